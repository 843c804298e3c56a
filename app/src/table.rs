use std::fmt::Write;

use pulse_core::format::{format_age, format_compact, format_currency, format_percent};
use pulse_core::{Direction, Token, TokenView};

pub fn render_header(view: &TokenView<'_>, shown: usize) -> String {
    let ui = view.ui();
    if ui.active_tab.token_tab().is_some() {
        return format!("[{}] listing order, unfiltered | {} shown", ui.active_tab, shown);
    }
    let filters = &ui.filters;
    let platforms: Vec<&str> = pulse_core::Platform::ALL
        .iter()
        .filter(|p| filters.platforms.contains(**p))
        .map(|p| p.as_str())
        .collect();
    format!(
        "[{}] sort={} {} | min mcap {} | {} | status {} | {} shown",
        ui.active_tab,
        ui.sort_config.key.as_str(),
        ui.sort_config.order.as_str(),
        format_currency(filters.min_market_cap),
        platforms.join(","),
        filters.status.as_str(),
        shown,
    )
}

pub fn render_table(view: &TokenView<'_>, tokens: &[&Token]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<3} {:<10} {:<14} {:<9} {:>10} {:>8} {:>8} {:>8} {:>6} {:>5} {:>8}",
        "#", "TICKER", "NAME", "PLATFORM", "MCAP", "24H", "LIQ", "VOL", "TXNS", "AGE", "LIVE"
    );
    for (idx, token) in tokens.iter().enumerate() {
        let live = view
            .realtime_by_id(&token.id)
            .map(|rt| {
                let arrow = match rt.direction {
                    Direction::Up => "▲",
                    Direction::Down => "▼",
                    Direction::Neutral => "",
                };
                format!("{arrow}{}", format_percent(rt.percent_change, 2))
            })
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:<3} {:<10} {:<14} {:<9} {:>10} {:>8} {:>8} {:>8} {:>6} {:>5} {:>8}",
            idx + 1,
            truncate(&token.ticker, 10),
            truncate(&token.name, 14),
            token.platform.as_str(),
            format_compact(token.market_cap),
            format_percent(token.market_cap_change_24h, 1),
            format_compact(token.liquidity),
            format_compact(token.volume_24h),
            format_compact(token.transaction_count as f64),
            format_age(token.age_in_seconds),
            live,
        );
    }
    out
}

pub fn render_details(token: &Token) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({}) on {}", token.name, token.ticker, token.platform);
    let _ = writeln!(
        out,
        "  market cap {}  24h {}  liquidity {}  volume {}",
        format_currency(token.market_cap),
        format_percent(token.market_cap_change_24h, 2),
        format_currency(token.liquidity),
        format_currency(token.volume_24h),
    );
    let _ = writeln!(
        out,
        "  txns {} (buys {}, sells {})  pro traders {}  age {}  status {}",
        token.transaction_count,
        token.buy_count,
        token.sell_count,
        token.pro_traders,
        format_age(token.age_in_seconds),
        token.status.as_str(),
    );
    for metric in &token.metrics {
        let _ = writeln!(out, "  {:<12} {:>3.0}%", metric.label, metric.value);
    }
    if let Some(twitter) = &token.social_links.twitter {
        let _ = writeln!(out, "  twitter  {twitter}");
    }
    if let Some(website) = &token.social_links.website {
        let _ = writeln!(out, "  website  {website}");
    }
    out
}

fn truncate(raw: &str, width: usize) -> String {
    if raw.chars().count() <= width {
        return raw.to_string();
    }
    let mut cut: String = raw.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
