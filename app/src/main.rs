use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use pulse_client::logging::init_logging;
use pulse_client::source::FETCH_ERROR_MESSAGE;
use pulse_client::{
    FetchOutcome, LiveEvent, LiveFeed, MockSourceConfig, MockSpec, MockTokenSource, QuickBuyOrder,
    Session, SharedSession, SimulatorConfig, TokenQuery, generate_mock_tokens, lock, refresh,
};
use pulse_core::{
    ActiveTab, CachedView, FilterPatch, Platform, SortConfig, SortKey, SortOrder, StatusFilter,
    Token, UiState, load_tokens_json,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tracing::{info, warn};

mod input;
mod table;
use input::{parse_amount, platform_patch};

#[derive(Parser, Debug)]
#[command(name = "pulse", about = "Token discovery table with simulated live updates")]
struct Args {
    /// Tab to display: new, final, migrated or discover.
    #[arg(long, default_value = "new", value_parser = ActiveTab::from_str)]
    tab: ActiveTab,

    /// Sort column: name, marketCap, liquidity, volume, txns.
    #[arg(long, value_parser = SortKey::from_str)]
    sort: Option<SortKey>,

    /// Sort direction (asc or desc). Defaults per column.
    #[arg(long, value_parser = SortOrder::from_str)]
    order: Option<SortOrder>,

    /// Hide tokens below this market cap (accepts 250k, 1.5m, ...).
    #[arg(long, value_parser = parse_amount)]
    min_market_cap: Option<f64>,

    /// all, paid or unpaid.
    #[arg(long, value_parser = StatusFilter::from_str)]
    status: Option<StatusFilter>,

    /// Restrict to a platform. Repeat to allow several.
    #[arg(long = "platform", value_parser = Platform::from_str)]
    platforms: Vec<Platform>,

    /// Number of live batches to print before exiting. 0 skips the feed.
    #[arg(long, default_value_t = 5)]
    ticks: usize,

    #[arg(long)]
    interval_ms: Option<u64>,

    #[arg(long)]
    variance_ms: Option<u64>,

    #[arg(long)]
    batch_size: Option<usize>,

    /// Seed for generated tokens, fetch latency and the simulator.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// JSON token list. Without it a generated list is used.
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Size of the generated list when no fixture is given.
    #[arg(long, default_value_t = 24)]
    count: usize,

    /// Make the mock source fail some of its fetches.
    #[arg(long)]
    simulate_error: bool,

    /// Fetch attempts after a failed initial load.
    #[arg(long, default_value_t = 3)]
    retries: u32,

    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Show the details card for a token id after loading.
    #[arg(long)]
    details: Option<String>,

    /// Run a simulated quick buy (1 SOL, 0.5% slippage) for a token id.
    #[arg(long)]
    buy: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref()).context("failed to set up logging")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    runtime.block_on(run(args))
}

async fn run(args: Args) -> Result<()> {
    let tokens = match &args.fixture {
        Some(path) => load_tokens_json(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => generate_mock_tokens(MockSpec {
            count: args.count,
            seed: args.seed,
        }),
    };
    let source = MockTokenSource::new(
        tokens,
        MockSourceConfig {
            simulate_error: args.simulate_error,
            ..MockSourceConfig::default()
        },
        args.seed,
    );
    let session = Session::with_ui(ui_state(&args)).into_shared();

    initial_load(&session, &source, args.retries).await?;
    let mut cache = CachedView::new();
    print_table(&session, &mut cache);

    if let Some(id) = &args.details {
        let mut guard = lock(&session);
        guard.open_token_details(id.clone());
        match guard.view().selected_token() {
            Some(token) => println!("\n{}", table::render_details(token)),
            None => println!("\nno token with id {id}"),
        }
    }

    if let Some(id) = &args.buy {
        let mut guard = lock(&session);
        if args.details.as_deref() == Some(id.as_str()) {
            guard.details_to_quick_buy();
        } else {
            guard.open_quick_buy(id.clone());
        }
        match guard.confirm_quick_buy(QuickBuyOrder::default()) {
            Ok(note) => println!("\n{}\n{}", note.title, note.description),
            Err(err) => println!("\nquick buy rejected: {err}"),
        }
    }

    if args.ticks == 0 {
        return Ok(());
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut feed = LiveFeed::start(
        session.clone(),
        simulator_config(&args),
        StdRng::seed_from_u64(args.seed),
        Some(tx),
    );

    let mut seen = 0;
    while seen < args.ticks {
        match rx.recv().await {
            Some(LiveEvent::Connected) => println!("\n-- live feed connected"),
            Some(LiveEvent::Batch { applied, deltas }) => {
                seen += 1;
                let ids: Vec<&str> = deltas.iter().map(|d| d.id.as_str()).collect();
                println!("\n-- tick {seen}: {applied} updated ({})", ids.join(", "));
                print_table(&session, &mut cache);

                let due = lock(&session).needs_refetch(OffsetDateTime::now_utc());
                if due {
                    info!("token list due for refetch");
                    refresh(&session, &source, TokenQuery::all()).await;
                }
            }
            Some(LiveEvent::Disconnected) => {
                println!("\n-- live feed disconnected, reloading tokens");
                if let FetchOutcome::Failed = refresh(&session, &source, TokenQuery::all()).await {
                    warn!("reload failed, live feed stays disconnected");
                    break;
                }
            }
            None => break,
        }
    }

    feed.stop();
    Ok(())
}

async fn initial_load(
    session: &SharedSession,
    source: &MockTokenSource,
    retries: u32,
) -> Result<()> {
    let mut attempt = 0;
    loop {
        match refresh(session, source, TokenQuery::all()).await {
            FetchOutcome::Applied { tokens } => {
                info!(tokens, "initial load complete");
                return Ok(());
            }
            FetchOutcome::Failed if attempt < retries => {
                attempt += 1;
                warn!(attempt, "token load failed, retrying");
                tokio::time::sleep(Duration::from_millis(250)).await;
            }
            FetchOutcome::Failed => {
                let guard = lock(session);
                let message = guard.view().error().unwrap_or(FETCH_ERROR_MESSAGE).to_string();
                bail!("{message}");
            }
            FetchOutcome::Stale => {}
        }
    }
}

fn ui_state(args: &Args) -> UiState {
    let mut ui = UiState::default();
    ui.set_active_tab(args.tab);
    if let Some(key) = args.sort {
        let base = SortConfig::default();
        let sort = match args.order {
            Some(order) => SortConfig::new(key, order),
            None if base.key == key => base,
            None => base.toggled(key),
        };
        ui.set_sort_config(sort);
    } else if let Some(order) = args.order {
        ui.set_sort_config(SortConfig::new(ui.sort_config.key, order));
    }
    ui.apply_filters(FilterPatch {
        min_market_cap: args.min_market_cap,
        platforms: platform_patch(&args.platforms),
        status: args.status,
    });
    ui
}

fn simulator_config(args: &Args) -> SimulatorConfig {
    let mut config = SimulatorConfig::default();
    if let Some(ms) = args.interval_ms {
        config.interval = Duration::from_millis(ms);
    }
    if let Some(ms) = args.variance_ms {
        config.interval_variance = Duration::from_millis(ms);
    }
    if let Some(size) = args.batch_size {
        config.batch_size = size;
    }
    config
}

/// Lifecycle tabs list their tokens in listing order and ignore the user
/// filters. `Discover` is the filtered, sorted table.
fn visible_tokens<'a>(session: &'a Session, cache: &mut CachedView) -> Vec<&'a Token> {
    match session.ui().active_tab.token_tab() {
        Some(tab) => session.view().tokens_by_tab(tab),
        None => session.sorted_tokens_cached(cache),
    }
}

fn print_table(session: &SharedSession, cache: &mut CachedView) {
    let guard = lock(session);
    let view = guard.view();
    let visible = visible_tokens(&guard, cache);
    println!("{}", table::render_header(&view, visible.len()));
    print!("{}", table::render_table(&view, &visible));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_shape_ui_state() {
        let args = Args::parse_from([
            "pulse",
            "--tab",
            "final",
            "--sort",
            "name",
            "--min-market-cap",
            "100k",
            "--platform",
            "raydium",
            "--status",
            "paid",
        ]);
        let ui = ui_state(&args);

        assert_eq!(ui.active_tab, ActiveTab::Final);
        assert_eq!(ui.sort_config, SortConfig::new(SortKey::Name, SortOrder::Asc));
        assert_eq!(ui.filters.min_market_cap, 100_000.0);
        assert!(ui.filters.platforms.contains(Platform::Raydium));
        assert!(!ui.filters.platforms.contains(Platform::Meteora));
        assert_eq!(ui.filters.status, StatusFilter::Paid);
    }

    #[test]
    fn explicit_order_wins() {
        let args = Args::parse_from(["pulse", "--sort", "volume", "--order", "asc"]);
        assert_eq!(
            ui_state(&args).sort_config,
            SortConfig::new(SortKey::Volume, SortOrder::Asc)
        );
    }

    #[test]
    fn tabs_ignore_filters_while_discover_applies_them() {
        let args = Args::parse_from(["pulse", "--tab", "new", "--min-market-cap", "1000b"]);
        let mut session = Session::with_ui(ui_state(&args));
        let query = TokenQuery::all();
        let id = session.begin_fetch(&query);
        let tokens = generate_mock_tokens(MockSpec { count: 9, seed: 3 });
        let new_ids: Vec<String> = tokens
            .iter()
            .filter(|t| t.tab == pulse_core::TokenTab::New)
            .map(|t| t.id.clone())
            .collect();
        session.finish_fetch(
            &query,
            id,
            Ok(pulse_client::TokenPage {
                tokens,
                last_updated_at: OffsetDateTime::now_utc(),
            }),
        );

        let mut cache = CachedView::new();
        let shown: Vec<String> = visible_tokens(&session, &mut cache)
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(shown, new_ids);

        session.ui_mut().set_active_tab(ActiveTab::Discover);
        assert!(visible_tokens(&session, &mut cache).is_empty());
    }

    #[test]
    fn simulator_flags_override_defaults() {
        let args = Args::parse_from(["pulse", "--interval-ms", "1500", "--batch-size", "7"]);
        let config = simulator_config(&args);
        assert_eq!(config.interval, Duration::from_millis(1500));
        assert_eq!(config.batch_size, 7);
    }
}
