use pulse_core::{
    Direction, Platform, SocialLinks, Token, TokenMetric, TokenStatus, TokenTab,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const SYLLABLES: [&str; 16] = [
    "mo", "on", "pep", "ka", "zu", "bon", "ki", "ra", "lu", "dex", "fi", "nova", "sol", "wif",
    "gib", "tor",
];

const METRIC_LABELS: [&str; 4] = ["Top 10 H.", "Dev H.", "Snipers H.", "Insiders"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockSpec {
    pub count: usize,
    pub seed: u64,
}

impl MockSpec {
    pub fn normalized(self) -> Self {
        Self {
            count: self.count.max(1),
            seed: self.seed,
        }
    }
}

impl Default for MockSpec {
    fn default() -> Self {
        Self { count: 24, seed: 0x1234_5678_9abc_def0 }
    }
}

/// Deterministic token list for demos and tests. The same `MockSpec` always yields
/// the same tokens; tabs, platforms and statuses rotate so every partition is
/// populated once `count >= 3`.
pub fn generate_mock_tokens(spec: MockSpec) -> Vec<Token> {
    let spec = spec.normalized();

    let mut rng = StdRng::seed_from_u64(spec.seed);

    let mut tokens = Vec::with_capacity(spec.count);
    for i in 0..spec.count {
        let first = SYLLABLES.choose(&mut rng).copied().unwrap_or("mo");
        let second = SYLLABLES.choose(&mut rng).copied().unwrap_or("on");
        let name = capitalize(&format!("{first}{second}"));
        let ticker = format!("{}{}", name.to_ascii_uppercase(), i);

        let market_cap: f64 = rng.gen_range(5_000.0..2_505_000.0_f64).round();
        let liquidity = (market_cap * rng.gen_range(0.05..0.30_f64)).round();
        let volume_24h = (market_cap * rng.gen_range(0.0..1.5_f64)).round();
        let buy_count: u64 = rng.gen_range(0..900);
        let sell_count: u64 = rng.gen_range(0..700);

        let metrics = METRIC_LABELS
            .iter()
            .map(|label| TokenMetric {
                label: (*label).to_string(),
                value: rng.gen_range(0.0..=100.0_f64).round(),
                direction: Direction::Neutral,
            })
            .collect();

        tokens.push(Token {
            id: format!("tok-{i:03}"),
            ticker: ticker.clone(),
            name,
            logo: format!("https://avatar.vercel.sh/{}.png", ticker.to_ascii_lowercase()),
            market_cap,
            market_cap_change_24h: (rng.gen_range(-40.0..40.0_f64) * 100.0).round() / 100.0,
            liquidity,
            volume_24h,
            transaction_count: buy_count + sell_count,
            buy_count,
            sell_count,
            metrics,
            status: if i % 2 == 0 {
                TokenStatus::Paid
            } else {
                TokenStatus::Unpaid
            },
            platform: Platform::ALL[i % Platform::ALL.len()],
            age_in_seconds: rng.gen_range(0..172_800),
            social_links: SocialLinks {
                twitter: Some(format!("https://x.com/{}", ticker.to_ascii_lowercase())),
                website: (i % 3 != 0).then(|| format!("https://{}.fun", ticker.to_ascii_lowercase())),
                contract: None,
            },
            tab: TokenTab::ALL[i % TokenTab::ALL.len()],
            pro_traders: rng.gen_range(0..40),
        });
    }

    tokens
}

fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_spec_same_tokens() {
        let spec = MockSpec { count: 10, seed: 99 };
        assert_eq!(generate_mock_tokens(spec), generate_mock_tokens(spec));
    }

    #[test]
    fn generated_tokens_respect_invariants() {
        let tokens = generate_mock_tokens(MockSpec { count: 30, seed: 5 });
        let mut ids: Vec<&str> = tokens.iter().map(|t| t.id.as_str()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 30);

        for t in &tokens {
            assert!(t.market_cap >= 0.0 && t.liquidity >= 0.0 && t.volume_24h >= 0.0);
            assert!((-99.0..=99.0).contains(&t.market_cap_change_24h));
            assert!(t.metrics.iter().all(|m| (0.0..=100.0).contains(&m.value)));
            assert_eq!(t.transaction_count, t.buy_count + t.sell_count);
        }
        for tab in TokenTab::ALL {
            assert!(tokens.iter().any(|t| t.tab == tab));
        }
    }

    #[test]
    fn seed_changes_the_list() {
        let a = generate_mock_tokens(MockSpec { count: 6, seed: 1 });
        let b = generate_mock_tokens(MockSpec { count: 6, seed: 2 });
        assert_ne!(a, b);
        assert_eq!(
            a.iter().map(|t| t.tab).collect::<Vec<_>>(),
            b.iter().map(|t| t.tab).collect::<Vec<_>>()
        );
    }

    #[test]
    fn zero_count_is_normalized() {
        assert_eq!(generate_mock_tokens(MockSpec { count: 0, seed: 1 }).len(), 1);
    }
}
