use std::future::Future;
use std::sync::{Mutex, PoisonError};

use pulse_core::{LoadError, Token, TokenTab};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use time::OffsetDateTime;
use tokio::time::{Duration, sleep};

use crate::query::QueryKey;

pub const FETCH_ERROR_MESSAGE: &str = "Failed to load token data.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenQuery {
    pub tab: Option<TokenTab>,
}

impl TokenQuery {
    pub fn all() -> Self {
        Self { tab: None }
    }

    pub fn tab(tab: TokenTab) -> Self {
        Self { tab: Some(tab) }
    }

    pub fn key(&self) -> QueryKey {
        match self.tab {
            Some(tab) => QueryKey::Tab(tab),
            None => QueryKey::All,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenPage {
    pub tokens: Vec<Token>,
    pub last_updated_at: OffsetDateTime,
}

/// Anything that can hand the dashboard a token list.
pub trait TokenSource {
    fn fetch_tokens(
        &self,
        query: TokenQuery,
    ) -> impl Future<Output = Result<TokenPage, LoadError>> + Send;
}

#[derive(Debug, Clone)]
pub struct MockSourceConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub simulate_error: bool,
    pub failure_rate: f64,
}

impl Default for MockSourceConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 420,
            max_delay_ms: 960,
            simulate_error: false,
            failure_rate: 0.3,
        }
    }
}

/// In-memory source that answers after a random delay and, when asked to,
/// fails some of the time.
pub struct MockTokenSource {
    tokens: Vec<Token>,
    config: MockSourceConfig,
    rng: Mutex<StdRng>,
}

impl MockTokenSource {
    pub fn new(tokens: Vec<Token>, config: MockSourceConfig, seed: u64) -> Self {
        Self {
            tokens,
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn resolve(&self, tab: Option<TokenTab>) -> Vec<Token> {
        match tab {
            None => self.tokens.clone(),
            Some(tab) => self
                .tokens
                .iter()
                .filter(|token| token.tab == tab)
                .cloned()
                .collect(),
        }
    }
}

impl TokenSource for MockTokenSource {
    fn fetch_tokens(
        &self,
        query: TokenQuery,
    ) -> impl Future<Output = Result<TokenPage, LoadError>> + Send {
        let (delay_ms, fail) = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            let lo = self.config.min_delay_ms.min(self.config.max_delay_ms);
            let hi = self.config.max_delay_ms.max(lo);
            let delay_ms = rng.gen_range(lo..=hi);
            let fail = self.config.simulate_error && rng.r#gen::<f64>() < self.config.failure_rate;
            (delay_ms, fail)
        };
        let tokens = self.resolve(query.tab);

        async move {
            sleep(Duration::from_millis(delay_ms)).await;
            if fail {
                return Err(LoadError::Fetch(FETCH_ERROR_MESSAGE.to_string()));
            }
            Ok(TokenPage {
                tokens,
                last_updated_at: OffsetDateTime::now_utc(),
            })
        }
    }
}
