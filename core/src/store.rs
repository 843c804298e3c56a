use std::collections::HashMap;

use time::OffsetDateTime;
use tracing::trace;

use crate::{Direction, LoadStatus, RealtimeAnnotation, Token, TokenId, TokenMetric};

/// Partial update of a token's market fields. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenChanges {
    pub market_cap: Option<f64>,
    pub market_cap_change_24h: Option<f64>,
    pub liquidity: Option<f64>,
    pub volume_24h: Option<f64>,
    pub transaction_count: Option<u64>,
    pub buy_count: Option<u64>,
    pub sell_count: Option<u64>,
    pub metrics: Option<Vec<TokenMetric>>,
}

impl TokenChanges {
    pub fn market_cap(value: f64) -> Self {
        Self {
            market_cap: Some(value),
            ..Self::default()
        }
    }

    fn merge_into(&self, token: &mut Token) {
        if let Some(v) = self.market_cap {
            token.market_cap = v;
        }
        if let Some(v) = self.market_cap_change_24h {
            token.market_cap_change_24h = v;
        }
        if let Some(v) = self.liquidity {
            token.liquidity = v;
        }
        if let Some(v) = self.volume_24h {
            token.volume_24h = v;
        }
        if let Some(v) = self.transaction_count {
            token.transaction_count = v;
        }
        if let Some(v) = self.buy_count {
            token.buy_count = v;
        }
        if let Some(v) = self.sell_count {
            token.sell_count = v;
        }
        if let Some(metrics) = &self.metrics {
            token.metrics = metrics.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenDelta {
    pub id: TokenId,
    pub changes: TokenChanges,
    pub price_delta_pct: Option<f64>,
    pub price_direction: Option<Direction>,
}

impl TokenDelta {
    pub fn new(id: impl Into<TokenId>, changes: TokenChanges) -> Self {
        Self {
            id: id.into(),
            changes,
            price_delta_pct: None,
            price_direction: None,
        }
    }

    pub fn with_price(mut self, pct: f64, direction: Direction) -> Self {
        self.price_delta_pct = Some(pct);
        self.price_direction = Some(direction);
        self
    }
}

/// Normalized token collection: records keyed by id plus the first-seen id
/// order, load status, and the per-token realtime annotations.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    entities: HashMap<TokenId, Token>,
    ids: Vec<TokenId>,
    status: LoadStatus,
    error: Option<String>,
    last_updated_at: Option<OffsetDateTime>,
    realtime: HashMap<TokenId, RealtimeAnnotation>,
    revision: u64,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, tokens: impl IntoIterator<Item = Token>, replace: bool) {
        if replace {
            self.entities.clear();
            self.ids.clear();
            self.realtime.clear();
        }
        for token in tokens {
            if !self.entities.contains_key(&token.id) {
                self.ids.push(token.id.clone());
            }
            self.entities.insert(token.id.clone(), token);
        }
        self.last_updated_at = Some(OffsetDateTime::now_utc());
        self.status = LoadStatus::Success;
        self.error = None;
        self.revision += 1;
    }

    /// Merges each delta into its token. Deltas for unknown ids are dropped.
    /// Returns how many deltas matched a token.
    pub fn apply_deltas(&mut self, deltas: impl IntoIterator<Item = TokenDelta>) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut applied = 0;
        for delta in deltas {
            let Some(target) = self.entities.get_mut(&delta.id) else {
                trace!(id = %delta.id, "dropping delta for unknown token");
                continue;
            };
            delta.changes.merge_into(target);
            applied += 1;

            if let (Some(pct), Some(direction)) = (delta.price_delta_pct, delta.price_direction) {
                let percent_change = if direction == Direction::Down {
                    -pct.abs()
                } else {
                    pct.abs()
                };
                self.realtime.insert(
                    delta.id,
                    RealtimeAnnotation {
                        percent_change,
                        direction,
                        updated_at: now,
                    },
                );
            }
        }
        self.last_updated_at = Some(now);
        self.revision += 1;
        applied
    }

    pub fn set_status(&mut self, status: LoadStatus) {
        self.status = status;
        self.revision += 1;
    }

    /// Setting a message also flips the status to `Error`; clearing it leaves
    /// the status untouched.
    pub fn set_error(&mut self, message: Option<String>) {
        if message.is_some() {
            self.status = LoadStatus::Error;
        }
        self.error = message;
        self.revision += 1;
    }

    pub fn reset(&mut self) {
        self.entities.clear();
        self.ids.clear();
        self.status = LoadStatus::Idle;
        self.error = None;
        self.last_updated_at = None;
        self.realtime.clear();
        self.revision += 1;
    }

    pub fn get(&self, id: &str) -> Option<&Token> {
        self.entities.get(id)
    }

    pub fn realtime(&self, id: &str) -> Option<&RealtimeAnnotation> {
        self.realtime.get(id)
    }

    pub fn realtime_len(&self) -> usize {
        self.realtime.len()
    }

    pub fn ids(&self) -> &[TokenId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_updated_at(&self) -> Option<OffsetDateTime> {
        self.last_updated_at
    }

    /// Bumped on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
