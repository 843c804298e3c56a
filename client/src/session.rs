use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pulse_core::{
    CachedView, LoadError, LoadStatus, Modal, SortKey, Token, TokenDelta, TokenId, TokenStore,
    TokenView, UiState,
};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::query::{QueryConfig, QueryTracker, RequestId};
use crate::source::{TokenPage, TokenQuery, TokenSource};

pub type SharedSession = Arc<Mutex<Session>>;

/// Locks the session, recovering the state if a holder panicked.
pub fn lock(session: &SharedSession) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied { tokens: usize },
    Failed,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuickBuyOrder {
    pub amount_sol: f64,
    pub slippage_pct: f64,
}

impl Default for QuickBuyOrder {
    fn default() -> Self {
        Self {
            amount_sol: 1.0,
            slippage_pct: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum QuickBuyError {
    #[error("quick buy is not open")]
    ModalClosed,
    #[error("no token selected")]
    NoSelection,
    #[error("amount must be greater than zero (got {0})")]
    InvalidAmount(f64),
    #[error("slippage must be between 0 and 100 (got {0})")]
    InvalidSlippage(f64),
}

/// Owner of the token store and the interaction state. Consumers and the live
/// feed share it through [`SharedSession`].
#[derive(Debug, Default)]
pub struct Session {
    store: TokenStore,
    ui: UiState,
    queries: QueryTracker,
    query_config: QueryConfig,
    last_fetched_at: Option<OffsetDateTime>,
    tokens_loaded: Arc<Notify>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ui(ui: UiState) -> Self {
        Self {
            ui,
            ..Self::default()
        }
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn view(&self) -> TokenView<'_> {
        TokenView::new(&self.store, &self.ui)
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut UiState {
        &mut self.ui
    }

    pub(crate) fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Sorted and filtered tokens, reusing `cache` while neither the store
    /// nor the sort and filter settings changed.
    pub fn sorted_tokens_cached<'a>(&'a self, cache: &mut CachedView) -> Vec<&'a Token> {
        cache.sorted_tokens(&self.store, &self.ui)
    }

    /// Signalled after every applied fetch. Holds one permit when nobody is
    /// waiting, so a load that lands before the wait starts is not lost.
    pub fn tokens_loaded(&self) -> Arc<Notify> {
        self.tokens_loaded.clone()
    }

    pub fn token_count(&self) -> usize {
        self.store.len()
    }

    pub fn apply_deltas(&mut self, deltas: Vec<TokenDelta>) -> usize {
        self.store.apply_deltas(deltas)
    }

    pub fn reset(&mut self) {
        self.store.reset();
        self.last_fetched_at = None;
    }

    pub fn set_query_config(&mut self, config: QueryConfig) {
        self.query_config = config;
    }

    pub fn begin_fetch(&mut self, query: &TokenQuery) -> RequestId {
        self.store.set_status(LoadStatus::Loading);
        self.queries.begin(query.key())
    }

    /// Applies a fetch result unless a newer request for the same query has
    /// been issued since `id`.
    pub fn finish_fetch(
        &mut self,
        query: &TokenQuery,
        id: RequestId,
        result: Result<TokenPage, LoadError>,
    ) -> FetchOutcome {
        if !self.queries.is_current(query.key(), id) {
            debug!(?id, key = ?query.key(), "discarding superseded token response");
            return FetchOutcome::Stale;
        }
        match result {
            Ok(page) => {
                let tokens = page.tokens.len();
                self.store.ingest(page.tokens, query.tab.is_none());
                self.last_fetched_at = Some(page.last_updated_at);
                info!(tokens, tab = ?query.tab, "token list loaded");
                self.tokens_loaded.notify_one();
                FetchOutcome::Applied { tokens }
            }
            Err(err) => {
                warn!(%err, tab = ?query.tab, "token list failed to load");
                self.store.set_error(Some(err.to_string()));
                FetchOutcome::Failed
            }
        }
    }

    pub fn is_stale(&self, now: OffsetDateTime) -> bool {
        self.query_config.is_stale(self.last_fetched_at, now)
    }

    pub fn needs_refetch(&self, now: OffsetDateTime) -> bool {
        self.query_config.needs_refetch(self.last_fetched_at, now)
    }

    pub fn toggle_sort(&mut self, key: SortKey) {
        let next = self.ui.sort_config.toggled(key);
        self.ui.set_sort_config(next);
    }

    pub fn open_token_details(&mut self, id: impl Into<TokenId>) {
        self.ui.select_token(Some(id.into()));
        self.ui.set_modal_open(Modal::TokenDetails, true);
    }

    pub fn open_quick_buy(&mut self, id: impl Into<TokenId>) {
        self.ui.select_token(Some(id.into()));
        self.ui.set_modal_open(Modal::QuickBuy, true);
    }

    pub fn details_to_quick_buy(&mut self) {
        self.ui.set_modal_open(Modal::TokenDetails, false);
        self.ui.set_modal_open(Modal::QuickBuy, true);
    }

    pub fn close_modal(&mut self, modal: Modal) {
        self.ui.set_modal_open(modal, false);
    }

    /// Simulated purchase: validates the order against the selected token and
    /// returns the confirmation to show. Nothing is executed.
    pub fn confirm_quick_buy(&mut self, order: QuickBuyOrder) -> Result<Notification, QuickBuyError> {
        if !self.ui.is_modal_open(Modal::QuickBuy) {
            return Err(QuickBuyError::ModalClosed);
        }
        if !(order.amount_sol.is_finite() && order.amount_sol > 0.0) {
            return Err(QuickBuyError::InvalidAmount(order.amount_sol));
        }
        if !(0.0..=100.0).contains(&order.slippage_pct) {
            return Err(QuickBuyError::InvalidSlippage(order.slippage_pct));
        }
        let ticker = self
            .view()
            .selected_token()
            .map(|token| token.ticker.clone())
            .ok_or(QuickBuyError::NoSelection)?;

        let notification = Notification {
            title: format!("{ticker} order submitted"),
            description: format!(
                "Buying {} SOL worth with {}% slippage.",
                order.amount_sol, order.slippage_pct
            ),
        };
        info!(%ticker, amount = order.amount_sol, slippage = order.slippage_pct, "quick buy confirmed");
        self.ui.set_modal_open(Modal::QuickBuy, false);
        Ok(notification)
    }
}

/// Runs one fetch against `source` and applies the result to the session.
/// The session lock is released while the request is in flight.
pub async fn refresh<S: TokenSource>(
    session: &SharedSession,
    source: &S,
    query: TokenQuery,
) -> FetchOutcome {
    let id = lock(session).begin_fetch(&query);
    let result = source.fetch_tokens(query).await;
    lock(session).finish_fetch(&query, id, result)
}
