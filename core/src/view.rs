//! Read side of the dashboard. Everything here is a pure function of a
//! [`TokenStore`] and a [`UiState`]; presentation code reads tokens through
//! these functions (or the [`TokenView`] facade) and never through the store.

use std::cmp::Ordering;

use time::OffsetDateTime;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::store::TokenStore;
use crate::ui_state::UiState;
use crate::{
    Filters, LoadStatus, RealtimeAnnotation, SortConfig, SortKey, SortOrder, Token, TokenId,
    TokenTab,
};

/// Tokens in first-seen order. Ids without an entity are skipped.
pub fn all_tokens(store: &TokenStore) -> Vec<&Token> {
    store.ids().iter().filter_map(|id| store.get(id)).collect()
}

pub fn filtered_tokens<'a>(store: &'a TokenStore, filters: &Filters) -> Vec<&'a Token> {
    all_tokens(store)
        .into_iter()
        .filter(|token| filters.admits(token))
        .collect()
}

/// Filtered tokens in `sort` order. The sort is stable: tokens with equal keys
/// keep their filtered order in both directions.
pub fn sorted_tokens<'a>(
    store: &'a TokenStore,
    filters: &Filters,
    sort: SortConfig,
) -> Vec<&'a Token> {
    let mut tokens = filtered_tokens(store, filters);
    sort_tokens(&mut tokens, sort);
    tokens
}

pub fn sort_tokens(tokens: &mut [&Token], sort: SortConfig) {
    tokens.sort_by(|a, b| {
        let ord = compare_by_key(a, b, sort.key);
        match sort.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

fn compare_by_key(a: &Token, b: &Token, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => compare_names(&a.name, &b.name),
        SortKey::MarketCap => a.market_cap.total_cmp(&b.market_cap),
        SortKey::Liquidity => a.liquidity.total_cmp(&b.liquidity),
        SortKey::Volume => a.volume_24h.total_cmp(&b.volume_24h),
        SortKey::Txns => a.transaction_count.cmp(&b.transaction_count),
    }
}

/// Base-strength comparison: case and diacritics are ignored, so `Éclair`
/// sorts with the `e`s and `Pokémon` ties with `Pokemon`.
fn compare_names(a: &str, b: &str) -> Ordering {
    base_letters(a).cmp(base_letters(b))
}

fn base_letters(name: &str) -> impl Iterator<Item = char> + '_ {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

/// Tokens listed under `tab`, independent of the user filters.
pub fn tokens_by_tab(store: &TokenStore, tab: TokenTab) -> Vec<&Token> {
    all_tokens(store)
        .into_iter()
        .filter(|token| token.tab == tab)
        .collect()
}

pub fn token_by_id<'a>(store: &'a TokenStore, id: &str) -> Option<&'a Token> {
    store.get(id)
}

pub fn realtime_by_id<'a>(store: &'a TokenStore, id: &str) -> Option<&'a RealtimeAnnotation> {
    store.realtime(id)
}

/// Borrowing facade over the store and the UI state.
#[derive(Clone, Copy)]
pub struct TokenView<'a> {
    store: &'a TokenStore,
    ui: &'a UiState,
}

impl<'a> TokenView<'a> {
    pub fn new(store: &'a TokenStore, ui: &'a UiState) -> Self {
        Self { store, ui }
    }

    pub fn all_tokens(&self) -> Vec<&'a Token> {
        all_tokens(self.store)
    }

    pub fn filtered_tokens(&self) -> Vec<&'a Token> {
        filtered_tokens(self.store, &self.ui.filters)
    }

    pub fn sorted_tokens(&self) -> Vec<&'a Token> {
        sorted_tokens(self.store, &self.ui.filters, self.ui.sort_config)
    }

    pub fn tokens_by_tab(&self, tab: TokenTab) -> Vec<&'a Token> {
        tokens_by_tab(self.store, tab)
    }

    pub fn token_by_id(&self, id: &str) -> Option<&'a Token> {
        token_by_id(self.store, id)
    }

    pub fn realtime_by_id(&self, id: &str) -> Option<&'a RealtimeAnnotation> {
        realtime_by_id(self.store, id)
    }

    /// The selected token, or `None` when nothing is selected or the id no
    /// longer resolves.
    pub fn selected_token(&self) -> Option<&'a Token> {
        self.ui
            .selected_token_id
            .as_deref()
            .and_then(|id| self.token_by_id(id))
    }

    pub fn ui(&self) -> &'a UiState {
        self.ui
    }

    pub fn status(&self) -> LoadStatus {
        self.store.status()
    }

    pub fn error(&self) -> Option<&'a str> {
        self.store.error()
    }

    pub fn last_updated_at(&self) -> Option<OffsetDateTime> {
        self.store.last_updated_at()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CacheKey {
    revision: u64,
    filters: Filters,
    sort: SortConfig,
}

/// Memoizes the sorted id sequence on (store revision, filters, sort config).
#[derive(Debug, Default)]
pub struct CachedView {
    key: Option<CacheKey>,
    sorted_ids: Vec<TokenId>,
    recomputes: u64,
}

impl CachedView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sorted_ids(&mut self, store: &TokenStore, ui: &UiState) -> &[TokenId] {
        let key = CacheKey {
            revision: store.revision(),
            filters: ui.filters.clone(),
            sort: ui.sort_config,
        };
        if self.key.as_ref() != Some(&key) {
            self.sorted_ids = sorted_tokens(store, &key.filters, key.sort)
                .into_iter()
                .map(|token| token.id.clone())
                .collect();
            self.key = Some(key);
            self.recomputes += 1;
        }
        &self.sorted_ids
    }

    pub fn sorted_tokens<'a>(&mut self, store: &'a TokenStore, ui: &UiState) -> Vec<&'a Token> {
        self.sorted_ids(store, ui)
            .iter()
            .filter_map(|id| store.get(id))
            .collect()
    }

    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }
}
