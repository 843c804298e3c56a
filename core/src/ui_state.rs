use std::fmt;
use std::str::FromStr;

use crate::error::ParseEnumError;
use crate::{Filters, Platform, SortConfig, StatusFilter, TokenId, TokenTab};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActiveTab {
    #[default]
    New,
    Final,
    Migrated,
    Discover,
}

impl ActiveTab {
    pub fn token_tab(&self) -> Option<TokenTab> {
        match self {
            ActiveTab::New => Some(TokenTab::New),
            ActiveTab::Final => Some(TokenTab::Final),
            ActiveTab::Migrated => Some(TokenTab::Migrated),
            ActiveTab::Discover => None,
        }
    }
}

impl From<TokenTab> for ActiveTab {
    fn from(tab: TokenTab) -> Self {
        match tab {
            TokenTab::New => ActiveTab::New,
            TokenTab::Final => ActiveTab::Final,
            TokenTab::Migrated => ActiveTab::Migrated,
        }
    }
}

impl FromStr for ActiveTab {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("discover") {
            return Ok(ActiveTab::Discover);
        }
        s.parse::<TokenTab>()
            .map(ActiveTab::from)
            .map_err(|_| ParseEnumError::new("tab", s))
    }
}

impl fmt::Display for ActiveTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token_tab() {
            Some(tab) => f.write_str(tab.as_str()),
            None => f.write_str("discover"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modal {
    TokenDetails,
    Filter,
    QuickBuy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModalState {
    pub is_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modals {
    pub token_details: ModalState,
    pub filter: ModalState,
    pub quick_buy: ModalState,
}

impl Modals {
    pub fn get(&self, modal: Modal) -> ModalState {
        match modal {
            Modal::TokenDetails => self.token_details,
            Modal::Filter => self.filter,
            Modal::QuickBuy => self.quick_buy,
        }
    }

    fn get_mut(&mut self, modal: Modal) -> &mut ModalState {
        match modal {
            Modal::TokenDetails => &mut self.token_details,
            Modal::Filter => &mut self.filter,
            Modal::QuickBuy => &mut self.quick_buy,
        }
    }
}

/// Partial filter update. `platforms` entries are merged one by one, so
/// platforms not listed keep their current flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    pub min_market_cap: Option<f64>,
    pub platforms: Vec<(Platform, bool)>,
    pub status: Option<StatusFilter>,
}

/// User-driven interaction state. Every operation is a direct field write.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UiState {
    pub active_tab: ActiveTab,
    pub sort_config: SortConfig,
    pub selected_token_id: Option<TokenId>,
    pub modals: Modals,
    pub filters: Filters,
}

impl UiState {
    pub fn set_active_tab(&mut self, tab: ActiveTab) {
        self.active_tab = tab;
    }

    pub fn set_sort_config(&mut self, sort: SortConfig) {
        self.sort_config = sort;
    }

    pub fn select_token(&mut self, id: Option<TokenId>) {
        self.selected_token_id = id;
    }

    pub fn set_modal_open(&mut self, modal: Modal, open: bool) {
        self.modals.get_mut(modal).is_open = open;
    }

    pub fn is_modal_open(&self, modal: Modal) -> bool {
        self.modals.get(modal).is_open
    }

    pub fn reset_modals(&mut self) {
        self.modals = Modals::default();
    }

    pub fn apply_filters(&mut self, patch: FilterPatch) {
        if let Some(min) = patch.min_market_cap {
            self.filters.min_market_cap = min.max(0.0);
        }
        for (platform, enabled) in patch.platforms {
            self.filters.platforms.set(platform, enabled);
        }
        if let Some(status) = patch.status {
            self.filters.status = status;
        }
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.filters.status = status;
    }

    pub fn reset_filters(&mut self) {
        self.filters = Filters::default();
    }
}
