use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ParseEnumError;

pub type TokenId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "raydium")]
    Raydium,
    #[serde(rename = "pump.fun")]
    PumpFun,
    #[serde(rename = "meteora")]
    Meteora,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Raydium, Platform::PumpFun, Platform::Meteora];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Raydium => "raydium",
            Platform::PumpFun => "pump.fun",
            Platform::Meteora => "meteora",
        }
    }
}

impl FromStr for Platform {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raydium" => Ok(Platform::Raydium),
            "pump.fun" | "pumpfun" | "pump" => Ok(Platform::PumpFun),
            "meteora" => Ok(Platform::Meteora),
            _ => Err(ParseEnumError::new("platform", s)),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    Paid,
    Unpaid,
}

impl TokenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::Paid => "paid",
            TokenStatus::Unpaid => "unpaid",
        }
    }
}

/// Coarse lifecycle category a token is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenTab {
    New,
    Final,
    Migrated,
}

impl TokenTab {
    pub const ALL: [TokenTab; 3] = [TokenTab::New, TokenTab::Final, TokenTab::Migrated];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenTab::New => "new",
            TokenTab::Final => "final",
            TokenTab::Migrated => "migrated",
        }
    }
}

impl FromStr for TokenTab {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(TokenTab::New),
            "final" => Ok(TokenTab::Final),
            "migrated" => Ok(TokenTab::Migrated),
            _ => Err(ParseEnumError::new("tab", s)),
        }
    }
}

impl fmt::Display for TokenTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

impl Direction {
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Up => 1.0,
            Direction::Down => -1.0,
            Direction::Neutral => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMetric {
    pub label: String,
    pub value: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: TokenId,
    pub ticker: String,
    pub name: String,
    pub logo: String,
    pub market_cap: f64,
    pub market_cap_change_24h: f64,
    pub liquidity: f64,
    pub volume_24h: f64,
    pub transaction_count: u64,
    pub buy_count: u64,
    pub sell_count: u64,
    #[serde(default)]
    pub metrics: Vec<TokenMetric>,
    pub status: TokenStatus,
    pub platform: Platform,
    pub age_in_seconds: u64,
    #[serde(default)]
    pub social_links: SocialLinks,
    pub tab: TokenTab,
    #[serde(default)]
    pub pro_traders: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Last simulated price movement for a token.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeAnnotation {
    pub percent_change: f64,
    pub direction: Direction,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Name,
    MarketCap,
    Liquidity,
    Volume,
    Txns,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Name,
        SortKey::MarketCap,
        SortKey::Liquidity,
        SortKey::Volume,
        SortKey::Txns,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::MarketCap => "marketCap",
            SortKey::Liquidity => "liquidity",
            SortKey::Volume => "volume",
            SortKey::Txns => "txns",
        }
    }
}

impl FromStr for SortKey {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError::new("sort key", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ParseEnumError::new("sort order", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: SortKey,
    pub order: SortOrder,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            key: SortKey::MarketCap,
            order: SortOrder::Desc,
        }
    }
}

impl SortConfig {
    pub fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }

    /// Config after a header click on `key`: the active key flips its order,
    /// a new key starts ascending for names and descending for numbers.
    pub fn toggled(&self, key: SortKey) -> Self {
        let order = if self.key == key {
            self.order.reversed()
        } else if key == SortKey::Name {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        };
        Self { key, order }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Paid,
    Unpaid,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Paid => "paid",
            StatusFilter::Unpaid => "unpaid",
        }
    }

    pub fn admits(&self, status: TokenStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Paid => status == TokenStatus::Paid,
            StatusFilter::Unpaid => status == TokenStatus::Unpaid,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "paid" => Ok(StatusFilter::Paid),
            "unpaid" => Ok(StatusFilter::Unpaid),
            _ => Err(ParseEnumError::new("status filter", s)),
        }
    }
}

/// Enabled flag per platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformSet {
    pub raydium: bool,
    #[serde(rename = "pump.fun")]
    pub pump_fun: bool,
    pub meteora: bool,
}

impl Default for PlatformSet {
    fn default() -> Self {
        Self {
            raydium: true,
            pump_fun: true,
            meteora: true,
        }
    }
}

impl PlatformSet {
    pub fn none() -> Self {
        Self {
            raydium: false,
            pump_fun: false,
            meteora: false,
        }
    }

    pub fn contains(&self, platform: Platform) -> bool {
        match platform {
            Platform::Raydium => self.raydium,
            Platform::PumpFun => self.pump_fun,
            Platform::Meteora => self.meteora,
        }
    }

    pub fn set(&mut self, platform: Platform, enabled: bool) {
        match platform {
            Platform::Raydium => self.raydium = enabled,
            Platform::PumpFun => self.pump_fun = enabled,
            Platform::Meteora => self.meteora = enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    pub min_market_cap: f64,
    pub platforms: PlatformSet,
    pub status: StatusFilter,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            min_market_cap: 0.0,
            platforms: PlatformSet::default(),
            status: StatusFilter::All,
        }
    }
}

impl Filters {
    pub fn admits(&self, token: &Token) -> bool {
        token.market_cap >= self.min_market_cap
            && self.platforms.contains(token.platform)
            && self.status.admits(token.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggled_flips_active_key_and_seeds_new_keys() {
        let cfg = SortConfig::default();
        assert_eq!(
            cfg.toggled(SortKey::MarketCap),
            SortConfig::new(SortKey::MarketCap, SortOrder::Asc)
        );
        assert_eq!(
            cfg.toggled(SortKey::Name),
            SortConfig::new(SortKey::Name, SortOrder::Asc)
        );
        assert_eq!(
            cfg.toggled(SortKey::Txns),
            SortConfig::new(SortKey::Txns, SortOrder::Desc)
        );
    }

    #[test]
    fn parses_enum_labels() {
        assert_eq!("marketcap".parse::<SortKey>(), Ok(SortKey::MarketCap));
        assert_eq!("pump.fun".parse::<Platform>(), Ok(Platform::PumpFun));
        assert_eq!("Migrated".parse::<TokenTab>(), Ok(TokenTab::Migrated));
        let err = "volume24h".parse::<SortKey>().unwrap_err();
        assert_eq!(err.to_string(), "unknown sort key: volume24h");
    }

    #[test]
    fn status_filter_all_admits_both() {
        assert!(StatusFilter::All.admits(TokenStatus::Paid));
        assert!(StatusFilter::All.admits(TokenStatus::Unpaid));
        assert!(!StatusFilter::Paid.admits(TokenStatus::Unpaid));
    }

    #[test]
    fn token_json_uses_dashboard_field_names() {
        let raw = r#"{
            "id": "tok-1",
            "ticker": "PULSE",
            "name": "Pulse",
            "logo": "https://example.invalid/pulse.png",
            "marketCap": 1200.5,
            "marketCapChange24h": -3.2,
            "liquidity": 800.0,
            "volume24h": 50.0,
            "transactionCount": 10,
            "buyCount": 6,
            "sellCount": 4,
            "metrics": [{ "label": "Top 10", "value": 40, "direction": "up" }],
            "status": "paid",
            "platform": "pump.fun",
            "ageInSeconds": 90,
            "socialLinks": { "twitter": "https://x.com/pulse" },
            "tab": "final",
            "proTraders": 3
        }"#;
        let token: Token = serde_json::from_str(raw).unwrap();
        assert_eq!(token.platform, Platform::PumpFun);
        assert_eq!(token.tab, TokenTab::Final);
        assert_eq!(token.market_cap_change_24h, -3.2);
        assert_eq!(token.metrics[0].direction, Direction::Up);
        assert_eq!(token.social_links.website, None);
    }
}
