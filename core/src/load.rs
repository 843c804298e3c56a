use std::fs;
use std::path::Path;

use crate::{LoadError, Token};

/// Reads a JSON array of tokens in the dashboard's camelCase layout.
pub fn load_tokens_json(path: impl AsRef<Path>) -> Result<Vec<Token>, LoadError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tokens = parse_tokens(&raw)?;
    if tokens.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    Ok(tokens)
}

pub fn parse_tokens(raw: &str) -> Result<Vec<Token>, LoadError> {
    let mut tokens: Vec<Token> = serde_json::from_str(raw)?;
    for token in &mut tokens {
        normalize(token)?;
    }
    Ok(tokens)
}

fn normalize(token: &mut Token) -> Result<(), LoadError> {
    if let Some(metric) = token
        .metrics
        .iter()
        .find(|m| !(0.0..=100.0).contains(&m.value))
    {
        return Err(LoadError::MetricOutOfRange {
            id: token.id.clone(),
            label: metric.label.clone(),
            value: metric.value,
        });
    }
    token.market_cap = token.market_cap.max(0.0);
    token.liquidity = token.liquidity.max(0.0);
    token.volume_24h = token.volume_24h.max(0.0);
    token.market_cap_change_24h = token.market_cap_change_24h.clamp(-99.0, 99.0);
    Ok(())
}
