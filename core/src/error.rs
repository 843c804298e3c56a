use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{0}")]
    Fetch(String),
    #[error("failed to read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid token fixture: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no tokens loaded from {0}")]
    Empty(PathBuf),
    #[error("token '{id}' has metric '{label}' outside 0..=100 (value={value})")]
    MetricOutOfRange { id: String, label: String, value: f64 },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
