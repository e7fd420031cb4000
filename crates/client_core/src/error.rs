use std::path::PathBuf;

use thiserror::Error;

use crate::orchestrator::ViewKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {event} while in the {from:?} view")]
    InvalidTransition { from: ViewKind, event: &'static str },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("analysis is not complete; nothing to export")]
    Incomplete,
    #[error("failed to encode report page {page}: {reason}")]
    Encode { page: usize, reason: String },
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid analysis service URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("failed to read settings file '{}': {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings file '{}': {reason}", path.display())]
    ParseFile { path: PathBuf, reason: String },
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}
