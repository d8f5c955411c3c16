use std::path::PathBuf;

use unikernal_core::{ServiceIdError, SessionState};

/// Error returned by session operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session already connected (state: {state})")]
    AlreadyConnected { state: SessionState },
    #[error("session is not active (state: {state})")]
    NotActive { state: SessionState },
}

/// Error reported by a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("no tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    #[error("{0}")]
    Other(String),
}

/// Error loading adapter configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("hub address cannot be empty")]
    EmptyAddress,
    #[error(transparent)]
    ServiceId(#[from] ServiceIdError),
}
