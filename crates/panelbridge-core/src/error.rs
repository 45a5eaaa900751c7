//! Error types shared by the bridge core.

use serde_json::Value;
use thiserror::Error;

use crate::resolver::IdentifierKind;

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors raised while resolving, transforming or exchanging simulator data.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Entity name is unknown to the simulator.
    #[error("{kind} \"{name}\" not found")]
    NotFound { kind: IdentifierKind, name: String },

    /// Lookup or value read could not reach the simulator.
    #[error("Simulator request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Simulator answered with something we could not interpret.
    #[error("Invalid response from simulator: {0}")]
    InvalidResponse(String),

    /// A value pipeline function rejected its input.
    #[error("Cannot apply {transform} to {value}")]
    Transform { transform: &'static str, value: Value },

    /// Toggle read returned a value that has no logical inverse.
    #[error("Cannot toggle non-boolean value {0}")]
    NotToggleable(Value),

    /// One or more names of an outbound batch did not resolve.
    #[error("Batch aborted, unresolved {kind}: {names:?}")]
    BatchAborted {
        kind: IdentifierKind,
        names: Vec<String>,
    },

    /// Inbound device key has no mapping.
    #[error("No mapping for input \"{0}\"")]
    UnknownInput(String),

    /// Data reference input without a value to write.
    #[error("Input \"{0}\" has no value to write")]
    MissingValue(String),

    /// Socket is not open.
    #[error("Not connected to simulator")]
    NotConnected,

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
