use thiserror::Error;

pub type LinkResult<T> = Result<T, LinkError>;

/// Panel link errors.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("No panel serial port found")]
    NoPort,

    #[error("Serial port enumeration failed: {0}")]
    Discovery(String),

    #[error("Cannot open serial port {path}: {message}")]
    Open { path: String, message: String },

    #[error("Panel closed the connection")]
    Closed,

    #[error("Serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode panel frame: {0}")]
    Encode(#[from] serde_json::Error),
}
