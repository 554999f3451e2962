use thiserror::Error;

/// Classification of a failed backend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Response,
    Unexpected,
}

/// Errors produced by the file-storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The request never got a response (connection refused, DNS, timeout).
    #[error("Request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Response { status: u16, body: String },

    /// Anything else, e.g. a body that is not a valid item mapping.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Transport(_) => ErrorKind::Transport,
            StoreError::Response { .. } => ErrorKind::Response,
            StoreError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }
}
