use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from the terminal or log/config files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// A label given to a new item was empty.
    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(String),
}
