/// Result alias that carries the custom [`PacerError`] type.
pub type Result<T> = std::result::Result<T, PacerError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum PacerError {
    /// Session parameters that cannot produce a schedule. Raised before any
    /// schedule exists so a session never starts from bad input.
    #[error("invalid session parameters: {0}")]
    InvalidParameters(String),
    /// The host could not provide a monotonic time reading.
    #[error("clock unavailable: {0}")]
    ClockUnavailable(String),
    /// Configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The runtime thread went away or shared state was poisoned.
    #[error("{0}")]
    Channel(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl PacerError {
    pub fn invalid<T: Into<String>>(msg: T) -> Self {
        Self::InvalidParameters(msg.into())
    }

    pub fn channel<T: Into<String>>(msg: T) -> Self {
        Self::Channel(msg.into())
    }
}

impl From<serde_json::Error> for PacerError {
    fn from(value: serde_json::Error) -> Self {
        Self::Config(value.to_string())
    }
}
