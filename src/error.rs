//! Error types for the agent runtime

use thiserror::Error;

/// Result type alias using the runtime's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the agent runtime
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model streaming/completion failed
    #[error("Model error: {0}")]
    Model(String),

    /// The toolkit could not schedule tool calls at all
    #[error("Tool dispatch error: {0}")]
    ToolDispatch(String),

    /// A hook in the hook chain returned an error
    #[error("Hook error: {0}")]
    Hook(String),

    /// Cooperative cancellation observed at a suspension point
    #[error("Cancelled")]
    Cancelled,

    /// Structured-output handler exhausted its iteration budget without a result
    #[error("Structured output budget exceeded after {0} iterations")]
    StructuredOutputBudgetExceeded(usize),

    /// A core invariant was violated (e.g. reasoning produced nothing and memory is empty)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Provider-level error surfaced by a concrete Model implementation
    #[error("Provider error: {0}")]
    Provider(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment error: {0}")]
    Env(#[from] std::env::VarError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Timeout(_) | Error::Model(_))
    }

    /// Check if error is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::NotFound(_))
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}
