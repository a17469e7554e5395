//! Error types for the assistant relay.

use thiserror::Error;

/// Assistant error type.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Invalid or missing configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// HTTP transport error.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// An upstream service answered with a non-success status.
    #[error("{service} returned status {status}: {body}")]
    Upstream {
        /// Name of the upstream service.
        service: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },
    /// `SQLite` storage error (sync).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// `SQLite` storage error (async).
    #[error("tokio-rusqlite error: {0}")]
    TokioSqlite(#[from] tokio_rusqlite::Error),
    /// Stored data could not be interpreted.
    #[error("invalid stored record: {0}")]
    InvalidRecord(String),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    /// The model returned no candidate content.
    #[error("model returned an empty response")]
    EmptyResponse,
    /// The model kept requesting functions past the configured limit.
    #[error("exceeded the maximum number of automatic function calls ({0})")]
    FunctionCallLimit(usize),
    /// The model requested a function that is not declared.
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    /// The model called a function with unusable arguments.
    #[error("invalid arguments for {function}: {reason}")]
    InvalidArguments {
        /// Function name.
        function: String,
        /// What was wrong.
        reason: String,
    },
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for assistant operations.
pub type AssistantResult<T> = Result<T, AssistantError>;
