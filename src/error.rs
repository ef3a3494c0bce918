//! Error types for replit-link.

use thiserror::Error;

/// Result type for replit-link operations.
pub type Result<T> = std::result::Result<T, ReplitLinkError>;

/// Errors that can occur while talking to Replit.
///
/// The realtime subscription engine deliberately surfaces almost none of
/// these: connect failures and unexpected closes are recovered internally,
/// and malformed inbound frames are dropped. The variants here are produced
/// by the one-shot query path and by configuration mistakes.
#[derive(Error, Debug)]
pub enum ReplitLinkError {
    /// HTTP transport failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// WebSocket connect or I/O failure.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// JSON (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The server responded with a non-success HTTP status.
    #[error("Server responded with status {0}")]
    ResponseStatus(u16),

    /// The server returned one or more GraphQL errors.
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// The server returned no `data` member in its JSON response.
    #[error("Server returned no data in JSON response")]
    EmptyResponse,
}
