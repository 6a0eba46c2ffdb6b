//! Gateway error types.

/// Errors from fetching the upstream transit API.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid API key
    #[error("unauthorized: check MBTA_API_KEY")]
    Unauthorized,

    /// Rate limited by the API
    #[error("rate limited by transit API")]
    RateLimited,

    /// API returned a non-success status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body was not a JSON:API document
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Client could not be constructed
    #[error("invalid gateway configuration: {0}")]
    Config(String),
}

/// A single upstream record that could not be turned into a domain entity.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    /// Resource had no id
    #[error("{kind} resource has no id")]
    MissingId { kind: &'static str },

    /// Required attribute absent or null
    #[error("{kind} {id} is missing required field {field}")]
    MissingField {
        kind: &'static str,
        id: String,
        field: &'static str,
    },

    /// Attributes had an unexpected shape
    #[error("{kind} {id} has malformed attributes: {message}")]
    Malformed {
        kind: &'static str,
        id: String,
        message: String,
    },
}
