use thiserror::Error;

/// Failures of the chat-completion transport. Never surfaced past the oracle client:
/// every variant is absorbed by the fallback answer policy.
#[derive(Debug, Error, Clone)]
pub enum OracleError {
    #[error("oracle is not configured (no API key)")]
    Unconfigured,

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("oracle request failed: {0}")]
    Transport(String),

    #[error("oracle rate limited: {0}")]
    RateLimited(String),

    #[error("oracle returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("oracle response invalid: {0}")]
    InvalidResponse(String),

    #[error("oracle response missing content")]
    MissingContent,
}

impl OracleError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, OracleError::RateLimited(_))
    }
}

/// Failures loading the local profile record. A missing file is not an error.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile: {0}")]
    Io(#[from] std::io::Error),

    #[error("profile is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("profile must be a JSON object of field name to value")]
    NotAnObject,
}
