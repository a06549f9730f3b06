use crate::types::OutcomeStatus;

#[derive(Debug, thiserror::Error)]
pub enum SupplierError {
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl SupplierError {
    /// Classify this error into the per-supplier outcome taxonomy.
    ///
    /// Individually malformed records are dropped during parsing and never
    /// reach here; `MalformedResponse` means the whole body was unusable,
    /// which is reported as a transport failure.
    pub fn status(&self) -> OutcomeStatus {
        match self {
            SupplierError::Authentication(_) => OutcomeStatus::Unauthorized,
            SupplierError::RateLimited(_) => OutcomeStatus::RateLimited,
            SupplierError::HttpRequest(e) if e.is_timeout() => OutcomeStatus::TimedOut,
            SupplierError::HttpRequest(_)
            | SupplierError::SerdeJson(_)
            | SupplierError::MalformedResponse(_)
            | SupplierError::InvalidInput(_)
            | SupplierError::Other(_) => OutcomeStatus::TransportError,
        }
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            SupplierError::Authentication(_) => "auth_failed",
            SupplierError::RateLimited(_) => "rate_limited",
            SupplierError::MalformedResponse(_) => "malformed_response",
            SupplierError::InvalidInput(_) => "invalid_input",
            SupplierError::HttpRequest(_) => "upstream_error",
            SupplierError::SerdeJson(_) => "parse_error",
            SupplierError::Other(_) => "internal_error",
        }
    }
}
