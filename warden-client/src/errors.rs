//! Error taxonomy for authentication and session operations
//!
//! The taxonomy is closed: every transport or HTTP outcome the subsystem can
//! observe maps onto exactly one of these kinds. Nothing here is fatal to
//! the process; network-class failures are retried once by the pipeline and
//! everything else is returned to the caller as a typed failure.

use thiserror::Error;
use warden_model::FieldViolation;

/// Main error type for the authentication subsystem
#[derive(Debug, Error)]
pub enum ApiError {
    /// The token endpoint rejected the supplied identifier/secret
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The delegated-login callback arrived without an authorization code
    #[error("Callback arrived without an authorization code")]
    MissingCode,

    /// The identity provider reported an error parameter on the callback
    #[error("Identity provider reported an error: {0}")]
    ProviderError(String),

    /// The code-for-token exchange failed or the code was already consumed
    #[error("Authorization code exchange failed")]
    ExchangeFailed,

    /// The service rejected the current credential; handled centrally by
    /// session teardown, surfaced to the call site only as this kind
    #[error("Authentication required")]
    Unauthorized,

    /// Authenticated but not allowed
    #[error("Access denied")]
    Forbidden,

    /// The request conflicts with existing state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request validation failed; carries per-field detail
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    /// The caller is being throttled
    #[error("Rate limited")]
    RateLimited {
        /// Seconds to wait before retrying, when the service says
        retry_after: Option<u64>,
    },

    /// The service answered with a server-side failure
    #[error("Service unavailable")]
    ServiceUnavailable,

    /// Transport-level failure before any HTTP status was observed
    #[error("Network error: {0}")]
    Network(String),
}

impl ApiError {
    /// Whether the pipeline may retry the request that produced this error.
    ///
    /// Only transport-level failures qualify; `Unauthorized`, `Forbidden`
    /// and `Conflict` in particular are never retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    /// Field-level detail for validation failures, empty otherwise.
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            ApiError::Validation(violations) => violations,
            _ => &[],
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

/// Result type alias for authentication operations
pub type ApiResult<T> = Result<T, ApiError>;
