//! Response classification and centralized authentication failure handling
//!
//! Every pipeline response funnels through [`FailureClassifier::classify`],
//! which maps transport and HTTP outcomes onto the closed [`ApiError`]
//! taxonomy. An `Unauthorized` outcome additionally tears the session down,
//! but at most once per session generation: when N in-flight requests all
//! come back 401, one of them wins the generation race and performs the
//! teardown and redirect, the rest surface a plain error.

use reqwest::{Response, StatusCode};
use warden_model::ValidationPayload;

use crate::errors::ApiError;
use crate::session::context::SessionContext;

/// Per-response decision point of the pipeline.
#[derive(Debug, Clone)]
pub struct FailureClassifier {
    context: SessionContext,
}

impl FailureClassifier {
    pub fn new(context: SessionContext) -> Self {
        Self { context }
    }

    /// Classify a dispatch outcome.
    ///
    /// `origin` is the path of the originating request, preserved through
    /// the login redirect so the user can resume where they were.
    /// `generation` is the session generation observed when the request was
    /// dispatched; it decides which of several concurrent 401s performs the
    /// teardown.
    pub async fn classify(
        &self,
        outcome: Result<Response, reqwest::Error>,
        origin: &str,
        generation: u64,
    ) -> Result<Response, ApiError> {
        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Transport failure for {}: {}", origin, e);
                return Err(ApiError::Network(e.to_string()));
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            let fired = self
                .context
                .teardown_once(generation, origin, true)
                .await;
            if fired {
                log::info!(
                    "Credential rejected for {}; session torn down",
                    origin
                );
            }
            return Err(ApiError::Unauthorized);
        }

        Err(error_from_response(response).await)
    }
}

/// Map a non-success, non-401 response onto the error taxonomy.
///
/// Shared by the issuer and the broker, which layer their own meaning on
/// top (a 401 at the token endpoint is `InvalidCredentials`, any exchange
/// failure is `ExchangeFailed`).
pub(crate) async fn error_from_response(response: Response) -> ApiError {
    let status = response.status();
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Forbidden,
        StatusCode::CONFLICT => {
            ApiError::Conflict(detail_message(response).await)
        }
        StatusCode::UNPROCESSABLE_ENTITY => {
            ApiError::Validation(validation_detail(response).await)
        }
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited {
            retry_after: retry_after_seconds(&response),
        },
        _ if status.is_server_error() => ApiError::ServiceUnavailable,
        _ => ApiError::Network(format!("Unexpected status {}", status)),
    }
}

/// Seconds from a `Retry-After` header, when present and numeric.
fn retry_after_seconds(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// The service's `{"detail": "..."}` message, or a generic fallback.
async fn detail_message(response: Response) -> String {
    #[derive(serde::Deserialize)]
    struct Detail {
        detail: String,
    }

    match response.json::<Detail>().await {
        Ok(body) => body.detail,
        Err(_) => "Conflict with existing state".to_string(),
    }
}

/// Per-field violations from a 422 body. A body that does not follow the
/// documented shape still yields one violation carrying the raw text, so
/// the failure is never silently flattened away.
async fn validation_detail(
    response: Response,
) -> Vec<warden_model::FieldViolation> {
    let raw = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ValidationPayload>(&raw) {
        Ok(payload) => payload.violations(),
        Err(_) => vec![warden_model::FieldViolation {
            field: "request".to_string(),
            message: if raw.is_empty() {
                "Validation failed".to_string()
            } else {
                raw
            },
        }],
    }
}
