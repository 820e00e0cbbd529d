//! First-party credential issuance
//!
//! Exchanges an identifier/secret pair for a signed access credential at the
//! token endpoint. The secret travels only in a form-encoded request body,
//! never in a URL, and nothing is persisted here: storing the credential is
//! the caller's job, done through the session store.

use reqwest::{Client, StatusCode};
use warden_model::AccessToken;

use crate::errors::ApiError;
use crate::session::classifier::error_from_response;
use crate::session::secret::Credentials;

/// Client of the token endpoint.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    http: Client,
    base_url: String,
}

impl TokenIssuer {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Exchange credentials for an access credential.
    ///
    /// Fails with `InvalidCredentials` before any network traffic when a
    /// field is empty, and leaves no partial state behind on any failure.
    pub async fn issue(
        &self,
        credentials: &Credentials,
    ) -> Result<AccessToken, ApiError> {
        if !credentials.is_complete() {
            log::debug!("Refusing issuance with incomplete credentials");
            return Err(ApiError::InvalidCredentials);
        }

        let url = format!("{}/auth/token", self.base_url);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("username", credentials.identifier.as_str()),
                ("password", credentials.secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                log::warn!("Token endpoint unreachable: {}", e);
                if e.is_connect() || e.is_timeout() {
                    ApiError::ServiceUnavailable
                } else {
                    ApiError::Network(e.to_string())
                }
            })?;

        match response.status() {
            StatusCode::OK => {
                response.json::<AccessToken>().await.map_err(|e| {
                    log::warn!("Malformed token response: {}", e);
                    ApiError::Network(format!("Malformed token response: {}", e))
                })
            }
            StatusCode::UNAUTHORIZED => {
                log::info!(
                    "Token endpoint rejected credentials for {}",
                    credentials.identifier
                );
                Err(ApiError::InvalidCredentials)
            }
            _ => Err(error_from_response(response).await),
        }
    }
}
