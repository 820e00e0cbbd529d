//! Delegated login broker
//!
//! Drives the authorization-code flow against the service's delegated-login
//! endpoints. The broker never contacts the identity provider itself: it
//! asks the service for the provider redirect target, and later hands the
//! callback's one-time code back to the service for the actual exchange.
//!
//! The flow is an explicit phase machine:
//!
//! ```text
//! Idle -> AwaitingProviderRedirect -> AwaitingCallback -> Exchanging
//!      -> Authenticated | Failed
//! ```
//!
//! Once a callback has been received there is no mid-flight cancellation;
//! `complete_login` runs to a terminal phase. Every authorization code is
//! single-use: a code that has entered an exchange once is refused on
//! replay, without touching the network.

use std::collections::HashSet;

use reqwest::{Client, StatusCode};
use warden_model::{AccessToken, AuthorizationRedirect, OAuthCallback};

use crate::errors::ApiError;
use crate::session::classifier::error_from_response;

/// Where the broker is in the delegated login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrokerPhase {
    #[default]
    Idle,
    /// Asking the service for the provider redirect target
    AwaitingProviderRedirect,
    /// Redirect handed to the caller; waiting for the callback
    AwaitingCallback,
    /// Code received, exchange in flight
    Exchanging,
    /// Terminal: exchange succeeded
    Authenticated,
    /// Terminal: exchange failed
    Failed,
}

/// Client of the delegated-login endpoints.
#[derive(Debug)]
pub struct OAuthBroker {
    http: Client,
    base_url: String,
    phase: BrokerPhase,
    /// Codes that have entered an exchange; refused on replay
    consumed_codes: HashSet<String>,
}

impl OAuthBroker {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            phase: BrokerPhase::Idle,
            consumed_codes: HashSet::new(),
        }
    }

    /// Current phase of the flow.
    pub fn phase(&self) -> BrokerPhase {
        self.phase
    }

    /// Ask the service where to send the user. Restarts the flow from any
    /// phase, including the terminal ones.
    pub async fn begin_login(
        &mut self,
    ) -> Result<AuthorizationRedirect, ApiError> {
        self.phase = BrokerPhase::AwaitingProviderRedirect;

        let url = format!("{}/auth/google/login", self.base_url);
        let response = self.http.get(&url).send().await.map_err(|e| {
            self.phase = BrokerPhase::Idle;
            log::warn!("Provider-login endpoint unreachable: {}", e);
            if e.is_connect() || e.is_timeout() {
                ApiError::ServiceUnavailable
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        if response.status() != StatusCode::OK {
            self.phase = BrokerPhase::Idle;
            return Err(error_from_response(response).await);
        }

        let redirect =
            response.json::<AuthorizationRedirect>().await.map_err(|e| {
                self.phase = BrokerPhase::Idle;
                ApiError::Network(format!(
                    "Malformed provider-login response: {}",
                    e
                ))
            })?;

        self.phase = BrokerPhase::AwaitingCallback;
        log::info!("Delegated login started; awaiting provider callback");
        Ok(redirect)
    }

    /// Complete the flow with the provider callback's query parameters.
    ///
    /// From the caller's point of view a success is indistinguishable from
    /// `TokenIssuer::issue`: an access credential comes back and the caller
    /// persists and publishes it.
    pub async fn complete_login(
        &mut self,
        callback: OAuthCallback,
    ) -> Result<AccessToken, ApiError> {
        if let Some(error) = callback.error {
            self.phase = BrokerPhase::Idle;
            log::warn!("Provider reported an error: {}", error);
            return Err(ApiError::ProviderError(error));
        }

        let Some(code) = callback.code else {
            self.phase = BrokerPhase::Idle;
            log::warn!("Callback arrived without an authorization code");
            return Err(ApiError::MissingCode);
        };

        if self.consumed_codes.contains(&code) {
            // Replay: refused locally, no network call, no state change
            log::warn!("Refusing replay of an already-consumed code");
            return Err(ApiError::ExchangeFailed);
        }
        self.consumed_codes.insert(code.clone());

        self.phase = BrokerPhase::Exchanging;
        match self.exchange(&code, callback.state.as_deref()).await {
            Ok(token) => {
                self.phase = BrokerPhase::Authenticated;
                log::info!("Delegated login completed");
                Ok(token)
            }
            Err(cause) => {
                self.phase = BrokerPhase::Failed;
                log::warn!("Code exchange failed: {}", cause);
                Err(ApiError::ExchangeFailed)
            }
        }
    }

    /// Hand the one-time code to the service's callback endpoint.
    async fn exchange(
        &self,
        code: &str,
        state: Option<&str>,
    ) -> Result<AccessToken, ApiError> {
        let url = format!("{}/auth/google/callback", self.base_url);
        let mut query: Vec<(&str, &str)> = vec![("code", code)];
        if let Some(state) = state {
            query.push(("state", state));
        }

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(error_from_response(response).await);
        }

        response.json::<AccessToken>().await.map_err(|e| {
            ApiError::Network(format!("Malformed exchange response: {}", e))
        })
    }
}
