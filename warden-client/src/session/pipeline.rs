//! Explicit request pipeline
//!
//! The three stages every outbound call goes through, composed in one place
//! instead of an interception registry:
//!
//! 1. authorize — attach the credential to protected targets
//! 2. dispatch  — the only stage that touches the network, with a single
//!    retry for transient transport failures
//! 3. classify  — map the outcome onto the error taxonomy, tearing the
//!    session down centrally on a rejected credential
//!
//! The session generation is snapshotted before the authorize stage, and a
//! retry re-runs authorization, so a teardown or logout that lands between
//! dispatches is observed by the very next decoration.

use reqwest::{Method, Request, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::{ApiError, ApiResult};
use crate::session::authorizer::RequestAuthorizer;
use crate::session::classifier::FailureClassifier;
use crate::session::context::SessionContext;

/// Composed authorize/dispatch/classify stages over one session context.
#[derive(Debug, Clone)]
pub struct Pipeline {
    context: SessionContext,
    authorizer: RequestAuthorizer,
    classifier: FailureClassifier,
}

impl Pipeline {
    pub fn new(context: SessionContext) -> Self {
        let authorizer = RequestAuthorizer::new(context.broadcaster().clone());
        let classifier = FailureClassifier::new(context.clone());
        Self {
            context,
            authorizer,
            classifier,
        }
    }

    /// Build a request against the configured service.
    pub fn request(&self, method: Method, path: &str) -> ApiResult<Request> {
        let url = format!("{}{}", self.context.base_url(), path);
        self.context
            .http()
            .request(method, url)
            .build()
            .map_err(ApiError::from)
    }

    /// Run a request through all three stages.
    pub async fn send(&self, request: Request) -> ApiResult<Response> {
        let generation = self.context.generation();
        let origin = request.url().path().to_string();

        // Keep an undecorated clone so a retry re-observes the session
        let retry = request.try_clone();
        let first = self.authorizer.decorate(request);
        let mut outcome = self.context.http().execute(first).await;

        if let Err(err) = &outcome
            && is_transient(err)
        {
            match retry {
                Some(second) => {
                    log::warn!(
                        "Transient network failure for {}; retrying once: {}",
                        origin,
                        err
                    );
                    let second = self.authorizer.decorate(second);
                    outcome = self.context.http().execute(second).await;
                }
                None => {
                    log::warn!(
                        "Transient network failure for {}; body not replayable, not retrying",
                        origin
                    );
                }
            }
        }

        self.classifier.classify(outcome, &origin, generation).await
    }

    /// GET a JSON resource.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> ApiResult<T> {
        let request = self.request(Method::GET, path)?;
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(|e| {
            ApiError::Network(format!("Malformed response body: {}", e))
        })
    }

    /// POST a JSON body, parsing a JSON response.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = format!("{}{}", self.context.base_url(), path);
        let request = self
            .context
            .http()
            .post(url)
            .json(body)
            .build()
            .map_err(ApiError::from)?;
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(|e| {
            ApiError::Network(format!("Malformed response body: {}", e))
        })
    }
}

/// Transport failures worth one retry. HTTP-level outcomes never qualify;
/// `Unauthorized`, `Forbidden` and `Conflict` in particular surface
/// immediately.
fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}
