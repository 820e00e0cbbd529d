//! Per-request authorization decoration
//!
//! The authorize stage of the pipeline. Looks the request target up in the
//! route classification and attaches the current credential to protected
//! targets. A protected request with no usable credential still goes out
//! bare: the failure is handled centrally on the response side instead of
//! being short-circuited here.

use reqwest::Request;
use reqwest::header::{AUTHORIZATION, HeaderValue};

use crate::routes::{Access, classify};
use crate::session::state::AuthStateBroadcaster;
use crate::session::store::SessionStore;

/// Per-request decision point: attach the credential or leave the request
/// alone. Reads session state, never writes it.
#[derive(Debug, Clone)]
pub struct RequestAuthorizer {
    broadcaster: AuthStateBroadcaster,
}

impl RequestAuthorizer {
    pub fn new(broadcaster: AuthStateBroadcaster) -> Self {
        Self { broadcaster }
    }

    /// Decorate an outbound request according to its route classification.
    ///
    /// Protected targets get exactly one `Authorization` header (insert
    /// semantics, replacing any caller-supplied value); public targets are
    /// returned untouched regardless of session state.
    pub fn decorate(&self, mut request: Request) -> Request {
        if classify(request.method(), request.url().path()) == Access::Public {
            return request;
        }

        let state = self.broadcaster.current();
        let Some(token) = state.token else {
            log::debug!(
                "No credential for protected target {}; sending bare",
                request.url().path()
            );
            return request;
        };

        if !SessionStore::is_valid(&token.access_token) {
            log::debug!(
                "Stored credential no longer valid; sending {} bare",
                request.url().path()
            );
            return request;
        }

        match HeaderValue::from_str(&token.bearer_header()) {
            Ok(value) => {
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(e) => {
                log::warn!("Credential not representable as a header: {}", e);
            }
        }
        request
    }
}
