//! Token wire types
//!
//! The token endpoint and the delegated-login callback both answer with the
//! same `{access_token, token_type}` body. The access token is an opaque
//! signed string from the client's point of view; the only claim the client
//! ever reads out of it is `exp`, and it does so without verifying the
//! signature (it never holds the signing key).

use serde::{Deserialize, Serialize};

/// Access credential returned after a successful login, first-party or
/// delegated. Owned by the session store once issued; every other component
/// treats it as read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Opaque signed credential presented as a bearer token
    pub access_token: String,
    /// Always `"bearer"` for this service
    pub token_type: String,
}

impl AccessToken {
    /// Value for the `Authorization` header.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Claims the client cares about when peeking inside an access token.
///
/// `exp` is optional at the type level so that a token missing the claim
/// deserializes instead of erroring; callers treat a missing `exp` as an
/// invalid credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject the credential was issued for
    pub sub: Option<String>,
    /// Expiry as a Unix timestamp
    pub exp: Option<i64>,
    /// Issued-at as a Unix timestamp
    pub iat: Option<i64>,
}

/// Response of the provider-login endpoint: where to send the user, plus a
/// human-readable hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRedirect {
    /// Provider URL the user agent should be redirected to
    pub authorization_url: String,
    /// Display message accompanying the redirect
    pub message: String,
}

/// Raw query parameters of the provider callback.
///
/// A present `code` is single-use; the broker records consumed codes and
/// refuses replay. `state` echoes the anti-forgery value handed out when the
/// login began, when the provider round-trips one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuthCallback {
    /// Authorization code to exchange for an access token
    pub code: Option<String>,
    /// Error reported by the provider (e.g. `access_denied`)
    pub error: Option<String>,
    /// Echoed anti-forgery state
    pub state: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_deserializes_from_wire_shape() {
        let raw = r#"{"access_token": "abc.def.ghi", "token_type": "bearer"}"#;
        let token: AccessToken =
            serde_json::from_str(raw).expect("token deserializes");
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.bearer_header(), "Bearer abc.def.ghi");
    }

    #[test]
    fn callback_tolerates_missing_fields() {
        let cb: OAuthCallback =
            serde_json::from_str(r#"{"error": "access_denied"}"#).unwrap();
        assert!(cb.code.is_none());
        assert_eq!(cb.error.as_deref(), Some("access_denied"));
    }
}
