//! Route classification
//!
//! Static mapping from a request target to its access class. The table must
//! stay in sync with the service's public surface: login, registration, the
//! delegated-login entry points and token refresh take no credential;
//! everything else defaults to protected (fail-closed).

use reqwest::Method;

/// Access class of an outbound request target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No credential is attached
    Public,
    /// The current credential is attached when one exists
    Protected,
}

/// Public entries as (method, path) pairs. Paths are matched exactly after
/// trailing-slash normalization, so `POST /users/` is public (registration)
/// while `GET /users/` stays protected (listing).
const PUBLIC_ROUTES: &[(&str, &str)] = &[
    ("GET", "/"),
    ("POST", "/auth/token"),
    ("POST", "/auth/refresh_token"),
    ("GET", "/auth/google/login"),
    ("GET", "/auth/google/callback"),
    ("POST", "/users"),
];

/// Classify a request target. Unknown targets are `Protected`.
pub fn classify(method: &Method, path: &str) -> Access {
    let normalized = normalize(path);
    let is_public = PUBLIC_ROUTES
        .iter()
        .any(|(m, p)| *m == method.as_str() && *p == normalized);

    if is_public {
        Access::Public
    } else {
        Access::Protected
    }
}

fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_and_delegated_entry_points_are_public() {
        assert_eq!(classify(&Method::POST, "/auth/token"), Access::Public);
        assert_eq!(
            classify(&Method::GET, "/auth/google/login"),
            Access::Public
        );
        assert_eq!(
            classify(&Method::GET, "/auth/google/callback"),
            Access::Public
        );
        assert_eq!(
            classify(&Method::POST, "/auth/refresh_token"),
            Access::Public
        );
    }

    #[test]
    fn registration_is_public_but_listing_is_not() {
        assert_eq!(classify(&Method::POST, "/users/"), Access::Public);
        assert_eq!(classify(&Method::GET, "/users/"), Access::Protected);
    }

    #[test]
    fn trailing_slash_does_not_change_classification() {
        assert_eq!(classify(&Method::POST, "/auth/token/"), Access::Public);
        assert_eq!(classify(&Method::GET, "/"), Access::Public);
    }

    #[test]
    fn unknown_targets_fail_closed() {
        assert_eq!(classify(&Method::GET, "/users/me"), Access::Protected);
        assert_eq!(classify(&Method::DELETE, "/users/7"), Access::Protected);
        assert_eq!(
            classify(&Method::GET, "/definitely/not/a/route"),
            Access::Protected
        );
    }
}
