//! Core data model definitions shared across Warden crates.
//!
//! Everything in this crate is a plain serde type mirroring the identity
//! service's wire contracts. No I/O, no state; the stateful pieces live in
//! `warden-client`.

pub mod token;
pub mod user;
pub mod validation;

// Intentionally curated re-exports for downstream consumers.
pub use token::{AccessToken, AuthorizationRedirect, Claims, OAuthCallback};
pub use user::UserRef;
pub use validation::{FieldViolation, ValidationPayload};
