//! Client-side authentication and session lifecycle for the Warden identity
//! service.
//!
//! The crate is organized around one explicitly constructed
//! [`SessionContext`] that owns the durable credential store, the
//! authoritative session state and the teardown bookkeeping. Outbound calls
//! flow through an explicit three-stage [`Pipeline`]:
//!
//! ```text
//! authorize -> dispatch -> classify
//! ```
//!
//! `authorize` attaches the current credential to protected routes,
//! `dispatch` is the only stage that touches the network, and `classify`
//! maps the outcome onto the closed [`ApiError`] taxonomy, tearing the
//! session down exactly once when the service rejects the credential.
//!
//! There is no ambient global state: callers construct a context, compose a
//! pipeline from it, and invoke the stages through `Pipeline::send`.

pub mod config;
pub mod errors;
pub mod routes;
pub mod session;

// Re-export commonly used types
pub use config::ClientConfig;
pub use errors::{ApiError, ApiResult};
pub use routes::Access;
pub use session::authorizer::RequestAuthorizer;
pub use session::classifier::FailureClassifier;
pub use session::context::{LoginRedirect, SessionContext};
pub use session::issuer::TokenIssuer;
pub use session::oauth::{BrokerPhase, OAuthBroker};
pub use session::pipeline::Pipeline;
pub use session::secret::{Credentials, SecretString};
pub use session::state::{AuthStateBroadcaster, SessionState, Subscription};
pub use session::store::SessionStore;
