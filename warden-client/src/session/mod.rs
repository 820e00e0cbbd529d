//! Session domain
//!
//! Everything that proves, stores, attaches and revokes identity: the token
//! issuer and the delegated-login broker on the way in, the durable store
//! and the state broadcaster in the middle, the request authorizer and the
//! failure classifier on every outbound call. The [`context::SessionContext`]
//! ties the pieces together as the single owner of mutable session state.

pub mod authorizer;
pub mod classifier;
pub mod context;
pub mod issuer;
pub mod oauth;
pub mod pipeline;
pub mod secret;
pub mod state;
pub mod store;

pub use authorizer::RequestAuthorizer;
pub use classifier::FailureClassifier;
pub use context::{LoginRedirect, SessionContext};
pub use issuer::TokenIssuer;
pub use oauth::{BrokerPhase, OAuthBroker};
pub use pipeline::Pipeline;
pub use secret::{Credentials, SecretString};
pub use state::{AuthStateBroadcaster, SessionState, Subscription};
pub use store::SessionStore;
