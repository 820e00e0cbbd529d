//! Authoritative session state and its broadcaster
//!
//! One `SessionState` instance per process, held by the broadcaster and
//! mutated only through [`AuthStateBroadcaster::publish`]. Propagation is an
//! explicit publish/subscribe registry rather than a reactive stream:
//! observers are plain callbacks invoked synchronously on every
//! authentication transition, in registration order.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use warden_model::{AccessToken, UserRef};

/// Snapshot of "who is logged in".
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Whether a credential is currently established
    pub authenticated: bool,
    /// The current access credential, when authenticated
    pub token: Option<AccessToken>,
    /// Weak reference to the user, fetched lazily after login
    pub identity: Option<UserRef>,
}

impl SessionState {
    /// State after a successful login, before the identity fetch.
    pub fn authenticated(token: AccessToken) -> Self {
        Self {
            authenticated: true,
            token: Some(token),
            identity: None,
        }
    }

    /// State after teardown or before any login.
    pub fn unauthenticated() -> Self {
        Self::default()
    }
}

type Observer = Arc<dyn Fn(&SessionState) + Send + Sync>;

struct Registry {
    state: SessionState,
    observers: Vec<(u64, Observer)>,
    next_id: u64,
}

/// Single source of truth for the session state.
///
/// `publish` replaces the held state unconditionally but notifies observers
/// only when the `authenticated` flag actually flips, so a login is observed
/// exactly once and a teardown is never skipped, while identity refreshes
/// update the snapshot silently.
#[derive(Clone)]
pub struct AuthStateBroadcaster {
    inner: Arc<Mutex<Registry>>,
}

impl AuthStateBroadcaster {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                state: SessionState::unauthenticated(),
                observers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Synchronous snapshot of the current state.
    pub fn current(&self) -> SessionState {
        self.inner.lock().expect("state registry poisoned").state.clone()
    }

    /// Register an observer. Delivery order is registration order; the
    /// returned handle removes the observer again.
    pub fn subscribe(
        &self,
        observer: impl Fn(&SessionState) + Send + Sync + 'static,
    ) -> Subscription {
        let mut registry = self.inner.lock().expect("state registry poisoned");
        let id = registry.next_id;
        registry.next_id += 1;
        registry.observers.push((id, Arc::new(observer)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Replace the held state, notifying observers on authentication
    /// transitions.
    pub fn publish(&self, next: SessionState) {
        let (snapshot, observers) = {
            let mut registry =
                self.inner.lock().expect("state registry poisoned");
            let flipped = registry.state.authenticated != next.authenticated;
            registry.state = next;
            if !flipped {
                return;
            }

            // Invoke outside the lock so observers may read or publish
            let observers: Vec<Observer> = registry
                .observers
                .iter()
                .map(|(_, observer)| Arc::clone(observer))
                .collect();
            (registry.state.clone(), observers)
        };

        log::info!(
            "Session state transition: authenticated={}",
            snapshot.authenticated
        );
        for observer in observers {
            observer(&snapshot);
        }
    }
}

impl Default for AuthStateBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AuthStateBroadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.lock().expect("state registry poisoned");
        f.debug_struct("AuthStateBroadcaster")
            .field("authenticated", &registry.state.authenticated)
            .field("observers", &registry.observers.len())
            .finish()
    }
}

/// Handle returned by [`AuthStateBroadcaster::subscribe`].
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Remove the observer this handle was created for.
    pub fn unsubscribe(self) {
        if let Some(inner) = self.registry.upgrade() {
            let mut registry = inner.lock().expect("state registry poisoned");
            registry.observers.retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
