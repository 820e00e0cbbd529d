//! Single-owner session context
//!
//! Replaces framework-managed singletons with one explicitly constructed
//! owner of all mutable session state: the durable store, the broadcaster,
//! the generation counter that serializes teardown and the redirect hook.
//! Construct one per process and hand clones (cheap `Arc` handles) to the
//! pipeline and to whatever drives the UI.
//!
//! ## Session generations
//!
//! Every established or torn-down session bumps a generation counter.
//! Requests snapshot the generation at dispatch; a 401 may tear the session
//! down only when its snapshot still matches, so N concurrent rejections
//! within one generation produce exactly one teardown and one redirect.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context as _;
use reqwest::Client;
use warden_model::{AccessToken, AuthorizationRedirect, OAuthCallback, UserRef};

use crate::config::ClientConfig;
use crate::errors::ApiResult;
use crate::session::issuer::TokenIssuer;
use crate::session::oauth::{BrokerPhase, OAuthBroker};
use crate::session::pipeline::Pipeline;
use crate::session::secret::Credentials;
use crate::session::state::{AuthStateBroadcaster, SessionState};
use crate::session::store::SessionStore;

/// Instruction to send the user back to login, preserving where they were.
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    /// Application login entry point
    pub login_path: String,
    /// Path the user should resume at after re-authenticating
    pub resume: String,
}

type RedirectHook = Box<dyn Fn(LoginRedirect) + Send + Sync>;

struct ContextInner {
    config: ClientConfig,
    http: Client,
    store: SessionStore,
    broadcaster: AuthStateBroadcaster,
    issuer: TokenIssuer,
    oauth: tokio::sync::Mutex<OAuthBroker>,
    generation: AtomicU64,
    redirect_hook: Mutex<Option<RedirectHook>>,
}

/// Owner of the session lifecycle. Clones share one underlying context.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<ContextInner>,
}

impl SessionContext {
    /// Context with the store rooted at the platform data directory.
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let store = SessionStore::new()?;
        Self::with_store(config, store)
    }

    /// Context with an explicit store, for tests and embedders.
    pub fn with_store(
        config: ClientConfig,
        store: SessionStore,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        let issuer = TokenIssuer::new(http.clone(), config.base_url.clone());
        let oauth = OAuthBroker::new(http.clone(), config.base_url.clone());

        Ok(Self {
            inner: Arc::new(ContextInner {
                config,
                http,
                store,
                broadcaster: AuthStateBroadcaster::new(),
                issuer,
                oauth: tokio::sync::Mutex::new(oauth),
                generation: AtomicU64::new(0),
                redirect_hook: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn broadcaster(&self) -> &AuthStateBroadcaster {
        &self.inner.broadcaster
    }

    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.inner.config.base_url
    }

    /// Current session generation.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Install the hook invoked when an authentication failure sends the
    /// user back to login. At most one hook; later calls replace it.
    pub fn on_login_redirect(
        &self,
        hook: impl Fn(LoginRedirect) + Send + Sync + 'static,
    ) {
        let mut slot = self
            .inner
            .redirect_hook
            .lock()
            .expect("redirect hook poisoned");
        *slot = Some(Box::new(hook));
    }

    /// Startup hydration: adopt a persisted, still-valid credential.
    /// Returns whether a session was restored.
    pub async fn restore(&self) -> bool {
        match self.inner.store.load().await {
            Some(token) => {
                log::info!("Restored persisted session");
                self.establish(token);
                true
            }
            None => false,
        }
    }

    /// First-party login: issue, persist, publish.
    pub async fn login(
        &self,
        credentials: &Credentials,
    ) -> ApiResult<AccessToken> {
        let token = self.inner.issuer.issue(credentials).await?;
        self.persist(&token).await;
        self.establish(token.clone());
        Ok(token)
    }

    /// Ask the service for the provider redirect target.
    pub async fn begin_delegated_login(
        &self,
    ) -> ApiResult<AuthorizationRedirect> {
        let mut broker = self.inner.oauth.lock().await;
        broker.begin_login().await
    }

    /// Complete a delegated login with the provider callback parameters.
    /// On success this is indistinguishable from [`SessionContext::login`].
    pub async fn login_delegated(
        &self,
        callback: OAuthCallback,
    ) -> ApiResult<AccessToken> {
        let token = {
            let mut broker = self.inner.oauth.lock().await;
            broker.complete_login(callback).await?
        };
        self.persist(&token).await;
        self.establish(token.clone());
        Ok(token)
    }

    /// Where the delegated login flow currently is.
    pub async fn delegated_phase(&self) -> BrokerPhase {
        self.inner.oauth.lock().await.phase()
    }

    /// The authenticated user, fetched lazily and cached on the session
    /// state. The fetch goes through the regular pipeline, so a rejected
    /// credential tears the session down like any other protected call.
    pub async fn identity(&self) -> ApiResult<UserRef> {
        if let Some(identity) = self.inner.broadcaster.current().identity {
            return Ok(identity);
        }

        let pipeline = Pipeline::new(self.clone());
        let user: UserRef = pipeline.get_json("/users/me").await?;

        let mut state = self.inner.broadcaster.current();
        state.identity = Some(user.clone());
        // Authenticated flag unchanged: updates the snapshot silently
        self.inner.broadcaster.publish(state);
        Ok(user)
    }

    /// Explicit logout. Goes through the same coalesced teardown path the
    /// classifier uses, without the login redirect (the user asked for it).
    pub async fn logout(&self) {
        let generation = self.generation();
        if self.teardown_once(generation, "/", false).await {
            log::info!("Logged out");
        }
    }

    /// Tear the session down if `observed` is still the current generation.
    ///
    /// The compare-and-swap on the generation counter makes this idempotent
    /// across any number of concurrent failures: exactly one caller wins,
    /// clears the store, publishes the unauthenticated state and (when
    /// `fire_redirect` is set) invokes the redirect hook.
    pub(crate) async fn teardown_once(
        &self,
        observed: u64,
        origin: &str,
        fire_redirect: bool,
    ) -> bool {
        if self
            .inner
            .generation
            .compare_exchange(
                observed,
                observed + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            log::debug!(
                "Teardown for generation {} already handled",
                observed
            );
            return false;
        }

        if let Err(e) = self.inner.store.clear().await {
            log::warn!("Failed to clear session store: {:#}", e);
        }
        self.inner.broadcaster.publish(SessionState::unauthenticated());

        if fire_redirect {
            let redirect = LoginRedirect {
                login_path: self.inner.config.login_path.clone(),
                resume: origin.to_string(),
            };
            let hook = self
                .inner
                .redirect_hook
                .lock()
                .expect("redirect hook poisoned");
            if let Some(hook) = hook.as_ref() {
                hook(redirect);
            } else {
                log::debug!(
                    "No redirect hook installed; dropping redirect to {}",
                    self.inner.config.login_path
                );
            }
        }
        true
    }

    /// Publish the authenticated state and open a new session generation.
    fn establish(&self, token: AccessToken) {
        self.inner
            .broadcaster
            .publish(SessionState::authenticated(token));
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Best-effort persistence: a session that cannot be written survives
    /// in memory for this process only.
    async fn persist(&self, token: &AccessToken) {
        if let Err(e) = self.inner.store.put(token).await {
            log::warn!(
                "Failed to persist credential; session will not survive restart: {:#}",
                e
            );
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("base_url", &self.inner.config.base_url)
            .field("generation", &self.generation())
            .field(
                "authenticated",
                &self.inner.broadcaster.current().authenticated,
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> SessionContext {
        let store = SessionStore::with_cache_path(
            dir.path().join("session_cache.json"),
        );
        SessionContext::with_store(
            ClientConfig::with_base_url("http://127.0.0.1:1"),
            store,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn concurrent_teardowns_coalesce_to_one() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        let redirects = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&redirects);
        ctx.on_login_redirect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let generation = ctx.generation();
        let first = ctx.teardown_once(generation, "/users/me", true).await;
        let second = ctx.teardown_once(generation, "/users/7", true).await;
        let third = ctx.teardown_once(generation, "/users/", true).await;

        assert!(first);
        assert!(!second);
        assert!(!third);
        assert_eq!(redirects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn redirect_preserves_the_originating_path() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        let captured = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&captured);
        ctx.on_login_redirect(move |redirect| {
            *slot.lock().unwrap() = Some(redirect);
        });

        ctx.teardown_once(ctx.generation(), "/users/me", true).await;

        let redirect = captured.lock().unwrap().clone().expect("redirect fired");
        assert_eq!(redirect.login_path, "/login");
        assert_eq!(redirect.resume, "/users/me");
    }

    #[tokio::test]
    async fn logout_does_not_fire_the_redirect_hook() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        let redirects = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&redirects);
        ctx.on_login_redirect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        ctx.logout().await;
        assert_eq!(redirects.load(Ordering::SeqCst), 0);
        assert!(!ctx.broadcaster().current().authenticated);
    }
}
