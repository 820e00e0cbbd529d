//! Durable local storage for the current access credential
//!
//! One key, one file: the platform data directory holds a single JSON
//! document with the current credential. Absence of the file means
//! unauthenticated. Expiry is computed locally from the token's `exp` claim
//! without contacting any service.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use warden_model::{AccessToken, Claims};

pub(crate) const SESSION_CACHE_FILE: &str = "session_cache.json";

/// Tokens with less than this many seconds remaining are treated as expired,
/// so a credential cannot expire in the gap between the validity check and
/// the request that carries it.
const TOKEN_EXPIRY_BUFFER_SECONDS: i64 = 60;

/// Persisted session data with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    token: AccessToken,
    /// When this credential was stored
    stored_at: DateTime<Utc>,
    /// Version for future compatibility
    version: u32,
}

/// File-backed single-key store for the current access credential
#[derive(Debug)]
pub struct SessionStore {
    /// Path to the cache file
    cache_path: PathBuf,
}

impl SessionStore {
    /// Create a store rooted at the platform data directory.
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("", "warden", "warden-client")
            .ok_or_else(|| {
                anyhow::anyhow!("Unable to determine data directory")
            })?;

        Ok(Self {
            cache_path: proj_dirs.data_dir().join(SESSION_CACHE_FILE),
        })
    }

    /// Store rooted at an explicit path, for tests and embedders.
    pub fn with_cache_path(cache_path: PathBuf) -> Self {
        Self { cache_path }
    }

    /// Path of the backing file.
    pub fn cache_path(&self) -> &PathBuf {
        &self.cache_path
    }

    /// Persist a credential, overwriting any existing one.
    pub async fn put(&self, token: &AccessToken) -> Result<()> {
        let stored = StoredSession {
            token: token.clone(),
            stored_at: Utc::now(),
            version: 1,
        };

        let json = serde_json::to_string_pretty(&stored)
            .context("Failed to serialize session data")?;

        if let Some(parent) = self.cache_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create session directory")?;
        }

        tokio::fs::write(&self.cache_path, json)
            .await
            .context("Failed to write session cache")?;

        log::info!("Saved session credential to {:?}", self.cache_path);
        Ok(())
    }

    /// Read the persisted credential, if any. A corrupt cache file is
    /// reported as absent rather than as an error.
    pub async fn get(&self) -> Option<AccessToken> {
        if !self.cache_path.exists() {
            log::debug!("No session cache at {:?}", self.cache_path);
            return None;
        }

        let json = match tokio::fs::read_to_string(&self.cache_path).await {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to read session cache: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<StoredSession>(&json) {
            Ok(stored) => Some(stored.token),
            Err(e) => {
                log::warn!("Corrupt session cache, ignoring: {}", e);
                None
            }
        }
    }

    /// Remove the persisted credential. Safe to call when nothing is stored.
    pub async fn clear(&self) -> Result<()> {
        if self.cache_path.exists() {
            tokio::fs::remove_file(&self.cache_path)
                .await
                .context("Failed to remove session cache")?;
            log::info!("Cleared session cache");
        }
        Ok(())
    }

    /// Whether a cache file exists at all (valid or not).
    pub fn has_cached_session(&self) -> bool {
        self.cache_path.exists()
    }

    /// Startup hydration: return the persisted credential only when it is
    /// still valid. A stale or malformed cache file is cleared so the next
    /// start does not trip over it again.
    pub async fn load(&self) -> Option<AccessToken> {
        let token = self.get().await?;
        if Self::is_valid(&token.access_token) {
            return Some(token);
        }

        log::info!("Persisted credential expired or malformed; clearing");
        if let Err(e) = self.clear().await {
            log::warn!("Failed to clear stale session cache: {}", e);
        }
        None
    }

    /// Whether a credential string is still usable.
    ///
    /// Pure function of the credential and the wall clock; never mutates
    /// stored state and never panics. The `exp` claim is read with signature
    /// validation disabled (the client never holds the signing key) and
    /// anything that cannot be decoded is invalid.
    pub fn is_valid(credential: &str) -> bool {
        let parts: Vec<&str> = credential.split('.').collect();
        if parts.len() != 3 {
            log::debug!(
                "Credential is not JWT-shaped ({} segments), treating as invalid",
                parts.len()
            );
            return false;
        }

        if let Err(e) = decode_header(credential) {
            log::debug!("Undecodable credential header: {}", e);
            return false;
        }

        // Expiry is read manually below so a decode failure and a missing
        // claim land on the same fail-closed path.
        let mut validation = Validation::new(Algorithm::default());
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = match decode::<Claims>(
            credential,
            &DecodingKey::from_secret(b"dummy"),
            &validation,
        ) {
            Ok(data) => data.claims,
            Err(e) => {
                log::debug!("Undecodable credential payload: {}", e);
                return false;
            }
        };

        match claims.exp {
            Some(exp) => {
                let now = Utc::now().timestamp();
                let expired = now >= exp - TOKEN_EXPIRY_BUFFER_SECONDS;
                if expired {
                    log::debug!(
                        "Credential expired: {} seconds past cutoff",
                        now - (exp - TOKEN_EXPIRY_BUFFER_SECONDS)
                    );
                }
                !expired
            }
            None => {
                log::debug!("Credential has no expiry claim, treating as invalid");
                false
            }
        }
    }
}
