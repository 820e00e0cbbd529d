use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret string that automatically zeros memory on drop
///
/// Holds the password side of first-party credentials. The memory is zeroed
/// when the value is dropped so the secret does not linger after the
/// issuance call it was created for.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    data: String,
}

impl SecretString {
    /// Create a new SecretString from an owned string
    pub fn new(data: String) -> Self {
        Self { data }
    }

    /// Get a reference to the secret as a string slice
    ///
    /// # Security Note
    /// The returned reference points at memory that will be zeroed on drop;
    /// do not store it beyond the lifetime of the SecretString.
    pub fn as_str(&self) -> &str {
        &self.data
    }

    /// Length of the secret in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the secret is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}

impl From<String> for SecretString {
    fn from(data: String) -> Self {
        Self::new(data)
    }
}

impl From<&str> for SecretString {
    fn from(data: &str) -> Self {
        Self::new(data.to_string())
    }
}

impl fmt::Debug for SecretString {
    /// Debug implementation that does not expose the secret
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretString")
            .field("len", &self.len())
            .field("data", &"[REDACTED]")
            .finish()
    }
}

/// First-party login credentials
///
/// Exists only for the duration of an issuance call; never persisted and
/// never serialized.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Username or email the account is registered under
    pub identifier: String,
    /// The account secret
    pub secret: SecretString,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<SecretString>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    /// Both fields non-empty; checked before any network traffic.
    pub fn is_complete(&self) -> bool {
        !self.identifier.trim().is_empty() && !self.secret.is_empty()
    }
}
