//! User identity reference
//!
//! The user entity is owned by the service's user-management surface; the
//! session subsystem only holds a weak reference to it, fetched lazily from
//! the identity endpoint after login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Weak reference to the authenticated user.
///
/// # Fields
///
/// * `id` - Unique identifier assigned by the service
/// * `username` - Login identifier (3-50 chars, alphanumeric plus `_` and `-`)
/// * `email` - Primary email address
/// * `first_name` / `last_name` - Optional display fields
/// * `is_active` - Whether the account is active
/// * `is_verified` - Whether the email has been verified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    /// Unique user identifier
    pub id: i64,
    /// Login identifier
    pub username: String,
    /// Primary email address
    pub email: String,
    /// Optional first name
    #[serde(default)]
    pub first_name: Option<String>,
    /// Optional last name
    #[serde(default)]
    pub last_name: Option<String>,
    /// Whether the account is active
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Whether the email address has been verified
    #[serde(default)]
    pub is_verified: bool,
    /// Account creation timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last profile update timestamp
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl UserRef {
    /// Display name: full name when present, username otherwise.
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => self.username.clone(),
        }
    }
}
