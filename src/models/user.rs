//! User model

use serde::{Deserialize, Serialize};

/// A user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Database ID (UUID string, issued at registration)
    pub id: String,
    /// Username
    pub username: String,
    /// Password hash (not serialized to JSON)
    #[serde(skip_serializing)]
    pub password: String,
    /// Unix timestamp of the last successful upload, if any.
    /// Stamped inside the upload transaction, never rolled back.
    #[serde(default)]
    pub last_upload: Option<i64>,
    /// Unix timestamp of the last successful vote, if any.
    /// Stamped inside the vote transaction, never rolled back.
    #[serde(default)]
    pub last_voted: Option<i64>,
}

impl User {
    /// Create a new user with a fresh UUID
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            password: password_hash,
            last_upload: None,
            last_voted: None,
        }
    }

    /// Serialize without password (for API responses)
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
        }
    }
}

/// Public user info (no password, no cooldown stamps)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
}

/// An authentication session.
///
/// Sessions are opaque random tokens mapped to a user and an expiry. The
/// voting/upload/board paths only ever read them; rows are created on login
/// and deleted on logout.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque session token
    pub id: String,
    /// Owning user
    pub userid: String,
    /// Unix timestamp after which the session is invalid
    pub expires_at: i64,
}

impl Session {
    /// Check whether the session is still valid at `now`
    pub fn is_valid(&self, now: i64) -> bool {
        now < self.expires_at
    }
}
