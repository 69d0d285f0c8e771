//! Credential records and the stores that hold them
//!
//! The persistence layer is a collaborator behind [`CredentialStore`]. Every
//! backend normalizes to the single [`CredentialRecord`] shape.

pub mod memory;
pub mod service;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::HashedPassword;
use crate::types::Result;

pub use memory::MemoryCredentialStore;
pub use service::{Authenticator, LoginSuccess};

/// Stored credentials for one identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Identity key (email or username)
    pub identifier: String,
    /// Base64 PBKDF2 derived key
    pub password_hash: String,
    /// Base64 salt
    pub password_salt: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub is_active: bool,
    pub is_blocked: bool,
    pub wrong_password_count: i32,
}

impl CredentialRecord {
    /// A fresh, active record
    pub fn new(identifier: impl Into<String>, hashed: HashedPassword, roles: Vec<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password_hash: hashed.hash,
            password_salt: hashed.salt,
            roles,
            is_active: true,
            is_blocked: false,
            wrong_password_count: 0,
        }
    }

    /// Whether the account may sign in
    pub fn can_sign_in(&self) -> bool {
        self.is_active && !self.is_blocked
    }
}

/// Lookup and mutation of credential records
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch the record for an identifier
    async fn find(&self, identifier: &str) -> Result<Option<CredentialRecord>>;

    /// Insert a new record; fails with `Conflict` if the identifier exists
    async fn insert(&self, record: CredentialRecord) -> Result<()>;

    /// Increment the wrong-password counter
    async fn record_failed_attempt(&self, identifier: &str) -> Result<()>;

    /// Reset the wrong-password counter to zero
    async fn reset_failed_attempts(&self, identifier: &str) -> Result<()>;

    /// Replace hash and salt together
    async fn update_password(&self, identifier: &str, hashed: &HashedPassword) -> Result<()>;

    /// Block or unblock an account
    async fn set_blocked(&self, identifier: &str, blocked: bool) -> Result<()>;
}
