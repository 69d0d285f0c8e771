//! In-memory credential store for dev mode and tests

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};

use crate::auth::HashedPassword;
use crate::credentials::{CredentialRecord, CredentialStore};
use crate::types::{GatehouseError, Result};

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: DashMap<String, CredentialRecord>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn update<F>(&self, identifier: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut CredentialRecord),
    {
        match self.records.get_mut(identifier) {
            Some(mut record) => {
                f(record.value_mut());
                Ok(())
            }
            None => Err(GatehouseError::CredentialNotFound(identifier.to_string())),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find(&self, identifier: &str) -> Result<Option<CredentialRecord>> {
        Ok(self.records.get(identifier).map(|r| r.value().clone()))
    }

    async fn insert(&self, record: CredentialRecord) -> Result<()> {
        match self.records.entry(record.identifier.clone()) {
            Entry::Occupied(_) => Err(GatehouseError::Conflict(format!(
                "Identifier already registered: {}",
                record.identifier
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn record_failed_attempt(&self, identifier: &str) -> Result<()> {
        self.update(identifier, |r| {
            r.wrong_password_count = r.wrong_password_count.saturating_add(1)
        })
    }

    async fn reset_failed_attempts(&self, identifier: &str) -> Result<()> {
        self.update(identifier, |r| r.wrong_password_count = 0)
    }

    async fn update_password(&self, identifier: &str, hashed: &HashedPassword) -> Result<()> {
        self.update(identifier, |r| {
            r.password_hash = hashed.hash.clone();
            r.password_salt = hashed.salt.clone();
        })
    }

    async fn set_blocked(&self, identifier: &str, blocked: bool) -> Result<()> {
        self.update(identifier, |r| r.is_blocked = blocked)
    }
}
