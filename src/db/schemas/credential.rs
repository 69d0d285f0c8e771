//! Credential document schema
//!
//! One document per identity. The store converts to and from
//! [`CredentialRecord`] so nothing outside `db` sees BSON.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::credentials::CredentialRecord;
use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for credentials
pub const CREDENTIAL_COLLECTION: &str = "credentials";

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CredentialDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Identity key (email or username)
    pub identifier: String,

    /// Base64 PBKDF2 derived key
    pub password_hash: String,

    /// Base64 salt
    pub password_salt: String,

    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub is_blocked: bool,

    #[serde(default)]
    pub wrong_password_count: i32,
}

fn default_true() -> bool {
    true
}

impl From<CredentialRecord> for CredentialDoc {
    fn from(record: CredentialRecord) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            identifier: record.identifier,
            password_hash: record.password_hash,
            password_salt: record.password_salt,
            roles: record.roles,
            is_active: record.is_active,
            is_blocked: record.is_blocked,
            wrong_password_count: record.wrong_password_count,
        }
    }
}

impl From<CredentialDoc> for CredentialRecord {
    fn from(doc: CredentialDoc) -> Self {
        Self {
            identifier: doc.identifier,
            password_hash: doc.password_hash,
            password_salt: doc.password_salt,
            roles: doc.roles,
            is_active: doc.is_active,
            is_blocked: doc.is_blocked,
            wrong_password_count: doc.wrong_password_count,
        }
    }
}

impl IntoIndexes for CredentialDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "identifier": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("identifier_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for CredentialDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
