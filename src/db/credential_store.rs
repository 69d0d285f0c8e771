//! MongoDB-backed [`CredentialStore`]

use async_trait::async_trait;
use bson::{doc, DateTime, Document};

use crate::auth::HashedPassword;
use crate::credentials::{CredentialRecord, CredentialStore};
use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{CredentialDoc, CREDENTIAL_COLLECTION};
use crate::types::{GatehouseError, Result};

pub struct MongoCredentialStore {
    collection: MongoCollection<CredentialDoc>,
}

impl MongoCredentialStore {
    /// Open the credentials collection, creating its unique index
    pub async fn new(client: &MongoClient) -> Result<Self> {
        let collection = client.collection::<CredentialDoc>(CREDENTIAL_COLLECTION).await?;
        Ok(Self { collection })
    }

    async fn update(&self, identifier: &str, set: Document, inc: Option<Document>) -> Result<()> {
        let mut set = set;
        set.insert("metadata.updated_at", DateTime::now());

        let mut update = doc! { "$set": set };
        if let Some(inc) = inc {
            update.insert("$inc", inc);
        }

        let result = self
            .collection
            .update_one(doc! { "identifier": identifier }, update)
            .await?;

        if result.matched_count == 0 {
            return Err(GatehouseError::CredentialNotFound(identifier.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MongoCredentialStore {
    async fn find(&self, identifier: &str) -> Result<Option<CredentialRecord>> {
        let doc = self
            .collection
            .find_one(doc! { "identifier": identifier })
            .await?;
        Ok(doc.map(CredentialRecord::from))
    }

    async fn insert(&self, record: CredentialRecord) -> Result<()> {
        let identifier = record.identifier.clone();
        match self.collection.insert_one(CredentialDoc::from(record)).await {
            Ok(_) => Ok(()),
            Err(GatehouseError::Conflict(_)) => Err(GatehouseError::Conflict(format!(
                "Identifier already registered: {}",
                identifier
            ))),
            Err(e) => Err(e),
        }
    }

    async fn record_failed_attempt(&self, identifier: &str) -> Result<()> {
        self.update(identifier, doc! {}, Some(doc! { "wrong_password_count": 1 }))
            .await
    }

    async fn reset_failed_attempts(&self, identifier: &str) -> Result<()> {
        self.update(identifier, doc! { "wrong_password_count": 0 }, None)
            .await
    }

    async fn update_password(&self, identifier: &str, hashed: &HashedPassword) -> Result<()> {
        self.update(
            identifier,
            doc! {
                "password_hash": hashed.hash.as_str(),
                "password_salt": hashed.salt.as_str(),
            },
            None,
        )
        .await
    }

    async fn set_blocked(&self, identifier: &str, blocked: bool) -> Result<()> {
        self.update(identifier, doc! { "is_blocked": blocked }, None)
            .await
    }
}
