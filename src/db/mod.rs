//! MongoDB persistence for credential records

pub mod credential_store;
pub mod mongo;
pub mod schemas;

pub use credential_store::MongoCredentialStore;
pub use mongo::{MongoClient, MongoCollection};
