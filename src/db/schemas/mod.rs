//! Database schemas for Gatehouse

mod credential;
mod metadata;

pub use credential::{CredentialDoc, CREDENTIAL_COLLECTION};
pub use metadata::Metadata;
