//! Gatehouse - credential verification and bearer-token authorization
//!
//! Gatehouse guards the HR/payroll admin API. It verifies passwords against
//! salted PBKDF2 hashes, issues signed bearer tokens, and authorizes each
//! protected request from its `Authorization` header.
//!
//! ## Components
//!
//! - **PasswordHasher**: salted PBKDF2-HMAC-SHA256 hashing and verification
//! - **TokenIssuer**: JWT issuance and validation with a shared secret
//! - **AuthorizationGuard**: turns a request into an identity or a rejection
//! - **CredentialStore**: MongoDB or in-memory persistence for credential records

pub mod auth;
pub mod config;
pub mod credentials;
pub mod db;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{GatehouseError, Result};
