//! Authentication and authorization for Gatehouse
//!
//! Provides:
//! - Salted PBKDF2 password hashing and verification
//! - JWT token issuance and validation
//! - The bearer-token authorization guard for protected routes

pub mod guard;
pub mod jwt;
pub mod password;

pub use guard::{
    extract_bearer, AuthOutcome, AuthStatus, AuthorizationGuard, BearerCredential, Identity,
    RejectReason, AUTH_STATUS_HEADER,
};
pub use jwt::{parse_algorithm, Claims, TokenError, TokenIssuer};
pub use password::{hash_password, verify_password, HashedPassword, PasswordHasher};
