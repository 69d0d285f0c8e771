//! Bearer-token authorization guard
//!
//! Every protected request goes through [`AuthorizationGuard::authorize`],
//! which yields either an [`Identity`] or a [`RejectReason`]. The outcome also
//! determines the `AuthStatus` response header, which is purely informational.

use hyper::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::fmt;

use crate::auth::jwt::{Claims, TokenError, TokenIssuer};
use crate::types::GatehouseError;

/// Response header carrying the authorization status
pub const AUTH_STATUS_HEADER: &str = "AuthStatus";

/// Authenticated identity handed to downstream handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub roles: Vec<String>,
    pub raw_claims: Claims,
}

impl Identity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub.clone(),
            roles: claims.roles.clone(),
            raw_claims: claims,
        }
    }
}

/// Why a request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NoCredentialsProvided,
    /// Token failed validation; carries the underlying cause
    InvalidOrExpiredToken(TokenError),
    MalformedToken,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCredentialsProvided => "NO_CREDENTIALS_PROVIDED",
            Self::InvalidOrExpiredToken(_) => "INVALID_OR_EXPIRED_TOKEN",
            Self::MalformedToken => "MALFORMED_TOKEN",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentialsProvided => write!(f, "No credentials provided"),
            Self::InvalidOrExpiredToken(_) => write!(f, "Invalid or expired token"),
            Self::MalformedToken => write!(f, "Malformed authorization header"),
        }
    }
}

impl From<RejectReason> for GatehouseError {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::NoCredentialsProvided => GatehouseError::NoCredentialsProvided,
            RejectReason::InvalidOrExpiredToken(cause) => GatehouseError::from(cause),
            RejectReason::MalformedToken => GatehouseError::TokenMalformed,
        }
    }
}

/// Result of guarding one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(Identity),
    Rejected(RejectReason),
}

impl AuthOutcome {
    pub fn status(&self) -> AuthStatus {
        match self {
            Self::Authenticated(_) => AuthStatus::Authorized,
            Self::Rejected(_) => AuthStatus::UnAuthorized,
        }
    }

    pub fn into_result(self) -> Result<Identity, RejectReason> {
        match self {
            Self::Authenticated(identity) => Ok(identity),
            Self::Rejected(reason) => Err(reason),
        }
    }
}

/// Observational authorization signal surfaced on responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Authorized,
    UnAuthorized,
}

impl AuthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authorized => "Authorized",
            Self::UnAuthorized => "UnAuthorized",
        }
    }

    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracted credential from an Authorization header value
#[derive(Debug, PartialEq, Eq)]
pub enum BearerCredential<'a> {
    Missing,
    Malformed,
    Token(&'a str),
}

/// Extract a bearer token from an Authorization header value.
///
/// The scheme is matched case-insensitively; anything other than
/// `Bearer <token>` is malformed.
pub fn extract_bearer(header: Option<&str>) -> BearerCredential<'_> {
    let header = match header.map(str::trim) {
        None | Some("") => return BearerCredential::Missing,
        Some(h) => h,
    };

    match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => {
            let token = token.trim();
            if token.is_empty() || token.contains(' ') {
                BearerCredential::Malformed
            } else {
                BearerCredential::Token(token)
            }
        }
        _ => BearerCredential::Malformed,
    }
}

/// Gate for protected routes
#[derive(Clone)]
pub struct AuthorizationGuard {
    issuer: TokenIssuer,
}

impl AuthorizationGuard {
    pub fn new(issuer: TokenIssuer) -> Self {
        Self { issuer }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Authorize from request headers
    pub fn authorize(&self, headers: &HeaderMap) -> AuthOutcome {
        // A header that is present but not visible ASCII counts as malformed
        let header = match headers.get(AUTHORIZATION) {
            None => None,
            Some(value) => match value.to_str() {
                Ok(s) => Some(s),
                Err(_) => return AuthOutcome::Rejected(RejectReason::MalformedToken),
            },
        };

        self.authorize_header(header)
    }

    /// Authorize from a raw Authorization header value
    pub fn authorize_header(&self, header: Option<&str>) -> AuthOutcome {
        match extract_bearer(header) {
            BearerCredential::Missing => AuthOutcome::Rejected(RejectReason::NoCredentialsProvided),
            BearerCredential::Malformed => AuthOutcome::Rejected(RejectReason::MalformedToken),
            BearerCredential::Token(token) => match self.issuer.validate(token) {
                Ok(claims) => AuthOutcome::Authenticated(Identity::from(claims)),
                Err(err) => AuthOutcome::Rejected(RejectReason::InvalidOrExpiredToken(err)),
            },
        }
    }
}
