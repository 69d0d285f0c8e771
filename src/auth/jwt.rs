//! JWT issuance and validation
//!
//! Security notes:
//! - Tokens are signed with an HMAC algorithm (HS256 by default)
//! - The signature is verified before any claim is read
//! - Expiry has no leeway: a token whose `exp` is at or before now is expired
//! - There is no revocation list; keep TTLs short

use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::types::GatehouseError;

/// Minimum accepted secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Payload stored in a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identity key (email or username)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Roles granted to the subject
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    /// Seconds until expiry, negative once expired
    pub fn time_remaining(&self) -> i64 {
        self.exp - Utc::now().timestamp()
    }
}

/// Why a token was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed or its signature does not verify")]
    Malformed,
    #[error("token has expired")]
    Expired,
}

impl From<TokenError> for GatehouseError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed => GatehouseError::TokenMalformed,
            TokenError::Expired => GatehouseError::TokenExpired,
        }
    }
}

/// Parse a configured algorithm name, accepting only HMAC variants
pub fn parse_algorithm(name: &str) -> Result<Algorithm, GatehouseError> {
    let algorithm = Algorithm::from_str(name)
        .map_err(|_| GatehouseError::Config(format!("Unknown JWT algorithm: {}", name)))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(GatehouseError::Config(format!(
            "JWT algorithm {:?} needs a key pair; only HS256, HS384 and HS512 are supported",
            other
        ))),
    }
}

/// Mints and validates signed bearer tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer from a shared secret
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: &str, algorithm: Algorithm, ttl: Duration) -> Result<Self, GatehouseError> {
        if secret.is_empty() {
            return Err(GatehouseError::Config("JWT_SECRET is required".into()));
        }

        if secret.len() < MIN_SECRET_LEN {
            return Err(GatehouseError::Config(format!(
                "JWT_SECRET must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }

        Ok(Self::from_bytes(secret.as_bytes(), algorithm, ttl))
    }

    /// Issuer with a random per-process secret, for dev mode.
    /// Tokens stop validating when the process restarts.
    pub fn ephemeral(ttl: Duration) -> Self {
        let mut secret = [0u8; 64];
        OsRng.fill_bytes(&mut secret);
        Self::from_bytes(&secret, Algorithm::HS256, ttl)
    }

    fn from_bytes(secret: &[u8], algorithm: Algorithm, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            algorithm,
            ttl,
        }
    }

    /// Configured token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token with the configured lifetime
    pub fn issue_default(&self, subject: &str, roles: &[String]) -> Result<String, GatehouseError> {
        self.issue(subject, roles, self.ttl)
    }

    /// Issue a token for `subject` valid for `ttl`
    pub fn issue(
        &self,
        subject: &str,
        roles: &[String],
        ttl: Duration,
    ) -> Result<String, GatehouseError> {
        self.issue_with_claims(subject, roles, ttl).map(|(token, _)| token)
    }

    /// Issue a token and return the claims it carries
    pub fn issue_with_claims(
        &self,
        subject: &str,
        roles: &[String],
        ttl: Duration,
    ) -> Result<(String, Claims), GatehouseError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now + ttl.num_seconds(),
            roles: roles.to_vec(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| GatehouseError::Internal(format!("Failed to generate token: {}", e)))?;

        Ok((token, claims))
    }

    /// Verify a token's signature, then its expiry
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        // jsonwebtoken accepts exp == now; treat that instant as expired
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-characters-long";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET, Algorithm::HS256, Duration::hours(1)).unwrap()
    }

    fn roles() -> Vec<String> {
        vec!["hr_admin".to_string()]
    }

    #[test]
    fn test_issue_and_validate() {
        let issuer = issuer();

        let token = issuer.issue("alice", &roles(), Duration::hours(1)).unwrap();
        let claims = issuer.validate(&token).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.roles, roles());
        assert!(claims.exp > claims.iat);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_negative_ttl_is_expired() {
        let issuer = issuer();

        let token = issuer.issue("alice", &[], Duration::seconds(-1)).unwrap();
        assert_eq!(issuer.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_zero_ttl_is_expired() {
        let issuer = issuer();

        let token = issuer.issue("alice", &[], Duration::zero()).unwrap();
        assert_eq!(issuer.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let issuer = issuer();
        let token = issuer.issue("alice", &roles(), Duration::hours(1)).unwrap();

        for index in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            assert_eq!(
                issuer.validate(&tampered),
                Err(TokenError::Malformed),
                "flipping byte {} was not rejected",
                index
            );
        }
    }

    #[test]
    fn test_expired_token_with_bad_signature_is_malformed() {
        let issuer = issuer();
        let other = TokenIssuer::new(
            "different-secret-that-is-at-least-32-characters",
            Algorithm::HS256,
            Duration::hours(1),
        )
        .unwrap();

        // Expiry must not be trusted before the signature checks out
        let token = other.issue("mallory", &[], Duration::seconds(-60)).unwrap();
        assert_eq!(issuer.validate(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_wrong_secret() {
        let other = TokenIssuer::new(
            "different-secret-that-is-at-least-32-characters",
            Algorithm::HS256,
            Duration::hours(1),
        )
        .unwrap();

        let token = other.issue("alice", &[], Duration::hours(1)).unwrap();
        assert_eq!(issuer().validate(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_garbage_rejected() {
        let issuer = issuer();

        assert_eq!(issuer.validate(""), Err(TokenError::Malformed));
        assert_eq!(issuer.validate("invalid-token"), Err(TokenError::Malformed));
        assert_eq!(issuer.validate("a.b.c"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_algorithm_mismatch_rejected() {
        let hs512 = TokenIssuer::new(SECRET, Algorithm::HS512, Duration::hours(1)).unwrap();
        let token = hs512.issue("alice", &[], Duration::hours(1)).unwrap();

        assert!(hs512.validate(&token).is_ok());
        assert_eq!(issuer().validate(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_secret_validation() {
        assert!(TokenIssuer::new("short", Algorithm::HS256, Duration::hours(1)).is_err());
        assert!(TokenIssuer::new("", Algorithm::HS256, Duration::hours(1)).is_err());
        assert!(TokenIssuer::new(SECRET, Algorithm::HS256, Duration::hours(1)).is_ok());
    }

    #[test]
    fn test_ephemeral_issuers_do_not_share_secrets() {
        let a = TokenIssuer::ephemeral(Duration::hours(1));
        let b = TokenIssuer::ephemeral(Duration::hours(1));

        let token = a.issue_default("alice", &[]).unwrap();
        assert!(a.validate(&token).is_ok());
        assert_eq!(b.validate(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(parse_algorithm("HS256").unwrap(), Algorithm::HS256);
        assert_eq!(parse_algorithm("HS512").unwrap(), Algorithm::HS512);
        assert!(parse_algorithm("RS256").is_err());
        assert!(parse_algorithm("none").is_err());
    }

    #[test]
    fn test_time_remaining() {
        let issuer = issuer();
        let token = issuer.issue_default("alice", &[]).unwrap();
        let claims = issuer.validate(&token).unwrap();

        let remaining = claims.time_remaining();
        assert!(remaining > 3590 && remaining <= 3600);
    }
}
