//! Configuration for Gatehouse
//!
//! CLI arguments with environment variable fallbacks using clap.

use clap::{Parser, ValueEnum};
use jsonwebtoken::Algorithm;
use std::net::SocketAddr;
use std::time::Duration;

use crate::auth::{jwt::MIN_SECRET_LEN, parse_algorithm, TokenIssuer};
use crate::types::GatehouseError;

/// Longest accepted token lifetime (one year)
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Gatehouse - credential verification and bearer-token authorization
#[derive(Parser, Debug, Clone)]
#[command(name = "gatehouse")]
#[command(about = "Credential verification and bearer-token authorization service")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (ephemeral signing secret, in-memory store fallback)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// JWT signing algorithm (HS256, HS384 or HS512)
    #[arg(long, env = "JWT_ALGORITHM", default_value = "HS256")]
    pub jwt_algorithm: String,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "gatehouse")]
    pub mongodb_db: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Timeout for credential store calls in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "5000")]
    pub request_timeout_ms: u64,
}

impl Args {
    /// Signing algorithm; call after `validate`
    pub fn algorithm(&self) -> Algorithm {
        parse_algorithm(&self.jwt_algorithm).unwrap_or(Algorithm::HS256)
    }

    /// Configured token lifetime; out-of-range values are a config error
    pub fn token_ttl(&self) -> Result<chrono::Duration, GatehouseError> {
        if self.jwt_expiry_seconds == 0 || self.jwt_expiry_seconds > MAX_TOKEN_TTL_SECS {
            return Err(GatehouseError::Config(format!(
                "JWT_EXPIRY_SECONDS must be between 1 and {}",
                MAX_TOKEN_TTL_SECS
            )));
        }

        i64::try_from(self.jwt_expiry_seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                GatehouseError::Config(format!(
                    "JWT_EXPIRY_SECONDS out of range: {}",
                    self.jwt_expiry_seconds
                ))
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Build the token issuer from the configured secret.
    /// Dev mode without a secret gets a random per-process one.
    pub fn token_issuer(&self) -> Result<TokenIssuer, GatehouseError> {
        match self.jwt_secret.as_deref() {
            Some(secret) => {
                let algorithm = parse_algorithm(&self.jwt_algorithm)?;
                TokenIssuer::new(secret, algorithm, self.token_ttl()?)
            }
            None if self.dev_mode => Ok(TokenIssuer::ephemeral(self.token_ttl()?)),
            None => Err(GatehouseError::Config(
                "JWT_SECRET is required in production mode".into(),
            )),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        match self.jwt_secret.as_deref() {
            None if !self.dev_mode => {
                return Err("JWT_SECRET is required in production mode".to_string());
            }
            Some(secret) if secret.len() < MIN_SECRET_LEN => {
                return Err(format!(
                    "JWT_SECRET must be at least {} characters",
                    MIN_SECRET_LEN
                ));
            }
            _ => {}
        }

        parse_algorithm(&self.jwt_algorithm).map_err(|e| e.to_string())?;

        self.token_ttl().map_err(|e| e.to_string())?;

        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-characters-long";

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["gatehouse"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["--jwt-secret", SECRET]);

        assert_eq!(args.listen, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(args.jwt_expiry_seconds, 3600);
        assert_eq!(args.algorithm(), Algorithm::HS256);
        assert_eq!(args.request_timeout(), Duration::from_millis(5000));
        assert_eq!(args.log_format, LogFormat::Pretty);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_secret_required_outside_dev_mode() {
        let args = parse(&[]);
        assert!(args.validate().is_err());

        let args = parse(&["--dev-mode"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let args = parse(&["--jwt-secret", "too-short"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_asymmetric_algorithm_rejected() {
        let args = parse(&["--jwt-secret", SECRET, "--jwt-algorithm", "RS256"]);
        assert!(args.validate().is_err());

        let args = parse(&["--jwt-secret", SECRET, "--jwt-algorithm", "HS512"]);
        assert!(args.validate().is_ok());
        assert_eq!(args.algorithm(), Algorithm::HS512);
    }

    #[test]
    fn test_token_issuer() {
        let args = parse(&["--jwt-secret", SECRET]);
        let issuer = args.token_issuer().unwrap();
        let token = issuer.issue_default("alice", &[]).unwrap();
        assert_eq!(issuer.validate(&token).unwrap().sub, "alice");

        assert!(parse(&["--dev-mode"]).token_issuer().is_ok());
        assert!(parse(&[]).token_issuer().is_err());
    }

    #[test]
    fn test_zero_expiry_rejected() {
        let args = parse(&["--jwt-secret", SECRET, "--jwt-expiry-seconds", "0"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_oversized_expiry_rejected() {
        for value in ["18446744073709551615", "10000000000000000", "31536001"] {
            let args = parse(&["--jwt-secret", SECRET, "--jwt-expiry-seconds", value]);
            assert!(args.validate().is_err(), "{} should be refused", value);
            assert!(matches!(args.token_ttl(), Err(GatehouseError::Config(_))));
            assert!(args.token_issuer().is_err());
        }

        let args = parse(&["--jwt-secret", SECRET, "--jwt-expiry-seconds", "31536000"]);
        assert!(args.validate().is_ok());
        let issuer = args.token_issuer().unwrap();
        let token = issuer.issue_default("alice", &[]).unwrap();
        let claims = issuer.validate(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 31_536_000);
    }
}
