//! Credential workflows: register, login, refresh, change password
//!
//! Every store call is bounded by the lookup timeout so a slow database
//! surfaces as `Timeout` instead of hanging the request.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::auth::{Claims, Identity, PasswordHasher, TokenIssuer};
use crate::credentials::{CredentialRecord, CredentialStore};
use crate::types::{GatehouseError, Result};

/// Canonical form of a login identifier, applied on every lookup and insert
fn normalize_identifier(identifier: &str) -> &str {
    identifier.trim()
}

/// A freshly issued token and its claims
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub token: String,
    pub claims: Claims,
}

/// Orchestrates the credential store, hasher and token issuer
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    lookup_timeout: Duration,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        issuer: TokenIssuer,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            store,
            hasher,
            issuer,
            lookup_timeout,
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.lookup_timeout, fut)
            .await
            .map_err(|_| GatehouseError::Timeout(format!("credential store {}", op)))?
    }

    fn issue(&self, record: &CredentialRecord) -> Result<LoginSuccess> {
        let (token, claims) =
            self.issuer
                .issue_with_claims(&record.identifier, &record.roles, self.issuer.ttl())?;
        Ok(LoginSuccess { token, claims })
    }

    /// Create credentials and sign the new account in
    pub async fn register(
        &self,
        identifier: &str,
        password: &str,
        roles: Vec<String>,
    ) -> Result<LoginSuccess> {
        let identifier = normalize_identifier(identifier);
        if identifier.is_empty() || password.is_empty() {
            return Err(GatehouseError::BadRequest(
                "Missing required fields: identifier, password".into(),
            ));
        }

        let record = CredentialRecord::new(identifier, self.hasher.hash(password), roles);
        self.bounded("insert", self.store.insert(record.clone())).await?;

        info!(identifier = %record.identifier, "Credentials registered");
        self.issue(&record)
    }

    /// Verify a password and issue a token
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginSuccess> {
        let identifier = normalize_identifier(identifier);
        let record = self
            .bounded("find", self.store.find(identifier))
            .await?
            .ok_or_else(|| GatehouseError::CredentialNotFound(identifier.to_string()))?;

        if !self
            .hasher
            .verify(password, &record.password_hash, &record.password_salt)
        {
            self.bounded(
                "record_failed_attempt",
                self.store.record_failed_attempt(identifier),
            )
            .await?;
            warn!(
                identifier,
                failures = record.wrong_password_count.saturating_add(1),
                "Password mismatch"
            );
            return Err(GatehouseError::PasswordMismatch);
        }

        if !record.can_sign_in() {
            warn!(
                identifier,
                is_active = record.is_active,
                is_blocked = record.is_blocked,
                "Sign-in refused for disabled account"
            );
            return Err(GatehouseError::AccountDisabled(identifier.to_string()));
        }

        if record.wrong_password_count != 0 {
            self.bounded(
                "reset_failed_attempts",
                self.store.reset_failed_attempts(identifier),
            )
            .await?;
        }

        info!(identifier, "Login successful");
        self.issue(&record)
    }

    /// Reissue a token for an authenticated identity, with current roles
    pub async fn refresh(&self, identity: &Identity) -> Result<LoginSuccess> {
        let record = self
            .bounded("find", self.store.find(&identity.subject))
            .await?
            .ok_or_else(|| GatehouseError::CredentialNotFound(identity.subject.clone()))?;

        if !record.can_sign_in() {
            return Err(GatehouseError::AccountDisabled(identity.subject.clone()));
        }

        debug!(subject = %identity.subject, "Token refreshed");
        self.issue(&record)
    }

    /// Replace the password after checking the current one
    pub async fn change_password(
        &self,
        identity: &Identity,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        if new_password.is_empty() {
            return Err(GatehouseError::BadRequest("New password must not be empty".into()));
        }

        let record = self
            .bounded("find", self.store.find(&identity.subject))
            .await?
            .ok_or_else(|| GatehouseError::CredentialNotFound(identity.subject.clone()))?;

        if !record.can_sign_in() {
            return Err(GatehouseError::AccountDisabled(identity.subject.clone()));
        }

        if !self
            .hasher
            .verify(current_password, &record.password_hash, &record.password_salt)
        {
            self.bounded(
                "record_failed_attempt",
                self.store.record_failed_attempt(&identity.subject),
            )
            .await?;
            return Err(GatehouseError::PasswordMismatch);
        }

        let hashed = self.hasher.hash(new_password);
        self.bounded(
            "update_password",
            self.store.update_password(&identity.subject, &hashed),
        )
        .await?;

        info!(subject = %identity.subject, "Password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::HashedPassword;
    use crate::credentials::MemoryCredentialStore;
    use async_trait::async_trait;
    use chrono::Duration as TtlDuration;
    use jsonwebtoken::Algorithm;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::with_params(50, 16, 32)
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            "test-secret-that-is-at-least-32-characters-long",
            Algorithm::HS256,
            TtlDuration::hours(1),
        )
        .unwrap()
    }

    fn authenticator() -> (Authenticator, Arc<MemoryCredentialStore>) {
        let store = Arc::new(MemoryCredentialStore::new());
        let auth = Authenticator::new(
            store.clone(),
            fast_hasher(),
            issuer(),
            Duration::from_secs(1),
        );
        (auth, store)
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (auth, _) = authenticator();

        let registered = auth
            .register("alice@example.com", "hunter22", vec!["hr_admin".into()])
            .await
            .unwrap();
        assert_eq!(registered.claims.sub, "alice@example.com");

        let login = auth.login("alice@example.com", "hunter22").await.unwrap();
        let claims = auth.issuer().validate(&login.token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.roles, vec!["hr_admin".to_string()]);
    }

    #[tokio::test]
    async fn test_register_rejects_empty_fields() {
        let (auth, _) = authenticator();

        let err = auth.register("", "pw", vec![]).await.unwrap_err();
        assert!(matches!(err, GatehouseError::BadRequest(_)));
        let err = auth.register("alice", "", vec![]).await.unwrap_err();
        assert!(matches!(err, GatehouseError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_duplicate_register_conflicts() {
        let (auth, _) = authenticator();
        auth.register("alice", "pw", vec![]).await.unwrap();

        let err = auth.register("alice", "other", vec![]).await.unwrap_err();
        assert!(matches!(err, GatehouseError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_unknown_identifier() {
        let (auth, _) = authenticator();

        let err = auth.login("ghost", "pw").await.unwrap_err();
        assert!(matches!(err, GatehouseError::CredentialNotFound(_)));
    }

    #[tokio::test]
    async fn test_wrong_password_counts_and_success_resets() {
        let (auth, store) = authenticator();
        auth.register("alice", "right", vec![]).await.unwrap();

        for _ in 0..3 {
            let err = auth.login("alice", "wrong").await.unwrap_err();
            assert!(matches!(err, GatehouseError::PasswordMismatch));
        }
        assert_eq!(store.find("alice").await.unwrap().unwrap().wrong_password_count, 3);

        auth.login("alice", "right").await.unwrap();
        assert_eq!(store.find("alice").await.unwrap().unwrap().wrong_password_count, 0);
    }

    #[tokio::test]
    async fn test_blocked_account_refused() {
        let (auth, store) = authenticator();
        auth.register("alice", "right", vec![]).await.unwrap();
        store.set_blocked("alice", true).await.unwrap();

        let err = auth.login("alice", "right").await.unwrap_err();
        assert!(matches!(err, GatehouseError::AccountDisabled(_)));
    }

    #[tokio::test]
    async fn test_refresh() {
        let (auth, store) = authenticator();
        let first = auth.register("alice", "pw", vec!["viewer".into()]).await.unwrap();
        let identity = Identity::from(first.claims);

        let refreshed = auth.refresh(&identity).await.unwrap();
        assert_eq!(refreshed.claims.sub, "alice");
        assert_eq!(refreshed.claims.roles, vec!["viewer".to_string()]);

        store.set_blocked("alice", true).await.unwrap();
        let err = auth.refresh(&identity).await.unwrap_err();
        assert!(matches!(err, GatehouseError::AccountDisabled(_)));
    }

    #[tokio::test]
    async fn test_change_password() {
        let (auth, _) = authenticator();
        let registered = auth.register("alice", "old-pw", vec![]).await.unwrap();
        let identity = Identity::from(registered.claims);

        let err = auth
            .change_password(&identity, "not-old", "new-pw")
            .await
            .unwrap_err();
        assert!(matches!(err, GatehouseError::PasswordMismatch));

        auth.change_password(&identity, "old-pw", "new-pw").await.unwrap();

        assert!(matches!(
            auth.login("alice", "old-pw").await.unwrap_err(),
            GatehouseError::PasswordMismatch
        ));
        assert!(auth.login("alice", "new-pw").await.is_ok());
    }

    #[tokio::test]
    async fn test_padded_identifier_round_trips() {
        let (auth, store) = authenticator();

        let registered = auth.register("  alice@example.com ", "pw", vec![]).await.unwrap();
        assert_eq!(registered.claims.sub, "alice@example.com");
        assert!(store.find("alice@example.com").await.unwrap().is_some());

        let login = auth.login("  alice@example.com ", "pw").await.unwrap();
        assert_eq!(login.claims.sub, "alice@example.com");
        assert!(auth.login("alice@example.com", "pw").await.is_ok());

        let err = auth.login(" alice@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, GatehouseError::PasswordMismatch));
        let record = store.find("alice@example.com").await.unwrap().unwrap();
        assert_eq!(record.wrong_password_count, 1);
    }

    #[tokio::test]
    async fn test_blocked_account_cannot_change_password() {
        let (auth, store) = authenticator();
        let registered = auth.register("alice", "old-pw", vec![]).await.unwrap();
        let identity = Identity::from(registered.claims);
        store.set_blocked("alice", true).await.unwrap();

        let err = auth
            .change_password(&identity, "old-pw", "new-pw")
            .await
            .unwrap_err();
        assert!(matches!(err, GatehouseError::AccountDisabled(_)));

        store.set_blocked("alice", false).await.unwrap();
        assert!(auth.login("alice", "old-pw").await.is_ok());
    }

    #[tokio::test]
    async fn test_saturated_failure_counter() {
        let (auth, store) = authenticator();
        let hashed = fast_hasher().hash("right");
        let mut record = CredentialRecord::new("alice", hashed, vec![]);
        record.wrong_password_count = i32::MAX;
        store.insert(record).await.unwrap();

        let err = auth.login("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, GatehouseError::PasswordMismatch));
        let record = store.find("alice").await.unwrap().unwrap();
        assert_eq!(record.wrong_password_count, i32::MAX);
    }

    struct StalledStore;

    #[async_trait]
    impl CredentialStore for StalledStore {
        async fn find(&self, _identifier: &str) -> Result<Option<CredentialRecord>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }
        async fn insert(&self, _record: CredentialRecord) -> Result<()> {
            Ok(())
        }
        async fn record_failed_attempt(&self, _identifier: &str) -> Result<()> {
            Ok(())
        }
        async fn reset_failed_attempts(&self, _identifier: &str) -> Result<()> {
            Ok(())
        }
        async fn update_password(&self, _identifier: &str, _hashed: &HashedPassword) -> Result<()> {
            Ok(())
        }
        async fn set_blocked(&self, _identifier: &str, _blocked: bool) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let auth = Authenticator::new(
            Arc::new(StalledStore),
            fast_hasher(),
            issuer(),
            Duration::from_millis(50),
        );

        let err = auth.login("alice", "pw").await.unwrap_err();
        assert!(matches!(err, GatehouseError::Timeout(_)));
    }
}
