//! Login and bearer-token verification

use crate::auth::credentials::CredentialStore;
use crate::auth::tokens::{SessionToken, TokenError};
use crate::error::{Error, Result};
use crate::storage::UserId;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_TOKEN_TTL: Duration = Duration::hours(1);

/// Token lifetime from whole seconds, if positive and representable from now on
pub fn token_ttl_from_secs(secs: i64) -> Option<Duration> {
    let ttl = Duration::try_seconds(secs)?;
    if ttl <= Duration::zero() {
        return None;
    }
    Utc::now().checked_add_signed(ttl).map(|_| ttl)
}

/// Issues and validates stateless session tokens.
///
/// There is no revocation list: a token stays valid until it expires.
#[derive(Clone)]
pub struct SessionIssuer {
    credentials: CredentialStore,
    secret: Arc<[u8]>,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(credentials: CredentialStore, secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        let secret: Vec<u8> = secret.into();
        Self {
            credentials,
            secret: Arc::from(secret),
            ttl,
        }
    }

    /// Check email and password and issue a token for the user
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionToken> {
        let user = self.credentials.authenticate(email, password).await?;
        let token = self.issue_at(user.id, Utc::now())?;

        info!(user_id = user.id, "User logged in");
        Ok(token)
    }

    pub fn issue_at(&self, user_id: UserId, issued_at: DateTime<Utc>) -> Result<SessionToken> {
        SessionToken::issue(user_id, issued_at, self.ttl, &self.secret).map_err(Error::Issuing)
    }

    /// Resolve a bearer token to the user it was issued for
    pub fn verify(&self, token: &str) -> Result<UserId> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<UserId> {
        if token.is_empty() {
            return Err(TokenError::Missing.into());
        }
        let token = SessionToken::verify(token, &self.secret, now)?;
        Ok(token.user_id())
    }
}

impl fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}
