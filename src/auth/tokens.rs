//! Session bearer tokens
//!
//! Format: `st-<payload>.<signature>` where payload is base64url JSON claims and
//! signature is base64url HMAC-SHA256 over the encoded payload.

use crate::storage::UserId;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use thiserror::Error;

pub const SESSION_TOKEN_PREFIX: &str = "st-";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("missing token")]
    Missing,

    #[error("invalid token format")]
    InvalidFormat,

    #[error("invalid token prefix: expected '{expected}', got '{got}'")]
    InvalidPrefix { expected: String, got: String },

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token decode error: {0}")]
    DecodeError(String),

    #[error("token expired")]
    Expired,

    #[error("token expiry is out of range")]
    ExpiryOutOfRange,
}

/// Claims carried by a session token (unix seconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub uid: UserId,
    pub iat: i64,
    pub exp: i64,
}

fn mac_for(secret: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size")
}

/// A signed, stateless session token
#[derive(Debug, Clone)]
pub struct SessionToken {
    token: String,
    claims: TokenClaims,
}

impl SessionToken {
    /// Issue a token for `user_id` valid for `ttl` starting at `issued_at`
    pub fn issue(
        user_id: UserId,
        issued_at: DateTime<Utc>,
        ttl: Duration,
        secret: &[u8],
    ) -> Result<Self, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or(TokenError::ExpiryOutOfRange)?;
        let claims = TokenClaims {
            uid: user_id,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let claims_json = serde_json::to_vec(&claims).expect("serialize claims");
        let payload_b64 = URL_SAFE_NO_PAD.encode(&claims_json);

        let mut mac = mac_for(secret);
        mac.update(payload_b64.as_bytes());
        let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        let token = format!("{}{}.{}", SESSION_TOKEN_PREFIX, payload_b64, signature_b64);

        Ok(Self { token, claims })
    }

    /// Check prefix and signature and decode the claims. Expiry is not checked.
    pub fn parse(token: &str, secret: &[u8]) -> Result<Self, TokenError> {
        let content = token
            .strip_prefix(SESSION_TOKEN_PREFIX)
            .ok_or_else(|| TokenError::InvalidPrefix {
                expected: SESSION_TOKEN_PREFIX.to_string(),
                got: token.chars().take(SESSION_TOKEN_PREFIX.len()).collect(),
            })?;

        let (payload_b64, signature_b64) =
            content.split_once('.').ok_or(TokenError::InvalidFormat)?;
        if payload_b64.is_empty() || signature_b64.contains('.') {
            return Err(TokenError::InvalidFormat);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::InvalidSignature)?;

        let mut mac = mac_for(secret);
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims_json = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|e| TokenError::DecodeError(e.to_string()))?;

        let claims: TokenClaims = serde_json::from_slice(&claims_json)
            .map_err(|e| TokenError::DecodeError(e.to_string()))?;

        Ok(Self {
            token: token.to_string(),
            claims,
        })
    }

    /// Parse and reject tokens whose expiry is at or before `now`
    pub fn verify(token: &str, secret: &[u8], now: DateTime<Utc>) -> Result<Self, TokenError> {
        let parsed = Self::parse(token, secret)?;
        if now.timestamp() >= parsed.claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(parsed)
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> UserId {
        self.claims.uid
    }

    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.claims.exp, 0)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token)
    }
}
