//! User registration and credential lookup

use crate::auth::password::CredentialHasher;
use crate::error::{Error, Result};
use crate::storage::{NewUser, User, UserRecord, UserStore};
use std::sync::Arc;
use tracing::{debug, info};

/// Registers users and checks their passwords
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserStore>,
    hasher: CredentialHasher,
    /// Hash checked when the email is unknown, so both login failures cost the same
    decoy_hash: Arc<str>,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserStore>, hasher: CredentialHasher) -> Result<Self> {
        let decoy_hash = hasher.hash("decoy-password").map_err(Error::Hashing)?;

        Ok(Self {
            users,
            hasher,
            decoy_hash: decoy_hash.into(),
        })
    }

    /// Hash the password and persist a new user.
    ///
    /// Returns the public user; the hash never leaves this module.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| Error::Hashing(e.to_string()))?
            .map_err(Error::Hashing)?;

        let user = self
            .users
            .create_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self.users.find_user_by_email(email).await?)
    }

    /// Look up the user and verify the password.
    ///
    /// Unknown email and wrong password both yield `InvalidCredentials`.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let record = self.find_by_email(email).await?;

        let stored_hash: Arc<str> = match &record {
            Some(r) => r.password_hash.as_str().into(),
            None => self.decoy_hash.clone(),
        };

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(|e| Error::Hashing(e.to_string()))?
            .map_err(Error::Hashing)?;

        match record {
            Some(r) if matches => Ok(r.user),
            _ => {
                debug!("Credential check failed");
                Err(Error::InvalidCredentials)
            }
        }
    }
}
