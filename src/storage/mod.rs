//! Storage backends for Notecast
//!
//! - Postgres: durable storage for users and notes
//! - Memory: process-local storage with the same semantics, for tests and dev runs

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{DbTlsMode, PostgresConfig, PostgresStore};

pub use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type UserId = i64;
pub type NoteId = i64;

/// Storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),

    /// A unique constraint rejected the write
    #[error("duplicate value: {0}")]
    Duplicate(String),
}

/// A registered user as exposed to clients (no password material)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A user together with the stored password hash.
///
/// Deliberately not `Serialize`: it only travels from the store to the login check.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

/// Input for creating a user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trait for user identity storage
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with `Duplicate` if username or email is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<User, StorageError>;

    /// Look up a user (with hash) by email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError>;

    async fn count_users(&self) -> Result<i64, StorageError>;
}

/// Trait for owner-scoped note storage
///
/// Update and delete match on id AND owner in a single step; `None` means no
/// note with that id belongs to that owner.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// All notes of one owner in creation order
    async fn list_notes(&self, owner: UserId) -> Result<Vec<Note>, StorageError>;

    async fn create_note(
        &self,
        owner: UserId,
        title: &str,
        content: &str,
    ) -> Result<Note, StorageError>;

    async fn update_note(
        &self,
        id: NoteId,
        owner: UserId,
        title: &str,
        content: &str,
    ) -> Result<Option<Note>, StorageError>;

    /// Delete and return the removed note
    async fn delete_note(&self, id: NoteId, owner: UserId) -> Result<Option<Note>, StorageError>;

    async fn count_notes(&self) -> Result<i64, StorageError>;
}
