//! In-memory storage backend
//!
//! Each operation takes the lock once, so uniqueness checks and owner-scoped
//! mutations are atomic the same way the conditional SQL statements are.

use crate::storage::{
    async_trait, NewUser, Note, NoteId, NoteStore, StorageError, User, UserId, UserRecord,
    UserStore,
};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, UserRecord>,
    /// Keyed by id, so iteration order is creation order
    notes: BTreeMap<NoteId, Note>,
    last_user_id: UserId,
    last_note_id: NoteId,
}

/// Process-local store for users and notes
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StorageError> {
        let mut tables = self.tables.write();

        for record in tables.users.values() {
            if record.user.username == new_user.username {
                return Err(StorageError::Duplicate("username".to_string()));
            }
            if record.user.email == new_user.email {
                return Err(StorageError::Duplicate("email".to_string()));
            }
        }

        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            username: new_user.username,
            email: new_user.email,
            created_at: Utc::now(),
        };

        tables.users.insert(
            user.id,
            UserRecord {
                user: user.clone(),
                password_hash: new_user.password_hash,
            },
        );

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        let tables = self.tables.read();
        Ok(tables
            .users
            .values()
            .find(|record| record.user.email == email)
            .cloned())
    }

    async fn count_users(&self) -> Result<i64, StorageError> {
        Ok(self.tables.read().users.len() as i64)
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn list_notes(&self, owner: UserId) -> Result<Vec<Note>, StorageError> {
        let tables = self.tables.read();
        Ok(tables
            .notes
            .values()
            .filter(|note| note.user_id == owner)
            .cloned()
            .collect())
    }

    async fn create_note(
        &self,
        owner: UserId,
        title: &str,
        content: &str,
    ) -> Result<Note, StorageError> {
        let mut tables = self.tables.write();

        // Mirrors the foreign key on notes.user_id
        if !tables.users.contains_key(&owner) {
            return Err(StorageError::Database(format!("user {} does not exist", owner)));
        }

        tables.last_note_id += 1;
        let now = Utc::now();
        let note = Note {
            id: tables.last_note_id,
            user_id: owner,
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.notes.insert(note.id, note.clone());

        Ok(note)
    }

    async fn update_note(
        &self,
        id: NoteId,
        owner: UserId,
        title: &str,
        content: &str,
    ) -> Result<Option<Note>, StorageError> {
        let mut tables = self.tables.write();

        match tables.notes.get_mut(&id) {
            Some(note) if note.user_id == owner => {
                note.title = title.to_string();
                note.content = content.to_string();
                note.updated_at = Utc::now();
                Ok(Some(note.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_note(&self, id: NoteId, owner: UserId) -> Result<Option<Note>, StorageError> {
        let mut tables = self.tables.write();

        let owned = tables.notes.get(&id).is_some_and(|note| note.user_id == owner);
        if !owned {
            return Ok(None);
        }

        Ok(tables.notes.remove(&id))
    }

    async fn count_notes(&self) -> Result<i64, StorageError> {
        Ok(self.tables.read().notes.len() as i64)
    }
}
