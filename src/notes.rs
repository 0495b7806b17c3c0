//! Owner-scoped note operations with change announcements

use crate::bus::{NoteEventKind, NotificationBus};
use crate::error::{Error, Result};
use crate::storage::{Note, NoteId, NoteStore, UserId};
use std::sync::Arc;
use tracing::{debug, warn};

/// Note operations for an authenticated owner.
///
/// Every successful mutation is published on the bus after the store has
/// confirmed it. A failed publish is logged and does not fail the call.
#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn NoteStore>,
    bus: NotificationBus,
}

impl NoteService {
    pub fn new(store: Arc<dyn NoteStore>, bus: NotificationBus) -> Self {
        Self { store, bus }
    }

    pub async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Note>> {
        Ok(self.store.list_notes(owner).await?)
    }

    pub async fn create(&self, owner: UserId, title: &str, content: &str) -> Result<Note> {
        let note = self.store.create_note(owner, title, content).await?;
        debug!(user_id = owner, note_id = note.id, "Note created");

        self.announce(NoteEventKind::Created, &note);
        Ok(note)
    }

    pub async fn update(
        &self,
        id: NoteId,
        owner: UserId,
        title: &str,
        content: &str,
    ) -> Result<Note> {
        let note = self
            .store
            .update_note(id, owner, title, content)
            .await?
            .ok_or(Error::NotFound)?;
        debug!(user_id = owner, note_id = id, "Note updated");

        self.announce(NoteEventKind::Updated, &note);
        Ok(note)
    }

    pub async fn delete(&self, id: NoteId, owner: UserId) -> Result<Note> {
        let note = self
            .store
            .delete_note(id, owner)
            .await?
            .ok_or(Error::NotFound)?;
        debug!(user_id = owner, note_id = id, "Note deleted");

        self.announce(NoteEventKind::Deleted, &note);
        Ok(note)
    }

    fn announce(&self, kind: NoteEventKind, note: &Note) {
        if let Err(e) = self.bus.publish(kind, note) {
            warn!(event = kind.event_name(), note_id = note.id, error = %e, "Failed to publish note event");
        }
    }
}
