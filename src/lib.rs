//! Notecast - multi-user notes service with real-time change fan-out
//!
//! Users register, log in for a signed bearer token, and manage their own
//! notes over a JSON HTTP API. Every successful note mutation is broadcast
//! to all WebSocket clients connected to `/ws`.

pub mod auth;
pub mod bus;
pub mod error;
pub mod notes;
pub mod server;
pub mod storage;

pub use auth::{CredentialHasher, CredentialStore, SessionIssuer, SessionToken, TokenError};
pub use bus::{NoteEventKind, NotificationBus, Subscription};
pub use error::{Error, Result};
pub use notes::NoteService;
pub use server::{NotesServer, NotesServerConfig};
pub use storage::{MemoryStore, Note, NoteStore, PostgresConfig, PostgresStore, User, UserStore};
