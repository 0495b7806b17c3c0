//! Notecast server implementation
//!
//! JSON HTTP API for registration, login and owner-scoped notes, plus the
//! `/ws` WebSocket endpoint that streams note events.

pub mod api;
mod app;
pub mod error;
pub mod extract;
pub mod websocket;

pub use app::{create_router, AppState, NotesServer, NotesServerConfig};
pub use error::{ApiError, ErrorBody};
pub use extract::AuthUser;
