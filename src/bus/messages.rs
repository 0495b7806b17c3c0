//! Wire frames exchanged over the real-time channel

use crate::storage::Note;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Frames from server to client, encoded as `{"event": ..., "data": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once after the socket opens
    Connected { connection_id: Uuid },
    NoteCreated(Note),
    NoteUpdated(Note),
    NoteDeleted(Note),
    /// Reply to a client ping
    Pong { seq: u64 },
    /// Reply to a frame the server could not understand
    Error { message: String },
}

/// Frames from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Keepalive
    Ping { seq: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn note() -> Note {
        let ts: DateTime<Utc> = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        Note {
            id: 3,
            user_id: 1,
            title: "t1".to_string(),
            content: "c1".to_string(),
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_note_event_shape() {
        let json = serde_json::to_value(ServerMessage::NoteUpdated(note())).unwrap();
        assert_eq!(json["event"], "note_updated");
        assert_eq!(json["data"]["id"], 3);
        assert_eq!(json["data"]["user_id"], 1);
        assert_eq!(json["data"]["title"], "t1");
        assert_eq!(json["data"]["content"], "c1");
    }

    #[test]
    fn test_pong_shape() {
        let json = serde_json::to_string(&ServerMessage::Pong { seq: 9 }).unwrap();
        assert_eq!(json, r#"{"event":"pong","data":{"seq":9}}"#);
    }

    #[test]
    fn test_client_ping_parse() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping","seq":4}"#).unwrap();
        assert_eq!(msg, ClientMessage::Ping { seq: 4 });
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"subscribe"}"#).is_err());
    }
}
