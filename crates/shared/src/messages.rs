//! Message history types as served by the game backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message in the session history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// The player's action text
    User,
    /// Game-master output
    System,
    Assistant,
    /// Unknown variant for forward compatibility
    #[serde(other)]
    Unknown,
}

impl MessageRole {
    /// Whether content from this role is a raw game-master turn.
    ///
    /// Everything except player input is decoded, including unknown roles.
    pub fn is_game_master(&self) -> bool {
        !matches!(self, Self::User)
    }
}

/// One entry in a session's message history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMessage {
    pub id: String,
    pub role: MessageRole,
    /// Raw text exactly as the backend stored it (for system turns, undecoded model output)
    pub content: String,
    /// Backend-side parse, if the backend attempted one. Clients re-decode `content`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_response: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl GameMessage {
    pub fn new(
        id: impl Into<String>,
        role: MessageRole,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
            parsed_response: None,
            created_at,
        }
    }
}
