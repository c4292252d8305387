//! Response payloads from the game backend's session endpoints.

use serde::{Deserialize, Serialize};

use storyloom_domain::{CharacterId, ScenarioId, SessionId, StateDelta};

use crate::messages::GameMessage;

// =============================================================================
// Pagination
// =============================================================================

/// One page of a cursor-paginated listing. History pages arrive newest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

impl<T> CursorPage<T> {
    /// A final page with no successor.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
            has_more: false,
        }
    }
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    Abandoned,
    /// Unknown variant for forward compatibility
    #[serde(other)]
    Unknown,
}

/// Persisted world state as the backend reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireGameState {
    pub items: Vec<String>,
    pub visited_locations: Vec<String>,
    pub met_npcs: Vec<String>,
    pub discoveries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub character_id: CharacterId,
    pub scenario_id: ScenarioId,
    #[serde(default)]
    pub current_location: String,
    #[serde(default)]
    pub game_state: WireGameState,
    pub status: SessionStatus,
    pub turn_count: u32,
    pub max_turns: u32,
}

// =============================================================================
// Actions
// =============================================================================

/// Backend reply to a submitted player action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameActionResponse {
    pub message: GameMessage,
    pub narrative: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub turn_count: u32,
    pub max_turns: u32,
    #[serde(default)]
    pub is_ending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_changes: Option<StateDelta>,
}

impl GameActionResponse {
    /// Raw turn text the client decodes: the narrative field followed by the
    /// stored message content, separated by a blank line.
    pub fn raw_turn_text(&self) -> String {
        if self.narrative.is_empty() {
            return self.message.content.clone();
        }
        format!("{}\n\n{}", self.narrative, self.message.content)
    }
}
