//! Storyloom domain layer.
//!
//! Holds the decoded shape of a game-master turn ([`TurnResponse`]), the per-turn
//! [`StateDelta`], and the caller-owned [`GameState`] that deltas fold into.

pub mod aggregates;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use aggregates::GameState;
pub use error::DomainError;
pub use ids::{CharacterId, ScenarioId, SessionId};
pub use value_objects::{ChangeNotice, NoticeKind, NoticeLine, StateDelta, TurnResponse};
