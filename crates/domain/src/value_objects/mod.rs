//! Value objects - Immutable objects defined by their attributes

mod change_notice;
mod state_delta;
mod turn_response;

// Per-turn world changes and their player-facing summary
pub use change_notice::{ChangeNotice, NoticeKind, NoticeLine};
pub use state_delta::StateDelta;

// Decoded game-master turn
pub use turn_response::TurnResponse;
