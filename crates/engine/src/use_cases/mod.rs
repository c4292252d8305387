//! Use cases - User story orchestration.
//!
//! - `turn_decoder` - recover a turn from raw model output
//! - `session` - fold decoded turns into the running game state
//! - `replay` - walk a stored transcript through a session

pub mod replay;
pub mod session;
pub mod turn_decoder;

pub use replay::{ReplayConfig, ReplayError, ReplaySummary, ReplayTranscript};
pub use session::{TurnRecord, TurnSession, TurnView};
pub use turn_decoder::{decode, decode_with_provenance, DecodeStrategy, Decoded, Isolation};
