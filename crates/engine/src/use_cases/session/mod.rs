//! Session use cases.
//!
//! Turn ingestion, state folding, and snapshot hydration.

mod hydration;
mod turn_session;

pub use hydration::{state_from_snapshot, state_to_wire, IntegrityStats};
pub use turn_session::{TurnRecord, TurnSession, TurnView};
