//! Aggregate roots - domain objects that own their related data
//!
//! Aggregates expose behavior through methods, not public fields. Restoring
//! persisted state goes through `::new()` plus builder methods.

pub mod game_state;

pub use game_state::GameState;
