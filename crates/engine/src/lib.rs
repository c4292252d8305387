//! Storyloom Engine library.
//!
//! Client-side turn handling for Storyloom sessions: decoding game-master
//! responses, folding state changes, and replaying stored transcripts.
//!
//! ## Structure
//!
//! - `use_cases/` - Turn decoding, session folding, transcript replay
//! - `infrastructure/` - Configuration and transcript sources (ports + adapters)

pub mod infrastructure;
pub mod use_cases;
