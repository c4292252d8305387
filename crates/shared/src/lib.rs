//! Storyloom Shared - Wire types exchanged with the game backend
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, chrono, and the domain crate
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Forward compatible** - Unknown enum variants deserialize to `Unknown`

pub mod messages;
pub mod responses;

pub use messages::{GameMessage, MessageRole};
pub use responses::{
    CursorPage, GameActionResponse, SessionSnapshot, SessionStatus, WireGameState,
};
