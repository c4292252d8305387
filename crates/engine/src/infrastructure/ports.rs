//! Port traits for infrastructure boundaries.
//!
//! The transcript source is the only abstraction in the engine: it could be a
//! file today and the backend's message-history endpoint tomorrow.

use async_trait::async_trait;
use storyloom_shared::{CursorPage, GameMessage};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("Transcript I/O error for {path}: {message}")]
    Io { path: String, message: String },
    #[error("Malformed transcript: {0}")]
    Malformed(String),
    #[error("Unknown page cursor: {0}")]
    UnknownCursor(String),
    #[error("Page reports more history but no cursor to fetch it")]
    MissingCursor,
    #[error("Page cursor {0} was already visited")]
    RepeatedCursor(String),
}

impl TranscriptError {
    pub fn io(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Transcript Port
// =============================================================================

/// Source of a session's message history, one cursor page at a time.
///
/// Pages are returned newest-first, as the backend history endpoint serves them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Load the page at `cursor`; `None` requests the first (newest) page.
    async fn load_page(
        &self,
        cursor: Option<String>,
    ) -> Result<CursorPage<GameMessage>, TranscriptError>;
}
