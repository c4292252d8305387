//! Transcript replay use case.
//!
//! Walks a session's paginated message history and feeds it, oldest first,
//! through a [`TurnSession`], reporting how every game-master turn decoded.

use std::collections::HashSet;
use std::sync::Arc;

use storyloom_domain::{DomainError, GameState};
use storyloom_shared::GameMessage;

use crate::infrastructure::ports::{TranscriptError, TranscriptSource};
use crate::use_cases::session::TurnSession;
use crate::use_cases::turn_decoder::DecodeStrategy;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Failed to load transcript: {0}")]
    Transcript(#[from] TranscriptError),

    #[error("Invalid session settings: {0}")]
    Domain(#[from] DomainError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayConfig {
    pub max_turns: u32,
    pub max_integrity: i64,
}

/// Outcome of a replay.
#[derive(Debug, Clone)]
pub struct ReplaySummary {
    pub session: TurnSession,
    pub pages: usize,
    pub messages: usize,
    /// Game-master turns decoded by strict parsing
    pub structured_turns: usize,
    /// Game-master turns recovered by a regex strategy
    pub recovered_turns: usize,
    /// Game-master turns shown as raw text
    pub raw_turns: usize,
}

/// Replays a stored transcript through a fresh turn session.
pub struct ReplayTranscript {
    source: Arc<dyn TranscriptSource>,
    config: ReplayConfig,
}

impl ReplayTranscript {
    pub fn new(source: Arc<dyn TranscriptSource>, config: ReplayConfig) -> Self {
        Self { source, config }
    }

    pub async fn execute(&self) -> Result<ReplaySummary, ReplayError> {
        let state = GameState::new(self.config.max_integrity)?;
        let (messages, pages) = self.load_history().await?;

        let mut session = TurnSession::new(state, self.config.max_turns);
        let mut structured_turns = 0;
        let mut recovered_turns = 0;
        let mut raw_turns = 0;

        for message in &messages {
            let record = session.ingest_message(message);
            if !record.role().is_game_master() {
                continue;
            }
            match record.strategy() {
                Some(DecodeStrategy::StrictParse) => structured_turns += 1,
                Some(_) => recovered_turns += 1,
                None => raw_turns += 1,
            }
        }

        tracing::info!(
            pages,
            messages = messages.len(),
            structured_turns,
            recovered_turns,
            raw_turns,
            "Transcript replayed"
        );

        Ok(ReplaySummary {
            session,
            pages,
            messages: messages.len(),
            structured_turns,
            recovered_turns,
            raw_turns,
        })
    }

    /// Load every page and return the messages oldest-first with the page count.
    ///
    /// A cursor seen twice means the source is looping and fails the walk.
    async fn load_history(&self) -> Result<(Vec<GameMessage>, usize), TranscriptError> {
        let mut newest_first = Vec::new();
        let mut seen_cursors = HashSet::new();
        let mut cursor = None;
        let mut pages = 0;

        loop {
            let page = self.source.load_page(cursor.take()).await?;
            pages += 1;
            newest_first.extend(page.items);

            if !page.has_more {
                break;
            }
            let next = page.next_cursor.ok_or(TranscriptError::MissingCursor)?;
            if !seen_cursors.insert(next.clone()) {
                return Err(TranscriptError::RepeatedCursor(next));
            }
            cursor = Some(next);
        }

        newest_first.reverse();
        Ok((newest_first, pages))
    }
}
