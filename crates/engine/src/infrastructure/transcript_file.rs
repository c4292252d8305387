//! File-backed transcript source.
//!
//! Reads a saved message history from a JSON file. Three shapes are accepted:
//! - a single history page: `{"items": [...], "has_more": false}`
//! - a list of pages, newest page first
//! - a bare list of messages, treated as one page
//!
//! Messages within a page are newest-first, as the history endpoint serves
//! them. Pages are addressed by position; the cursor is the page index.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use storyloom_shared::{CursorPage, GameMessage};

use super::ports::{TranscriptError, TranscriptSource};

#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptFile {
    Page(CursorPage<GameMessage>),
    Pages(Vec<CursorPage<GameMessage>>),
    Messages(Vec<GameMessage>),
}

impl TranscriptFile {
    fn into_pages(self) -> Vec<Vec<GameMessage>> {
        match self {
            Self::Page(page) => vec![page.items],
            Self::Pages(pages) if pages.is_empty() => vec![Vec::new()],
            Self::Pages(pages) => pages.into_iter().map(|page| page.items).collect(),
            Self::Messages(messages) => vec![messages],
        }
    }
}

pub struct FileTranscriptSource {
    path: PathBuf,
}

impl FileTranscriptSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_pages(&self) -> Result<Vec<Vec<GameMessage>>, TranscriptError> {
        let display = self.path.display().to_string();

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| TranscriptError::io(display.as_str(), e))?;

        let file: TranscriptFile = serde_json::from_str(&contents).map_err(|e| {
            TranscriptError::Malformed(format!("{}: not a message history ({})", display, e))
        })?;

        Ok(file.into_pages())
    }
}

fn page_index(cursor: Option<&str>) -> Result<usize, TranscriptError> {
    match cursor {
        None => Ok(0),
        Some(raw) => raw
            .parse()
            .map_err(|_| TranscriptError::UnknownCursor(raw.to_string())),
    }
}

#[async_trait]
impl TranscriptSource for FileTranscriptSource {
    async fn load_page(
        &self,
        cursor: Option<String>,
    ) -> Result<CursorPage<GameMessage>, TranscriptError> {
        let index = page_index(cursor.as_deref())?;
        let mut pages = self.read_pages().await?;
        let total = pages.len();

        if index >= total {
            return Err(TranscriptError::UnknownCursor(index.to_string()));
        }

        let items = pages.swap_remove(index);
        let has_more = index + 1 < total;

        tracing::debug!(
            path = %self.path.display(),
            page = index,
            messages = items.len(),
            has_more,
            "Loaded transcript page"
        );

        Ok(CursorPage {
            items,
            next_cursor: has_more.then(|| (index + 1).to_string()),
            has_more,
        })
    }
}
