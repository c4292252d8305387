//! Player-facing summary of what a turn changed.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::StateDelta;

/// Kind of a single notice line, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Acquired,
    Lost,
    Location,
    Contact,
    Discovery,
    IntegrityGain,
    IntegrityLoss,
}

impl NoticeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Acquired => "ACQUIRED",
            Self::Lost => "LOST",
            Self::Location => "LOCATION",
            Self::Contact => "CONTACT",
            Self::Discovery => "DATA",
            Self::IntegrityGain | Self::IntegrityLoss => "INTEGRITY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeLine {
    pub kind: NoticeKind,
    pub text: String,
}

impl fmt::Display for NoticeLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NoticeKind::IntegrityGain | NoticeKind::IntegrityLoss => {
                write!(f, "{} {}", self.text, self.kind.label())
            }
            _ => write!(f, "{}: {}", self.kind.label(), self.text),
        }
    }
}

/// Ordered notice lines for a delta that has changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotice {
    lines: Vec<NoticeLine>,
}

impl ChangeNotice {
    /// Build the notice for `delta`, or `None` when it has no changes.
    pub fn from_delta(delta: &StateDelta) -> Option<Self> {
        if !delta.has_changes() {
            return None;
        }

        let location = delta.destination().map(|location| NoticeLine {
            kind: NoticeKind::Location,
            text: location.to_string(),
        });

        let mut lines: Vec<NoticeLine> = [
            list_line(NoticeKind::Acquired, &delta.items_gained),
            list_line(NoticeKind::Lost, &delta.items_lost),
            location,
            list_line(NoticeKind::Contact, &delta.npcs_met),
            list_line(NoticeKind::Discovery, &delta.discoveries),
        ]
        .into_iter()
        .flatten()
        .collect();

        match delta.integrity_delta() {
            0 => {}
            change if change > 0 => lines.push(NoticeLine {
                kind: NoticeKind::IntegrityGain,
                text: format!("+{}", change),
            }),
            change => lines.push(NoticeLine {
                kind: NoticeKind::IntegrityLoss,
                text: change.to_string(),
            }),
        }

        Some(Self { lines })
    }

    pub fn lines(&self) -> &[NoticeLine] {
        &self.lines
    }
}

fn list_line(kind: NoticeKind, values: &[String]) -> Option<NoticeLine> {
    (!values.is_empty()).then(|| NoticeLine {
        kind,
        text: values.join(", "),
    })
}

impl fmt::Display for ChangeNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", line)?;
        }
        Ok(())
    }
}
