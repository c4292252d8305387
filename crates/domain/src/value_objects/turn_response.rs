//! The structured interpretation of one game-master turn.

use serde::{Deserialize, Serialize};

use super::StateDelta;

/// Narrative, follow-up options, and optional state delta for a single turn.
///
/// Built fresh per decode and never mutated afterwards, so fields are private
/// and exposed read-only.
///
/// # Invariants
///
/// - `narrative` is never blank when produced by the turn decoder
/// - `options` preserves the order the model offered them in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResponse {
    narrative: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    state_changes: Option<StateDelta>,
}

impl TurnResponse {
    pub fn new(narrative: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            narrative: narrative.into(),
            options,
            state_changes: None,
        }
    }

    pub fn with_state_changes(mut self, state_changes: Option<StateDelta>) -> Self {
        self.state_changes = state_changes;
        self
    }

    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn state_changes(&self) -> Option<&StateDelta> {
        self.state_changes.as_ref()
    }

    /// Whether this turn carries a delta worth showing and folding.
    pub fn has_changes(&self) -> bool {
        self.state_changes
            .as_ref()
            .is_some_and(StateDelta::has_changes)
    }

    pub fn into_parts(self) -> (String, Vec<String>, Option<StateDelta>) {
        (self.narrative, self.options, self.state_changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_delta_does_not_count_as_changes() {
        let turn = TurnResponse::new("You wait.", vec![])
            .with_state_changes(Some(StateDelta::new()));
        assert!(turn.state_changes().is_some());
        assert!(!turn.has_changes());
    }

    #[test]
    fn populated_delta_counts_as_changes() {
        let turn = TurnResponse::new("You pocket the chip.", vec!["Leave".into()])
            .with_state_changes(Some(StateDelta::new().with_item_gained("chip")));
        assert!(turn.has_changes());
        assert_eq!(turn.options(), ["Leave".to_string()]);
    }

    #[test]
    fn serializes_without_absent_delta() {
        let turn = TurnResponse::new("Quiet.", vec!["Listen".into()]);
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"narrative": "Quiet.", "options": ["Listen"]})
        );
    }
}
