//! GameState aggregate - the running world state a session folds deltas into
//!
//! # Fold semantics
//!
//! Each field of a [`StateDelta`] folds independently:
//! - integrity is additive and unclamped (going negative or past max is caller policy)
//! - inventory becomes `(inventory ∪ gained) − lost` in one update, so a loss
//!   always beats a same-turn gain
//! - a reported location replaces the current one and is appended once to the
//!   visited log
//! - met NPCs and discoveries are appended without deduplication against history
//!
//! Deltas must be folded in the order turns were produced.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::value_objects::StateDelta;
use crate::DomainError;

/// Caller-owned world state for one play session.
///
/// # Invariants
///
/// - `max_integrity` is always positive (enforced by `new`)
/// - `inventory` never holds the same identifier twice
///
/// # Example
///
/// ```
/// use storyloom_domain::{GameState, StateDelta};
///
/// let mut state = GameState::new(100).unwrap();
/// state.apply(&StateDelta::new().with_location("Docks").with_integrity_change(-5));
///
/// assert_eq!(state.current_location(), Some("Docks"));
/// assert_eq!(state.integrity(), 95);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    inventory: Vec<String>,
    current_location: Option<String>,
    visited_locations: Vec<String>,
    met_npcs: Vec<String>,
    discoveries: Vec<String>,
    integrity: i64,
    max_integrity: i64,
}

impl GameState {
    // =========================================================================
    // Constructor
    // =========================================================================

    /// Create a fresh state at full integrity.
    pub fn new(max_integrity: i64) -> Result<Self, DomainError> {
        if max_integrity <= 0 {
            return Err(DomainError::validation(format!(
                "max integrity must be positive, got {}",
                max_integrity
            )));
        }

        Ok(Self {
            inventory: Vec::new(),
            current_location: None,
            visited_locations: Vec::new(),
            met_npcs: Vec::new(),
            discoveries: Vec::new(),
            integrity: max_integrity,
            max_integrity,
        })
    }

    // =========================================================================
    // Builder methods (for restoring a saved session)
    // =========================================================================

    pub fn with_integrity(mut self, integrity: i64) -> Self {
        self.integrity = integrity;
        self
    }

    /// Restore an inventory. Duplicate identifiers are dropped, keeping the first.
    pub fn with_inventory(mut self, items: impl IntoIterator<Item = String>) -> Self {
        self.inventory.clear();
        for item in items {
            if !self.inventory.contains(&item) {
                self.inventory.push(item);
            }
        }
        self
    }

    pub fn with_current_location(mut self, location: Option<String>) -> Self {
        self.current_location = location.filter(|l| !l.trim().is_empty());
        self
    }

    pub fn with_visited_locations(mut self, visited: Vec<String>) -> Self {
        self.visited_locations = visited;
        self
    }

    pub fn with_met_npcs(mut self, npcs: Vec<String>) -> Self {
        self.met_npcs = npcs;
        self
    }

    pub fn with_discoveries(mut self, discoveries: Vec<String>) -> Self {
        self.discoveries = discoveries;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn inventory(&self) -> &[String] {
        &self.inventory
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.inventory.iter().any(|held| held == item)
    }

    pub fn current_location(&self) -> Option<&str> {
        self.current_location.as_deref()
    }

    pub fn visited_locations(&self) -> &[String] {
        &self.visited_locations
    }

    /// The last `count` visited locations, oldest first.
    pub fn recent_path(&self, count: usize) -> &[String] {
        let start = self.visited_locations.len().saturating_sub(count);
        &self.visited_locations[start..]
    }

    pub fn met_npcs(&self) -> &[String] {
        &self.met_npcs
    }

    pub fn discoveries(&self) -> &[String] {
        &self.discoveries
    }

    pub fn integrity(&self) -> i64 {
        self.integrity
    }

    pub fn max_integrity(&self) -> i64 {
        self.max_integrity
    }

    // =========================================================================
    // Fold
    // =========================================================================

    /// Fold one turn's delta into this state.
    ///
    /// Integrity saturates at the `i64` bounds; the model controls the change.
    pub fn apply(&mut self, delta: &StateDelta) {
        self.integrity = self.integrity.saturating_add(delta.integrity_delta());
        self.fold_inventory(delta);

        if let Some(location) = delta.destination() {
            self.current_location = Some(location.to_string());
            self.visited_locations.push(location.to_string());
        }

        self.met_npcs.extend(delta.npcs_met.iter().cloned());
        self.discoveries.extend(delta.discoveries.iter().cloned());
    }

    /// Consuming variant of [`apply`](Self::apply).
    pub fn folded(mut self, delta: &StateDelta) -> Self {
        self.apply(delta);
        self
    }

    fn fold_inventory(&mut self, delta: &StateDelta) {
        let lost: HashSet<&str> = delta.items_lost.iter().map(String::as_str).collect();

        for item in &delta.items_gained {
            if !self.inventory.contains(item) {
                self.inventory.push(item.clone());
            }
        }
        self.inventory.retain(|item| !lost.contains(item.as_str()));
    }
}
