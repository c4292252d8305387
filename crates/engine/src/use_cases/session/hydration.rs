//! Conversion between the backend's session snapshot and the domain state.

use storyloom_domain::{DomainError, GameState};
use storyloom_shared::{SessionSnapshot, WireGameState};

/// Integrity figures tracked client-side; the backend snapshot does not carry them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrityStats {
    pub current: i64,
    pub max: i64,
}

impl IntegrityStats {
    /// Integrity at its maximum, as at the start of a session.
    pub fn full(max: i64) -> Self {
        Self { current: max, max }
    }
}

/// Build a [`GameState`] from a backend snapshot.
///
/// A blank `current_location` is treated as unknown. Duplicate items in the
/// snapshot inventory collapse to one.
pub fn state_from_snapshot(
    snapshot: &SessionSnapshot,
    integrity: IntegrityStats,
) -> Result<GameState, DomainError> {
    let wire = &snapshot.game_state;

    Ok(GameState::new(integrity.max)?
        .with_integrity(integrity.current)
        .with_inventory(wire.items.iter().cloned())
        .with_current_location(Some(snapshot.current_location.clone()))
        .with_visited_locations(wire.visited_locations.clone())
        .with_met_npcs(wire.met_npcs.clone())
        .with_discoveries(wire.discoveries.clone()))
}

/// Project a [`GameState`] back onto the backend's wire shape.
pub fn state_to_wire(state: &GameState) -> WireGameState {
    WireGameState {
        items: state.inventory().to_vec(),
        visited_locations: state.visited_locations().to_vec(),
        met_npcs: state.met_npcs().to_vec(),
        discoveries: state.discoveries().to_vec(),
    }
}
