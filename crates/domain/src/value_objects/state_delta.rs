//! Per-turn world changes reported by the game master.
//!
//! A `StateDelta` covers exactly one turn. Every field is independent and optional;
//! folding it into a [`GameState`](crate::aggregates::GameState) is the caller's job.

use serde::{Deserialize, Deserializer, Serialize};

/// Changes one turn applies to the running game state.
///
/// Collection fields keep the order the model wrote them in (that is the order a
/// change notice lists them), but the fold treats the item lists as sets. The same
/// identifier may appear in both `items_gained` and `items_lost`; nothing here
/// collapses that.
///
/// Deserialization is forgiving about the shapes models actually emit:
/// - `hp_change` is accepted as an alias of `integrity_change`; a payload carrying
///   both keys is a duplicate-field error, so the whole delta is rejected
/// - integrity may arrive as an integral float (`-5.0`) or a numeric string (`"+3"`)
/// - a list field may be `null` or a bare string instead of an array
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateDelta {
    #[serde(
        alias = "hp_change",
        deserialize_with = "lenient_integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub integrity_change: Option<i64>,
    #[serde(deserialize_with = "string_list", skip_serializing_if = "Vec::is_empty")]
    pub items_gained: Vec<String>,
    #[serde(deserialize_with = "string_list", skip_serializing_if = "Vec::is_empty")]
    pub items_lost: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(deserialize_with = "string_list", skip_serializing_if = "Vec::is_empty")]
    pub npcs_met: Vec<String>,
    #[serde(deserialize_with = "string_list", skip_serializing_if = "Vec::is_empty")]
    pub discoveries: Vec<String>,
}

impl StateDelta {
    /// An empty delta. Equivalent to "no delta".
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_integrity_change(mut self, change: i64) -> Self {
        self.integrity_change = Some(change);
        self
    }

    pub fn with_item_gained(mut self, item: impl Into<String>) -> Self {
        self.items_gained.push(item.into());
        self
    }

    pub fn with_item_lost(mut self, item: impl Into<String>) -> Self {
        self.items_lost.push(item.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_npc_met(mut self, npc: impl Into<String>) -> Self {
        self.npcs_met.push(npc.into());
        self
    }

    pub fn with_discovery(mut self, discovery: impl Into<String>) -> Self {
        self.discoveries.push(discovery.into());
        self
    }

    /// The new location, if one was reported. Blank strings count as absent.
    pub fn destination(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|location| !location.is_empty())
    }

    /// Integrity delta with absence folded to zero.
    pub fn integrity_delta(&self) -> i64 {
        self.integrity_change.unwrap_or(0)
    }

    /// True iff at least one field would change the game state.
    ///
    /// An all-empty delta must not produce a change notice.
    pub fn has_changes(&self) -> bool {
        !self.items_gained.is_empty()
            || !self.items_lost.is_empty()
            || self.destination().is_some()
            || !self.npcs_met.is_empty()
            || !self.discoveries.is_empty()
            || self.integrity_delta() != 0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntegerLike {
    Int(i64),
    Float(f64),
    Text(String),
}

fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<IntegerLike>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IntegerLike::Int(value)) => Ok(Some(value)),
        Some(IntegerLike::Float(value)) if value.is_finite() && value.fract() == 0.0 => {
            Ok(Some(value as i64))
        }
        Some(IntegerLike::Float(value)) => Err(D::Error::custom(format!(
            "integrity change must be whole, got {}",
            value
        ))),
        Some(IntegerLike::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("not an integer: {:?}", text)))
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringList {
    One(String),
    Many(Vec<String>),
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StringList>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(StringList::One(value)) if value.trim().is_empty() => Vec::new(),
        Some(StringList::One(value)) => vec![value],
        Some(StringList::Many(values)) => values,
    })
}
