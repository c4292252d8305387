//! Resilient decoder for game-master turn responses.
//!
//! The model is asked for a JSON object with `narrative`, `options` and
//! `state_changes`, but what comes back may be fenced, wrapped in prose,
//! truncated or badly escaped. Decoding runs a fixed cascade:
//!
//! 1. Isolate a candidate: the interior of a ```` ```json ```` fence, else the
//!    `{...}` span when the first brace opens within 20 characters, else the
//!    whole input.
//! 2. Try, in order, on that candidate:
//!    - strict JSON parse (the only step that can yield `state_changes`)
//!    - regex recovery of a terminated `"narrative": "..."` value
//!    - salvage of everything before an `"options":` marker
//!
//! The first step producing non-blank narrative wins. When the narrative came
//! from a recovery step, options are salvaged separately from the first
//! `"options": [...]` array. Nothing here panics, logs, or keeps state.

mod strategies;


use std::fmt;

use storyloom_domain::TurnResponse;

use strategies::Recovered;

pub use strategies::BRACE_WINDOW_CHARS;

/// How the candidate text was cut out of the raw response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Isolation {
    FencedBlock,
    BraceSpan,
    FullText,
}

/// Which step of the cascade produced the narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeStrategy {
    StrictParse,
    NarrativeField,
    OptionsBoundary,
}

impl DecodeStrategy {
    /// Whether this result went through full structural validation.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::StrictParse)
    }
}

impl fmt::Display for DecodeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrictParse => write!(f, "strict_parse"),
            Self::NarrativeField => write!(f, "narrative_field"),
            Self::OptionsBoundary => write!(f, "options_boundary"),
        }
    }
}

impl fmt::Display for Isolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FencedBlock => write!(f, "fenced_block"),
            Self::BraceSpan => write!(f, "brace_span"),
            Self::FullText => write!(f, "full_text"),
        }
    }
}

/// A decoded turn together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub response: TurnResponse,
    pub isolation: Isolation,
    pub strategy: DecodeStrategy,
}

type StrategyFn = fn(&str) -> Option<Recovered>;

/// Narrative strategies in strict precedence order.
const STRATEGIES: [(DecodeStrategy, StrategyFn); 3] = [
    (DecodeStrategy::StrictParse, strategies::strict_parse),
    (DecodeStrategy::NarrativeField, strategies::narrative_field),
    (DecodeStrategy::OptionsBoundary, strategies::options_boundary),
];

/// Decode one raw turn response.
///
/// Returns `None` only when no strategy recovers non-blank narrative; callers
/// then show `raw` verbatim with no options.
pub fn decode(raw: &str) -> Option<TurnResponse> {
    decode_with_provenance(raw).map(|decoded| decoded.response)
}

/// Like [`decode`], but also reports which isolation and strategy succeeded.
pub fn decode_with_provenance(raw: &str) -> Option<Decoded> {
    let (isolation, candidate) = isolate_candidate(raw);

    STRATEGIES.iter().find_map(|(strategy, run)| {
        let recovered = run(candidate)?;
        if recovered.narrative.trim().is_empty() {
            return None;
        }

        let response = TurnResponse::new(recovered.narrative, recovered.options)
            .with_state_changes(recovered.state_changes);

        Some(Decoded {
            response,
            isolation,
            strategy: *strategy,
        })
    })
}

fn isolate_candidate(raw: &str) -> (Isolation, &str) {
    if let Some(interior) = strategies::fenced_json(raw) {
        return (Isolation::FencedBlock, interior);
    }
    if let Some(span) = strategies::leading_brace_span(raw) {
        return (Isolation::BraceSpan, span);
    }
    (Isolation::FullText, raw)
}
