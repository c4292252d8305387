//! Individual extraction and recovery steps of the turn decoder cascade.
//!
//! Each function is pure and independently testable. None of them log: the
//! session layer traces around the decode call instead.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Deserializer};
use storyloom_domain::StateDelta;

/// The opening `{` must sit at a character index below this for brace extraction.
/// Anything later is treated as prose followed by trailing JSON.
pub const BRACE_WINDOW_CHARS: usize = 20;

const OPTIONS_MARKER: &str = "\"options\":";

// Compiled patterns for recovery
static FENCED_JSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("valid regex"));

// The closing quote must be followed by a structural terminator, so a string
// truncated before `, "options"` does not swallow the next key's opening quote.
static NARRATIVE_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""narrative"\s*:\s*"((?:[^"\\]|\\.)*)"\s*(?:,|\}|$)"#).expect("valid regex")
});
static NARRATIVE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""narrative"\s*:\s*""#).expect("valid regex"));
static OPTIONS_ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)"options"\s*:\s*\[(.*?)\]"#).expect("valid regex"));
static QUOTED_LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).expect("valid regex"));

/// What a narrative strategy recovered, before the non-empty check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Recovered {
    pub narrative: String,
    pub options: Vec<String>,
    pub state_changes: Option<StateDelta>,
}

// =============================================================================
// Candidate isolation (steps 1 and 2)
// =============================================================================

/// Interior of the first ```` ```json ```` fenced block, trimmed.
pub(crate) fn fenced_json(raw: &str) -> Option<&str> {
    FENCED_JSON_RE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Inclusive span from the first `{` to the last `}`, if the opening brace is
/// within [`BRACE_WINDOW_CHARS`] characters of the start.
pub(crate) fn leading_brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    if text[..start].chars().count() >= BRACE_WINDOW_CHARS {
        return None;
    }
    Some(&text[start..=end])
}

// =============================================================================
// Step 3: strict structural parse
// =============================================================================

/// Schema accepted at the strict-parse boundary.
#[derive(Deserialize)]
struct TurnPayload {
    narrative: String,
    #[serde(default, deserialize_with = "string_entries")]
    options: Vec<String>,
    #[serde(default, deserialize_with = "recoverable_delta")]
    state_changes: Option<StateDelta>,
}

/// Keep only string entries; anything that is not an array counts as no options.
fn string_entries<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(entries) => entries
            .into_iter()
            .filter_map(|entry| match entry {
                serde_json::Value::String(option) => Some(option),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// A malformed delta is dropped rather than failing the whole turn.
fn recoverable_delta<'de, D>(deserializer: D) -> Result<Option<StateDelta>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

/// Parse the candidate as a JSON object with a string `narrative` key.
pub(crate) fn strict_parse(candidate: &str) -> Option<Recovered> {
    let value: serde_json::Value = serde_json::from_str(candidate).ok()?;
    if !value.is_object() {
        return None;
    }
    let payload: TurnPayload = serde_json::from_value(value).ok()?;

    Some(Recovered {
        narrative: payload.narrative,
        options: payload.options,
        state_changes: payload.state_changes,
    })
}

// =============================================================================
// Step 4: narrative-field regex recovery
// =============================================================================

/// Recover a well-formed `"narrative": "..."` value from otherwise broken JSON.
pub(crate) fn narrative_field(candidate: &str) -> Option<Recovered> {
    let body = NARRATIVE_FIELD_RE.captures(candidate)?.get(1)?.as_str();

    Some(Recovered {
        narrative: unescape_narrative(body),
        options: salvage_options(candidate),
        state_changes: None,
    })
}

// =============================================================================
// Step 5: options-boundary salvage
// =============================================================================

/// Treat everything before the `"options":` marker as the narrative body.
pub(crate) fn options_boundary(candidate: &str) -> Option<Recovered> {
    let marker = candidate.find(OPTIONS_MARKER)?;
    let mut body = candidate[..marker].trim();

    if let Some(stripped) = body.strip_suffix(',') {
        body = stripped.trim();
    }
    if let Some(stripped) = body.strip_suffix('"') {
        body = stripped;
    }

    if let Some(key) = NARRATIVE_KEY_RE.find(body) {
        body = &body[key.end()..];
    } else if let Some(stripped) = body.strip_prefix('{') {
        body = stripped.trim_start();
    }

    Some(Recovered {
        narrative: unescape_narrative(body),
        options: salvage_options(candidate),
        state_changes: None,
    })
}

// =============================================================================
// Shared recovery helpers
// =============================================================================

/// Collect the string literals of the first `"options": [...]` array, in order.
pub(crate) fn salvage_options(candidate: &str) -> Vec<String> {
    let Some(inner) = OPTIONS_ARRAY_RE
        .captures(candidate)
        .and_then(|caps| caps.get(1))
    else {
        return Vec::new();
    };

    QUOTED_LITERAL_RE
        .captures_iter(inner.as_str())
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().replace("\\\"", "\""))
        .collect()
}

/// Undo exactly three escapes: `\n`, `\"` and `\\`. Everything else is kept
/// verbatim, including other backslash sequences.
pub(crate) fn unescape_narrative(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => out.push('\n'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            _ => {
                out.push('\\');
                continue;
            }
        }
        chars.next();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_json_returns_trimmed_interior() {
        let raw = "Here you go:\n```json\n  {\"narrative\": \"x\"}  \n```\nthanks";
        assert_eq!(fenced_json(raw), Some("{\"narrative\": \"x\"}"));
    }

    #[test]
    fn fence_requires_json_tag_and_closing_marker() {
        assert_eq!(fenced_json("```\n{\"narrative\": \"x\"}\n```"), None);
        assert_eq!(fenced_json("```json\n{\"narrative\": \"x\"}"), None);
    }

    #[test]
    fn brace_span_inside_window() {
        assert_eq!(leading_brace_span("{\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(
            leading_brace_span("Sure! {\"a\":1} done"),
            Some("{\"a\":1}")
        );
    }

    #[test]
    fn brace_window_boundary_is_exactly_twenty_chars() {
        let at_nineteen = format!("{}{{\"a\":1}}", "x".repeat(19));
        let at_twenty = format!("{}{{\"a\":1}}", "x".repeat(20));
        assert_eq!(leading_brace_span(&at_nineteen), Some("{\"a\":1}"));
        assert_eq!(leading_brace_span(&at_twenty), None);
    }

    #[test]
    fn brace_window_counts_characters_not_bytes() {
        // 10 two-byte characters: 20 bytes but only 10 chars
        let text = format!("{}{{\"a\":1}}", "é".repeat(10));
        assert_eq!(leading_brace_span(&text), Some("{\"a\":1}"));
    }

    #[test]
    fn brace_span_needs_closing_after_opening() {
        assert_eq!(leading_brace_span("} then {"), None);
        assert_eq!(leading_brace_span("{ never closed"), None);
        assert_eq!(leading_brace_span("no braces"), None);
    }

    #[test]
    fn strict_parse_requires_object_with_string_narrative() {
        assert!(strict_parse(r#"["narrative", [], null]"#).is_none());
        assert!(strict_parse(r#"{"story": "x"}"#).is_none());
        assert!(strict_parse(r#"{"narrative": 42}"#).is_none());
        assert!(strict_parse("\"narrative\"").is_none());

        let recovered = strict_parse(r#"{"narrative": "x"}"#).unwrap();
        assert_eq!(recovered.narrative, "x");
        assert!(recovered.options.is_empty());
        assert!(recovered.state_changes.is_none());
    }

    #[test]
    fn strict_parse_is_lenient_about_option_and_delta_shapes() {
        let recovered =
            strict_parse(r#"{"narrative": "x", "options": ["a", 2, null, "b"], "state_changes": "none"}"#)
                .unwrap();
        assert_eq!(recovered.options, vec!["a", "b"]);
        assert!(recovered.state_changes.is_none());

        let recovered = strict_parse(
            r#"{"narrative": "x", "options": "a", "state_changes": {"items_gained": [1, 2]}}"#,
        )
        .unwrap();
        assert!(recovered.options.is_empty());
        assert!(recovered.state_changes.is_none());
    }

    #[test]
    fn conflicting_integrity_keys_drop_only_the_delta() {
        let recovered = strict_parse(
            r#"{"narrative": "x", "options": ["a"], "state_changes": {"integrity_change": 1, "hp_change": 2}}"#,
        )
        .unwrap();
        assert_eq!(recovered.narrative, "x");
        assert_eq!(recovered.options, vec!["a"]);
        assert!(recovered.state_changes.is_none());
    }

    #[test]
    fn strict_parse_lifts_delta() {
        let recovered = strict_parse(
            r#"{"narrative": "x", "state_changes": {"hp_change": -3, "location": "Roof"}}"#,
        )
        .unwrap();
        let delta = recovered.state_changes.unwrap();
        assert_eq!(delta.integrity_change, Some(-3));
        assert_eq!(delta.location.as_deref(), Some("Roof"));
    }

    #[test]
    fn narrative_field_tolerates_escapes_and_broken_tail() {
        let recovered =
            narrative_field(r#"{"narrative": "He said \"run\" \\ now", "options": ["Go"], "state_changes": {"#)
                .unwrap();
        assert_eq!(recovered.narrative, "He said \"run\" \\ now");
        assert_eq!(recovered.options, vec!["Go"]);
        assert!(recovered.state_changes.is_none());
    }

    #[test]
    fn narrative_field_needs_terminated_string() {
        assert!(narrative_field(r#"{"narrative": "You open the door., "options": ["#).is_none());
        assert!(narrative_field(r#"{"narrative": "cut off"#).is_none());
        assert!(narrative_field(r#"{"narrative": "ends here""#).is_some());
    }

    #[test]
    fn options_boundary_strips_key_prefix() {
        let recovered = options_boundary(r#"{"narrative": "You open the door., "options": ["#).unwrap();
        assert_eq!(recovered.narrative, "You open the door.");
        assert!(recovered.options.is_empty());
    }

    #[test]
    fn options_boundary_strips_single_leading_brace() {
        let recovered =
            options_boundary("{  The hall is dark.\\nA light flickers.\", \"options\": [\"Wait\"]").unwrap();
        assert_eq!(recovered.narrative, "The hall is dark.\nA light flickers.");
        assert_eq!(recovered.options, vec!["Wait"]);
    }

    #[test]
    fn options_boundary_requires_marker_without_space() {
        assert!(options_boundary(r#"text "options" : ["a"]"#).is_none());
        assert!(options_boundary("no marker at all").is_none());
    }

    #[test]
    fn salvage_options_reads_first_array_in_order() {
        let options = salvage_options(r#""options": ["Say \"hi\"", "Leave"] , "options": ["Other"]"#);
        assert_eq!(options, vec!["Say \"hi\"", "Leave"]);
        assert!(salvage_options(r#""options": "#).is_empty());
    }

    #[test]
    fn salvage_options_spans_lines() {
        let options = salvage_options("\"options\": [\n  \"North\",\n  \"South\"\n]");
        assert_eq!(options, vec!["North", "South"]);
    }

    #[test]
    fn unescape_handles_only_three_sequences() {
        assert_eq!(unescape_narrative(r#"a\nb"#), "a\nb");
        assert_eq!(unescape_narrative(r#"\"q\""#), "\"q\"");
        assert_eq!(unescape_narrative(r#"c:\\dir"#), "c:\\dir");
        assert_eq!(unescape_narrative(r#"tab\there"#), "tab\\there");
        assert_eq!(unescape_narrative(r#"\u00e9"#), "\\u00e9");
        assert_eq!(unescape_narrative(r#"\\n"#), "\\n");
        assert_eq!(unescape_narrative("trailing\\"), "trailing\\");
    }
}
