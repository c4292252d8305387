//! Turn session - the caller side of the decoder.
//!
//! Decodes each game-master turn, folds its state delta into the running
//! [`GameState`], and keeps the ordered record the player sees.

use storyloom_domain::{ChangeNotice, DomainError, GameState};
use storyloom_shared::{GameActionResponse, GameMessage, MessageRole, SessionSnapshot, SessionStatus};
use tracing::instrument;

use super::hydration::{state_from_snapshot, IntegrityStats};
use crate::use_cases::turn_decoder::{self, DecodeStrategy, Isolation};

/// Fraction of the turn budget after which the session is nearing its end.
const NEARING_END_RATIO: f64 = 0.8;

// =============================================================================
// Records
// =============================================================================

/// One entry in the session's display history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRecord {
    role: MessageRole,
    narrative: String,
    options: Vec<String>,
    notice: Option<ChangeNotice>,
    provenance: Option<(Isolation, DecodeStrategy)>,
}

impl TurnRecord {
    fn verbatim(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            narrative: text.into(),
            options: Vec::new(),
            notice: None,
            provenance: None,
        }
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn notice(&self) -> Option<&ChangeNotice> {
        self.notice.as_ref()
    }

    /// Decoder step that produced this turn, if it was decoded at all.
    pub fn strategy(&self) -> Option<DecodeStrategy> {
        self.provenance.map(|(_, strategy)| strategy)
    }

    pub fn isolation(&self) -> Option<Isolation> {
        self.provenance.map(|(isolation, _)| isolation)
    }

    /// Whether this is a game-master turn shown as raw text because decoding failed.
    pub fn is_raw_fallback(&self) -> bool {
        self.role.is_game_master() && self.provenance.is_none()
    }
}

/// Presentation view of a [`TurnRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnView<'a> {
    pub role: MessageRole,
    pub narrative: &'a str,
    pub options: &'a [String],
    pub notice: Option<&'a ChangeNotice>,
    /// Options may be chosen only on the latest game-master turn of a live session
    pub selectable: bool,
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug, Clone)]
pub struct TurnSession {
    state: GameState,
    turn_count: u32,
    max_turns: u32,
    ended: bool,
    records: Vec<TurnRecord>,
}

impl TurnSession {
    pub fn new(state: GameState, max_turns: u32) -> Self {
        Self {
            state,
            turn_count: 0,
            max_turns,
            ended: false,
            records: Vec::new(),
        }
    }

    /// Resume counting from turns already played.
    pub fn with_turn_count(mut self, turn_count: u32) -> Self {
        self.turn_count = turn_count;
        self
    }

    /// Rebuild a session from a backend snapshot.
    ///
    /// Sessions the backend no longer reports as active start out over.
    pub fn from_snapshot(
        snapshot: &SessionSnapshot,
        integrity: IntegrityStats,
    ) -> Result<Self, DomainError> {
        let state = state_from_snapshot(snapshot, integrity)?;
        let mut session = Self::new(state, snapshot.max_turns).with_turn_count(snapshot.turn_count);
        session.ended = matches!(
            snapshot.status,
            SessionStatus::Completed | SessionStatus::Abandoned
        );
        Ok(session)
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Decode one raw game-master turn and fold its changes.
    ///
    /// Unrecoverable text is kept verbatim with no options.
    pub fn ingest(&mut self, raw: &str) -> &TurnRecord {
        let index = self.record_turn(MessageRole::System, raw);
        &self.records[index]
    }

    /// Ingest a history entry. Everything except player input is decoded as a
    /// game-master turn under its own role; player input is shown as written
    /// and does not advance the turn count.
    pub fn ingest_message(&mut self, message: &GameMessage) -> &TurnRecord {
        if message.role.is_game_master() {
            let index = self.record_turn(message.role, &message.content);
            return &self.records[index];
        }

        self.records
            .push(TurnRecord::verbatim(message.role, message.content.as_str()));
        &self.records[self.records.len() - 1]
    }

    /// Ingest the backend's reply to a submitted action.
    ///
    /// The reply's turn counters are authoritative and replace the local count.
    pub fn ingest_action_response(&mut self, response: &GameActionResponse) -> &TurnRecord {
        let index = self.record_turn(MessageRole::System, &response.raw_turn_text());
        self.turn_count = response.turn_count;
        self.max_turns = response.max_turns;
        self.ended |= response.is_ending;
        &self.records[index]
    }

    #[instrument(
        skip(self, raw),
        fields(turn = self.turn_count.saturating_add(1), raw_len = raw.len())
    )]
    fn record_turn(&mut self, role: MessageRole, raw: &str) -> usize {
        let record = match turn_decoder::decode_with_provenance(raw) {
            Some(decoded) => {
                if decoded.strategy.is_structured() {
                    tracing::debug!(
                        strategy = %decoded.strategy,
                        isolation = %decoded.isolation,
                        "Decoded turn"
                    );
                } else {
                    tracing::info!(
                        strategy = %decoded.strategy,
                        isolation = %decoded.isolation,
                        "Recovered turn from malformed response; state changes dropped"
                    );
                }

                let provenance = Some((decoded.isolation, decoded.strategy));
                let (narrative, options, delta) = decoded.response.into_parts();

                let notice = match delta {
                    Some(delta) if delta.has_changes() => {
                        self.state.apply(&delta);
                        ChangeNotice::from_delta(&delta)
                    }
                    _ => None,
                };

                TurnRecord {
                    role,
                    narrative,
                    options,
                    notice,
                    provenance,
                }
            }
            None => {
                tracing::warn!("Turn response unrecoverable; showing raw text");
                TurnRecord::verbatim(role, raw)
            }
        };

        self.turn_count = self.turn_count.saturating_add(1);
        self.records.push(record);
        self.records.len() - 1
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    pub fn records(&self) -> &[TurnRecord] {
        &self.records
    }

    pub fn is_nearing_end(&self) -> bool {
        f64::from(self.turn_count) >= f64::from(self.max_turns) * NEARING_END_RATIO
    }

    pub fn is_over(&self) -> bool {
        self.ended || self.turn_count >= self.max_turns
    }

    /// The last `count` visited locations, oldest first.
    pub fn recent_path(&self, count: usize) -> &[String] {
        self.state.recent_path(count)
    }

    /// Display views of every record, in order.
    pub fn views(&self) -> Vec<TurnView<'_>> {
        let latest_turn = self
            .records
            .iter()
            .rposition(|record| record.role.is_game_master());
        let live = !self.is_over();

        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| TurnView {
                role: record.role,
                narrative: &record.narrative,
                options: &record.options,
                notice: record.notice.as_ref(),
                selectable: live && latest_turn == Some(index),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use storyloom_domain::{CharacterId, NoticeKind, ScenarioId, SessionId};
    use storyloom_shared::WireGameState;

    fn session(max_turns: u32) -> TurnSession {
        TurnSession::new(GameState::new(100).unwrap(), max_turns)
    }

    fn message(id: &str, role: MessageRole, content: &str) -> GameMessage {
        let created_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        GameMessage::new(id, role, content, created_at)
    }

    const DOCKS_TURN: &str = r#"{"narrative": "Fog rolls over the docks.", "options": ["Board the ship", "Head inland"], "state_changes": {"location": "Docks", "items_gained": ["rusty key"]}}"#;
    const MARKET_TURN: &str = r#"```json
{"narrative": "Stalls crowd the square.", "options": ["Haggle"], "state_changes": {"location": "Market", "hp_change": -10, "items_lost": ["rusty key"]}}
```"#;

    #[test]
    fn folds_changes_across_turns() {
        let mut session = session(30);

        let first = session.ingest(DOCKS_TURN);
        assert_eq!(first.narrative(), "Fog rolls over the docks.");
        assert_eq!(first.strategy(), Some(DecodeStrategy::StrictParse));
        assert!(session.state().has_item("rusty key"));

        let second = session.ingest(MARKET_TURN);
        assert_eq!(second.isolation(), Some(Isolation::FencedBlock));

        let state = session.state();
        assert_eq!(state.current_location(), Some("Market"));
        assert_eq!(state.visited_locations(), ["Docks", "Market"]);
        assert!(!state.has_item("rusty key"));
        assert_eq!(state.integrity(), 90);
        assert_eq!(session.turn_count(), 2);
    }

    #[test]
    fn notice_is_attached_only_when_something_changed() {
        let mut session = session(30);

        let record = session.ingest(DOCKS_TURN);
        let notice = record.notice().unwrap();
        let kinds: Vec<NoticeKind> = notice.lines().iter().map(|line| line.kind).collect();
        assert_eq!(kinds, vec![NoticeKind::Acquired, NoticeKind::Location]);

        let quiet = session.ingest(r#"{"narrative": "Nothing stirs.", "options": [], "state_changes": {}}"#);
        assert!(quiet.notice().is_none());
    }

    #[test]
    fn unrecoverable_turn_shows_raw_text() {
        let mut session = session(30);
        let raw = "The model rambled without any structure.";

        let record = session.ingest(raw);
        assert_eq!(record.narrative(), raw);
        assert!(record.options().is_empty());
        assert!(record.is_raw_fallback());
        assert_eq!(session.turn_count(), 1);
        assert_eq!(session.state().integrity(), 100);
    }

    #[test]
    fn recovered_turn_never_changes_state() {
        let mut session = session(30);
        let raw = "{\"narrative\": \"Line one\nline two\", \"options\": [\"Go\"], \"state_changes\": {\"location\": \"Vault\"}}";

        let record = session.ingest(raw);
        assert_eq!(record.strategy(), Some(DecodeStrategy::NarrativeField));
        assert_eq!(record.options(), ["Go"]);
        assert!(record.notice().is_none());
        assert_eq!(session.state().current_location(), None);
    }

    #[test]
    fn player_messages_pass_through_verbatim() {
        let mut session = session(30);
        let text = r#"{"narrative": "I am not decoded"}"#;

        let record = session.ingest_message(&message("m-1", MessageRole::User, text));
        assert_eq!(record.narrative(), text);
        assert!(!record.is_raw_fallback());
        assert_eq!(session.turn_count(), 0);

        session.ingest_message(&message("m-2", MessageRole::System, DOCKS_TURN));
        assert_eq!(session.turn_count(), 1);
        assert_eq!(session.records().len(), 2);
    }

    #[test]
    fn assistant_messages_are_decoded_as_game_master_turns() {
        let mut session = session(30);
        let content = r#"{"narrative": "Rain falls.", "options": ["Wait"], "state_changes": {"location": "Docks"}}"#;

        let record = session.ingest_message(&message("m-1", MessageRole::Assistant, content));
        assert_eq!(record.role(), MessageRole::Assistant);
        assert_eq!(record.narrative(), "Rain falls.");
        assert_eq!(record.options(), ["Wait"]);
        assert!(record.notice().is_some());
        assert_eq!(session.state().current_location(), Some("Docks"));
        assert_eq!(session.turn_count(), 1);
        assert!(session.views()[0].selectable);
    }

    #[test]
    fn unknown_role_falls_back_to_raw_text_under_its_role() {
        let mut session = session(30);
        let record = session.ingest_message(&message("m-1", MessageRole::Unknown, "static"));
        assert_eq!(record.role(), MessageRole::Unknown);
        assert!(record.is_raw_fallback());
        assert_eq!(session.turn_count(), 1);
    }

    #[test]
    fn huge_integrity_change_saturates_instead_of_panicking() {
        let mut session = session(30);
        session.ingest(r#"{"narrative":"A surge.","options":[],"state_changes":{"hp_change":9223372036854775807}}"#);
        let record = session.ingest(r#"{"narrative":"Another.","options":[],"state_changes":{"hp_change":9223372036854775807}}"#);

        assert_eq!(record.narrative(), "Another.");
        assert_eq!(session.state().integrity(), i64::MAX);
    }

    #[test]
    fn turn_count_saturates_at_the_counter_limit() {
        let mut session = session(30).with_turn_count(u32::MAX);
        session.ingest(DOCKS_TURN);
        assert_eq!(session.turn_count(), u32::MAX);
        assert!(session.is_over());
    }

    #[test]
    fn action_response_counters_are_authoritative() {
        let mut session = session(30);
        let response = GameActionResponse {
            message: message("m-9", MessageRole::System, DOCKS_TURN),
            narrative: String::new(),
            options: Vec::new(),
            turn_count: 12,
            max_turns: 20,
            is_ending: false,
            state_changes: None,
        };

        let record = session.ingest_action_response(&response);
        assert_eq!(record.narrative(), "Fog rolls over the docks.");
        assert_eq!(session.turn_count(), 12);
        assert_eq!(session.max_turns(), 20);
        assert!(!session.is_over());

        let ending = GameActionResponse {
            is_ending: true,
            turn_count: 13,
            ..response
        };
        session.ingest_action_response(&ending);
        assert!(session.is_over());
    }

    #[test]
    fn nearing_end_at_eighty_percent() {
        let mut session = session(10).with_turn_count(7);
        assert!(!session.is_nearing_end());

        session.ingest(DOCKS_TURN);
        assert!(session.is_nearing_end());
        assert!(!session.is_over());

        session = session.with_turn_count(10);
        assert!(session.is_over());
    }

    #[test]
    fn only_latest_game_master_turn_is_selectable() {
        let mut session = session(30);
        session.ingest(DOCKS_TURN);
        session.ingest_message(&message("m-2", MessageRole::User, "Board the ship"));
        session.ingest(MARKET_TURN);
        session.ingest_message(&message("m-4", MessageRole::User, "Haggle"));

        let selectable: Vec<bool> = session.views().iter().map(|view| view.selectable).collect();
        assert_eq!(selectable, vec![false, false, true, false]);
        assert_eq!(session.views()[2].options, ["Haggle"]);
    }

    #[test]
    fn nothing_is_selectable_once_over() {
        let mut session = session(1);
        session.ingest(DOCKS_TURN);
        assert!(session.is_over());
        assert!(session.views().iter().all(|view| !view.selectable));
    }

    #[test]
    fn recent_path_limits_to_latest_locations() {
        let mut session = session(30);
        for location in ["A", "B", "C", "D", "E", "F"] {
            session.ingest(&format!(
                r#"{{"narrative": "You reach {0}.", "options": [], "state_changes": {{"location": "{0}"}}}}"#,
                location
            ));
        }
        assert_eq!(session.recent_path(5), ["B", "C", "D", "E", "F"]);
    }

    #[test]
    fn completed_snapshot_starts_over() {
        let snapshot = SessionSnapshot {
            id: SessionId::new(),
            character_id: CharacterId::new(),
            scenario_id: ScenarioId::new(),
            current_location: "Docks".into(),
            game_state: WireGameState::default(),
            status: SessionStatus::Completed,
            turn_count: 5,
            max_turns: 30,
        };

        let session = TurnSession::from_snapshot(&snapshot, IntegrityStats::full(100)).unwrap();
        assert_eq!(session.turn_count(), 5);
        assert!(session.is_over());
        assert_eq!(session.state().current_location(), Some("Docks"));
    }
}
