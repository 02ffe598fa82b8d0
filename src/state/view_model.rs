use crate::state::session::{Phase, Session};
use chrono_tz::Tz;
use pickleview_api::UNAVAILABLE;

pub const PROMPT_MESSAGE: &str = "Enter your 3-character match code to watch live rounds";
pub const NO_BENCH: &str = "None";

/// Everything the draw layer needs, derived from a `Session`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewModel {
    pub phase: Phase,
    pub room_code: Option<String>,
    pub group_name: Option<String>,
    pub round: Option<String>,
    pub courts: Vec<CourtLine>,
    pub benched: Option<String>,
    pub last_updated: Option<String>,
    pub message: Option<String>,
    /// A previous record is shown while the latest fetch failed.
    pub stale: bool,
    pub controls: Controls,
}

/// One court row. `text == None` means the source entry could not be read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CourtLine {
    pub number: usize,
    pub text: Option<String>,
}

impl CourtLine {
    pub fn display(&self) -> &str {
        self.text.as_deref().unwrap_or(UNAVAILABLE)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    pub code_entry: bool,
    pub refresh: bool,
    pub switch_match: bool,
}

impl ViewModel {
    pub fn from_session(session: &Session, tz: &Tz) -> Self {
        let phase = session.phase();
        let has_code = session.code.is_some();
        // A poll retrying an invalid code keeps presenting as invalid.
        let retrying = phase == Phase::Fetching && session.error.is_some();
        let controls = Controls {
            code_entry: matches!(phase, Phase::NoCode | Phase::Invalid) || retrying,
            refresh: has_code,
            switch_match: has_code,
        };

        let message = session.input_error.clone().or_else(|| match phase {
            Phase::NoCode => Some(PROMPT_MESSAGE.to_string()),
            Phase::Invalid | Phase::Fetching => session.error.as_ref().map(|e| e.message().to_string()),
            Phase::Displaying => None,
        });

        let mut view = ViewModel {
            phase,
            room_code: session.code.as_ref().map(ToString::to_string),
            message,
            controls,
            ..Default::default()
        };

        let Some(record) = session.record.as_ref() else {
            return view;
        };
        view.stale = session.error.is_some();
        view.group_name = Some(record.group_name.clone());
        view.round = Some(record.round.to_string());
        view.courts = record
            .courts
            .iter()
            .enumerate()
            .map(|(i, court)| CourtLine {
                number: i + 1,
                text: court.pairing().map(ToString::to_string),
            })
            .collect();
        view.benched = Some(record.benched_display().unwrap_or_else(|| NO_BENCH.to_string()));
        view.last_updated = Some(record.updated.display(tz));
        view
    }

    /// Plain text rendering, one line per item.
    pub fn plain_text(&self) -> String {
        let mut lines = Vec::new();
        if let Some(code) = &self.room_code {
            lines.push(format!("Match code: {code}"));
        }
        if let (Some(group), Some(round)) = (&self.group_name, &self.round) {
            lines.push(format!("{group} - Round {round}"));
            for court in &self.courts {
                lines.push(format!("Court {}: {}", court.number, court.display()));
            }
            if let Some(benched) = &self.benched {
                lines.push(format!("Benched: {benched}"));
            }
            if let Some(updated) = &self.last_updated {
                lines.push(format!("Last updated: {updated}"));
            }
        }
        if let Some(message) = &self.message {
            lines.push(message.clone());
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::session::{NOT_FOUND_MESSAGE, TRANSPORT_MESSAGE};
    use chrono::Utc;
    use pickleview_api::{RawRecord, RoomCode, StoreError};
    use serde_json::json;

    const TZ: Tz = chrono_tz::America::New_York;

    fn raw(value: serde_json::Value) -> RawRecord {
        let serde_json::Value::Object(map) = value else {
            unreachable!()
        };
        map
    }

    fn session_with(c: &str, result: Result<RawRecord, StoreError>) -> Session {
        let mut session = Session::new();
        let code = session.submit_code(c).unwrap();
        session.apply_fetch(&code, result, Utc::now());
        session
    }

    #[test]
    fn no_code_prompts_and_offers_code_entry_only() {
        let view = ViewModel::from_session(&Session::new(), &TZ);
        assert_eq!(view.phase, Phase::NoCode);
        assert_eq!(view.message.as_deref(), Some(PROMPT_MESSAGE));
        assert_eq!(
            view.controls,
            Controls { code_entry: true, refresh: false, switch_match: false }
        );
    }

    #[test]
    fn displaying_fills_every_field() {
        let session = session_with(
            "123",
            Ok(raw(json!({
                "group_name": "Tuesday Night",
                "round": 3,
                "courts": [["A", "B", "C", "D"], {"bad": "shape"}],
                "benched": [],
                "timestamp": "8:15 PM"
            }))),
        );
        let view = ViewModel::from_session(&session, &TZ);
        assert_eq!(view.room_code.as_deref(), Some("123"));
        assert_eq!(view.round.as_deref(), Some("3"));
        assert_eq!(view.courts[0].display(), "A + B vs C + D");
        assert_eq!(view.courts[1], CourtLine { number: 2, text: None });
        assert_eq!(view.courts[1].display(), "unavailable");
        assert_eq!(view.benched.as_deref(), Some(NO_BENCH));
        assert_eq!(view.last_updated.as_deref(), Some("8:15 PM"));
        assert!(view.message.is_none());
        assert!(!view.stale);
        assert!(!view.controls.code_entry && view.controls.refresh && view.controls.switch_match);
    }

    #[test]
    fn transport_failure_shows_distinct_message() {
        let session = session_with("123", Err(StoreError::Transport("boom".into())));
        let view = ViewModel::from_session(&session, &TZ);
        assert_eq!(view.phase, Phase::Invalid);
        assert_eq!(view.message.as_deref(), Some(TRANSPORT_MESSAGE));
        assert!(view.controls.code_entry);
    }

    #[test]
    fn failed_refresh_marks_previous_record_stale() {
        let mut session = session_with("123", Ok(raw(json!({"round": 1}))));
        let code = session.begin_poll().unwrap();
        session.apply_fetch(&code, Err(StoreError::NotFound("123".into())), Utc::now());
        let view = ViewModel::from_session(&session, &TZ);
        assert!(view.stale);
        assert_eq!(view.round.as_deref(), Some("1"));
        assert_eq!(view.message.as_deref(), Some(NOT_FOUND_MESSAGE));
    }

    #[test]
    fn retry_of_invalid_code_still_shows_entry_and_error() {
        let mut session = session_with("999", Err(StoreError::NotFound("999".into())));
        session.begin_poll().unwrap();
        let view = ViewModel::from_session(&session, &TZ);
        assert_eq!(view.phase, Phase::Fetching);
        assert!(view.controls.code_entry);
        assert_eq!(view.message.as_deref(), Some(NOT_FOUND_MESSAGE));
    }

    #[test]
    fn plain_text_lists_courts_and_bench() {
        let session = session_with(
            "ABC",
            Ok(raw(json!({
                "group_name": "Open Play",
                "round": "2",
                "courts": [[["A", "B"], ["C", "D"]]],
                "benched": ["E", "F"]
            }))),
        );
        let text = ViewModel::from_session(&session, &TZ).plain_text();
        assert_eq!(
            text,
            "Match code: ABC\nOpen Play - Round 2\nCourt 1: A + B vs C + D\nBenched: E, F\nLast updated: Just now"
        );
    }

    #[test]
    fn fetching_without_record_has_no_match_fields() {
        let mut session = Session::new();
        session.submit_code("123");
        let view = ViewModel::from_session(&session, &TZ);
        assert_eq!(view.phase, Phase::Fetching);
        assert!(view.group_name.is_none() && view.courts.is_empty());
        assert_eq!(RoomCode::parse("123").ok().map(|c| c.to_string()), view.room_code);
    }
}
