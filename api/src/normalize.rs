use crate::wire::{CourtShape, PlayerList, TeamShape};
use crate::{
    Court, CourtPairing, JUST_NOW, MatchRecord, RawRecord, RoomCode, Round, UNKNOWN_GROUP,
    UpdatedAt,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::warn;
use serde_json::Value;

/// Numeric epoch fields, highest precedence first.
const EPOCH_FIELDS: [&str; 2] = ["last_updated", "timestamp_epoch"];
/// String timestamp fields, shown verbatim, highest precedence first.
const TEXT_TIME_FIELDS: [&str; 3] = ["timestamp", "updated", "last_updated"];
const ROUND_FIELDS: [&str; 2] = ["round", "round_number"];

/// Epoch values above this are taken to be milliseconds.
const MILLIS_THRESHOLD: f64 = 1e11;
/// Upper bound on court indices accepted from object-shaped court lists.
const MAX_COURTS: usize = 256;

pub const UPDATED_FORMAT: &str = "%b %d, %I:%M %p %Z";

impl MatchRecord {
    /// Shape a raw backend object into a record. Never fails: every missing or
    /// malformed field degrades to its documented default.
    pub fn from_raw(room_code: RoomCode, raw: &RawRecord) -> Self {
        let record = Self {
            group_name: group_name(raw),
            round: round(raw),
            courts: courts(raw.get("courts")),
            benched: benched(raw.get("benched")),
            updated: updated_at(raw),
            room_code,
        };
        let unavailable = record.unavailable_courts();
        if unavailable > 0 {
            warn!(
                "room {}: {unavailable} of {} courts did not match a known shape",
                record.room_code,
                record.courts.len()
            );
        }
        record
    }
}

impl UpdatedAt {
    /// Epoch rendered in `tz`, else the raw string verbatim, else "Just now".
    pub fn display(&self, tz: &Tz) -> String {
        if let Some(epoch) = self.epoch {
            return epoch.with_timezone(tz).format(UPDATED_FORMAT).to_string();
        }
        self.raw.clone().unwrap_or_else(|| JUST_NOW.to_string())
    }
}

fn group_name(raw: &RawRecord) -> String {
    raw.get("group_name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_GROUP)
        .to_string()
}

fn round(raw: &RawRecord) -> Round {
    ROUND_FIELDS
        .iter()
        .filter_map(|field| raw.get(*field))
        .map(parse_round)
        .find(|r| *r != Round::Unknown)
        .unwrap_or_default()
}

pub fn parse_round(value: &Value) -> Round {
    match value {
        Value::Number(n) => n.as_i64().map(Round::Number).unwrap_or_default(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Round::Unknown
            } else if let Ok(n) = s.parse::<i64>() {
                Round::Number(n)
            } else {
                Round::Label(s.to_string())
            }
        }
        _ => Round::Unknown,
    }
}

/// Normalize the `courts` field. The result always has one entry per source
/// court, with unrecognised shapes kept as `Court::Unavailable`.
pub fn courts(value: Option<&Value>) -> Vec<Court> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries.iter().map(court).collect(),
        Some(single @ Value::Object(map)) => {
            let indexed: Option<Vec<(usize, &Value)>> = map
                .iter()
                .map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, v)))
                .collect();
            match indexed {
                Some(entries) => sparse_courts(entries),
                // Not index-keyed: a single court written as an object.
                None => vec![court(single)],
            }
        }
        Some(other) => vec![Court::Unavailable { raw: other.clone() }],
    }
}

/// The realtime database turns arrays with holes into objects keyed by index.
fn sparse_courts(entries: Vec<(usize, &Value)>) -> Vec<Court> {
    let len = entries
        .iter()
        .map(|(i, _)| *i)
        .filter(|i| *i < MAX_COURTS)
        .max()
        .map_or(0, |max| max + 1);
    let mut out = vec![Court::Unavailable { raw: Value::Null }; len];
    let mut overflow = Vec::new();
    for (index, value) in entries {
        if index >= MAX_COURTS {
            warn!("court index {index} is above {MAX_COURTS}, shown as unavailable");
            overflow.push(Court::Unavailable { raw: value.clone() });
            continue;
        }
        out[index] = court(value);
    }
    out.extend(overflow);
    out
}

pub fn court(value: &Value) -> Court {
    match normalize_court(value) {
        Some(pairing) => Court::Pairing(pairing),
        None => Court::Unavailable { raw: value.clone() },
    }
}

/// Decide a court entry's shape and flatten it to four names, team A first.
/// Returns `None` when no shape fits or a name is blank.
pub fn normalize_court(value: &Value) -> Option<CourtPairing> {
    let shape: CourtShape = serde_json::from_value(value.clone()).ok()?;
    let [a, b, c, d] = match shape {
        CourtShape::Keyed { players } => match players {
            PlayerList::Flat(names) => names,
            PlayerList::Nested([[a, b], [c, d]]) => [a, b, c, d],
        },
        CourtShape::Teams { team1, team2 } => {
            let [a, b] = team_names(team1)?;
            let [c, d] = team_names(team2)?;
            [a, b, c, d]
        }
        CourtShape::Flat(names) => names,
        CourtShape::Nested([[a, b], [c, d]]) => [a, b, c, d],
    };
    Some(CourtPairing {
        players: [name(a)?, name(b)?, name(c)?, name(d)?],
    })
}

fn team_names(team: TeamShape) -> Option<[String; 2]> {
    match team {
        TeamShape::Pair(pair) => Some(pair),
        TeamShape::Joined(joined) => {
            let mut parts = joined.split(['&', '+', '/']);
            let first = parts.next()?;
            let second = parts.next()?;
            if parts.next().is_some() {
                return None;
            }
            Some([first.to_string(), second.to_string()])
        }
    }
}

fn name(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn benched(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };
    let mut out: Vec<String> = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(player) = entry.as_str().map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        if !out.iter().any(|p| p == player) {
            out.push(player.to_string());
        }
    }
    out
}

/// Resolve freshness with a fixed precedence:
/// numeric `last_updated`, numeric `timestamp_epoch`, then string
/// `timestamp`, `updated`, `last_updated`.
pub fn updated_at(raw: &RawRecord) -> UpdatedAt {
    let epoch = EPOCH_FIELDS
        .iter()
        .filter_map(|field| raw.get(*field))
        .find_map(epoch_value);
    let text = TEXT_TIME_FIELDS
        .iter()
        .filter_map(|field| raw.get(*field).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .map(ToString::to_string);
    UpdatedAt { epoch, raw: text }
}

fn epoch_value(value: &Value) -> Option<DateTime<Utc>> {
    let n = value.as_number()?;
    if let Some(whole) = n.as_i64() {
        return if whole as f64 > MILLIS_THRESHOLD {
            DateTime::from_timestamp_millis(whole)
        } else {
            DateTime::from_timestamp(whole, 0)
        };
    }
    let secs = n.as_f64().filter(|f| f.is_finite() && *f >= 0.0)?;
    let secs = if secs > MILLIS_THRESHOLD { secs / 1000.0 } else { secs };
    let nanos = ((secs.fract()) * 1e9) as u32;
    DateTime::from_timestamp(secs.trunc() as i64, nanos)
}
