pub mod file;
pub mod http;
pub mod normalize;
pub mod store;
mod wire;

pub use file::FileStore;
pub use http::{RealtimeDbStore, StaticJsonStore};
pub use reqwest::Url;
pub use store::{CachedStore, MemoryStore, RoomStore, StoreError};

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;

/// The backend's record object, exactly as it was read.
pub type RawRecord = serde_json::Map<String, Value>;

pub const UNKNOWN_GROUP: &str = "Unknown Group";
pub const UNKNOWN_ROUND: &str = "N/A";
pub const JUST_NOW: &str = "Just now";
pub const UNAVAILABLE: &str = "unavailable";

/// Characters that cannot appear in a database key or a path segment.
const FORBIDDEN_CODE_CHARS: [char; 8] = ['/', '\\', '.', '#', '$', '[', ']', '?'];

// ---------------------------------------------------------------------------
// Room codes
// ---------------------------------------------------------------------------

/// A validated 3-character room code. Compared byte-for-byte, no case folding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomCode(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid room code {input:?}: expected exactly 3 characters")]
pub struct InvalidCodeFormat {
    pub input: String,
}

impl RoomCode {
    pub const LEN: usize = 3;

    pub fn parse(input: &str) -> Result<Self, InvalidCodeFormat> {
        let code = input.trim();
        let well_formed = code.chars().count() == Self::LEN
            && code
                .chars()
                .all(|c| !c.is_whitespace() && !c.is_control() && !FORBIDDEN_CODE_CHARS.contains(&c));
        if !well_formed {
            return Err(InvalidCodeFormat { input: input.to_owned() });
        }
        Ok(Self(code.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for RoomCode {
    type Err = InvalidCodeFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Domain types: normalized view of one room's record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub room_code: RoomCode,
    pub group_name: String,
    pub round: Round,
    /// Index position is the 0-based court number; gaps stay as `Court::Unavailable`.
    pub courts: Vec<Court>,
    /// Insertion order, no duplicates.
    pub benched: Vec<String>,
    pub updated: UpdatedAt,
}

impl MatchRecord {
    pub fn benched_display(&self) -> Option<String> {
        if self.benched.is_empty() {
            None
        } else {
            Some(self.benched.join(", "))
        }
    }

    pub fn unavailable_courts(&self) -> usize {
        self.courts.iter().filter(|c| c.pairing().is_none()).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Round {
    Number(i64),
    Label(String),
    #[default]
    Unknown,
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Round::Number(n) => write!(f, "{n}"),
            Round::Label(label) => f.write_str(label),
            Round::Unknown => f.write_str(UNKNOWN_ROUND),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Court {
    Pairing(CourtPairing),
    /// The source entry matched no known shape. Kept so court numbering stays intact.
    Unavailable { raw: Value },
}

impl Court {
    pub fn pairing(&self) -> Option<&CourtPairing> {
        match self {
            Court::Pairing(p) => Some(p),
            Court::Unavailable { .. } => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Court::Pairing(p) => p.to_string(),
            Court::Unavailable { .. } => UNAVAILABLE.to_string(),
        }
    }
}

/// Two teams of two. Team A is `players[0..2]`, team B is `players[2..4]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourtPairing {
    pub players: [String; 4],
}

impl CourtPairing {
    pub fn team_a(&self) -> &[String] {
        &self.players[..2]
    }

    pub fn team_b(&self) -> &[String] {
        &self.players[2..]
    }
}

impl fmt::Display for CourtPairing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = &self.players;
        write!(f, "{a} + {b} vs {c} + {d}")
    }
}

/// Freshness of a record. `epoch` wins over `raw` when both are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatedAt {
    pub epoch: Option<DateTime<Utc>>,
    pub raw: Option<String>,
}
