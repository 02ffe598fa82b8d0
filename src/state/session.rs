use chrono::{DateTime, Utc};
use log::{info, warn};
use pickleview_api::{MatchRecord, RawRecord, RoomCode, StoreError};

pub const NOT_FOUND_MESSAGE: &str = "Code not found, double-check it";
pub const TRANSPORT_MESSAGE: &str = "Could not reach the data source, try again";
pub const INVALID_CODE_MESSAGE: &str = "Invalid code, enter exactly 3 characters";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    NoCode,
    Fetching,
    Displaying,
    Invalid,
}

/// Why the last fetch for the current code failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchError {
    NotFound,
    Transport { cause: String },
}

impl FetchError {
    pub fn message(&self) -> &'static str {
        match self {
            FetchError::NotFound => NOT_FOUND_MESSAGE,
            FetchError::Transport { .. } => TRANSPORT_MESSAGE,
        }
    }
}

impl From<StoreError> for FetchError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => FetchError::NotFound,
            StoreError::Transport(cause) => FetchError::Transport { cause },
        }
    }
}

/// State of one viewing session. Owned by its caller and passed through every
/// transition, so independent sessions never share anything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    phase: Phase,
    pub code: Option<RoomCode>,
    /// Last record successfully fetched for `code`.
    pub record: Option<MatchRecord>,
    pub error: Option<FetchError>,
    /// Rejection of the last code entry, shown inline.
    pub input_error: Option<String>,
    pub last_poll: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Validate a typed code. On success the session enters `Fetching` and the
    /// code to fetch is returned; on failure only `input_error` changes.
    /// Re-submitting the code that is already being fetched starts nothing.
    pub fn submit_code(&mut self, input: &str) -> Option<RoomCode> {
        let code = match RoomCode::parse(input) {
            Ok(code) => code,
            Err(e) => {
                info!("{e}");
                self.input_error = Some(INVALID_CODE_MESSAGE.to_string());
                return None;
            }
        };
        self.input_error = None;
        if self.phase == Phase::Fetching && self.code.as_ref() == Some(&code) {
            return None;
        }

        if self.code.as_ref() != Some(&code) {
            self.record = None;
        }
        self.code = Some(code.clone());
        self.error = None;
        self.phase = Phase::Fetching;
        Some(code)
    }

    /// Start the next fetch for the stored code. Poll ticks and manual refresh
    /// both come through here. Returns `None` while a fetch is already in
    /// flight or no code is set.
    pub fn begin_poll(&mut self) -> Option<RoomCode> {
        match self.phase {
            Phase::Displaying | Phase::Invalid => {
                let code = self.code.clone()?;
                self.phase = Phase::Fetching;
                Some(code)
            }
            Phase::NoCode | Phase::Fetching => None,
        }
    }

    pub fn request_refresh(&mut self) -> Option<RoomCode> {
        self.begin_poll()
    }

    /// Fold a fetch result into the session. Results for a code the session is
    /// no longer fetching are dropped and `false` is returned.
    pub fn apply_fetch(
        &mut self,
        code: &RoomCode,
        result: Result<RawRecord, StoreError>,
        now: DateTime<Utc>,
    ) -> bool {
        if self.phase != Phase::Fetching || self.code.as_ref() != Some(code) {
            info!("dropping stale result for room {code}");
            return false;
        }

        self.last_poll = Some(now);
        match result {
            Ok(raw) => {
                self.record = Some(MatchRecord::from_raw(code.clone(), &raw));
                self.error = None;
                self.phase = Phase::Displaying;
            }
            Err(err) => {
                match &err {
                    StoreError::NotFound(_) => info!("room {code}: no record yet"),
                    StoreError::Transport(cause) => warn!("room {code}: {cause}"),
                }
                self.error = Some(err.into());
                self.phase = Phase::Invalid;
            }
        }
        true
    }

    pub fn switch_match(&mut self) {
        *self = Self::default();
    }
}
