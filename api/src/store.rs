use crate::{RawRecord, RoomCode};
use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The room has no record. Expected while an organizer has not started it yet.
    #[error("no record for room {0}")]
    NotFound(String),

    /// The backend could not be read, or answered with something that is not a record.
    #[error("transport error: {0}")]
    Transport(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Read access to match records keyed by room code.
///
/// Implementations return the backend object unmodified; shaping it into a
/// [`crate::MatchRecord`] is the caller's single shared step.
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn fetch(&self, code: &RoomCode) -> StoreResult<RawRecord>;

    /// Short label for logs and the status line.
    fn describe(&self) -> String;
}

#[async_trait]
impl<T: RoomStore + ?Sized> RoomStore for Box<T> {
    async fn fetch(&self, code: &RoomCode) -> StoreResult<RawRecord> {
        (**self).fetch(code).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Accept a parsed JSON document only when it is an object.
pub(crate) fn into_record(value: serde_json::Value, code: &RoomCode, source: &str) -> StoreResult<RawRecord> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        serde_json::Value::Null => Err(StoreError::NotFound(code.to_string())),
        other => Err(StoreError::Transport(format!(
            "{source}: expected a JSON object for room {code}, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Rooms held in memory. Counts the fetches it serves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rooms: Mutex<HashMap<String, RawRecord>>,
    failure: Mutex<Option<String>>,
    fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_room(self, code: &str, record: RawRecord) -> Self {
        self.insert(code, record);
        self
    }

    pub fn insert(&self, code: &str, record: RawRecord) {
        if let Ok(mut rooms) = self.rooms.lock() {
            rooms.insert(code.to_string(), record);
        }
    }

    pub fn remove(&self, code: &str) {
        if let Ok(mut rooms) = self.rooms.lock() {
            rooms.remove(code);
        }
    }

    /// Make every following fetch fail with a transport error, or clear that with `None`.
    pub fn fail_with(&self, cause: Option<&str>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = cause.map(ToString::to_string);
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn fetch(&self, code: &RoomCode) -> StoreResult<RawRecord> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        if let Some(cause) = self.failure.lock().ok().and_then(|f| f.clone()) {
            return Err(StoreError::Transport(cause));
        }
        self.rooms
            .lock()
            .map_err(|_| StoreError::Transport("memory store lock poisoned".into()))?
            .get(code.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(code.to_string()))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ---------------------------------------------------------------------------
// Result cache
// ---------------------------------------------------------------------------

/// Serves repeated fetches of the same room from memory for `ttl`.
/// Only successful reads are kept; failures always go to the backend again.
pub struct CachedStore<S> {
    inner: S,
    ttl: Duration,
    entries: Mutex<HashMap<RoomCode, (Instant, RawRecord)>>,
}

impl<S: RoomStore> CachedStore<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn cached(&self, code: &RoomCode) -> Option<RawRecord> {
        let entries = self.entries.lock().ok()?;
        let (stored_at, record) = entries.get(code)?;
        (stored_at.elapsed() < self.ttl).then(|| record.clone())
    }
}

#[async_trait]
impl<S: RoomStore> RoomStore for CachedStore<S> {
    async fn fetch(&self, code: &RoomCode) -> StoreResult<RawRecord> {
        if let Some(record) = self.cached(code) {
            debug!("room {code}: served from cache");
            return Ok(record);
        }
        let result = self.inner.fetch(code).await;
        if let Ok(mut entries) = self.entries.lock() {
            match &result {
                Ok(record) => {
                    entries.insert(code.clone(), (Instant::now(), record.clone()));
                }
                Err(_) => {
                    entries.remove(code);
                }
            }
        }
        result
    }

    fn describe(&self) -> String {
        format!("{} (cached {}s)", self.inner.describe(), self.ttl.as_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(round: i64) -> RawRecord {
        let serde_json::Value::Object(map) = json!({ "round": round }) else {
            unreachable!()
        };
        map
    }

    fn code(s: &str) -> RoomCode {
        RoomCode::parse(s).unwrap()
    }

    #[tokio::test]
    async fn memory_store_finds_and_misses() {
        let store = MemoryStore::new().with_room("123", record(1));
        assert_eq!(store.fetch(&code("123")).await.unwrap()["round"], json!(1));
        assert_eq!(
            store.fetch(&code("999")).await,
            Err(StoreError::NotFound("999".into()))
        );
        assert_eq!(store.fetch_count(), 2);

        store.remove("123");
        assert!(store.fetch(&code("123")).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn memory_store_can_fail() {
        let store = MemoryStore::new().with_room("123", record(1));
        store.fail_with(Some("backend down"));
        let err = store.fetch(&code("123")).await.unwrap_err();
        assert!(!err.is_not_found());
        store.fail_with(None);
        assert!(store.fetch(&code("123")).await.is_ok());
    }

    #[tokio::test]
    async fn cache_serves_repeat_fetches_within_ttl() {
        let cached = CachedStore::new(MemoryStore::new().with_room("123", record(1)), Duration::from_secs(60));
        cached.fetch(&code("123")).await.unwrap();
        cached.inner().insert("123", record(2));
        let second = cached.fetch(&code("123")).await.unwrap();
        assert_eq!(second["round"], json!(1));
        assert_eq!(cached.inner().fetch_count(), 1);
    }

    #[tokio::test]
    async fn zero_ttl_always_refetches() {
        let cached = CachedStore::new(MemoryStore::new().with_room("123", record(1)), Duration::ZERO);
        cached.fetch(&code("123")).await.unwrap();
        cached.inner().insert("123", record(2));
        assert_eq!(cached.fetch(&code("123")).await.unwrap()["round"], json!(2));
        assert_eq!(cached.inner().fetch_count(), 2);
    }

    #[tokio::test]
    async fn cache_never_keeps_failures() {
        let cached = CachedStore::new(MemoryStore::new(), Duration::from_secs(60));
        assert!(cached.fetch(&code("123")).await.unwrap_err().is_not_found());
        cached.inner().insert("123", record(5));
        assert_eq!(cached.fetch(&code("123")).await.unwrap()["round"], json!(5));
    }

    #[test]
    fn into_record_rejects_non_objects() {
        let c = code("123");
        assert!(into_record(json!({"a": 1}), &c, "test").is_ok());
        assert!(into_record(json!(null), &c, "test").unwrap_err().is_not_found());
        let err = into_record(json!([1, 2]), &c, "test").unwrap_err();
        assert_eq!(
            err,
            StoreError::Transport("test: expected a JSON object for room 123, got an array".into())
        );
    }
}
