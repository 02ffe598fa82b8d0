use crate::store::{RoomStore, StoreError, StoreResult, into_record};
use crate::{RawRecord, RoomCode};
use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Records on local disk. `path` is either a directory holding one
/// `{code}.json` per room, or a single JSON document keyed by room code
/// (under a top-level `matches` object, or at the top level).
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RoomStore for FileStore {
    async fn fetch(&self, code: &RoomCode) -> StoreResult<RawRecord> {
        let is_dir = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.is_dir(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} does not exist", self.path.display());
                return Err(StoreError::NotFound(code.to_string()));
            }
            Err(e) => return Err(io_error(&self.path, e)),
        };

        if is_dir {
            let file = self.path.join(format!("{code}.json"));
            let value = read_json(&file, code).await?;
            return into_record(value, code, &file.display().to_string());
        }

        let source = self.path.display().to_string();
        let document = read_json(&self.path, code).await?;
        let entry = lookup(document, code, &source)?;
        into_record(entry, code, &source)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Find `code` under `matches`, then at the top level. A missing key is
/// `Null`; a document that is not keyed by room code is an error.
fn lookup(document: Value, code: &RoomCode, source: &str) -> StoreResult<Value> {
    let not_keyed = || StoreError::Transport(format!("{source}: expected a JSON object keyed by room code"));
    let Value::Object(mut top) = document else {
        return Err(not_keyed());
    };
    match top.get_mut("matches") {
        Some(Value::Object(matches)) => {
            if let Some(entry) = matches.remove(code.as_str()) {
                return Ok(entry);
            }
        }
        Some(_) => return Err(not_keyed()),
        None => {}
    }
    Ok(top.remove(code.as_str()).unwrap_or(Value::Null))
}

async fn read_json(path: &Path, code: &RoomCode) -> StoreResult<Value> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound(code.to_string())),
        Err(e) => return Err(io_error(path, e)),
    };
    serde_json::from_str(&content)
        .map_err(|e| StoreError::Transport(format!("{}: invalid JSON: {e}", path.display())))
}

fn io_error(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Transport(format!("could not read {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn code(s: &str) -> RoomCode {
        RoomCode::parse(s).unwrap()
    }

    #[tokio::test]
    async fn directory_layout_reads_one_file_per_room() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("123.json"), r#"{"round": 2, "benched": ["Kim"]}"#).unwrap();

        let store = FileStore::new(dir.path());
        let record = store.fetch(&code("123")).await.unwrap();
        assert_eq!(record["round"], json!(2));
        assert!(store.fetch(&code("456")).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn keyed_document_prefers_matches_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.json");
        std::fs::write(
            &path,
            r#"{"matches": {"123": {"round": 4}}, "123": {"round": 1}, "777": {"round": 9}}"#,
        )
        .unwrap();

        let store = FileStore::new(&path);
        assert_eq!(store.fetch(&code("123")).await.unwrap()["round"], json!(4));
        assert_eq!(store.fetch(&code("777")).await.unwrap()["round"], json!(9));
        assert!(store.fetch(&code("000")).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn absent_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("missing.json"));
        assert!(store.fetch(&code("123")).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn document_not_keyed_by_code_is_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in [("list.json", "[1, 2, 3]"), ("text.json", r#""oops""#), ("bad.json", r#"{"matches": 5}"#)] {
            let path = dir.path().join(name);
            std::fs::write(&path, body).unwrap();
            let store = FileStore::new(&path);
            assert_eq!(store.path(), path);
            let err = store.fetch(&code("123")).await.unwrap_err();
            assert!(matches!(err, StoreError::Transport(_)), "{name}: {err}");
        }
    }

    #[tokio::test]
    async fn malformed_file_is_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("123.json"), "{ round: ").unwrap();
        std::fs::write(dir.path().join("456.json"), "[1, 2, 3]").unwrap();

        let store = FileStore::new(dir.path());
        for c in ["123", "456"] {
            let err = store.fetch(&code(c)).await.unwrap_err();
            assert!(matches!(err, StoreError::Transport(_)), "{c}: {err}");
        }
    }
}
