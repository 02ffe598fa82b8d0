use crate::store::{RoomStore, StoreError, StoreResult, into_record};
use crate::{RawRecord, RoomCode};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;

pub const DEFAULT_PREFIX: &str = "matches";

fn default_client() -> Client {
    Client::builder()
        .user_agent("pickleview/0.1 (terminal live viewer)")
        .build()
        .unwrap_or_default()
}

/// Realtime key-value database read over its REST interface:
/// `GET {database_url}/{prefix}/{code}.json`, answering `null` for missing keys.
#[derive(Debug, Clone)]
pub struct RealtimeDbStore {
    client: Client,
    database_url: Url,
    prefix: String,
    auth: Option<String>,
    timeout: Duration,
}

impl RealtimeDbStore {
    pub fn new(database_url: Url, timeout: Duration) -> Self {
        Self {
            client: default_client(),
            database_url,
            prefix: DEFAULT_PREFIX.to_string(),
            auth: None,
            timeout,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Database secret or ID token, sent as the `auth` query parameter.
    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(token.into());
        self
    }

    fn room_url(&self, code: &RoomCode) -> StoreResult<Url> {
        let mut url = join_segments(&self.database_url, &self.prefix, code)?;
        if let Some(token) = &self.auth {
            url.query_pairs_mut().append_pair("auth", token);
        }
        Ok(url)
    }
}

#[async_trait]
impl RoomStore for RealtimeDbStore {
    async fn fetch(&self, code: &RoomCode) -> StoreResult<RawRecord> {
        let url = self.room_url(code)?;
        get_record(&self.client, url, self.timeout, code).await
    }

    fn describe(&self) -> String {
        format!("realtime-db {}", self.database_url)
    }
}

/// A static JSON file per room: `GET {base_url}/{code}.json`.
#[derive(Debug, Clone)]
pub struct StaticJsonStore {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl StaticJsonStore {
    pub fn new(base_url: Url, timeout: Duration) -> Self {
        Self {
            client: default_client(),
            base_url,
            timeout,
        }
    }
}

#[async_trait]
impl RoomStore for StaticJsonStore {
    async fn fetch(&self, code: &RoomCode) -> StoreResult<RawRecord> {
        let url = join_segments(&self.base_url, "", code)?;
        get_record(&self.client, url, self.timeout, code).await
    }

    fn describe(&self) -> String {
        format!("http {}", self.base_url)
    }
}

/// Append `prefix` path segments and `{code}.json` to `base`, percent-encoding as needed.
fn join_segments(base: &Url, prefix: &str, code: &RoomCode) -> StoreResult<Url> {
    let mut url = base.clone();
    url.set_query(None);
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| StoreError::Transport(format!("{base} cannot be used as a base URL")))?;
        segments.pop_if_empty();
        segments.extend(prefix.split('/').filter(|s| !s.is_empty()));
        segments.push(&format!("{code}.json"));
    }
    Ok(url)
}

async fn get_record(client: &Client, url: Url, timeout: Duration, code: &RoomCode) -> StoreResult<RawRecord> {
    // The query may carry a credential; keep it out of logs and messages.
    let mut shown = url.clone();
    shown.set_query(None);
    debug!("GET {shown}");

    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| StoreError::Transport(format!("request to {shown} failed: {}", e.without_url())))?;

    match response.status() {
        StatusCode::NOT_FOUND => return Err(StoreError::NotFound(code.to_string())),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            return Err(StoreError::Transport(format!(
                "{shown}: authentication failed ({})",
                response.status()
            )));
        }
        status if !status.is_success() => {
            return Err(StoreError::Transport(format!("{shown}: unexpected status {status}")));
        }
        _ => {}
    }

    let body = response
        .text()
        .await
        .map_err(|e| StoreError::Transport(format!("{shown}: failed to read body: {}", e.without_url())))?;
    let value: serde_json::Value = serde_json::from_str(&body)
        .map_err(|e| StoreError::Transport(format!("{shown}: invalid JSON: {e}")))?;
    into_record(value, code, &shown.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn code(s: &str) -> RoomCode {
        RoomCode::parse(s).unwrap()
    }

    fn timeout() -> Duration {
        Duration::from_secs(2)
    }

    #[test]
    fn room_url_joins_prefix_and_code() {
        let store = RealtimeDbStore::new(Url::parse("https://live.example.com/").unwrap(), timeout())
            .with_prefix("sessions/matches");
        let url = store.room_url(&code("7Q1")).unwrap();
        assert_eq!(url.as_str(), "https://live.example.com/sessions/matches/7Q1.json");
    }

    #[test]
    fn room_url_appends_auth_and_encodes_code() {
        let store = RealtimeDbStore::new(Url::parse("https://live.example.com").unwrap(), timeout())
            .with_auth("s3cret");
        let url = store.room_url(&code("éx1")).unwrap();
        assert_eq!(url.as_str(), "https://live.example.com/matches/%C3%A9x1.json?auth=s3cret");
    }

    #[tokio::test]
    async fn realtime_db_reads_record() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/matches/ABC.json")
            .match_query(Matcher::UrlEncoded("auth".into(), "token".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"group_name":"Tuesday Night","round":3}"#)
            .create_async()
            .await;

        let store = RealtimeDbStore::new(Url::parse(&server.url()).unwrap(), timeout()).with_auth("token");
        let record = store.fetch(&code("ABC")).await.unwrap();
        assert_eq!(record["round"], json!(3));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn realtime_db_null_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/matches/999.json")
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;

        let store = RealtimeDbStore::new(Url::parse(&server.url()).unwrap(), timeout());
        let err = store.fetch(&code("999")).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound("999".into()));
    }

    #[tokio::test]
    async fn realtime_db_denied_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/matches/ABC.json")
            .with_status(401)
            .with_body(r#"{"error":"Permission denied"}"#)
            .create_async()
            .await;

        let store = RealtimeDbStore::new(Url::parse(&server.url()).unwrap(), timeout());
        let err = store.fetch(&code("ABC")).await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(ref m) if m.contains("authentication failed")), "{err}");
    }

    #[tokio::test]
    async fn static_json_404_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/rooms/XYZ.json").with_status(404).create_async().await;

        let base = Url::parse(&format!("{}/rooms/", server.url())).unwrap();
        let store = StaticJsonStore::new(base, timeout());
        assert!(store.fetch(&code("XYZ")).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn static_json_server_error_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/XYZ.json").with_status(500).create_async().await;

        let store = StaticJsonStore::new(Url::parse(&server.url()).unwrap(), timeout());
        let err = store.fetch(&code("XYZ")).await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(ref m) if m.contains("500")), "{err}");
    }

    #[tokio::test]
    async fn static_json_garbage_body_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/XYZ.json")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let store = StaticJsonStore::new(Url::parse(&server.url()).unwrap(), timeout());
        let err = store.fetch(&code("XYZ")).await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(ref m) if m.contains("invalid JSON")), "{err}");
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let store = StaticJsonStore::new(Url::parse("http://127.0.0.1:9/").unwrap(), Duration::from_millis(500));
        let err = store.fetch(&code("XYZ")).await.unwrap_err();
        assert!(!err.is_not_found());
    }
}
