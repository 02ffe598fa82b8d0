use anyhow::Context;
use chrono_tz::Tz;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use log::LevelFilter;
use pickleview_api::{CachedStore, FileStore, RealtimeDbStore, RoomStore, StaticJsonStore, Url};
use std::time::Duration;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    RealtimeDb,
    Http,
    File,
}

impl BackendKind {
    fn from_arg(value: &str) -> Self {
        match value {
            "http" => BackendKind::Http,
            "file" => BackendKind::File,
            _ => BackendKind::RealtimeDb,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub backend: BackendKind,
    /// Database URL, base URL, or filesystem path depending on `backend`.
    pub source: String,
    pub auth_token: Option<String>,
    pub prefix: String,
    pub initial_code: Option<String>,
    pub poll_interval: Duration,
    pub timeout: Duration,
    /// Never longer than `poll_interval`.
    pub cache_ttl: Duration,
    pub timezone: Tz,
    pub log_level: LevelFilter,
    pub once: bool,
    pub full_screen: bool,
}

impl AppSettings {
    pub fn command() -> Command {
        Command::new("pickleview")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Live viewer for doubles round-robin sessions")
            .arg(
                Arg::new("backend")
                    .long("backend")
                    .env("PICKLEVIEW_BACKEND")
                    .value_name("KIND")
                    .help("Where match records live")
                    .default_value("realtime-db")
                    .value_parser(["realtime-db", "http", "file"]),
            )
            .arg(
                Arg::new("source")
                    .long("source")
                    .env("PICKLEVIEW_SOURCE")
                    .value_name("URL|PATH")
                    .help("Database URL, base URL of the JSON files, or a local file/directory")
                    .required(true),
            )
            .arg(
                Arg::new("auth-token")
                    .long("auth-token")
                    .env("PICKLEVIEW_AUTH_TOKEN")
                    .value_name("TOKEN")
                    .hide_env_values(true)
                    .help("Database auth token (realtime-db only)"),
            )
            .arg(
                Arg::new("prefix")
                    .long("prefix")
                    .env("PICKLEVIEW_PREFIX")
                    .value_name("PATH")
                    .help("Database path holding the rooms (realtime-db only)")
                    .default_value(pickleview_api::http::DEFAULT_PREFIX),
            )
            .arg(
                Arg::new("code")
                    .long("code")
                    .value_name("CODE")
                    .help("Match code to open on start"),
            )
            .arg(
                Arg::new("interval")
                    .long("interval")
                    .value_name("SECS")
                    .help("Seconds between polls")
                    .default_value("5")
                    .value_parser(value_parser!(u64).range(5..=10)),
            )
            .arg(
                Arg::new("timeout")
                    .long("timeout")
                    .value_name("SECS")
                    .help("Seconds before a fetch is abandoned")
                    .default_value("5")
                    .value_parser(value_parser!(u64).range(1..=9)),
            )
            .arg(
                Arg::new("cache-ttl")
                    .long("cache-ttl")
                    .value_name("SECS")
                    .help("Reuse a fetched record for this long (0 = off, capped at the interval)")
                    .default_value("0")
                    .value_parser(value_parser!(u64)),
            )
            .arg(
                Arg::new("tz")
                    .long("tz")
                    .env("PICKLEVIEW_TZ")
                    .value_name("ZONE")
                    .help("IANA time zone for \"last updated\"")
                    .default_value("America/New_York")
                    .value_parser(|s: &str| s.parse::<Tz>()),
            )
            .arg(
                Arg::new("log-level")
                    .long("log-level")
                    .env("PICKLEVIEW_LOG")
                    .value_name("LEVEL")
                    .default_value("error")
                    .value_parser(["off", "error", "warn", "info", "debug", "trace"]),
            )
            .arg(
                Arg::new("once")
                    .long("once")
                    .help("Fetch once, print the result and exit")
                    .requires("code")
                    .action(ArgAction::SetTrue),
            )
    }

    pub fn load() -> Self {
        Self::from_matches(&Self::command().get_matches())
    }

    pub fn from_matches(matches: &ArgMatches) -> Self {
        let secs = |id: &str| Duration::from_secs(matches.get_one::<u64>(id).copied().unwrap_or_default());
        let poll_interval = secs("interval");
        let log_level = matches
            .get_one::<String>("log-level")
            .and_then(|l| l.parse().ok())
            .unwrap_or(LevelFilter::Error);

        Self {
            backend: matches
                .get_one::<String>("backend")
                .map(|b| BackendKind::from_arg(b))
                .unwrap_or_default(),
            source: matches.get_one::<String>("source").cloned().unwrap_or_default(),
            auth_token: matches.get_one::<String>("auth-token").cloned(),
            prefix: matches
                .get_one::<String>("prefix")
                .cloned()
                .unwrap_or_else(|| pickleview_api::http::DEFAULT_PREFIX.to_string()),
            initial_code: matches.get_one::<String>("code").cloned(),
            poll_interval,
            timeout: secs("timeout"),
            cache_ttl: secs("cache-ttl").min(poll_interval),
            timezone: matches.get_one::<Tz>("tz").copied().unwrap_or(DEFAULT_TIMEZONE),
            log_level,
            once: matches.get_flag("once"),
            full_screen: false,
        }
    }

    /// Build the configured backend, wrapped in a result cache when one is enabled.
    pub fn build_store(&self) -> anyhow::Result<Box<dyn RoomStore>> {
        let store: Box<dyn RoomStore> = match self.backend {
            BackendKind::RealtimeDb => {
                let url = Url::parse(&self.source)
                    .with_context(|| format!("invalid database URL {:?}", self.source))?;
                let mut store = RealtimeDbStore::new(url, self.timeout).with_prefix(self.prefix.clone());
                if let Some(token) = &self.auth_token {
                    store = store.with_auth(token.clone());
                }
                Box::new(store)
            }
            BackendKind::Http => {
                let url = Url::parse(&self.source)
                    .with_context(|| format!("invalid base URL {:?}", self.source))?;
                Box::new(StaticJsonStore::new(url, self.timeout))
            }
            BackendKind::File => Box::new(FileStore::new(&self.source)),
        };

        if self.cache_ttl.is_zero() {
            Ok(store)
        } else {
            Ok(Box::new(CachedStore::new(store, self.cache_ttl)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<AppSettings, clap::Error> {
        let mut argv = vec!["pickleview"];
        argv.extend_from_slice(args);
        AppSettings::command()
            .try_get_matches_from(argv)
            .map(|m| AppSettings::from_matches(&m))
    }

    #[test]
    fn defaults() {
        let settings = parse(&["--source", "https://live.example.com"]).unwrap();
        assert_eq!(settings.backend, BackendKind::RealtimeDb);
        assert_eq!(settings.poll_interval, Duration::from_secs(5));
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.cache_ttl, Duration::ZERO);
        assert_eq!(settings.timezone, chrono_tz::America::New_York);
        assert_eq!(settings.prefix, "matches");
        assert_eq!(settings.log_level, LevelFilter::Error);
        assert!(!settings.once);
    }

    #[test]
    fn interval_must_be_five_to_ten_seconds() {
        assert!(parse(&["--source", "x", "--interval", "4"]).is_err());
        assert!(parse(&["--source", "x", "--interval", "11"]).is_err());
        let settings = parse(&["--source", "x", "--interval", "10"]).unwrap();
        assert_eq!(settings.poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn cache_ttl_is_capped_at_interval() {
        let settings = parse(&["--source", "x", "--interval", "6", "--cache-ttl", "30"]).unwrap();
        assert_eq!(settings.cache_ttl, Duration::from_secs(6));
    }

    #[test]
    fn timezone_and_backend_are_parsed() {
        let settings = parse(&["--source", "./rooms", "--backend", "file", "--tz", "Europe/London"]).unwrap();
        assert_eq!(settings.backend, BackendKind::File);
        assert_eq!(settings.timezone, chrono_tz::Europe::London);
        assert!(parse(&["--source", "x", "--tz", "Mars/Olympus"]).is_err());
        assert!(parse(&["--source", "x", "--backend", "ftp"]).is_err());
    }

    #[test]
    fn once_needs_a_code() {
        assert!(parse(&["--source", "x", "--once"]).is_err());
        assert!(parse(&["--source", "x", "--once", "--code", "123"]).unwrap().once);
    }

    #[test]
    fn build_store_rejects_bad_urls() {
        let settings = parse(&["--source", "not a url"]).unwrap();
        assert!(settings.build_store().is_err());
        let settings = parse(&["--source", "./rooms", "--backend", "file", "--cache-ttl", "3"]).unwrap();
        let store = settings.build_store().unwrap();
        assert_eq!(store.describe(), "file ./rooms (cached 3s)");
    }
}
