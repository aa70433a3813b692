use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::entities::UserProfile;

// Repository Types

/// A signed in account, persisted so the next start can reuse its token
#[derive(Default, Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct SavedUser {
    pub id: String,
    pub username: String,
    pub last_login: DateTime<Utc>,
    pub server_url: String,
    pub token: String,
}

impl SavedUser {
    pub fn new(server_url: String, profile: &UserProfile, token: String) -> Self {
        Self {
            id: profile.id.clone(),
            username: profile.username.clone(),
            last_login: Utc::now(),
            server_url,
            token,
        }
    }
}

// Configuration

const DEFAULT_LOG_FILTER: &str = "debug";

/// Runtime settings, read from `HUDDLE_*` environment variables (and a
/// `.env` file, if present).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub server_url: Option<String>,
    pub token: Option<String>,
    pub enable_logging: bool,
    pub user_agent: Option<String>,
    pub locale: Option<String>,
    pub log_filter: String,
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: None,
            token: None,
            enable_logging: false,
            user_agent: None,
            locale: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            data_dir: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            log::trace!("No .env loaded: {e}");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let server_url = match get("HUDDLE_SERVER_URL") {
            Some(raw) => {
                let url = Url::parse(&raw)
                    .with_context(|| format!("HUDDLE_SERVER_URL is not a valid url: {raw}"))?;
                if !matches!(url.scheme(), "http" | "https") {
                    anyhow::bail!("HUDDLE_SERVER_URL must be http or https, got {}", url.scheme());
                }
                Some(url.as_str().trim_end_matches('/').to_string())
            }
            None => None,
        };

        Ok(Self {
            server_url,
            token: get("HUDDLE_TOKEN"),
            enable_logging: get("HUDDLE_ENABLE_LOGGING")
                .map(|v| parse_flag(&v))
                .unwrap_or_default(),
            user_agent: get("HUDDLE_USER_AGENT"),
            locale: get("HUDDLE_LOCALE"),
            log_filter: get("HUDDLE_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            data_dir: get("HUDDLE_DATA_DIR").map(PathBuf::from),
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(config(&[]).unwrap(), Config::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = config(&[
            ("HUDDLE_SERVER_URL", "https://chat.example.com/"),
            ("HUDDLE_TOKEN", "abc"),
            ("HUDDLE_ENABLE_LOGGING", "TRUE"),
            ("HUDDLE_USER_AGENT", "huddle/0.2"),
            ("HUDDLE_LOCALE", "de"),
            ("HUDDLE_LOG", "huddle=trace"),
            ("HUDDLE_DATA_DIR", "/tmp/huddle"),
        ])
        .unwrap();

        assert_eq!(config.server_url.as_deref(), Some("https://chat.example.com"));
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert!(config.enable_logging);
        assert_eq!(config.user_agent.as_deref(), Some("huddle/0.2"));
        assert_eq!(config.locale.as_deref(), Some("de"));
        assert_eq!(config.log_filter, "huddle=trace");
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/huddle")));
    }

    #[test]
    fn blank_values_are_unset() {
        let config = config(&[("HUDDLE_TOKEN", "  "), ("HUDDLE_ENABLE_LOGGING", "nope")]).unwrap();
        assert_eq!(config.token, None);
        assert!(!config.enable_logging);
    }

    #[test]
    fn rejects_bad_server_urls() {
        assert!(config(&[("HUDDLE_SERVER_URL", "not a url")]).is_err());
        assert!(config(&[("HUDDLE_SERVER_URL", "ftp://chat.example.com")]).is_err());
    }
}
