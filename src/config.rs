//! Runtime configuration sourced from the process environment.
//!
//! The credential and list id are read once, at start-up, and threaded into the
//! task source explicitly. Nothing downstream touches the environment.

use std::fmt;
use std::time::Duration;

use crate::error::DashError;

pub const TOKEN_VAR: &str = "CLICKUP_TOKEN";
pub const LIST_ID_VAR: &str = "CLICKUP_LIST_ID";
pub const API_BASE_VAR: &str = "CLICKUP_API_BASE";
pub const CACHE_TTL_VAR: &str = "SDASH_CACHE_TTL_SECS";
pub const HTTP_TIMEOUT_VAR: &str = "SDASH_HTTP_TIMEOUT_SECS";

pub const DEFAULT_API_BASE: &str = "https://api.clickup.com/api/v2";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to reach the remote task list.
#[derive(Clone)]
pub struct Config {
    pub token: String,
    pub list_id: String,
    pub api_base: String,
    pub cache_ttl: Duration,
    pub http_timeout: Duration,
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, DashError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    /// Blank values are treated as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DashError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token = get(TOKEN_VAR)
            .ok_or_else(|| DashError::Config(format!("{TOKEN_VAR} is not set")))?;
        let list_id = get(LIST_ID_VAR)
            .ok_or_else(|| DashError::Config(format!("{LIST_ID_VAR} is not set")))?;
        let api_base = get(API_BASE_VAR)
            .map(|b| b.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let cache_ttl = match get(CACHE_TTL_VAR) {
            Some(v) => parse_secs(CACHE_TTL_VAR, &v)?,
            None => DEFAULT_CACHE_TTL,
        };
        let http_timeout = match get(HTTP_TIMEOUT_VAR) {
            Some(v) => parse_secs(HTTP_TIMEOUT_VAR, &v)?,
            None => DEFAULT_HTTP_TIMEOUT,
        };

        Ok(Config {
            token,
            list_id,
            api_base,
            cache_ttl,
            http_timeout,
        })
    }

    /// Endpoint listing the tasks of the configured list.
    pub fn tasks_url(&self) -> String {
        format!("{}/list/{}/task", self.api_base, self.list_id)
    }
}

// The token never goes to logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("list_id", &self.list_id)
            .field("api_base", &self.api_base)
            .field("cache_ttl", &self.cache_ttl)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration, DashError> {
    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| DashError::Config(format!("{key} must be a whole number of seconds, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let cfg = Config::from_lookup(lookup(&[(TOKEN_VAR, "pk_123"), (LIST_ID_VAR, "901")])).unwrap();
        assert_eq!(cfg.token, "pk_123");
        assert_eq!(cfg.list_id, "901");
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.cache_ttl, DEFAULT_CACHE_TTL);
        assert_eq!(cfg.tasks_url(), "https://api.clickup.com/api/v2/list/901/task");
    }

    #[test]
    fn test_missing_token_fails_fast() {
        let err = Config::from_lookup(lookup(&[(LIST_ID_VAR, "901")])).unwrap_err();
        assert!(matches!(err, DashError::Config(ref m) if m.contains(TOKEN_VAR)));
    }

    #[test]
    fn test_blank_list_id_is_missing() {
        let err = Config::from_lookup(lookup(&[(TOKEN_VAR, "pk"), (LIST_ID_VAR, "   ")])).unwrap_err();
        assert!(matches!(err, DashError::Config(ref m) if m.contains(LIST_ID_VAR)));
    }

    #[test]
    fn test_overrides_and_bad_ttl() {
        let cfg = Config::from_lookup(lookup(&[
            (TOKEN_VAR, "pk"),
            (LIST_ID_VAR, "7"),
            (API_BASE_VAR, "http://127.0.0.1:9000/"),
            (CACHE_TTL_VAR, "5"),
        ]))
        .unwrap();
        assert_eq!(cfg.tasks_url(), "http://127.0.0.1:9000/list/7/task");
        assert_eq!(cfg.cache_ttl, Duration::from_secs(5));

        let err = Config::from_lookup(lookup(&[
            (TOKEN_VAR, "pk"),
            (LIST_ID_VAR, "7"),
            (CACHE_TTL_VAR, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, DashError::Config(_)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let cfg = Config::from_lookup(lookup(&[(TOKEN_VAR, "pk_secret"), (LIST_ID_VAR, "1")])).unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("pk_secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
