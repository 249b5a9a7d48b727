//! Settings read from the environment.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::IndexingError;
use nyt_indexer_pipeline::consumer::DEFAULT_BASE_URL;
use nyt_indexer_pipeline::quota::QuotaLimits;
use nyt_indexer_shared::LogFormat;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default cursor file, relative to the working directory.
const DEFAULT_CURSOR_FILE: &str = ".harvest-cursors.json";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Indexer settings.
#[derive(Clone)]
pub struct Settings {
    /// NYT developer API key. Only the harvest command needs it.
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub opensearch_url: String,
    pub quota: QuotaLimits,
    pub http_timeout: Duration,
    pub cursor_file: PathBuf,
    pub log_format: LogFormat,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("api_base_url", &self.api_base_url)
            .field("opensearch_url", &self.opensearch_url)
            .field("quota", &self.quota)
            .field("http_timeout", &self.http_timeout)
            .field("cursor_file", &self.cursor_file)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Settings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `NYT_API_KEY`: NYT developer API key (required to harvest)
    /// - `NYT_API_BASE_URL`: API base URL (default: https://api.nytimes.com/svc)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `MAX_CALLS_PER_MINUTE`: Per-minute call limit (default: 5)
    /// - `MAX_CALLS_PER_DAY`: Daily call limit (default: 500)
    /// - `HTTP_TIMEOUT_SECS`: External API request timeout (default: 30)
    /// - `CURSOR_FILE`: Cursor file path (default: .harvest-cursors.json)
    /// - `LOG_FORMAT`: `json` for JSON logs, anything else for text
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns the value of a variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = QuotaLimits::default();

        let quota = QuotaLimits {
            max_calls_per_minute: parse_positive(
                "MAX_CALLS_PER_MINUTE",
                get("MAX_CALLS_PER_MINUTE"),
                defaults.max_calls_per_minute,
            )?,
            max_calls_per_day: parse_positive(
                "MAX_CALLS_PER_DAY",
                get("MAX_CALLS_PER_DAY"),
                defaults.max_calls_per_day,
            )?,
        };

        let timeout_secs = parse_positive(
            "HTTP_TIMEOUT_SECS",
            get("HTTP_TIMEOUT_SECS"),
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?;

        let log_format = LogFormat::from_setting(get("LOG_FORMAT").as_deref());

        Ok(Self {
            api_key: get("NYT_API_KEY").map(|key| key.trim().to_string()),
            api_base_url: get("NYT_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            opensearch_url: get("OPENSEARCH_URL")
                .unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string()),
            quota,
            http_timeout: Duration::from_secs(timeout_secs),
            cursor_file: get("CURSOR_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CURSOR_FILE)),
            log_format,
        })
    }

    /// The API key, or a configuration error when it is not set.
    pub fn require_api_key(&self) -> Result<&str, IndexingError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| IndexingError::config("NYT_API_KEY is not set"))
    }
}

fn parse_positive<T>(key: &str, value: Option<String>, default: T) -> Result<T, IndexingError>
where
    T: FromStr + PartialOrd + Default,
{
    let Some(raw) = value else {
        return Ok(default);
    };

    let parsed: T = raw
        .trim()
        .parse()
        .map_err(|_| IndexingError::config(format!("{} must be a positive integer, got {:?}", key, raw)))?;

    if parsed <= T::default() {
        return Err(IndexingError::config(format!(
            "{} must be a positive integer, got {:?}",
            key, raw
        )));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, IndexingError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[]).unwrap();

        assert_eq!(settings.api_key, None);
        assert_eq!(settings.api_base_url, "https://api.nytimes.com/svc");
        assert_eq!(settings.opensearch_url, "http://localhost:9200");
        assert_eq!(settings.quota, QuotaLimits::default());
        assert_eq!(settings.http_timeout, Duration::from_secs(30));
        assert_eq!(settings.cursor_file, PathBuf::from(".harvest-cursors.json"));
        assert_eq!(settings.log_format, LogFormat::Text);
        assert!(settings.require_api_key().is_err());
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("NYT_API_KEY", "abc123"),
            ("OPENSEARCH_URL", "http://search:9200"),
            ("MAX_CALLS_PER_MINUTE", "10"),
            ("MAX_CALLS_PER_DAY", "4000"),
            ("HTTP_TIMEOUT_SECS", "5"),
            ("CURSOR_FILE", "/var/lib/nyt/cursors.json"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(settings.require_api_key().unwrap(), "abc123");
        assert_eq!(settings.opensearch_url, "http://search:9200");
        assert_eq!(settings.quota.max_calls_per_minute, 10);
        assert_eq!(settings.quota.max_calls_per_day, 4000);
        assert_eq!(settings.http_timeout, Duration::from_secs(5));
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_numbers_are_config_errors() {
        for (key, value) in [("HTTP_TIMEOUT_SECS", "0"), ("MAX_CALLS_PER_DAY", "many"), ("MAX_CALLS_PER_MINUTE", "-1")] {
            let result = settings(&[(key, value)]);
            assert!(
                matches!(result, Err(IndexingError::ConfigError(_))),
                "{}={} should be rejected",
                key,
                value
            );
        }
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let settings = settings(&[("NYT_API_KEY", "  "), ("HTTP_TIMEOUT_SECS", "")]).unwrap();
        assert_eq!(settings.api_key, None);
        assert_eq!(settings.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let settings = settings(&[("NYT_API_KEY", "very-secret")]).unwrap();
        assert!(!format!("{:?}", settings).contains("very-secret"));
    }
}
