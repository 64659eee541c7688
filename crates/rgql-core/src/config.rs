use crate::client::{ClientConfig, DEFAULT_TIMEOUT};
use crate::retry::{RetryPolicy, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_DELAY};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum number of attempts per call (including the first).
    pub max_attempts: u32,
    /// Delay before the first retry, in seconds (e.g. 0.25 = 250ms).
    pub initial_delay_secs: f64,
    /// Backoff ceiling in seconds, applied before jitter.
    pub max_delay_secs: f64,
    #[serde(default = "default_base")]
    pub exponential_base: f64,
    #[serde(default = "default_true")]
    pub jitter: bool,
}

fn default_true() -> bool {
    true
}

fn default_base() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            enabled: policy.enabled,
            max_attempts: policy.max_attempts,
            initial_delay_secs: policy.initial_delay.as_secs_f64(),
            max_delay_secs: policy.max_delay.as_secs_f64(),
            exponential_base: policy.exponential_base,
            jitter: policy.jitter,
        }
    }
}

impl RetryConfig {
    /// Normalized policy. Negative or unreadable delays fall back to the defaults.
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.enabled,
            self.max_attempts,
            secs_or(self.initial_delay_secs, DEFAULT_INITIAL_DELAY),
            secs_or(self.max_delay_secs, DEFAULT_MAX_DELAY),
            self.exponential_base,
            self.jitter,
        )
    }
}

fn secs_or(secs: f64, fallback: Duration) -> Duration {
    if secs < 0.0 {
        return fallback;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(fallback)
}

/// Global configuration loaded from `~/.config/rgql/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RgqlConfig {
    /// GraphQL endpoint; commands can override it with `--endpoint`.
    #[serde(default)]
    pub endpoint: String,
    /// Bearer token; omitted from the file when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Per-request timeout in seconds (0 = default of 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Emit request/retry events through `tracing`.
    #[serde(default = "default_true")]
    pub logging: bool,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl Default for RgqlConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4000/graphql".to_string(),
            token: None,
            timeout_secs: default_timeout_secs(),
            logging: true,
            retry: Some(RetryConfig::default()),
            headers: BTreeMap::new(),
        }
    }
}

impl RgqlConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryConfig::to_policy)
            .unwrap_or_default()
    }

    /// Client settings; validation of the endpoint happens when the client is built.
    pub fn to_client_config(&self) -> ClientConfig {
        let mut cfg = ClientConfig::new(self.endpoint.clone());
        cfg.token = self.token.clone().filter(|t| !t.is_empty());
        cfg.headers = self.headers.clone().into_iter().collect();
        cfg.timeout = match self.timeout_secs {
            0 => DEFAULT_TIMEOUT,
            secs => Duration::from_secs(secs),
        };
        cfg.retry = self.retry_policy();
        cfg.logging = self.logging;
        cfg
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rgql")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RgqlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RgqlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

pub fn load_from(path: &Path) -> Result<RgqlConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: RgqlConfig = toml::from_str(&data)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_values() {
        let cfg = RgqlConfig::default();
        assert_eq!(cfg.timeout_secs, 30);
        assert!(cfg.logging);
        assert!(cfg.token.is_none());
        assert_eq!(cfg.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = RgqlConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: RgqlConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.endpoint, cfg.endpoint);
        assert_eq!(parsed.timeout_secs, cfg.timeout_secs);
        assert_eq!(parsed.retry, cfg.retry);
    }

    #[test]
    fn minimal_file_uses_defaults() {
        let cfg: RgqlConfig = toml::from_str(r#"endpoint = "https://api.example.com/graphql""#).unwrap();
        assert_eq!(cfg.timeout_secs, 30);
        assert!(cfg.logging);
        assert!(cfg.retry.is_none());
        assert!(cfg.headers.is_empty());
        assert_eq!(cfg.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn config_toml_retry_and_headers() {
        let toml = r#"
            endpoint = "https://api.example.com/graphql"
            token = "abc"
            timeout_secs = 10
            logging = false

            [headers]
            X-Tenant = "acme"

            [retry]
            max_attempts = 5
            initial_delay_secs = 0.5
            max_delay_secs = 15
            jitter = false
        "#;
        let cfg: RgqlConfig = toml::from_str(toml).unwrap();
        let client = cfg.to_client_config();
        assert_eq!(client.token.as_deref(), Some("abc"));
        assert_eq!(client.timeout, Duration::from_secs(10));
        assert!(!client.logging);
        assert_eq!(client.headers.get("X-Tenant").map(String::as_str), Some("acme"));

        let policy = client.retry;
        assert!(policy.enabled);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(15));
        assert_eq!(policy.exponential_base, 2.0);
        assert!(!policy.jitter);
    }

    #[test]
    fn retry_section_is_normalized() {
        let retry = RetryConfig {
            enabled: true,
            max_attempts: 0,
            initial_delay_secs: -3.0,
            max_delay_secs: 0.1,
            exponential_base: 0.5,
            jitter: true,
        };
        let policy = retry.to_policy();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.initial_delay, DEFAULT_INITIAL_DELAY);
        // max below initial resets to the default ceiling
        assert_eq!(policy.max_delay, DEFAULT_MAX_DELAY);
        assert_eq!(policy.exponential_base, 2.0);
    }

    #[test]
    fn zero_timeout_means_default() {
        let cfg = RgqlConfig {
            timeout_secs: 0,
            ..RgqlConfig::default()
        };
        assert_eq!(cfg.to_client_config().timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endpoint = \"http://127.0.0.1:8080/graphql\"").unwrap();
        writeln!(file, "[retry]\nenabled = false\nmax_attempts = 3\ninitial_delay_secs = 1\nmax_delay_secs = 30").unwrap();
        let cfg = load_from(file.path()).unwrap();
        assert_eq!(cfg.endpoint, "http://127.0.0.1:8080/graphql");
        assert!(!cfg.retry_policy().enabled);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeout_secs = \"soon\"").unwrap();
        let err = load_from(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("failed to parse config"));
    }
}
