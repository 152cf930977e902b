//! vigil.toml configuration parser with `VIGIL_*` environment overrides.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilConfig {
    pub site: SiteConfig,
    pub probe: ProbeConfig,
    pub alert: AlertConfig,
    pub telegram: TelegramConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    pub url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "AI Mind OS".to_string(),
            url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Hard deadline for one probe, headers and body included.
    pub timeout_ms: u64,
    /// Responses slower than this are reported unhealthy.
    pub slow_threshold_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            slow_threshold_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Prefix for the last-alert key in the shared store.
    pub namespace: String,
    pub cooldown_secs: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            namespace: "health".to_string(),
            cooldown_secs: 15 * 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: "https://api.telegram.org".to_string(),
        }
    }
}

impl TelegramConfig {
    /// Token and chat id, only when both are set and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let token = self.bot_token.as_deref().filter(|t| !t.is_empty())?;
        let chat = self.chat_id.as_deref().filter(|c| !c.is_empty())?;
        Some((token, chat))
    }
}

/// Which shared key-value store holds the last-alert timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    Redb,
    Rest,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "redb" => Ok(StoreBackend::Redb),
            "rest" => Ok(StoreBackend::Rest),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// redb database file.
    pub path: PathBuf,
    /// Base URL of an Upstash-compatible REST KV.
    pub rest_url: Option<String>,
    pub rest_token: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Redb,
            path: PathBuf::from("vigil.redb"),
            rest_url: None,
            rest_token: None,
        }
    }
}

impl VigilConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load the optional file, overlay the process environment, and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay `VIGIL_*` variables resolved through `lookup`.
    ///
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("VIGIL_SITE_NAME") {
            self.site.name = v;
        }
        if let Some(v) = get("VIGIL_TARGET_URL") {
            self.site.url = v;
        }
        if let Some(v) = get("VIGIL_TIMEOUT_MS") {
            self.probe.timeout_ms = parse_u64("VIGIL_TIMEOUT_MS", v)?;
        }
        if let Some(v) = get("VIGIL_SLOW_MS") {
            self.probe.slow_threshold_ms = parse_u64("VIGIL_SLOW_MS", v)?;
        }
        if let Some(v) = get("VIGIL_ALERT_NAMESPACE") {
            self.alert.namespace = v;
        }
        if let Some(v) = get("VIGIL_ALERT_COOLDOWN_SECS") {
            self.alert.cooldown_secs = parse_u64("VIGIL_ALERT_COOLDOWN_SECS", v)?;
        }
        if let Some(v) = get("VIGIL_TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(v);
        }
        if let Some(v) = get("VIGIL_TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = Some(v);
        }
        if let Some(v) = get("VIGIL_TELEGRAM_API_BASE") {
            self.telegram.api_base = v;
        }
        if let Some(v) = get("VIGIL_STORE") {
            self.store.backend = v.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "VIGIL_STORE",
                value: v.clone(),
            })?;
        }
        if let Some(v) = get("VIGIL_STORE_PATH") {
            self.store.path = PathBuf::from(v);
        }
        if let Some(v) = get("VIGIL_KV_REST_URL") {
            self.store.rest_url = Some(v);
        }
        if let Some(v) = get("VIGIL_KV_REST_TOKEN") {
            self.store.rest_token = Some(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.site.url.trim();
        if url.is_empty() {
            return Err(ConfigError::Invalid(
                "site.url is required (set VIGIL_TARGET_URL)".to_string(),
            ));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "site.url must be an http(s) URL, got {url:?}"
            )));
        }
        if self.probe.timeout_ms == 0 {
            return Err(ConfigError::Invalid("probe.timeout_ms must be > 0".to_string()));
        }
        if self.alert.namespace.is_empty() {
            return Err(ConfigError::Invalid("alert.namespace must not be empty".to_string()));
        }
        if self.store.backend == StoreBackend::Rest
            && (self.store.rest_url.is_none() || self.store.rest_token.is_none())
        {
            return Err(ConfigError::Invalid(
                "rest store requires store.rest_url and store.rest_token".to_string(),
            ));
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe.timeout_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.alert.cooldown_secs)
    }

    /// Store key holding the last-alert timestamp.
    pub fn alert_key(&self) -> String {
        format!("{}:last_alert", self.alert.namespace)
    }

    /// Copy with secrets masked, for printing.
    pub fn redacted(&self) -> Self {
        let mask = |s: &Option<String>| s.as_ref().map(|_| "***".to_string());
        let mut out = self.clone();
        out.telegram.bot_token = mask(&self.telegram.bot_token);
        out.store.rest_token = mask(&self.store.rest_token);
        out
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn parse_u64(var: &'static str, value: String) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = VigilConfig::default();
        assert_eq!(config.site.name, "AI Mind OS");
        assert_eq!(config.probe.timeout_ms, 10_000);
        assert_eq!(config.probe.slow_threshold_ms, 5_000);
        assert_eq!(config.cooldown(), Duration::from_secs(900));
        assert_eq!(config.alert_key(), "health:last_alert");
        assert_eq!(config.store.backend, StoreBackend::Redb);
    }

    #[test]
    fn test_parse_minimal() {
        let toml_str = r#"
[site]
url = "https://aimindos.example"
"#;
        let config = VigilConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.site.url, "https://aimindos.example");
        assert_eq!(config.site.name, "AI Mind OS");
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full() {
        let toml_str = r#"
[site]
name = "Staging"
url = "http://localhost:3000"

[probe]
timeout_ms = 2000
slow_threshold_ms = 800

[alert]
namespace = "staging"
cooldown_secs = 60

[telegram]
bot_token = "123:abc"
chat_id = "-100"

[store]
backend = "memory"
"#;
        let config = VigilConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.probe_timeout(), Duration::from_millis(2000));
        assert_eq!(config.alert_key(), "staging:last_alert");
        assert_eq!(config.telegram.credentials(), Some(("123:abc", "-100")));
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = VigilConfig::from_toml_str(
            "[site]\nurl = \"https://file.example\"\n[probe]\ntimeout_ms = 1\n",
        )
        .unwrap();
        config
            .apply_env(env(&[
                ("VIGIL_TARGET_URL", "https://env.example"),
                ("VIGIL_TIMEOUT_MS", "3000"),
                ("VIGIL_ALERT_NAMESPACE", "prod"),
                ("VIGIL_STORE", "REST"),
                ("VIGIL_KV_REST_URL", "https://kv.example"),
                ("VIGIL_KV_REST_TOKEN", "tok"),
            ]))
            .unwrap();

        assert_eq!(config.site.url, "https://env.example");
        assert_eq!(config.probe.timeout_ms, 3000);
        assert_eq!(config.alert_key(), "prod:last_alert");
        assert_eq!(config.store.backend, StoreBackend::Rest);
        config.validate().unwrap();
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = VigilConfig::default();
        config.site.url = "https://keep.example".to_string();
        config
            .apply_env(env(&[("VIGIL_TARGET_URL", "  ")]))
            .unwrap();
        assert_eq!(config.site.url, "https://keep.example");
    }

    #[test]
    fn bad_numeric_env_is_rejected() {
        let mut config = VigilConfig::default();
        let err = config
            .apply_env(env(&[("VIGIL_SLOW_MS", "fast")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "VIGIL_SLOW_MS", .. }));
    }

    #[test]
    fn validate_requires_http_url() {
        let mut config = VigilConfig::default();
        assert!(config.validate().is_err());

        config.site.url = "ftp://nope".to_string();
        assert!(config.validate().is_err());

        config.site.url = "https://ok.example".to_string();
        config.validate().unwrap();
    }

    #[test]
    fn validate_rest_store_needs_credentials() {
        let mut config = VigilConfig::default();
        config.site.url = "https://ok.example".to_string();
        config.store.backend = StoreBackend::Rest;
        assert!(config.validate().is_err());

        config.store.rest_url = Some("https://kv.example".to_string());
        config.store.rest_token = Some("t".to_string());
        config.validate().unwrap();
    }

    #[test]
    fn credentials_need_both_values() {
        let mut telegram = TelegramConfig::default();
        assert!(telegram.credentials().is_none());
        telegram.bot_token = Some("t".to_string());
        assert!(telegram.credentials().is_none());
        telegram.chat_id = Some(String::new());
        assert!(telegram.credentials().is_none());
        telegram.chat_id = Some("42".to_string());
        assert_eq!(telegram.credentials(), Some(("t", "42")));
    }

    #[test]
    fn redacted_masks_secrets() {
        let mut config = VigilConfig::default();
        config.telegram.bot_token = Some("secret".to_string());
        config.store.rest_token = Some("secret".to_string());
        let rendered = config.redacted().to_toml_string().unwrap();
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn from_file_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = VigilConfig::from_file(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vigil.toml");
        std::fs::write(&path, "[site]\nurl = \"https://disk.example\"\n").unwrap();
        let config = VigilConfig::from_file(&path).unwrap();
        assert_eq!(config.site.url, "https://disk.example");
    }
}
