//! Dispatch configuration.
//!
//! Every setting is optional. Missing keys fall back to the defaults below,
//! so `DispatchConfig::default()`, an empty TOML file and `{}` all describe
//! the same configuration.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FLAG_FIELD: &str = "warmer";
pub const DEFAULT_CONCURRENCY_FIELD: &str = "concurrency";
pub const DEFAULT_TARGET_FIELD: &str = "target";
pub const DEFAULT_TEST_FIELD: &str = "test";
pub const DEFAULT_DELAY_MS: u64 = 75;
pub const DEFAULT_MAX_CONCURRENCY: u32 = 1000;

/// Per-call warmer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Field whose truthiness marks an event as a warming ping.
    #[serde(rename = "flag", alias = "flag_field")]
    pub flag_field: String,
    /// Field holding the requested concurrency.
    #[serde(rename = "concurrency", alias = "concurrency_field")]
    pub concurrency_field: String,
    /// Field holding the function to warm; absent means self.
    #[serde(rename = "target", alias = "target_field")]
    pub target_field: String,
    /// Field that, when truthy, suppresses all fan-out.
    #[serde(rename = "test", alias = "test_field")]
    pub test_field: String,
    #[serde(rename = "log", alias = "logging_enabled")]
    pub logging_enabled: bool,
    /// Correlation id used when the event carries none. `None` means the
    /// instance id.
    #[serde(
        rename = "correlation_id",
        alias = "correlationId",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_correlation_id: Option<String>,
    #[serde(rename = "delay", alias = "delay_ms")]
    pub delay_ms: u64,
    /// Largest concurrency a ping may request. Larger requests are
    /// malformed and fall back to a concurrency of one.
    #[serde(rename = "max_concurrency", alias = "maxConcurrency")]
    pub max_concurrency: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            flag_field: DEFAULT_FLAG_FIELD.to_string(),
            concurrency_field: DEFAULT_CONCURRENCY_FIELD.to_string(),
            target_field: DEFAULT_TARGET_FIELD.to_string(),
            test_field: DEFAULT_TEST_FIELD.to_string(),
            logging_enabled: true,
            default_correlation_id: None,
            delay_ms: DEFAULT_DELAY_MS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl DispatchConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: DispatchConfig = toml::from_str(&content)
            .with_context(|| format!("invalid warmer config in {}", path.display()))?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_max_concurrency(mut self, max: u32) -> Self {
        self.max_concurrency = max;
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.default_correlation_id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = DispatchConfig::default();
        assert_eq!(config.flag_field, "warmer");
        assert_eq!(config.concurrency_field, "concurrency");
        assert_eq!(config.target_field, "target");
        assert_eq!(config.test_field, "test");
        assert!(config.logging_enabled);
        assert!(config.default_correlation_id.is_none());
        assert_eq!(config.delay(), Duration::from_millis(75));
        assert_eq!(config.max_concurrency, 1000);
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
flag = "ping"
log = false
delay = 120
"#;
        let config: DispatchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.flag_field, "ping");
        assert!(!config.logging_enabled);
        assert_eq!(config.delay_ms, 120);
        assert_eq!(config.concurrency_field, "concurrency");
    }

    #[test]
    fn parse_json_object_with_camel_case_correlation() {
        let config: DispatchConfig =
            serde_json::from_str(r#"{ "correlationId": "abc", "test": "dry" }"#).unwrap();
        assert_eq!(config.default_correlation_id.as_deref(), Some("abc"));
        assert_eq!(config.test_field, "dry");
    }

    #[test]
    fn from_file_round_trips() {
        let config = DispatchConfig::default()
            .with_delay_ms(10)
            .with_correlation_id("root");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_toml_string().unwrap().as_bytes()).unwrap();

        let loaded = DispatchConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn from_file_reports_missing_path() {
        let err = DispatchConfig::from_file(Path::new("/nonexistent/warmer.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
