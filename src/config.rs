//! Configuration management for Perspective-POM

use crate::wait::{SettleWait, WaitPolicy};
use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Default wait settings applied to components
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// How long reads poll the DOM before giving up, in milliseconds
    pub wait_timeout_ms: u64,

    /// Delay between polling attempts, in milliseconds
    pub poll_interval_ms: u64,

    /// Settle wait applied after mutating interactions, in milliseconds
    pub settle_ms: u64,

    /// How long `set_text` waits for a pre-populated value to render
    pub text_prefill_wait_ms: u64,

    /// Extra time `set_text` allows the typed value to appear
    pub text_verify_grace_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: 10_000,
            poll_interval_ms: 500,
            settle_ms: 0,
            text_prefill_wait_ms: 500,
            text_verify_grace_ms: 500,
        }
    }
}

impl WaitConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = WaitConfig::default();

        if let Some(v) = read_ms("POM_WAIT_TIMEOUT_MS")? {
            config.wait_timeout_ms = v;
        }

        if let Some(v) = read_ms("POM_POLL_INTERVAL_MS")? {
            config.poll_interval_ms = v;
        }

        if let Some(v) = read_ms("POM_SETTLE_MS")? {
            config.settle_ms = v;
        }

        if let Some(v) = read_ms("POM_TEXT_PREFILL_WAIT_MS")? {
            config.text_prefill_wait_ms = v;
        }

        if let Some(v) = read_ms("POM_TEXT_VERIFY_GRACE_MS")? {
            config.text_verify_grace_ms = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: WaitConfig = toml::from_str(content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the poller cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::configuration("poll_interval_ms must be greater than zero"));
        }
        Ok(())
    }

    /// Default wait policy for components built from this configuration
    pub fn policy(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_millis(self.wait_timeout_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }

    /// Default settle wait after mutating interactions
    pub fn settle(&self) -> SettleWait {
        SettleWait::from_millis(self.settle_ms)
    }

    /// See [`WaitConfig::text_prefill_wait_ms`]
    pub fn text_prefill_wait(&self) -> Duration {
        Duration::from_millis(self.text_prefill_wait_ms)
    }

    /// See [`WaitConfig::text_verify_grace_ms`]
    pub fn text_verify_grace(&self) -> Duration {
        Duration::from_millis(self.text_verify_grace_ms)
    }
}

fn read_ms(name: &str) -> Result<Option<u64>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::configuration(format!("Invalid {}", name))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = WaitConfig::default();
        let policy = config.policy();
        assert_eq!(policy.timeout(), Duration::from_secs(10));
        assert_eq!(policy.poll_interval(), Duration::from_millis(500));
        assert!(config.settle().is_none());
        assert_eq!(config.text_verify_grace(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = WaitConfig::from_toml_str("wait_timeout_ms = 2000\nsettle_ms = 250\n").unwrap();
        assert_eq!(config.wait_timeout_ms, 2000);
        assert_eq!(config.settle_ms, 250);
        assert_eq!(config.poll_interval_ms, 500);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = WaitConfig::from_toml_str("poll_interval_ms = 0").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_ms = 50").unwrap();
        let config = WaitConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.poll_interval_ms, 50);
    }

    #[test]
    fn test_missing_file() {
        let err = WaitConfig::from_file("/nonexistent/pom.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_from_env_rejects_garbage() {
        env::set_var("POM_SETTLE_MS", "soon");
        let result = WaitConfig::from_env();
        env::remove_var("POM_SETTLE_MS");
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
