//! Worker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_WORKER_NAME: &str = "shuttle-worker";
const DEFAULT_STOP_TIMEOUT_MS: u64 = 10_000;

pub const ENV_WORKER_NAME: &str = "SHUTTLE_WORKER_NAME";
pub const ENV_STOP_TIMEOUT_MS: &str = "SHUTTLE_STOP_TIMEOUT_MS";

/// Settings for one [`Worker`](crate::Worker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Name attached to every log event of this worker.
    pub name: String,

    /// How long `stop()` waits for the loop to exit before cancelling it.
    pub stop_timeout_ms: u64,
}

impl WorkerConfig {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    /// Decode from JSON; missing fields fall back to the defaults.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Defaults overridden by `SHUTTLE_WORKER_NAME` / `SHUTTLE_STOP_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(name) = lookup(ENV_WORKER_NAME) {
            config.name = name;
        }
        if let Some(raw) = lookup(ENV_STOP_TIMEOUT_MS) {
            config.stop_timeout_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_STOP_TIMEOUT_MS,
                value: raw,
            })?;
        }
        Ok(config)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_WORKER_NAME.to_string(),
            stop_timeout_ms: DEFAULT_STOP_TIMEOUT_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    #[test]
    fn default_config_has_ten_second_stop_timeout() {
        let config = WorkerConfig::default();
        assert_eq!(config.name, "shuttle-worker");
        assert_eq!(config.stop_timeout(), Duration::from_secs(10));
    }

    #[rstest]
    #[case(r#"{}"#, "shuttle-worker", 10_000)]
    #[case(r#"{"name":"crawler"}"#, "crawler", 10_000)]
    #[case(r#"{"name":"crawler","stop_timeout_ms":250}"#, "crawler", 250)]
    fn from_json_fills_missing_fields(
        #[case] json: &str,
        #[case] name: &str,
        #[case] stop_timeout_ms: u64,
    ) {
        let config = WorkerConfig::from_json(json).unwrap();
        assert_eq!(config.name, name);
        assert_eq!(config.stop_timeout_ms, stop_timeout_ms);
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(matches!(
            WorkerConfig::from_json("not json"),
            Err(ConfigError::Decode(_))
        ));
    }

    #[test]
    fn env_overrides_defaults() {
        let vars = HashMap::from([
            (ENV_WORKER_NAME, "fetcher".to_string()),
            (ENV_STOP_TIMEOUT_MS, " 1500 ".to_string()),
        ]);
        let config = WorkerConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.name, "fetcher");
        assert_eq!(config.stop_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn env_with_bad_timeout_is_rejected() {
        let err = WorkerConfig::from_lookup(|k| {
            (k == ENV_STOP_TIMEOUT_MS).then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: ENV_STOP_TIMEOUT_MS, ref value } if value == "soon"
        ));
    }
}
