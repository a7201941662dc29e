use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::json::SchemaPolicy;
use crate::llm::GeminiConfig;
use crate::llm::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub dataset: String,
    pub snapshot_path: Option<PathBuf>,
    pub schema_policy: SchemaPolicy,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub llm_timeout: Option<Duration>,
}

impl AppConfig {
    /// Reads the process environment after loading `.env`, if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = var("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match var("APP_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|err| ConfigError::Invalid {
                key: "APP_PORT",
                reason: err.to_string(),
            })?,
            None => 8000,
        };

        let dataset = var("WAREHOUSE_DATASET").unwrap_or_else(|| "canvasflow".to_string());
        let snapshot_path = var("WAREHOUSE_SNAPSHOT").map(PathBuf::from);

        let schema_policy = match var("SCHEMA_POLICY") {
            Some(raw) => raw
                .parse::<SchemaPolicy>()
                .map_err(|reason| ConfigError::Invalid {
                    key: "SCHEMA_POLICY",
                    reason,
                })?,
            None => SchemaPolicy::Widen,
        };

        let gemini_api_key = var("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;
        let gemini_model = var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let gemini_base_url =
            var("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let llm_timeout = match var("LLM_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.parse::<u64>().map_err(|err| {
                ConfigError::Invalid {
                    key: "LLM_TIMEOUT_SECS",
                    reason: err.to_string(),
                }
            })?)),
            None => None,
        };

        Ok(Self {
            host,
            port,
            dataset,
            snapshot_path,
            schema_policy,
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            llm_timeout,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn gemini(&self) -> GeminiConfig {
        let config = GeminiConfig::new(self.gemini_api_key.as_str())
            .model(self.gemini_model.as_str())
            .base_url(self.gemini_base_url.as_str());
        match self.llm_timeout {
            Some(timeout) => config.timeout(timeout),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("GEMINI_API_KEY", "k")]).unwrap();
        assert_eq!(cfg.address(), "0.0.0.0:8000");
        assert_eq!(cfg.dataset, "canvasflow");
        assert_eq!(cfg.schema_policy, SchemaPolicy::Widen);
        assert_eq!(cfg.gemini_model, DEFAULT_MODEL);
        assert!(cfg.snapshot_path.is_none());
        assert!(cfg.llm_timeout.is_none());
    }

    #[test]
    fn api_key_is_required() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::Missing("GEMINI_API_KEY"));
        assert_eq!(
            config(&[("GEMINI_API_KEY", " ")]).unwrap_err(),
            ConfigError::Missing("GEMINI_API_KEY")
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config(&[
            ("GEMINI_API_KEY", "k"),
            ("APP_PORT", "9100"),
            ("SCHEMA_POLICY", "strict"),
            ("WAREHOUSE_SNAPSHOT", "/tmp/store.snapshot"),
            ("LLM_TIMEOUT_SECS", "30"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.schema_policy, SchemaPolicy::Strict);
        assert_eq!(cfg.snapshot_path, Some(PathBuf::from("/tmp/store.snapshot")));
        assert_eq!(cfg.gemini().timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            config(&[("GEMINI_API_KEY", "k"), ("APP_PORT", "eighty")]),
            Err(ConfigError::Invalid { key: "APP_PORT", .. })
        ));
        assert!(matches!(
            config(&[("GEMINI_API_KEY", "k"), ("SCHEMA_POLICY", "loose")]),
            Err(ConfigError::Invalid { key: "SCHEMA_POLICY", .. })
        ));
    }
}
