//! Runtime configuration resolved from the environment.
//!
//! # Responsibility
//! - Collect store path, logging and AI backend settings in one place.
//! - Pick the AI backend the rest of core talks to.
//!
//! # Invariants
//! - Resolution never fails; missing or blank values fall back to defaults.
//! - The API key is never printed by `Debug`.

use crate::ai::client::{AiError, AiResult, GeminiClient, GenerationClient, ProxyClient};
use crate::logging::default_log_level;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "MANDALA_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "MANDALA_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "MANDALA_LOG_DIR";
pub const ENV_AI_ENDPOINT: &str = "MANDALA_AI_ENDPOINT";
pub const ENV_AI_TIMEOUT_SECS: &str = "MANDALA_AI_TIMEOUT_SECS";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

const DEFAULT_DB_FILE_NAME: &str = "mandala_chart.sqlite3";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 60;

/// Core runtime settings.
#[derive(Clone)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files; logging stays off when `None`.
    pub log_dir: Option<PathBuf>,
    /// Proxy URL accepting `{prompt, systemInstruction}`.
    pub ai_endpoint: Option<String>,
    pub gemini_api_key: Option<String>,
    pub ai_timeout: Duration,
}

impl Debug for CoreConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("db_path", &self.db_path)
            .field("log_level", &self.log_level)
            .field("log_dir", &self.log_dir)
            .field("ai_endpoint", &self.ai_endpoint)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("ai_timeout", &self.ai_timeout)
            .finish()
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl CoreConfig {
    /// Resolves settings from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = get(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
        let ai_timeout = get(ENV_AI_TIMEOUT_SECS)
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_AI_TIMEOUT_SECS);

        Self {
            db_path,
            log_level: get(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: get(ENV_LOG_DIR).map(PathBuf::from),
            ai_endpoint: get(ENV_AI_ENDPOINT),
            gemini_api_key: get(ENV_GEMINI_API_KEY),
            ai_timeout: Duration::from_secs(ai_timeout),
        }
    }

    /// Builds the configured AI backend.
    ///
    /// The proxy wins when both an endpoint and a key are set.
    pub fn ai_client(&self) -> AiResult<Box<dyn GenerationClient>> {
        if let Some(endpoint) = &self.ai_endpoint {
            return Ok(Box::new(ProxyClient::new(endpoint.clone(), self.ai_timeout)?));
        }
        if let Some(key) = &self.gemini_api_key {
            return Ok(Box::new(GeminiClient::new(key.clone(), self.ai_timeout)?));
        }
        Err(AiError::NotConfigured(format!(
            "set {ENV_AI_ENDPOINT} or {ENV_GEMINI_API_KEY}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, ENV_AI_TIMEOUT_SECS, ENV_DB_PATH, ENV_GEMINI_API_KEY};
    use crate::ai::client::AiError;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn config_with(pairs: &[(&str, &str)]) -> CoreConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CoreConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_for_missing_and_blank_values() {
        let config = config_with(&[(ENV_DB_PATH, "  "), (ENV_AI_TIMEOUT_SECS, "0")]);
        assert!(config.db_path.ends_with("mandala_chart.sqlite3"));
        assert_eq!(config.ai_timeout, Duration::from_secs(60));
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn explicit_values_are_used() {
        let config = config_with(&[(ENV_DB_PATH, "/tmp/chart.db"), (ENV_AI_TIMEOUT_SECS, "5")]);
        assert_eq!(config.db_path, PathBuf::from("/tmp/chart.db"));
        assert_eq!(config.ai_timeout, Duration::from_secs(5));
    }

    #[test]
    fn ai_client_requires_endpoint_or_key() {
        let err = CoreConfig::default().ai_client().err().unwrap();
        assert!(matches!(err, AiError::NotConfigured(_)));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = config_with(&[(ENV_GEMINI_API_KEY, "secret-key")]);
        let printed = format!("{config:?}");
        assert!(!printed.contains("secret-key"));
        assert!(printed.contains("<redacted>"));
    }
}
