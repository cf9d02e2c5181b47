//! Configuration management for quiz acquisition

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Gemini `generateContent` endpoint used when none is configured
pub const DEFAULT_API_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent";

/// Quiz acquisition configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuizConfig {
    /// Provider URL receiving the generation request
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    /// Provider credential, sent as the `key` query parameter
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-attempt timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Attempts made by the retrying variant
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Time unit of the `2^n` backoff, in milliseconds
    #[serde(default = "default_backoff_unit_ms")]
    pub backoff_unit_ms: u64,

    /// Upper bound of a single backoff wait in milliseconds (0 = uncapped)
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Add up to 25% random extra wait to each backoff
    #[serde(default)]
    pub retry_jitter: bool,

    /// Network requests allowed in flight at once
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Skip the network and serve the local dataset only
    #[serde(default)]
    pub offline_mode: bool,

    /// On-disk dataset replacing the bundled one
    #[serde(default)]
    pub dataset_path: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Top-k sampling
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Nucleus sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Output token budget
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            api_endpoint: default_api_endpoint(),
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_unit_ms: default_backoff_unit_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            retry_jitter: false,
            max_concurrent_requests: default_max_concurrent_requests(),
            offline_mode: false,
            dataset_path: None,
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl QuizConfig {
    /// Load configuration from `QUIZ_*` environment variables
    pub fn from_env() -> Result<Self> {
        let config: Self = envy::prefixed("QUIZ_")
            .from_env()
            .map_err(|e| Error::Config(format!("Failed to parse environment variables: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// A missing API key is not an error here: the service runs on the local
    /// dataset until one is provided.
    pub fn validate(&self) -> Result<()> {
        if !self.api_endpoint.is_empty() {
            Url::parse(&self.api_endpoint).map_err(|e| {
                Error::Config(format!("Invalid api_endpoint '{}': {}", self.api_endpoint, e))
            })?;
        }

        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be > 0".to_string()));
        }

        if self.max_attempts == 0 {
            return Err(Error::Config("max_attempts must be >= 1".to_string()));
        }

        if self.max_concurrent_requests == 0 {
            return Err(Error::Config(
                "max_concurrent_requests must be >= 1".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Config("temperature must be between 0.0 and 2.0".to_string()));
        }

        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(Error::Config("top_p must be between 0.0 and 1.0".to_string()));
        }

        if self.max_output_tokens == 0 {
            return Err(Error::Config("max_output_tokens must be > 0".to_string()));
        }

        Ok(())
    }

    /// True when both a key and an endpoint are present
    pub fn is_configured(&self) -> bool {
        self.api_key().is_some() && !self.api_endpoint.trim().is_empty()
    }

    /// Non-blank API key
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }

    pub fn max_backoff(&self) -> Option<Duration> {
        (self.max_backoff_ms > 0).then(|| Duration::from_millis(self.max_backoff_ms))
    }
}

// Default value functions
fn default_api_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_unit_ms() -> u64 {
    1000
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

fn default_max_concurrent_requests() -> usize {
    crate::MAX_CONCURRENT_REQUESTS
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_k() -> u32 {
    40
}

fn default_top_p() -> f32 {
    0.95
}

fn default_max_output_tokens() -> u32 {
    1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid_but_unconfigured() {
        let config = QuizConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.is_configured());
        assert_eq!(config.max_concurrent_requests, 3);
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_blank_key_is_not_configured() {
        let config = QuizConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(!config.is_configured());

        let config = QuizConfig {
            api_key: Some("secret".to_string()),
            ..Default::default()
        };
        assert!(config.is_configured());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let bad_url = QuizConfig {
            api_endpoint: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(bad_url.validate(), Err(Error::Config(_))));

        let zero_attempts = QuizConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(zero_attempts.validate().is_err());

        let zero_limit = QuizConfig {
            max_concurrent_requests: 0,
            ..Default::default()
        };
        assert!(zero_limit.validate().is_err());

        let hot = QuizConfig {
            temperature: 3.5,
            ..Default::default()
        };
        assert!(hot.validate().is_err());
    }

    #[test]
    fn test_backoff_cap() {
        let capped = QuizConfig::default();
        assert_eq!(capped.max_backoff(), Some(Duration::from_secs(60)));

        let uncapped = QuizConfig {
            max_backoff_ms: 0,
            ..Default::default()
        };
        assert_eq!(uncapped.max_backoff(), None);
    }

    #[test]
    fn test_from_env_reads_prefixed_variables() {
        std::env::set_var("QUIZ_API_KEY", "env-key");
        std::env::set_var("QUIZ_MAX_ATTEMPTS", "5");
        std::env::set_var("QUIZ_OFFLINE_MODE", "true");
        std::env::set_var("QUIZ_RETRY_JITTER", "true");

        let config = QuizConfig::from_env().unwrap();

        std::env::remove_var("QUIZ_API_KEY");
        std::env::remove_var("QUIZ_MAX_ATTEMPTS");
        std::env::remove_var("QUIZ_OFFLINE_MODE");
        std::env::remove_var("QUIZ_RETRY_JITTER");

        assert_eq!(config.api_key(), Some("env-key"));
        assert_eq!(config.max_attempts, 5);
        assert!(config.offline_mode);
        assert!(config.retry_jitter);
        assert_eq!(config.api_endpoint, DEFAULT_API_ENDPOINT);
    }
}
