//! Configuration for the assistant relay.
//!
//! Values come from `TRAVIGO_*` environment variables. Everything except the
//! credentials has a default.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::errors::{AssistantError, AssistantResult};

/// Environment variable holding the Twilio account SID.
pub const TWILIO_ACCOUNT_SID_ENV: &str = "TRAVIGO_TWILIO_ACCOUNT_SID";
/// Environment variable holding the Twilio auth token.
pub const TWILIO_AUTH_TOKEN_ENV: &str = "TRAVIGO_TWILIO_AUTH_TOKEN";
/// Environment variable holding the Twilio Conversations service SID.
pub const TWILIO_SERVICE_SID_ENV: &str = "TRAVIGO_TWILIO_SERVICE_SID";
const TWILIO_BASE_URL_ENV: &str = "TRAVIGO_TWILIO_BASE_URL";
/// Environment variable holding the Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "TRAVIGO_GEMINI_API_KEY";
const GEMINI_MODEL_ENV: &str = "TRAVIGO_GEMINI_MODEL";
const GEMINI_BASE_URL_ENV: &str = "TRAVIGO_GEMINI_BASE_URL";
const TRAVIGO_API_BASE_URL_ENV: &str = "TRAVIGO_API_BASE_URL";
const DB_PATH_ENV: &str = "TRAVIGO_ASSISTANT_DB";
const PORT_ENV: &str = "TRAVIGO_ASSISTANT_PORT";
const HISTORY_LIMIT_ENV: &str = "TRAVIGO_HISTORY_LIMIT";
const MAX_FUNCTION_CALLS_ENV: &str = "TRAVIGO_MAX_FUNCTION_CALLS";
const REQUEST_TIMEOUT_ENV: &str = "TRAVIGO_REQUEST_TIMEOUT_SECS";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Top-level configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Messaging provider settings.
    pub twilio: TwilioConfig,
    /// Generative model settings.
    pub model: ModelConfig,
    /// Transit API settings.
    pub travigo: TravigoConfig,
    /// Conversation persistence settings.
    pub storage: StorageConfig,
}

impl AssistantConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns an error if a variable is present but cannot be parsed, or if
    /// the resulting configuration is invalid.
    pub fn from_env() -> AssistantResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns an error if a value cannot be parsed or validation fails.
    pub fn from_lookup<F>(lookup: F) -> AssistantResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = parse_var(&lookup, PORT_ENV)? {
            config.server.port = port;
        }

        config.twilio.account_sid = lookup(TWILIO_ACCOUNT_SID_ENV).unwrap_or_default();
        config.twilio.auth_token = lookup(TWILIO_AUTH_TOKEN_ENV).unwrap_or_default();
        config.twilio.service_sid = lookup(TWILIO_SERVICE_SID_ENV).unwrap_or_default();
        if let Some(base_url) = lookup(TWILIO_BASE_URL_ENV) {
            config.twilio.base_url = base_url;
        }

        config.model.api_key = lookup(GEMINI_API_KEY_ENV).unwrap_or_default();
        if let Some(model) = lookup(GEMINI_MODEL_ENV) {
            config.model.model = model;
        }
        if let Some(base_url) = lookup(GEMINI_BASE_URL_ENV) {
            config.model.base_url = base_url;
        }
        if let Some(limit) = parse_var(&lookup, MAX_FUNCTION_CALLS_ENV)? {
            config.model.max_automatic_function_calls = limit;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, REQUEST_TIMEOUT_ENV)? {
            config.model.request_timeout = Duration::from_secs(secs);
        }

        if let Some(base_url) = lookup(TRAVIGO_API_BASE_URL_ENV) {
            config.travigo.base_url = base_url;
        }

        if let Some(path) = lookup(DB_PATH_ENV) {
            config.storage.sqlite_path = PathBuf::from(path);
        }
        if let Some(limit) = parse_var(&lookup, HISTORY_LIMIT_ENV)? {
            config.storage.history_limit = limit;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> AssistantResult<()> {
        if self.model.max_automatic_function_calls == 0 {
            return Err(AssistantError::InvalidConfig(
                "model.max_automatic_function_calls must be > 0".to_string(),
            ));
        }

        if self.model.request_timeout.is_zero() {
            return Err(AssistantError::InvalidConfig(
                "model.request_timeout must be > 0".to_string(),
            ));
        }

        if self.model.model.trim().is_empty() {
            return Err(AssistantError::InvalidConfig(
                "model.model must not be empty".to_string(),
            ));
        }

        Url::parse(&self.twilio.base_url)?;
        Url::parse(&self.model.base_url)?;
        Url::parse(&self.travigo.base_url)?;

        Ok(())
    }

    /// Check that the model API key is present.
    ///
    /// # Errors
    /// Returns an error naming the missing variable.
    pub fn require_model(&self) -> AssistantResult<()> {
        require(&self.model.api_key, GEMINI_API_KEY_ENV)
    }

    /// Check that all Twilio credentials are present.
    ///
    /// # Errors
    /// Returns an error naming the first missing variable.
    pub fn require_twilio(&self) -> AssistantResult<()> {
        require(&self.twilio.account_sid, TWILIO_ACCOUNT_SID_ENV)?;
        require(&self.twilio.auth_token, TWILIO_AUTH_TOKEN_ENV)?;
        require(&self.twilio.service_sid, TWILIO_SERVICE_SID_ENV)
    }
}

fn require(value: &str, name: &str) -> AssistantResult<()> {
    if value.trim().is_empty() {
        return Err(AssistantError::InvalidConfig(format!("{name} is not set")));
    }
    Ok(())
}

fn parse_var<T, F>(lookup: &F, key: &str) -> AssistantResult<Option<T>>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| {
                AssistantError::InvalidConfig(format!("{key} has an invalid value: {raw}"))
            }),
        None => Ok(None),
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

/// Twilio Conversations settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TwilioConfig {
    /// Account SID, used as the basic-auth user.
    pub account_sid: String,
    /// Auth token, used as the basic-auth password.
    pub auth_token: String,
    /// Conversations service SID replies are posted under.
    pub service_sid: String,
    /// Conversations API base URL.
    pub base_url: String,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            service_sid: String::new(),
            base_url: "https://conversations.twilio.com".to_string(),
        }
    }
}

/// Generative model settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    /// API key sent as `x-goog-api-key`.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// API base URL, without the `/models` suffix.
    pub base_url: String,
    /// Rounds of automatic function calling allowed per user message.
    pub max_automatic_function_calls: usize,
    /// Timeout applied to outbound HTTP requests.
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.0-flash-exp".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            max_automatic_function_calls: 5,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Travigo transit API settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TravigoConfig {
    /// API base URL.
    pub base_url: String,
}

impl Default for TravigoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.travigo.app".to_string(),
        }
    }
}

/// Conversation persistence settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `SQLite` database path.
    pub sqlite_path: PathBuf,
    /// Maximum history entries kept per conversation (0 keeps everything).
    pub history_limit: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("travigo_assistant.db"),
            history_limit: 20,
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AssistantConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.model.max_automatic_function_calls, 5);
        assert_eq!(config.travigo.base_url, "https://api.travigo.app");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = AssistantConfig::from_lookup(lookup_from(&[
            (PORT_ENV, "9090"),
            (GEMINI_MODEL_ENV, "gemini-1.5-flash"),
            (HISTORY_LIMIT_ENV, "8"),
            (TRAVIGO_API_BASE_URL_ENV, "http://localhost:8080"),
            (TWILIO_ACCOUNT_SID_ENV, "AC123"),
        ]));
        assert!(config.is_ok());
        let config = config.unwrap_or_default();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.model.model, "gemini-1.5-flash");
        assert_eq!(config.storage.history_limit, 8);
        assert_eq!(config.travigo.base_url, "http://localhost:8080");
        assert_eq!(config.twilio.account_sid, "AC123");
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let result = AssistantConfig::from_lookup(lookup_from(&[(PORT_ENV, "not-a-port")]));
        assert!(matches!(result, Err(AssistantError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_function_calls_is_rejected() {
        let result =
            AssistantConfig::from_lookup(lookup_from(&[(MAX_FUNCTION_CALLS_ENV, "0")]));
        assert!(matches!(result, Err(AssistantError::InvalidConfig(_))));
    }

    #[test]
    fn test_bad_url_is_rejected() {
        let result =
            AssistantConfig::from_lookup(lookup_from(&[(TRAVIGO_API_BASE_URL_ENV, "not a url")]));
        assert!(matches!(result, Err(AssistantError::Url(_))));
    }

    #[test]
    fn test_require_twilio_names_missing_variable() {
        let config = AssistantConfig::from_lookup(lookup_from(&[
            (TWILIO_ACCOUNT_SID_ENV, "AC123"),
            (TWILIO_AUTH_TOKEN_ENV, "secret"),
        ]))
        .unwrap_or_default();
        let err = config.require_twilio().err().map(|e| e.to_string());
        assert_eq!(
            err.as_deref(),
            Some("invalid configuration: TRAVIGO_TWILIO_SERVICE_SID is not set")
        );
        assert!(config.require_model().is_err());
    }
}
