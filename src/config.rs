//! Configuration types, read from the environment.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default model used for scoring.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default OpenAI-compatible API base.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default port for the scoring HTTP server.
pub const DEFAULT_API_PORT: u16 = 8000;

/// Scoring server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Port the `/survey` endpoint listens on.
    pub port: u16,
    /// Model provider API key.
    pub api_key: SecretString,
    /// Model identifier sent with every completion request.
    pub model: String,
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Upper bound on a single model call.
    pub llm_timeout: Duration,
    /// Optional completion length cap per call.
    pub max_tokens: Option<u32>,
}

impl ApiConfig {
    /// Build from `OPENAI_API_KEY` (or legacy `OPENAI_KEY`), `SCORING_MODEL`,
    /// `OPENAI_BASE_URL`, `SCORING_LLM_TIMEOUT_SECS`, `SCORING_MAX_TOKENS` and
    /// `SURVEY_API_PORT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = first_env(&["OPENAI_API_KEY", "OPENAI_KEY"])
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        Ok(Self {
            port: api_port()?,
            api_key: SecretString::from(api_key),
            model: std::env::var("SCORING_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            llm_timeout: Duration::from_secs(parse_env("SCORING_LLM_TIMEOUT_SECS", 60)?),
            max_tokens: parse_optional_env("SCORING_MAX_TOKENS")?,
        })
    }
}

/// Port of the scoring server, from `SURVEY_API_PORT`.
pub fn api_port() -> Result<u16, ConfigError> {
    parse_env("SURVEY_API_PORT", DEFAULT_API_PORT)
}

/// Chat bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token. `None` runs the bot on the CLI channel.
    pub telegram_token: Option<SecretString>,
    /// Telegram usernames or numeric ids allowed to talk to the bot (`*` = everyone).
    pub allowed_users: Vec<String>,
    /// Full URL of the scoring endpoint.
    pub survey_api_url: String,
    /// Upper bound on the whole scoring HTTP call (it covers eight model calls).
    pub survey_api_timeout: Duration,
    /// Sessions with no traffic for this long are dropped.
    pub session_idle_timeout: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            telegram_token: None,
            allowed_users: vec!["*".to_string()],
            survey_api_url: format!("http://127.0.0.1:{DEFAULT_API_PORT}/survey"),
            survey_api_timeout: Duration::from_secs(600), // 10 minutes
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
        }
    }
}

impl BotConfig {
    /// Build from `TELEGRAM_BOT_TOKEN` (or legacy `TELEGRAM_KEY`), `TELEGRAM_ALLOWED_USERS`,
    /// `SURVEY_API_URL`, `SURVEY_API_TIMEOUT_SECS` and `SESSION_IDLE_TIMEOUT_SECS`.
    ///
    /// `api_port` is used to derive the default scoring URL when the bot and
    /// the scoring server share a process.
    pub fn from_env(api_port: u16) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let telegram_token =
            first_env(&["TELEGRAM_BOT_TOKEN", "TELEGRAM_KEY"]).map(SecretString::from);

        let allowed_users: Vec<String> = std::env::var("TELEGRAM_ALLOWED_USERS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let survey_api_url = std::env::var("SURVEY_API_URL")
            .unwrap_or_else(|_| format!("http://127.0.0.1:{api_port}/survey"));

        Ok(Self {
            telegram_token,
            allowed_users,
            survey_api_url,
            survey_api_timeout: Duration::from_secs(parse_env(
                "SURVEY_API_TIMEOUT_SECS",
                defaults.survey_api_timeout.as_secs(),
            )?),
            session_idle_timeout: Duration::from_secs(parse_env(
                "SESSION_IDLE_TIMEOUT_SECS",
                defaults.session_idle_timeout.as_secs(),
            )?),
        })
    }
}

/// First non-blank value among `keys`, in order.
fn first_env(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_optional_env(key)?.unwrap_or(default))
}

fn parse_optional_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })
        }
        _ => Ok(None),
    }
}
