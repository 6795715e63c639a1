use std::env;
use std::fmt;
use std::time::Duration;

use tracing::info;

use crate::error::{Result, SteenBotError};

/// Application configuration loaded from environment variables.
///
/// Integration credentials are held here but never logged; `Debug` and
/// [`Config::log_redacted`] only report whether each one is set.
#[derive(Clone)]
pub struct Config {
    // Bot
    pub bot_id: String,
    pub bot_name: String,
    pub poll_interval: Duration,

    // Pipeline / engine / registry
    pub call_timeout: Option<Duration>,
    pub replay_continue_on_error: bool,

    // Integrations
    pub github_enabled: bool,
    pub jira_enabled: bool,

    // Integration credentials
    pub github_token: Option<String>,
    pub github_organization: Option<String>,
    pub jira_url: Option<String>,
    pub jira_username: Option<String>,
    pub jira_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot_id: "steenbot".to_string(),
            bot_name: "SteenBot".to_string(),
            poll_interval: Duration::from_millis(60_000),
            call_timeout: None,
            replay_continue_on_error: false,
            github_enabled: false,
            jira_enabled: false,
            github_token: None,
            github_organization: None,
            jira_url: None,
            jira_username: None,
            jira_token: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables. Every variable is
    /// optional; malformed values are rejected rather than silently defaulted.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests use a map instead of the process env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let poll_ms = parse_u64(&lookup, "STEENBOT_POLL_INTERVAL_MS")?;
        if poll_ms == Some(0) {
            return Err(SteenBotError::Validation(
                "STEENBOT_POLL_INTERVAL_MS must be greater than zero".into(),
            ));
        }

        Ok(Self {
            bot_id: lookup("STEENBOT_ID").unwrap_or(defaults.bot_id),
            bot_name: lookup("STEENBOT_NAME").unwrap_or(defaults.bot_name),
            poll_interval: poll_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            call_timeout: parse_u64(&lookup, "STEENBOT_CALL_TIMEOUT_MS")?
                .map(Duration::from_millis),
            replay_continue_on_error: parse_bool(&lookup, "STEENBOT_REPLAY_CONTINUE_ON_ERROR")?
                .unwrap_or(defaults.replay_continue_on_error),
            github_enabled: parse_bool(&lookup, "GITHUB_INTEGRATION_ENABLED")?
                .unwrap_or(defaults.github_enabled),
            jira_enabled: parse_bool(&lookup, "JIRA_INTEGRATION_ENABLED")?
                .unwrap_or(defaults.jira_enabled),
            github_token: non_empty(&lookup, "GITHUB_TOKEN"),
            github_organization: non_empty(&lookup, "GITHUB_ORGANIZATION"),
            jira_url: non_empty(&lookup, "JIRA_URL"),
            jira_username: non_empty(&lookup, "JIRA_USERNAME"),
            jira_token: non_empty(&lookup, "JIRA_TOKEN"),
        })
    }

    /// Log the effective configuration. Credentials are reported as set or unset.
    pub fn log_redacted(&self) {
        info!(
            bot_id = %self.bot_id,
            bot_name = %self.bot_name,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            call_timeout_ms = ?self.call_timeout.map(|d| d.as_millis() as u64),
            replay_continue_on_error = self.replay_continue_on_error,
            github_enabled = self.github_enabled,
            jira_enabled = self.jira_enabled,
            github_token_set = self.github_token.is_some(),
            github_organization = ?self.github_organization,
            jira_url = ?self.jira_url,
            jira_username_set = self.jira_username.is_some(),
            jira_token_set = self.jira_token.is_some(),
            "Configuration loaded"
        );
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[redacted]");
        f.debug_struct("Config")
            .field("bot_id", &self.bot_id)
            .field("bot_name", &self.bot_name)
            .field("poll_interval", &self.poll_interval)
            .field("call_timeout", &self.call_timeout)
            .field("replay_continue_on_error", &self.replay_continue_on_error)
            .field("github_enabled", &self.github_enabled)
            .field("jira_enabled", &self.jira_enabled)
            .field("github_token", &redact(&self.github_token))
            .field("github_organization", &self.github_organization)
            .field("jira_url", &self.jira_url)
            .field("jira_username", &redact(&self.jira_username))
            .field("jira_token", &redact(&self.jira_token))
            .finish()
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|_| SteenBotError::Validation(format!("{key} must be a number, got {raw:?}")))
        })
        .transpose()
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<bool>> {
    lookup(key)
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(SteenBotError::Validation(format!(
                "{key} must be a boolean, got {raw:?}"
            ))),
        })
        .transpose()
}
