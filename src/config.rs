//! Runtime configuration.
//!
//! Loaded from `~/.mailminder/config.json` when present, otherwise built
//! from defaults. The Groq API key may also come from the environment
//! (`MAILMINDER_GROQ_API_KEY`, then `GROQ_API_KEY`), which always wins over
//! the file so deployments can rotate keys without touching config.

use std::path::PathBuf;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::calendar::synth::SynthesisPolicy;
use crate::error::ConfigError;

/// Ordered model fallback chain. Earlier entries are cheaper/faster and are
/// only superseded on failure; the order is load-bearing.
pub const DEFAULT_MODEL_CHAIN: &[&str] = &[
    "llama-3.1-8b-instant",
    "llama-3.3-70b-versatile",
    "openai/gpt-oss-120b",
];

/// OpenAI-compatible Groq endpoint base.
pub const DEFAULT_GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1";

/// The fixed civil timezone for the target user population.
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Groq API key. Usually supplied via environment, not the file.
    pub groq_api_key: Option<String>,
    /// Base URL of the OpenAI-compatible completion endpoint.
    pub groq_endpoint: String,
    /// Ordered model identifiers, tried first-to-last per email.
    pub model_fallback: Vec<String>,
    /// Popup reminder lead time for timed events.
    pub reminder_minutes: u32,
    /// Assumed duration for start-only events.
    pub default_duration_minutes: i64,
    /// IANA timezone name all naive datetimes are interpreted in.
    pub timezone: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            groq_api_key: None,
            groq_endpoint: DEFAULT_GROQ_ENDPOINT.to_string(),
            model_fallback: DEFAULT_MODEL_CHAIN.iter().map(|m| m.to_string()).collect(),
            reminder_minutes: 60,
            default_duration_minutes: 60,
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

/// Path to the config file: `~/.mailminder/config.json`.
pub fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".mailminder")
        .join("config.json")
}

/// Load config from disk, falling back to defaults, then apply env overrides.
pub fn load() -> Result<Config, ConfigError> {
    let path = config_path();
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)?
    } else {
        Config::default()
    };
    apply_env(&mut config);
    Ok(config)
}

fn apply_env(config: &mut Config) {
    let key = std::env::var("MAILMINDER_GROQ_API_KEY")
        .or_else(|_| std::env::var("GROQ_API_KEY"))
        .ok()
        .filter(|k| !k.is_empty());
    if key.is_some() {
        config.groq_api_key = key;
    }
}

impl Config {
    /// Resolve the configured timezone name through the IANA database.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(self.timezone.clone()))
    }

    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.groq_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    /// Build the event synthesis policy from the configured knobs.
    pub fn synthesis_policy(&self) -> Result<SynthesisPolicy, ConfigError> {
        Ok(SynthesisPolicy {
            timezone: self.timezone()?,
            reminder_minutes: self.reminder_minutes,
            default_duration: chrono::Duration::minutes(self.default_duration_minutes),
        })
    }
}
