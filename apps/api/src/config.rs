use thiserror::Error;

use crate::batch::BatchSettings;

const DEFAULT_MIN_TEXT_CHARS: usize = 50;
const DEFAULT_MAX_PROMPT_CHARS: usize = 6000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Fatal configuration problems. Raised before the server binds; nothing is processed.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Required environment variable '{0}' is not set")]
    MissingVar(&'static str),

    #[error("Environment variable '{key}' is invalid: {reason}")]
    InvalidVar { key: &'static str, reason: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Trimmed documents shorter than this are treated as unextractable.
    pub min_text_chars: usize,
    /// Resume text is cut to this many characters before it reaches the model.
    pub max_prompt_chars: usize,
    pub max_upload_bytes: usize,
    pub llm_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, StartupError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, StartupError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let anthropic_api_key = lookup("ANTHROPIC_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or(StartupError::MissingVar("ANTHROPIC_API_KEY"))?;

        let config = Config {
            anthropic_api_key,
            port: parse_or("PORT", &lookup, 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            min_text_chars: parse_or("MIN_TEXT_CHARS", &lookup, DEFAULT_MIN_TEXT_CHARS)?,
            max_prompt_chars: parse_or("MAX_PROMPT_CHARS", &lookup, DEFAULT_MAX_PROMPT_CHARS)?,
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", &lookup, DEFAULT_MAX_UPLOAD_BYTES)?,
            llm_timeout_secs: parse_or("LLM_TIMEOUT_SECS", &lookup, DEFAULT_LLM_TIMEOUT_SECS)?,
        };

        if config.max_prompt_chars == 0 {
            return Err(StartupError::InvalidVar {
                key: "MAX_PROMPT_CHARS",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(config)
    }

    pub fn batch_settings(&self) -> BatchSettings {
        BatchSettings {
            min_text_chars: self.min_text_chars,
            max_prompt_chars: self.max_prompt_chars,
        }
    }
}

fn parse_or<T, F>(key: &'static str, lookup: &F, default: T) -> Result<T, StartupError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| StartupError::InvalidVar {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
