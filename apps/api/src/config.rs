use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::LlmClientConfig;
use crate::speech::SpeechConfig;

const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const DEFAULT_LLM_MODEL: &str = "gemini-2.0-flash-exp";
const DEFAULT_SPEECH_BASE_URL: &str = "https://api.openai.com/v1";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub llm_max_retries: u32,
    /// Voice answers and question audio are enabled only when this is set.
    pub speech_api_key: Option<String>,
    pub speech_base_url: String,
    pub stt_model: String,
    pub tts_model: String,
    pub tts_voice: String,
    /// When false, an empty transcript asks the candidate to answer again
    /// instead of being recorded.
    pub accept_empty_transcripts: bool,
    pub results_dir: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            llm_api_key: lookup("LLM_API_KEY")
                .context("Required environment variable 'LLM_API_KEY' is not set")?,
            llm_base_url: var("LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
            llm_model: var("LLM_MODEL", DEFAULT_LLM_MODEL),
            llm_timeout_secs: parse(&lookup, "LLM_TIMEOUT_SECS", 120)?,
            llm_max_retries: parse(&lookup, "LLM_MAX_RETRIES", 3)?,
            speech_api_key: lookup("SPEECH_API_KEY").filter(|k| !k.trim().is_empty()),
            speech_base_url: var("SPEECH_BASE_URL", DEFAULT_SPEECH_BASE_URL),
            stt_model: var("STT_MODEL", "whisper-1"),
            tts_model: var("TTS_MODEL", "tts-1"),
            tts_voice: var("TTS_VOICE", "alloy"),
            accept_empty_transcripts: parse(&lookup, "ACCEPT_EMPTY_TRANSCRIPTS", true)?,
            results_dir: var("RESULTS_DIR", "Result"),
            port: parse(&lookup, "PORT", 8080)?,
            rust_log: var("RUST_LOG", "info"),
        })
    }

    pub fn llm_client_config(&self) -> LlmClientConfig {
        LlmClientConfig {
            base_url: self.llm_base_url.clone(),
            api_key: self.llm_api_key.clone(),
            timeout: Duration::from_secs(self.llm_timeout_secs),
            max_retries: self.llm_max_retries,
        }
    }

    /// `None` when no speech credential is configured.
    pub fn speech_config(&self) -> Option<SpeechConfig> {
        let api_key = self.speech_api_key.clone()?;
        Some(SpeechConfig {
            base_url: self.speech_base_url.clone(),
            api_key,
            stt_model: self.stt_model.clone(),
            tts_model: self.tts_model.clone(),
            voice: self.tts_voice.clone(),
            timeout: Duration::from_secs(self.llm_timeout_secs),
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
