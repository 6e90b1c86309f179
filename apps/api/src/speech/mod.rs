//! Speech collaborators for voice interviews.
//!
//! The interview engine never touches audio. Handlers turn uploaded audio into
//! text through a `Transcriber` before submitting, and serve question audio from
//! a `Synthesizer`. Both are optional in `AppState`; text interviews need neither.
//!
//! `OpenAiSpeechClient` implements both against the OpenAI audio endpoints.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Speech API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Speech-to-text. Recognition failures are swallowed into an empty string;
/// the caller decides whether an empty answer is acceptable.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: Bytes, file_name: &str) -> String;
}

/// Text-to-speech, best-effort. A failure here must never block an interview.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Bytes, SpeechError>;
}

#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub base_url: String,
    pub api_key: String,
    pub stt_model: String,
    pub tts_model: String,
    pub voice: String,
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Clone)]
pub struct OpenAiSpeechClient {
    client: Client,
    base_url: String,
    api_key: String,
    stt_model: String,
    tts_model: String,
    voice: String,
}

impl OpenAiSpeechClient {
    pub fn new(config: SpeechConfig) -> Result<Self, SpeechError> {
        Ok(Self {
            client: Client::builder().timeout(config.timeout).build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            stt_model: config.stt_model,
            tts_model: config.tts_model,
            voice: config.voice,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn request_transcription(&self, audio: Bytes, file_name: &str) -> Result<String, SpeechError> {
        let form = Form::new()
            .part("file", Part::bytes(audio.to_vec()).file_name(file_name.to_string()))
            .text("model", self.stt_model.clone());

        let response = self
            .client
            .post(self.url("audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let transcription: TranscriptionResponse = response.json().await?;
        Ok(transcription.text.trim().to_string())
    }
}

#[async_trait]
impl Transcriber for OpenAiSpeechClient {
    async fn transcribe(&self, audio: Bytes, file_name: &str) -> String {
        let size = audio.len();
        match self.request_transcription(audio, file_name).await {
            Ok(text) => {
                debug!("Transcribed {size} bytes into {} chars", text.len());
                text
            }
            Err(e) => {
                warn!("Transcription of {file_name} failed, treating as empty answer: {e}");
                String::new()
            }
        }
    }
}

#[async_trait]
impl Synthesizer for OpenAiSpeechClient {
    async fn synthesize(&self, text: &str) -> Result<Bytes, SpeechError> {
        let body = SpeechRequest {
            model: &self.tts_model,
            input: text,
            voice: &self.voice,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(self.url("audio/speech"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.bytes().await?)
    }
}
