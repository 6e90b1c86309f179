mod config;
mod errors;
mod interview;
mod llm_client;
mod routes;
mod speech;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::speech::OpenAiSpeechClient;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interviewer v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = Arc::new(LlmClient::new(config.llm_client_config())?);
    info!(
        "LLM client initialized (model: {}, endpoint: {})",
        config.llm_model, config.llm_base_url
    );

    let mut state = AppState::new(llm, config.clone());

    // Speech is optional; text interviews work without it
    match config.speech_config() {
        Some(speech_config) => {
            let speech = Arc::new(OpenAiSpeechClient::new(speech_config)?);
            state = state.with_speech(speech.clone(), speech);
            info!(
                "Speech enabled (stt: {}, tts: {}, voice: {})",
                config.stt_model, config.tts_model, config.tts_voice
            );
        }
        None => info!("SPEECH_API_KEY not set, voice endpoints disabled"),
    }

    info!("Interview results will be written to {}", state.results.dir().display());

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
