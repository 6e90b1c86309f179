use std::sync::Arc;

use crate::config::Config;
use crate::interview::evaluation::EvaluationEngine;
use crate::interview::questions::QuestionGenerator;
use crate::interview::results::ResultStore;
use crate::interview::store::SessionStore;
use crate::llm_client::CompletionGateway;
use crate::speech::{Synthesizer, Transcriber};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub generator: QuestionGenerator,
    pub evaluator: EvaluationEngine,
    /// Live sessions. Lives as long as the server; completed sessions are removed.
    pub sessions: Arc<SessionStore>,
    pub results: ResultStore,
    /// Present only when speech is configured.
    pub transcriber: Option<Arc<dyn Transcriber>>,
    pub synthesizer: Option<Arc<dyn Synthesizer>>,
    pub config: Config,
}

impl AppState {
    /// Text-only state: both pipeline stages share one gateway and the configured model.
    pub fn new(gateway: Arc<dyn CompletionGateway>, config: Config) -> Self {
        Self {
            generator: QuestionGenerator::new(gateway.clone(), config.llm_model.clone()),
            evaluator: EvaluationEngine::new(gateway, config.llm_model.clone()),
            sessions: Arc::new(SessionStore::new()),
            results: ResultStore::new(&config.results_dir),
            transcriber: None,
            synthesizer: None,
            config,
        }
    }

    pub fn with_speech(
        mut self,
        transcriber: Arc<dyn Transcriber>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        self.transcriber = Some(transcriber);
        self.synthesizer = Some(synthesizer);
        self
    }
}
