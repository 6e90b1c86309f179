pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

/// Recorded answers can run well past Axum's 2MB default body limit.
const AUDIO_UPLOAD_LIMIT: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Interview API
        .route("/api/v1/interviews", post(handlers::handle_start_interview))
        .route("/api/v1/interviews/:id", get(handlers::handle_get_session))
        .route(
            "/api/v1/interviews/:id/answers",
            post(handlers::handle_submit_answer),
        )
        .route(
            "/api/v1/interviews/:id/answers/audio",
            post(handlers::handle_submit_audio).layer(DefaultBodyLimit::max(AUDIO_UPLOAD_LIMIT)),
        )
        .route(
            "/api/v1/interviews/:id/questions/:index/audio",
            get(handlers::handle_question_audio),
        )
        .route(
            "/api/v1/interviews/:id/result",
            get(handlers::handle_get_result),
        )
        .with_state(state)
}
