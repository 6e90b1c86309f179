//! Axum route handlers for the Interview API.
//!
//! Text and voice interviews share one session engine; the voice endpoints only
//! add transcription in front of `submit` and synthesis behind question delivery.

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::results::InterviewResult;
use crate::interview::session::{InterviewSession, SessionState, SubmitOutcome};
use crate::interview::store::SharedSession;
use crate::interview::{AnswerRecord, Role};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StartInterviewRequest {
    pub job_role: String,
}

#[derive(Debug, Serialize)]
pub struct StartInterviewResponse {
    pub session_id: Uuid,
    pub question_index: usize,
    pub question_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_audio_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub response: String,
    /// When present, must name the question currently awaiting an answer.
    #[serde(default)]
    pub question_index: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnResponse {
    NextQuestion {
        session_id: Uuid,
        question_index: usize,
        question_text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        question_audio_url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        transcript: Option<String>,
    },
    Complete {
        session_id: Uuid,
        result: InterviewResult,
        evaluation_degraded: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        transcript: Option<String>,
    },
    /// Voice answer came back empty and empty answers are not accepted.
    /// Nothing was recorded; answer the same question again.
    Retry {
        session_id: Uuid,
        question_index: usize,
        transcript: String,
    },
}

#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub job_role: String,
    #[serde(flatten)]
    pub state: SessionState,
    pub turn_index: usize,
    pub questions: Vec<String>,
    pub answers: Vec<AnswerRecord>,
    pub started_at: DateTime<Utc>,
}

impl From<&InterviewSession> for SessionSnapshot {
    fn from(session: &InterviewSession) -> Self {
        Self {
            session_id: session.id(),
            job_role: session.role().to_string(),
            state: session.state(),
            turn_index: session.turn_index(),
            questions: session.questions().to_vec(),
            answers: session.answers().to_vec(),
            started_at: session.started_at(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interviews
///
/// Generates the question set and returns the first question.
pub async fn handle_start_interview(
    State(state): State<AppState>,
    Json(request): Json<StartInterviewRequest>,
) -> Result<Json<StartInterviewResponse>, AppError> {
    let role = Role::new(request.job_role)?;

    let mut session = InterviewSession::new(role);
    session.start(&state.generator).await?;

    let (question_index, question_text) = session
        .current_question()
        .map(|(i, q)| (i, q.to_string()))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Started session has no question")))?;

    let session_id = state.sessions.insert(session).await;

    Ok(Json(StartInterviewResponse {
        session_id,
        question_index,
        question_text,
        question_audio_url: question_audio_url(&state, session_id, question_index),
    }))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let shared = live_session(&state, session_id).await?;
    let session = shared.lock().await;
    Ok(Json(SessionSnapshot::from(&*session)))
}

/// POST /api/v1/interviews/:id/answers
///
/// Records a typed answer. The fifth answer runs the evaluation and returns the result.
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SubmitAnswerRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    let response = submit_turn(state, session_id, request.response, request.question_index, None)
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/interviews/:id/answers/audio
///
/// Multipart form: `audio` (file), optional `question_index`.
/// Transcribes the recording, then records it like a typed answer.
pub async fn handle_submit_audio(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<TurnResponse>, AppError> {
    let transcriber = state
        .transcriber
        .clone()
        .ok_or_else(|| AppError::Validation("Voice answers are not enabled".to_string()))?;

    let mut audio: Option<(Bytes, String)> = None;
    let mut question_index: Option<usize> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                let file_name = field.file_name().unwrap_or("answer.wav").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read audio: {e}")))?;
                audio = Some((data, file_name));
            }
            "question_index" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read question_index: {e}")))?;
                let index = text.trim().parse().map_err(|_| {
                    AppError::Validation(format!("question_index must be a number, got '{text}'"))
                })?;
                question_index = Some(index);
            }
            _ => {}
        }
    }

    let (audio, file_name) =
        audio.ok_or_else(|| AppError::Validation("No audio file provided".to_string()))?;

    // Reject out-of-turn uploads before paying for transcription.
    let current_index = {
        let shared = live_session(&state, session_id).await?;
        let session = shared.lock().await;
        let index = match question_index {
            Some(i) => {
                session.check_turn(i)?;
                i
            }
            None => session.current_question().map(|(i, _)| i).ok_or_else(|| {
                AppError::InvalidSessionState(format!("session is {}", session.state()))
            })?,
        };
        index
    };

    let transcript = transcriber.transcribe(audio, &file_name).await;

    if transcript.trim().is_empty() && !state.config.accept_empty_transcripts {
        info!("Empty transcript for interview {session_id} question {current_index}, asking again");
        return Ok(Json(TurnResponse::Retry {
            session_id,
            question_index: current_index,
            transcript,
        }));
    }

    let response = submit_turn(
        state,
        session_id,
        transcript.clone(),
        Some(current_index),
        Some(transcript),
    )
    .await?;
    Ok(Json(response))
}

/// GET /api/v1/interviews/:id/questions/:index/audio
///
/// Synthesized audio for a question. Failure here never affects the session.
pub async fn handle_question_audio(
    State(state): State<AppState>,
    Path((session_id, index)): Path<(Uuid, usize)>,
) -> Result<Response, AppError> {
    let synthesizer = state
        .synthesizer
        .clone()
        .ok_or_else(|| AppError::Validation("Voice output is not enabled".to_string()))?;

    let question = {
        let shared = live_session(&state, session_id).await?;
        let session = shared.lock().await;
        let question = session.questions().get(index).cloned();
        question.ok_or_else(|| AppError::NotFound(format!("Question {index} not found")))?
    };

    let audio = synthesizer
        .synthesize(&question)
        .await
        .map_err(|e| AppError::Speech(e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}

/// GET /api/v1/interviews/:id/result
pub async fn handle_get_result(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<InterviewResult>, AppError> {
    state
        .results
        .load(session_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No result for interview {session_id}")))
}

// ────────────────────────────────────────────────────────────────────────────
// Turn handling
// ────────────────────────────────────────────────────────────────────────────

async fn live_session(state: &AppState, session_id: Uuid) -> Result<SharedSession, AppError> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Interview {session_id} not found")))
}

/// Runs one turn on its own task: the final turn holds the session across an
/// evaluation call, and a dropped client connection must not strand it in
/// `Evaluating`.
async fn submit_turn(
    state: AppState,
    session_id: Uuid,
    response: String,
    question_index: Option<usize>,
    transcript: Option<String>,
) -> Result<TurnResponse, AppError> {
    let shared = live_session(&state, session_id).await?;

    tokio::spawn(run_turn(state, session_id, shared, response, question_index, transcript))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Answer task failed: {e}")))?
}

async fn run_turn(
    state: AppState,
    session_id: Uuid,
    shared: SharedSession,
    response: String,
    question_index: Option<usize>,
    transcript: Option<String>,
) -> Result<TurnResponse, AppError> {
    let mut session = shared.lock().await;
    if let Some(index) = question_index {
        session.check_turn(index)?;
    }

    let outcome = session.submit(response, &state.evaluator).await?;
    match outcome {
        SubmitOutcome::NextQuestion { index, question } => Ok(TurnResponse::NextQuestion {
            session_id,
            question_index: index,
            question_text: question,
            question_audio_url: question_audio_url(&state, session_id, index),
            transcript,
        }),
        SubmitOutcome::Complete(record) => {
            let result = InterviewResult::from_session(&session, Utc::now()).ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("Completed interview has no evaluation"))
            })?;
            drop(session);

            archive(&state, session_id, &result).await;

            Ok(TurnResponse::Complete {
                session_id,
                result,
                evaluation_degraded: record.degraded,
                transcript,
            })
        }
    }
}

/// Persists the result and retires the session. A failed write is logged; the
/// candidate still receives the evaluation.
async fn archive(state: &AppState, session_id: Uuid, result: &InterviewResult) {
    if let Err(e) = state.results.save(session_id, result).await {
        error!("Failed to persist result for interview {session_id}: {e:?}");
    }
    if state.sessions.remove(session_id).await.is_none() {
        warn!("Interview {session_id} was already removed from the session store");
    }
    info!(
        "Interview {session_id} complete: overall_score={}, {} sessions still live",
        result.evaluation.overall_score,
        state.sessions.len().await
    );
}

fn question_audio_url(state: &AppState, session_id: Uuid, index: usize) -> Option<String> {
    state
        .synthesizer
        .as_ref()
        .map(|_| format!("/api/v1/interviews/{session_id}/questions/{index}/audio"))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
