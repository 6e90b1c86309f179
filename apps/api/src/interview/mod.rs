// Interview Engine
// Implements: question generation, turn-by-turn answer collection, evaluation.
// All model calls go through llm_client::CompletionGateway; no direct HTTP calls here.

pub mod evaluation;
pub mod handlers;
pub mod prompts;
pub mod questions;
pub mod results;
pub mod session;
pub mod store;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm_client::extraction::ExtractionFailed;
use crate::llm_client::LlmError;

/// Number of questions (and therefore turns) in every interview.
pub const QUESTION_COUNT: usize = 5;

/// Domain errors of the interview engine.
///
/// Generation and evaluation absorb model failures into fallbacks, so only
/// `InvalidSessionState` and `EmptyRole` ever reach a caller. The remaining
/// variants describe why a strategy was abandoned and end up in logs.
#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("Completion gateway error: {0}")]
    Gateway(#[from] LlmError),

    #[error("{0}")]
    ExtractionFailed(#[from] ExtractionFailed),

    #[error("Question generation failed: {0}")]
    GenerationFailed(String),

    #[error("Invalid session state: expected {expected}, session is {actual}")]
    InvalidSessionState { expected: String, actual: String },

    #[error("Job role cannot be empty")]
    EmptyRole,
}

/// The position being interviewed for. Never blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Role(String);

impl Role {
    pub fn new(role: impl Into<String>) -> Result<Self, InterviewError> {
        let role = role.into();
        let trimmed = role.trim();
        if trimmed.is_empty() {
            return Err(InterviewError::EmptyRole);
        }
        Ok(Role(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Role {
    type Error = InterviewError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Role::new(value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One collected turn. `response` is empty when transcription produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    pub response: String,
}
