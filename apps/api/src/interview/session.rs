//! Interview session state machine.
//!
//! Created → AwaitingAnswer(0) → … → AwaitingAnswer(4) → Evaluating → Complete
//!
//! `start` is valid only in `Created`; `submit` only in `AwaitingAnswer(i)`.
//! The fifth submit runs the evaluation before returning, so callers only ever
//! observe `Evaluating` while that call is in flight.
//!
//! Invariant: `answers.len() == turn_index()`, and in `AwaitingAnswer(i)` that index is `i`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::interview::evaluation::{EvaluationEngine, EvaluationRecord};
use crate::interview::questions::QuestionGenerator;
use crate::interview::{AnswerRecord, InterviewError, Role, QUESTION_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "question_index", rename_all = "snake_case")]
pub enum SessionState {
    Created,
    AwaitingAnswer(usize),
    Evaluating,
    Complete,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Created => f.write_str("created"),
            SessionState::AwaitingAnswer(i) => write!(f, "awaiting answer {i}"),
            SessionState::Evaluating => f.write_str("evaluating"),
            SessionState::Complete => f.write_str("complete"),
        }
    }
}

/// Result of a successful `submit`.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    NextQuestion { index: usize, question: String },
    Complete(EvaluationRecord),
}

#[derive(Debug, Clone)]
pub struct InterviewSession {
    id: Uuid,
    role: Role,
    questions: Vec<String>,
    answers: Vec<AnswerRecord>,
    state: SessionState,
    evaluation: Option<EvaluationRecord>,
    started_at: DateTime<Utc>,
}

impl InterviewSession {
    pub fn new(role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            questions: Vec::new(),
            answers: Vec::new(),
            state: SessionState::Created,
            evaluation: None,
            started_at: Utc::now(),
        }
    }

    /// Generates the question set and moves to the first turn.
    pub async fn start(&mut self, generator: &QuestionGenerator) -> Result<(), InterviewError> {
        self.require(SessionState::Created, "created")?;

        let questions = generator.generate(&self.role).await;
        debug_assert_eq!(questions.len(), QUESTION_COUNT);

        self.questions = questions;
        self.state = SessionState::AwaitingAnswer(0);
        info!("Interview {} started for '{}'", self.id, self.role);
        Ok(())
    }

    /// Records the answer to the current question. An empty response is a
    /// valid answer. After the last question the evaluation runs and its record
    /// is returned.
    pub async fn submit(
        &mut self,
        response: impl Into<String>,
        evaluator: &EvaluationEngine,
    ) -> Result<SubmitOutcome, InterviewError> {
        let index = self.awaiting_index()?;

        self.answers.push(AnswerRecord {
            question: self.questions[index].clone(),
            response: response.into(),
        });

        let next = index + 1;
        if next < QUESTION_COUNT {
            self.state = SessionState::AwaitingAnswer(next);
            return Ok(SubmitOutcome::NextQuestion {
                index: next,
                question: self.questions[next].clone(),
            });
        }

        self.state = SessionState::Evaluating;
        info!("Interview {} answered, evaluating", self.id);
        let record = evaluator.evaluate(&self.role, &self.answers).await;

        self.evaluation = Some(record.clone());
        self.state = SessionState::Complete;
        Ok(SubmitOutcome::Complete(record))
    }

    /// Fails unless the session is waiting for the answer to `question_index`.
    pub fn check_turn(&self, question_index: usize) -> Result<(), InterviewError> {
        let index = self.awaiting_index()?;
        if index != question_index {
            return Err(InterviewError::InvalidSessionState {
                expected: format!("awaiting answer {question_index}"),
                actual: self.state.to_string(),
            });
        }
        Ok(())
    }

    pub fn current_question(&self) -> Option<(usize, &str)> {
        match self.state {
            SessionState::AwaitingAnswer(i) => Some((i, self.questions[i].as_str())),
            _ => None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn turn_index(&self) -> usize {
        self.answers.len()
    }

    pub fn evaluation(&self) -> Option<&EvaluationRecord> {
        self.evaluation.as_ref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    fn awaiting_index(&self) -> Result<usize, InterviewError> {
        match self.state {
            SessionState::AwaitingAnswer(i) => Ok(i),
            other => Err(InterviewError::InvalidSessionState {
                expected: "awaiting an answer".to_string(),
                actual: other.to_string(),
            }),
        }
    }

    fn require(&self, state: SessionState, expected: &str) -> Result<(), InterviewError> {
        if self.state != state {
            return Err(InterviewError::InvalidSessionState {
                expected: expected.to_string(),
                actual: self.state.to_string(),
            });
        }
        Ok(())
    }
}
