//! Question Generator: produces exactly five questions for a role.
//!
//! Strategies, in order:
//! 1. detailed prompt (timestamped) → JSON array of at least five questions
//! 2. short prompt → best-effort JSON array of at least five questions
//! 3. fixed fallback set with the role interpolated
//!
//! Generation never fails: a model that is down or answering nonsense still
//! yields a usable interview.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::interview::prompts::{QUESTION_PROMPT_TEMPLATE, SIMPLE_QUESTION_PROMPT_TEMPLATE};
use crate::interview::{InterviewError, Role, QUESTION_COUNT};
use crate::llm_client::extraction::extract_array;
use crate::llm_client::prompts::{fill_template, timestamp_line, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{ChatMessage, CompletionGateway};

#[derive(Clone)]
pub struct QuestionGenerator {
    gateway: Arc<dyn CompletionGateway>,
    model_id: String,
}

impl QuestionGenerator {
    pub fn new(gateway: Arc<dyn CompletionGateway>, model_id: impl Into<String>) -> Self {
        Self {
            gateway,
            model_id: model_id.into(),
        }
    }

    /// Returns exactly `QUESTION_COUNT` non-empty questions, in model order.
    pub async fn generate(&self, role: &Role) -> Vec<String> {
        match self.generate_detailed(role).await {
            Ok(questions) => {
                info!("Generated {} questions for '{}'", questions.len(), role);
                questions
            }
            Err(e) => {
                warn!("Question generation for '{role}' failed, retrying with simpler prompt: {e}");
                self.generate_simple(role).await
            }
        }
    }

    async fn generate_detailed(&self, role: &Role) -> Result<Vec<String>, InterviewError> {
        let prompt = build_question_prompt(role, Utc::now());
        let raw = self
            .gateway
            .complete(&self.model_id, &[ChatMessage::user(prompt)])
            .await?;
        take_questions(extract_array(&raw)?)
    }

    /// Second strategy. Falls back to the fixed set on any failure, including
    /// a gateway error, so this never returns fewer than five questions.
    async fn generate_simple(&self, role: &Role) -> Vec<String> {
        match self.try_simple(role).await {
            Ok(questions) => {
                info!(
                    "Generated {} questions for '{}' with simple prompt",
                    questions.len(),
                    role
                );
                questions
            }
            Err(e) => {
                warn!("Simple question generation for '{role}' failed, using fallback set: {e}");
                fallback_questions(role)
            }
        }
    }

    async fn try_simple(&self, role: &Role) -> Result<Vec<String>, InterviewError> {
        let prompt = fill_template(SIMPLE_QUESTION_PROMPT_TEMPLATE, &[("job_role", role.as_str())]);
        let raw = self
            .gateway
            .complete(&self.model_id, &[ChatMessage::user(prompt)])
            .await?;
        take_questions(extract_array(&raw)?)
    }
}

/// Builds the detailed generation prompt, stamped with `now`.
pub fn build_question_prompt(role: &Role, now: DateTime<Utc>) -> String {
    let prompt = fill_template(
        QUESTION_PROMPT_TEMPLATE,
        &[("job_role", role.as_str()), ("json_only", JSON_ONLY_INSTRUCTION)],
    );
    format!("{prompt}\n{}", timestamp_line(now))
}

/// The fixed set used when both model strategies fail.
pub fn fallback_questions(role: &Role) -> Vec<String> {
    vec![
        format!("What makes you a strong candidate for this {role} position?"),
        "Tell me about a challenging project you worked on recently.".to_string(),
        "How do you approach learning new technologies?".to_string(),
        "Describe your experience with team collaboration.".to_string(),
        "What are your career goals?".to_string(),
    ]
}

/// Validates an extracted array and keeps the first `QUESTION_COUNT` entries.
///
/// Entries may be plain strings or objects carrying a `question` string.
/// Anything else, a blank entry, or a short array fails the strategy.
fn take_questions(items: Vec<Value>) -> Result<Vec<String>, InterviewError> {
    if items.len() < QUESTION_COUNT {
        return Err(InterviewError::GenerationFailed(format!(
            "expected {QUESTION_COUNT} questions, model returned {}",
            items.len()
        )));
    }

    items
        .iter()
        .take(QUESTION_COUNT)
        .enumerate()
        .map(|(i, item)| {
            question_text(item)
                .map(str::to_string)
                .ok_or_else(|| {
                    InterviewError::GenerationFailed(format!(
                        "question {} is not a non-empty string: {item}",
                        i + 1
                    ))
                })
        })
        .collect()
}

fn question_text(item: &Value) -> Option<&str> {
    let text = match item {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("question")?.as_str()?,
        _ => return None,
    };
    let text = text.trim();
    (!text.is_empty()).then_some(text)
}
