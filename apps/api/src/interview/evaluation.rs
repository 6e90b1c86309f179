//! Evaluation Engine: scores a transcript and turns the model's reply into a
//! fixed-schema `EvaluationRecord`.
//!
//! Completion policy for fields the model leaves out:
//! - `overall_score` defaults to the integer 5 (consumers use it numerically)
//! - every other field is marked `Provided::Missing`, serialized as "Not provided"
//!
//! A gateway error or unparseable reply yields `EvaluationRecord::fallback`,
//! flagged `degraded`. `evaluate` never fails.

use std::sync::Arc;

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::interview::prompts::{EVALUATION_PROMPT_TEMPLATE, TRANSCRIPT_SEPARATOR_WIDTH};
use crate::interview::{AnswerRecord, InterviewError, Role};
use crate::llm_client::extraction::extract_object;
use crate::llm_client::prompts::{fill_template, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{ChatMessage, CompletionGateway};

/// Literal written in place of any field the model did not supply.
pub const NOT_PROVIDED: &str = "Not provided";
/// Neutral score used for a missing `overall_score` and in the fallback record.
pub const DEFAULT_SCORE: u8 = 5;
pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

/// A field the model may omit.
#[derive(Debug, Clone, PartialEq)]
pub enum Provided<T> {
    Value(T),
    Missing,
}

impl<T> Provided<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Provided::Value(v) => Some(v),
            Provided::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Provided::Missing)
    }
}

impl<T: Serialize> Serialize for Provided<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Provided::Value(v) => v.serialize(serializer),
            Provided::Missing => serializer.serialize_str(NOT_PROVIDED),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Provided<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.as_str() == Some(NOT_PROVIDED) {
            return Ok(Provided::Missing);
        }
        serde_json::from_value(value)
            .map(Provided::Value)
            .map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiringRecommendation {
    StrongYes,
    Yes,
    Maybe,
    No,
}

impl HiringRecommendation {
    /// Lenient parse of the model's free-text recommendation.
    pub fn parse(text: &str) -> Option<Self> {
        let normalized = text
            .trim()
            .to_lowercase()
            .replace(['_', '-'], " ");
        match normalized.trim_end_matches(['.', '!']) {
            "strong yes" => Some(HiringRecommendation::StrongYes),
            "yes" => Some(HiringRecommendation::Yes),
            "maybe" => Some(HiringRecommendation::Maybe),
            "no" => Some(HiringRecommendation::No),
            _ => None,
        }
    }
}

/// Structured evaluation of a finished (or partial) interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub overall_score: u8,
    pub technical_competency: Provided<u8>,
    pub problem_solving: Provided<u8>,
    pub communication: Provided<u8>,
    pub experience_level: Provided<u8>,
    pub cultural_fit: Provided<u8>,
    pub strengths: Provided<Vec<String>>,
    pub areas_for_improvement: Provided<Vec<String>>,
    pub hiring_recommendation: Provided<String>,
    pub detailed_feedback: Provided<String>,
    /// Set when this is the fallback record rather than a model evaluation.
    #[serde(skip)]
    pub degraded: bool,
}

impl EvaluationRecord {
    /// Reads every schema field from the extracted object, completing the ones
    /// that are absent, null or unusable.
    pub fn from_model_output(output: &Map<String, Value>) -> Self {
        let overall_score = match field(output, "overall_score", read_score) {
            Provided::Value(score) => score,
            Provided::Missing => DEFAULT_SCORE,
        };

        Self {
            overall_score,
            technical_competency: field(output, "technical_competency", read_score),
            problem_solving: field(output, "problem_solving", read_score),
            communication: field(output, "communication", read_score),
            experience_level: field(output, "experience_level", read_score),
            cultural_fit: field(output, "cultural_fit", read_score),
            strengths: field(output, "strengths", read_list),
            areas_for_improvement: field(output, "areas_for_improvement", read_list),
            hiring_recommendation: field(output, "hiring_recommendation", read_text),
            detailed_feedback: field(output, "detailed_feedback", read_text),
            degraded: false,
        }
    }

    /// Fully populated neutral record used when evaluation could not run.
    pub fn fallback(error: &str) -> Self {
        Self {
            overall_score: DEFAULT_SCORE,
            technical_competency: Provided::Value(DEFAULT_SCORE),
            problem_solving: Provided::Value(DEFAULT_SCORE),
            communication: Provided::Value(DEFAULT_SCORE),
            experience_level: Provided::Value(DEFAULT_SCORE),
            cultural_fit: Provided::Value(DEFAULT_SCORE),
            strengths: Provided::Value(vec!["Unable to determine strengths".to_string()]),
            areas_for_improvement: Provided::Value(vec![
                "Unable to determine areas for improvement".to_string(),
            ]),
            hiring_recommendation: Provided::Value("maybe".to_string()),
            detailed_feedback: Provided::Value(format!("Error processing evaluation: {error}")),
            degraded: true,
        }
    }

    pub fn recommendation(&self) -> Option<HiringRecommendation> {
        self.hiring_recommendation
            .value()
            .and_then(|text| HiringRecommendation::parse(text))
    }
}

#[derive(Clone)]
pub struct EvaluationEngine {
    gateway: Arc<dyn CompletionGateway>,
    model_id: String,
}

impl EvaluationEngine {
    pub fn new(gateway: Arc<dyn CompletionGateway>, model_id: impl Into<String>) -> Self {
        Self {
            gateway,
            model_id: model_id.into(),
        }
    }

    /// Evaluates however many answers were collected. Never fails: any error
    /// produces the degraded fallback record.
    pub async fn evaluate(&self, role: &Role, answers: &[AnswerRecord]) -> EvaluationRecord {
        match self.try_evaluate(role, answers).await {
            Ok(record) => {
                info!(
                    "Evaluated {} answers for '{}': overall_score={}, recommendation={:?}",
                    answers.len(),
                    role,
                    record.overall_score,
                    record.recommendation()
                );
                record
            }
            Err(e) => {
                warn!("Evaluation for '{role}' failed, returning default record: {e}");
                EvaluationRecord::fallback(&e.to_string())
            }
        }
    }

    async fn try_evaluate(
        &self,
        role: &Role,
        answers: &[AnswerRecord],
    ) -> Result<EvaluationRecord, InterviewError> {
        let prompt = build_evaluation_prompt(role, answers);
        let raw = self
            .gateway
            .complete(&self.model_id, &[ChatMessage::user(prompt)])
            .await?;
        let output = extract_object(&raw)?;
        Ok(EvaluationRecord::from_model_output(&output))
    }
}

/// Builds the evaluation prompt with a numbered Q/A transcript.
pub fn build_evaluation_prompt(role: &Role, answers: &[AnswerRecord]) -> String {
    let transcript = answers
        .iter()
        .enumerate()
        .map(|(i, answer)| {
            let response = if answer.response.trim().is_empty() {
                "(no response captured)"
            } else {
                answer.response.as_str()
            };
            format!("Q{}: {}\nA: {}\n", i + 1, answer.question, response)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let separator = "-".repeat(TRANSCRIPT_SEPARATOR_WIDTH);
    fill_template(
        EVALUATION_PROMPT_TEMPLATE,
        &[
            ("job_role", role.as_str()),
            ("separator", separator.as_str()),
            ("transcript", transcript.as_str()),
            ("json_only", JSON_ONLY_INSTRUCTION),
        ],
    )
}

fn field<T>(
    output: &Map<String, Value>,
    key: &str,
    read: impl Fn(&Value) -> Option<T>,
) -> Provided<T> {
    match output.get(key) {
        None | Some(Value::Null) => {
            debug!("Evaluation field '{key}' not provided");
            Provided::Missing
        }
        Some(value) => match read(value) {
            Some(v) => Provided::Value(v),
            None => {
                warn!("Evaluation field '{key}' has unusable value {value}, treating as not provided");
                Provided::Missing
            }
        },
    }
}

/// Integer, float (rounded) or numeric string such as "7" or "7/10", clamped to 1–10.
fn read_score(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            let numerator = s.split('/').next().unwrap_or(s).trim();
            numerator.parse::<f64>().ok()?
        }
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(MIN_SCORE as f64, MAX_SCORE as f64) as u8)
}

/// Array of strings (blank entries dropped) or a single string.
fn read_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        Value::String(s) if !s.trim().is_empty() => Some(vec![s.trim().to_string()]),
        _ => None,
    }
}

fn read_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::stub::ScriptedGateway;
    use serde_json::json;

    fn role() -> Role {
        Role::new("Backend Engineer").unwrap()
    }

    fn answers(n: usize) -> Vec<AnswerRecord> {
        (1..=n)
            .map(|i| AnswerRecord {
                question: format!("Question {i}?"),
                response: format!("Answer {i}"),
            })
            .collect()
    }

    fn engine(gateway: &Arc<ScriptedGateway>) -> EvaluationEngine {
        EvaluationEngine::new(gateway.clone(), "test-model")
    }

    const FULL_EVALUATION: &str = r#"{
        "overall_score": 8,
        "technical_competency": 9,
        "problem_solving": 7,
        "communication": 8,
        "experience_level": 6,
        "cultural_fit": 8,
        "strengths": ["Deep Rust knowledge", "Clear explanations"],
        "areas_for_improvement": ["System design breadth"],
        "hiring_recommendation": "yes",
        "detailed_feedback": "Strong candidate overall."
    }"#;

    #[tokio::test]
    async fn test_full_evaluation_parsed() {
        let gateway = Arc::new(ScriptedGateway::new().reply(FULL_EVALUATION));
        let record = engine(&gateway).evaluate(&role(), &answers(5)).await;

        assert!(!record.degraded);
        assert_eq!(record.overall_score, 8);
        assert_eq!(record.technical_competency, Provided::Value(9));
        assert_eq!(record.experience_level, Provided::Value(6));
        assert_eq!(
            record.strengths,
            Provided::Value(vec![
                "Deep Rust knowledge".to_string(),
                "Clear explanations".to_string()
            ])
        );
        assert_eq!(record.recommendation(), Some(HiringRecommendation::Yes));
    }

    #[tokio::test]
    async fn test_gateway_error_returns_fallback() {
        let gateway = Arc::new(ScriptedGateway::new().fail(500));
        let record = engine(&gateway).evaluate(&role(), &answers(5)).await;

        assert!(record.degraded);
        assert_eq!(record.overall_score, 5);
        for score in [
            &record.technical_competency,
            &record.problem_solving,
            &record.communication,
            &record.experience_level,
            &record.cultural_fit,
        ] {
            assert_eq!(score, &Provided::Value(5));
        }
        assert_eq!(record.hiring_recommendation, Provided::Value("maybe".to_string()));
        let feedback = record.detailed_feedback.value().unwrap();
        assert!(feedback.starts_with("Error processing evaluation: "));
        assert!(feedback.contains("500"));
    }

    #[tokio::test]
    async fn test_only_overall_score_completes_other_fields() {
        let gateway = Arc::new(ScriptedGateway::new().reply(r#"{"overall_score": 8}"#));
        let record = engine(&gateway).evaluate(&role(), &answers(5)).await;

        assert!(!record.degraded);
        assert_eq!(record.overall_score, 8);
        assert!(record.detailed_feedback.is_missing());

        let json = serde_json::to_value(&record).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 10);
        assert_eq!(object["overall_score"], json!(8));
        for key in [
            "technical_competency",
            "problem_solving",
            "communication",
            "experience_level",
            "cultural_fit",
            "strengths",
            "areas_for_improvement",
            "hiring_recommendation",
            "detailed_feedback",
        ] {
            assert_eq!(object[key], json!("Not provided"), "field {key}");
        }
    }

    #[tokio::test]
    async fn test_missing_overall_score_defaults_to_integer_five() {
        let gateway = Arc::new(ScriptedGateway::new().reply(r#"{"communication": 9}"#));
        let record = engine(&gateway).evaluate(&role(), &answers(2)).await;

        assert_eq!(record.overall_score, 5);
        assert_eq!(record.communication, Provided::Value(9));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["overall_score"], json!(5));
    }

    #[tokio::test]
    async fn test_unparseable_reply_returns_fallback() {
        let gateway = Arc::new(ScriptedGateway::new().reply("The candidate did well."));
        let record = engine(&gateway).evaluate(&role(), &answers(5)).await;

        assert!(record.degraded);
        assert_eq!(
            record.strengths,
            Provided::Value(vec!["Unable to determine strengths".to_string()])
        );
        assert!(record
            .detailed_feedback
            .value()
            .unwrap()
            .contains("No parseable JSON object"));
    }

    #[tokio::test]
    async fn test_fenced_reply_with_prose() {
        let reply = format!("Here is my evaluation:\n```json\n{FULL_EVALUATION}\n```\nThanks.");
        let gateway = Arc::new(ScriptedGateway::new().reply(reply));
        let record = engine(&gateway).evaluate(&role(), &answers(5)).await;

        assert_eq!(record.cultural_fit, Provided::Value(8));
    }

    #[tokio::test]
    async fn test_partial_session_prompt_numbers_answers() {
        let gateway = Arc::new(ScriptedGateway::new().reply(FULL_EVALUATION));
        engine(&gateway).evaluate(&role(), &answers(2)).await;

        let prompt = gateway.prompt(0);
        assert!(prompt.contains("Q1: Question 1?\nA: Answer 1"));
        assert!(prompt.contains("Q2: Question 2?\nA: Answer 2"));
        assert!(!prompt.contains("Q3:"));
        assert!(prompt.contains("Backend Engineer position"));
        assert!(prompt.contains(&"-".repeat(40)));
    }

    #[test]
    fn test_empty_response_marked_in_prompt() {
        let answers = vec![AnswerRecord {
            question: "Why Rust?".to_string(),
            response: String::new(),
        }];
        let prompt = build_evaluation_prompt(&role(), &answers);
        assert!(prompt.contains("Q1: Why Rust?\nA: (no response captured)"));
    }

    #[test]
    fn test_placeholders_in_candidate_text_are_not_expanded() {
        let role = Role::new("Engineer {transcript}").unwrap();
        let answers = vec![AnswerRecord {
            question: "Anything else?".to_string(),
            response: "I type {json_only} and {job_role} a lot".to_string(),
        }];
        let prompt = build_evaluation_prompt(&role, &answers);

        assert!(prompt.contains("for a Engineer {transcript} position"));
        assert!(prompt.contains("A: I type {json_only} and {job_role} a lot"));
        assert_eq!(prompt.matches("Anything else?").count(), 1);
        assert_eq!(prompt.matches(JSON_ONLY_INSTRUCTION).count(), 1);
    }

    #[test]
    fn test_lenient_score_reading() {
        let output = json!({
            "overall_score": 7.6,
            "technical_competency": "6",
            "problem_solving": "9/10",
            "communication": 14,
            "experience_level": 0,
            "cultural_fit": "excellent"
        });
        let record = EvaluationRecord::from_model_output(output.as_object().unwrap());

        assert_eq!(record.overall_score, 8);
        assert_eq!(record.technical_competency, Provided::Value(6));
        assert_eq!(record.problem_solving, Provided::Value(9));
        assert_eq!(record.communication, Provided::Value(10));
        assert_eq!(record.experience_level, Provided::Value(1));
        assert!(record.cultural_fit.is_missing());
    }

    #[test]
    fn test_null_and_wrong_typed_fields_are_missing() {
        let output = json!({
            "overall_score": null,
            "strengths": null,
            "areas_for_improvement": {"a": 1},
            "hiring_recommendation": "Strong Yes",
            "detailed_feedback": ["not", "text"]
        });
        let record = EvaluationRecord::from_model_output(output.as_object().unwrap());

        assert_eq!(record.overall_score, DEFAULT_SCORE);
        assert!(record.strengths.is_missing());
        assert!(record.areas_for_improvement.is_missing());
        assert!(record.detailed_feedback.is_missing());
        assert_eq!(record.recommendation(), Some(HiringRecommendation::StrongYes));
    }

    #[test]
    fn test_single_string_list_field() {
        let output = json!({"strengths": "Communicates clearly"});
        let record = EvaluationRecord::from_model_output(output.as_object().unwrap());
        assert_eq!(
            record.strengths,
            Provided::Value(vec!["Communicates clearly".to_string()])
        );
    }

    #[test]
    fn test_persisted_record_reads_back_not_provided() {
        let json = json!({
            "overall_score": 6,
            "technical_competency": "Not provided",
            "problem_solving": 7,
            "communication": 7,
            "experience_level": 5,
            "cultural_fit": 6,
            "strengths": ["Curious"],
            "areas_for_improvement": "Not provided",
            "hiring_recommendation": "maybe",
            "detailed_feedback": "Decent."
        });
        let record: EvaluationRecord = serde_json::from_value(json).unwrap();
        assert!(record.technical_competency.is_missing());
        assert!(record.areas_for_improvement.is_missing());
        assert_eq!(record.problem_solving, Provided::Value(7));
        assert!(!record.degraded);
    }

    #[test]
    fn test_recommendation_parse_variants() {
        assert_eq!(
            HiringRecommendation::parse("strong_yes"),
            Some(HiringRecommendation::StrongYes)
        );
        assert_eq!(HiringRecommendation::parse(" No. "), Some(HiringRecommendation::No));
        assert_eq!(
            HiringRecommendation::parse("MAYBE"),
            Some(HiringRecommendation::Maybe)
        );
        assert_eq!(HiringRecommendation::parse("hire immediately"), None);
    }
}
