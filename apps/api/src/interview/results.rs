//! Result documents: the durable record of a finished interview.
//!
//! Shape: `{job_role, timestamp, interview_responses: [{question, response}], evaluation}`,
//! written as pretty JSON to `{results_dir}/interview_results_{session_id}.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::interview::evaluation::EvaluationRecord;
use crate::interview::session::InterviewSession;
use crate::interview::AnswerRecord;
use crate::llm_client::prompts::TIMESTAMP_FORMAT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewResult {
    pub job_role: String,
    pub timestamp: String,
    pub interview_responses: Vec<AnswerRecord>,
    pub evaluation: EvaluationRecord,
}

impl InterviewResult {
    /// Builds the document for a completed session, stamped with `completed_at`.
    /// `None` until the evaluation is stored.
    pub fn from_session(session: &InterviewSession, completed_at: DateTime<Utc>) -> Option<Self> {
        let evaluation = session.evaluation()?.clone();
        Some(Self {
            job_role: session.role().to_string(),
            timestamp: completed_at.format(TIMESTAMP_FORMAT).to_string(),
            interview_responses: session.answers().to_vec(),
            evaluation,
        })
    }
}

/// Writes and reads result documents in a single directory.
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, session_id: Uuid) -> PathBuf {
        self.dir
            .join(format!("interview_results_{session_id}.json"))
    }

    pub async fn save(&self, session_id: Uuid, result: &InterviewResult) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create results directory {}", self.dir.display()))?;

        let path = self.path_for(session_id);
        let body = serde_json::to_vec_pretty(result).context("Failed to serialize interview result")?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!("Interview result saved to {}", path.display());
        Ok(path)
    }

    /// Loads a saved document. `Ok(None)` when no result exists for the id.
    pub async fn load(&self, session_id: Uuid) -> Result<Option<InterviewResult>> {
        let path = self.path_for(session_id);
        let body = match tokio::fs::read(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        let result = serde_json::from_slice(&body)
            .with_context(|| format!("Malformed result document {}", path.display()))?;
        Ok(Some(result))
    }
}
