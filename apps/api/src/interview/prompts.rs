// All LLM prompt templates for the interview module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Primary question-generation prompt. Replace `{job_role}` and `{json_only}`,
/// then append a timestamp line before sending.
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"Generate 5 unique interview questions for a {job_role} position.
Mix of:
- Technical skills for {job_role}
- Problem-solving scenarios
- System design (if applicable)
- Team collaboration
- Past experience

Make questions specific to {job_role} and avoid generic questions.
Keep every question short: one or two sentences.

Format your response as a JSON array of questions only:
["question1", "question2", "question3", "question4", "question5"]

{json_only}"#;

/// Secondary, shorter question prompt used when the primary attempt fails.
/// Replace `{job_role}`.
pub const SIMPLE_QUESTION_PROMPT_TEMPLATE: &str =
    "List 5 interview questions for a {job_role} position. Return only the questions as a JSON array.";

/// Evaluation prompt. Replace `{job_role}`, `{separator}`, `{transcript}` and `{json_only}`.
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"As an expert hiring manager, evaluate this candidate for a {job_role} position.

Here are their interview responses:

{separator}
{transcript}
{separator}

Provide a structured evaluation in this exact JSON format:
{
    "overall_score": <number between 1-10>,
    "technical_competency": <number between 1-10>,
    "problem_solving": <number between 1-10>,
    "communication": <number between 1-10>,
    "experience_level": <number between 1-10>,
    "cultural_fit": <number between 1-10>,
    "strengths": ["strength1", "strength2"],
    "areas_for_improvement": ["area1", "area2"],
    "hiring_recommendation": "<strong yes/yes/maybe/no>",
    "detailed_feedback": "<your comprehensive evaluation>"
}

Ensure your response is valid JSON and includes all fields.
{json_only}"#;

/// Line that frames the transcript inside the evaluation prompt.
pub const TRANSCRIPT_SEPARATOR_WIDTH: usize = 40;
