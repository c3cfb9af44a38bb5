// src/models/response.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub answers: Vec<SubmittedAnswer>,
}

/// One answer inside a submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedAnswer {
    #[serde(alias = "questionId")]
    pub question_id: String,
    /// Missing or `null` means the question was left blank.
    #[serde(default)]
    pub answer: Option<AnswerValue>,
}

/// The raw answer as sent by the client.
///
/// Choice questions send a list of option ids (numbers or numeric strings);
/// everything else sends a scalar.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Flag(bool),
    Number(serde_json::Number),
    Text(String),
    Selection(Vec<OptionRef>),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OptionRef {
    Id(i64),
    Raw(String),
}

impl OptionRef {
    pub fn as_id(&self) -> Option<i64> {
        match self {
            OptionRef::Id(id) => Some(*id),
            OptionRef::Raw(raw) => raw.trim().parse().ok(),
        }
    }
}

impl AnswerValue {
    /// Textual form of a scalar answer. A one-element selection counts as a scalar
    /// because radio inputs post their value inside a list.
    pub fn as_text(&self) -> Option<String> {
        match self {
            AnswerValue::Flag(b) => Some(b.to_string()),
            AnswerValue::Number(n) => Some(n.to_string()),
            AnswerValue::Text(s) => Some(s.clone()),
            AnswerValue::Selection(items) if items.len() == 1 => Some(match &items[0] {
                OptionRef::Id(id) => id.to_string(),
                OptionRef::Raw(raw) => raw.clone(),
            }),
            AnswerValue::Selection(_) => None,
        }
    }

    /// Selected option ids, in the order given.
    ///
    /// Returns `None` when any entry is not an option id, so a malformed selection
    /// can never match the answer key. A bare scalar id counts as a one-element selection.
    pub fn selection(&self) -> Option<Vec<i64>> {
        match self {
            AnswerValue::Selection(items) => items.iter().map(OptionRef::as_id).collect(),
            AnswerValue::Number(n) => n.as_i64().map(|id| vec![id]),
            AnswerValue::Text(s) => s.trim().parse().ok().map(|id| vec![id]),
            AnswerValue::Flag(_) => None,
        }
    }
}

/// Successful submission payload.
#[derive(Debug, Serialize)]
pub struct SubmitQuizResponse {
    pub success: bool,
    pub response_id: String,
    pub total_score: i32,
    pub total_marks: i32,
    /// Questions whose answers were recorded but need manual grading.
    pub pending_review: Vec<String>,
    pub message: String,
}

/// Header of a stored attempt, joined with its quiz.
#[derive(Debug, Clone, FromRow)]
pub struct ResponseHeader {
    pub id: String,
    pub quiz_id: String,
    pub user_id: String,
    pub total_score: i32,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub quiz_title: String,
    pub total_marks: i32,
    pub quiz_created_by: Option<String>,
}

/// One graded question of a stored attempt.
#[derive(Debug, Serialize, FromRow)]
pub struct ResponseQuestion {
    pub question_id: String,
    pub question_text: String,
    pub answer_type: String,
    pub marks: i32,
    pub marks_obtained: i32,
    pub is_correct: bool,
    pub needs_review: bool,
    pub user_answer: Option<String>,
    pub correct_answer: Option<String>,
}

/// Payload of `GET /api/responses/{id}`.
#[derive(Debug, Serialize)]
pub struct ResponseReport {
    pub response_id: String,
    pub quiz_id: String,
    pub quiz_title: String,
    pub score: i32,
    pub total_marks: i32,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub questions: Vec<ResponseQuestion>,
}

/// A row of a student's attempt history.
#[derive(Debug, Serialize, FromRow)]
pub struct AttemptSummary {
    pub response_id: String,
    pub quiz_id: String,
    pub quiz_title: String,
    pub score: i32,
    pub total_marks: i32,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Query parameters for listing attempts.
#[derive(Debug, Deserialize)]
pub struct AttemptListParams {
    /// Number of items to return (default: 20, max: 100).
    pub limit: Option<i64>,
}

impl AttemptListParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }
}

/// Aggregate attempt statistics for one quiz.
#[derive(Debug, Serialize, FromRow)]
pub struct AttemptStats {
    pub total_attempts: i64,
    pub average_score: f64,
    pub highest_score: i32,
}

/// Per-question figures for the quiz results page.
#[derive(Debug, Serialize, FromRow)]
pub struct QuestionAnalytics {
    pub question_id: String,
    pub question_text: String,
    pub marks: i32,
    pub response_count: i64,
    pub average_marks: f64,
    pub correct_count: i64,
}
