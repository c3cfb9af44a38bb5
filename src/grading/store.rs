// src/grading/store.rs

use async_trait::async_trait;

/// The slice of a quiz the grader needs before it opens a transaction.
#[derive(Debug, Clone)]
pub struct QuizKey {
    pub id: String,
    pub total_marks: i32,
}

/// A question as seen by the grader.
#[derive(Debug, Clone)]
pub struct KeyQuestion {
    pub id: String,
    pub answer_type: String,
    pub marks: i32,
}

/// An option together with its correctness flag.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyOption {
    pub id: i64,
    pub option_text: String,
    pub is_correct: bool,
}

/// A `response_details` row to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewResponseDetail {
    pub response_id: String,
    pub question_id: String,
    pub answer_text: Option<String>,
    pub option_id: Option<i64>,
    pub is_correct: bool,
    pub marks_obtained: i32,
    pub needs_review: bool,
}

/// Entry point into the persistence layer used by the grader.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn find_quiz(&self, quiz_id: &str) -> Result<Option<QuizKey>, sqlx::Error>;

    /// Opens a transaction. Dropping the returned handle without committing rolls it back.
    async fn begin(&self) -> Result<Box<dyn SubmissionTx>, sqlx::Error>;
}

/// Reads and writes performed inside one submission transaction.
#[async_trait]
pub trait SubmissionTx: Send {
    async fn insert_response(
        &mut self,
        response_id: &str,
        quiz_id: &str,
        user_id: &str,
    ) -> Result<(), sqlx::Error>;

    /// Looks a question up by id, scoped to the quiz it must belong to.
    async fn find_question(
        &mut self,
        quiz_id: &str,
        question_id: &str,
    ) -> Result<Option<KeyQuestion>, sqlx::Error>;

    async fn options_for(&mut self, question_id: &str) -> Result<Vec<KeyOption>, sqlx::Error>;

    async fn insert_detail(&mut self, detail: &NewResponseDetail) -> Result<(), sqlx::Error>;

    /// Writes the final score and stamps `completed_at`.
    async fn finalize_response(
        &mut self,
        response_id: &str,
        total_score: i32,
    ) -> Result<(), sqlx::Error>;

    async fn commit(self: Box<Self>) -> Result<(), sqlx::Error>;

    async fn rollback(self: Box<Self>) -> Result<(), sqlx::Error>;
}
