// src/grading/mod.rs

//! Submission grading.
//!
//! A submission is graded and stored inside a single transaction: one
//! `responses` row, one `response_details` row per answered question of the
//! quiz, and the final score. Any storage error rolls everything back.

pub mod evaluate;
#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod store;

use std::{collections::HashSet, sync::Arc};

use crate::{
    error::AppError,
    models::{
        question::AnswerType,
        response::{AnswerValue, SubmittedAnswer},
    },
    utils::id::new_response_id,
};

use evaluate::{Verdict, evaluate};
use store::{KeyOption, NewResponseDetail, QuizKey, SubmissionStore, SubmissionTx};

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("quiz {0} not found")]
    QuizNotFound(String),
    #[error("storage failure: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error("grading task aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::QuizNotFound(_) => AppError::NotFound("Quiz not found".to_string()),
            // Logged with submission context by the grader.
            _ => AppError::InternalServerError("Failed to submit response".to_string()),
        }
    }
}

/// Per-question result of a graded submission.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedAnswer {
    pub question_id: String,
    pub verdict: Verdict,
    pub marks_obtained: i32,
}

#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub response_id: String,
    pub total_score: i32,
    pub total_marks: i32,
    pub graded: Vec<GradedAnswer>,
}

impl SubmissionOutcome {
    /// Questions recorded without an automatic verdict.
    pub fn pending_review(&self) -> Vec<String> {
        self.graded
            .iter()
            .filter(|g| g.verdict == Verdict::PendingReview)
            .map(|g| g.question_id.clone())
            .collect()
    }
}

/// Grades quiz submissions against the stored answer key.
#[derive(Clone)]
pub struct Grader {
    store: Arc<dyn SubmissionStore>,
}

impl Grader {
    pub fn new(store: Arc<dyn SubmissionStore>) -> Self {
        Self { store }
    }

    /// Grades on a detached task so the transaction reaches commit or rollback
    /// even if the caller goes away mid-request.
    pub async fn submit_detached(
        &self,
        quiz_id: String,
        user_id: String,
        answers: Vec<SubmittedAnswer>,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let grader = self.clone();
        tokio::spawn(async move { grader.submit(&quiz_id, &user_id, &answers).await })
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Grading task aborted"))?
    }

    /// Grades and stores one attempt.
    ///
    /// Answers for questions outside the quiz are skipped without error.
    pub async fn submit(
        &self,
        quiz_id: &str,
        user_id: &str,
        answers: &[SubmittedAnswer],
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let quiz = self
            .store
            .find_quiz(quiz_id)
            .await
            .inspect_err(|e| tracing::error!(quiz_id = %quiz_id, error = %e, "Quiz lookup failed"))?
            .ok_or_else(|| SubmissionError::QuizNotFound(quiz_id.to_string()))?;

        let response_id = new_response_id();
        let mut tx = self
            .store
            .begin()
            .await
            .inspect_err(|e| tracing::error!(quiz_id = %quiz_id, error = %e, "Failed to open transaction"))?;

        let result = grade(tx.as_mut(), &quiz, &response_id, user_id, answers).await;
        let graded = match result {
            Ok(graded) => graded,
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(response_id = %response_id, error = %rollback_err, "Rollback failed");
                }
                tracing::error!(
                    quiz_id = %quiz_id,
                    user_id = %user_id,
                    response_id = %response_id,
                    error = %err,
                    "Submission rolled back"
                );
                return Err(err.into());
            }
        };

        tx.commit().await.inspect_err(|e| {
            tracing::error!(
                quiz_id = %quiz_id,
                user_id = %user_id,
                response_id = %response_id,
                error = %e,
                "Commit failed"
            )
        })?;

        let total_score: i32 = graded.iter().map(|g| g.marks_obtained).sum();
        tracing::info!(
            quiz_id = %quiz_id,
            user_id = %user_id,
            response_id = %response_id,
            total_score,
            graded = graded.len(),
            skipped = answers.len() - graded.len(),
            "Submission graded"
        );

        Ok(SubmissionOutcome {
            response_id,
            total_score,
            total_marks: quiz.total_marks,
            graded,
        })
    }
}

async fn grade(
    tx: &mut dyn SubmissionTx,
    quiz: &QuizKey,
    response_id: &str,
    user_id: &str,
    answers: &[SubmittedAnswer],
) -> Result<Vec<GradedAnswer>, sqlx::Error> {
    tx.insert_response(response_id, &quiz.id, user_id).await?;

    let mut graded = Vec::with_capacity(answers.len());
    let mut seen = HashSet::new();
    let mut total_score = 0;

    for submitted in answers {
        // First answer per question wins.
        if !seen.insert(submitted.question_id.as_str()) {
            tracing::debug!(
                quiz_id = %quiz.id,
                question_id = %submitted.question_id,
                "Skipping repeated answer"
            );
            continue;
        }

        let Some(question) = tx.find_question(&quiz.id, &submitted.question_id).await? else {
            tracing::debug!(
                quiz_id = %quiz.id,
                question_id = %submitted.question_id,
                "Skipping answer for a question outside the quiz"
            );
            continue;
        };

        let answer_type = question.answer_type.parse::<AnswerType>().unwrap_or_else(|e| {
            tracing::warn!(question_id = %question.id, error = %e, "Grading as free-form");
            AnswerType::Text
        });

        let options = if answer_type.has_options() {
            tx.options_for(&question.id).await?
        } else {
            Vec::new()
        };

        let answer = submitted.answer.as_ref();
        let verdict = evaluate(answer_type, &options, answer);
        let marks_obtained = verdict.marks(question.marks);
        total_score += marks_obtained;

        tx.insert_detail(&NewResponseDetail {
            response_id: response_id.to_string(),
            question_id: question.id.clone(),
            answer_text: recorded_text(answer_type, answer),
            option_id: recorded_option(answer_type, &options, answer),
            is_correct: verdict.is_correct(),
            marks_obtained,
            needs_review: verdict == Verdict::PendingReview,
        })
        .await?;

        graded.push(GradedAnswer {
            question_id: question.id,
            verdict,
            marks_obtained,
        });
    }

    tx.finalize_response(response_id, total_score).await?;
    Ok(graded)
}

/// Free-form and true/false answers are kept verbatim.
fn recorded_text(answer_type: AnswerType, answer: Option<&AnswerValue>) -> Option<String> {
    match answer_type {
        AnswerType::Single | AnswerType::Multiple => None,
        _ => answer.and_then(AnswerValue::as_text),
    }
}

/// Only the first selected option is kept, and only if it belongs to the question.
fn recorded_option(
    answer_type: AnswerType,
    options: &[KeyOption],
    answer: Option<&AnswerValue>,
) -> Option<i64> {
    let answer = answer?;
    let candidate = match answer_type {
        AnswerType::Single | AnswerType::Multiple => answer.selection()?.first().copied()?,
        AnswerType::Boolean => {
            let text = answer.as_text()?;
            options
                .iter()
                .find(|o| o.option_text.trim().eq_ignore_ascii_case(text.trim()))?
                .id
        }
        AnswerType::Text | AnswerType::Number => return None,
    };
    options.iter().any(|o| o.id == candidate).then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory::MemoryStore;
    use serde_json::json;

    fn answers(value: serde_json::Value) -> Vec<SubmittedAnswer> {
        serde_json::from_value(value).unwrap()
    }

    /// Q1: one single-choice question worth 5, correct option 1 of {1, 2}.
    fn single_quiz() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::default());
        store.add_quiz("quiz-1", 5);
        store.add_question("quiz-1", "q1", "single", 5, &[(1, "O1", true), (2, "O2", false)]);
        store
    }

    /// Q2: one multiple-choice question worth 10, correct options {1, 3} of {1, 2, 3}.
    fn multiple_quiz() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::default());
        store.add_quiz("quiz-2", 10);
        store.add_question(
            "quiz-2",
            "q1",
            "multiple",
            10,
            &[(1, "O1", true), (2, "O2", false), (3, "O3", true)],
        );
        store
    }

    async fn score(store: &Arc<MemoryStore>, quiz_id: &str, body: serde_json::Value) -> i32 {
        Grader::new(store.clone())
            .submit(quiz_id, "user_1", &answers(body))
            .await
            .unwrap()
            .total_score
    }

    #[tokio::test]
    async fn single_choice_scenario() {
        let store = single_quiz();
        assert_eq!(score(&store, "quiz-1", json!([{ "question_id": "q1", "answer": ["1"] }])).await, 5);
        assert_eq!(score(&store, "quiz-1", json!([{ "question_id": "q1", "answer": ["2"] }])).await, 0);
    }

    #[tokio::test]
    async fn multiple_choice_scenario() {
        let store = multiple_quiz();
        let q = |answer: serde_json::Value| json!([{ "question_id": "q1", "answer": answer }]);

        assert_eq!(score(&store, "quiz-2", q(json!(["3", "1"]))).await, 10);
        assert_eq!(score(&store, "quiz-2", q(json!(["1"]))).await, 0);
        assert_eq!(score(&store, "quiz-2", q(json!(["1", "2", "3"]))).await, 0);
    }

    #[tokio::test]
    async fn total_score_matches_stored_details() {
        let store = Arc::new(MemoryStore::default());
        store.add_quiz("quiz-3", 12);
        store.add_question("quiz-3", "a", "single", 2, &[(1, "x", true), (2, "y", false)]);
        store.add_question("quiz-3", "b", "boolean", 3, &[(3, "true", true), (4, "false", false)]);
        store.add_question("quiz-3", "c", "multiple", 4, &[(5, "m", true), (6, "n", true)]);
        store.add_question("quiz-3", "d", "text", 3, &[]);

        let outcome = Grader::new(store.clone())
            .submit(
                "quiz-3",
                "user_7",
                &answers(json!([
                    { "question_id": "a", "answer": ["1"] },
                    { "question_id": "b", "answer": "true" },
                    { "question_id": "c", "answer": ["5"] },
                    { "question_id": "d", "answer": "rivers carve valleys" }
                ])),
            )
            .await
            .unwrap();

        assert_eq!(outcome.total_score, 5);
        assert_eq!(outcome.total_marks, 12);
        assert_eq!(outcome.pending_review(), vec!["d".to_string()]);

        let stored = store.response(&outcome.response_id).expect("committed response");
        let details = store.details_for(&outcome.response_id);
        assert_eq!(details.len(), 4);
        assert_eq!(stored.total_score, details.iter().map(|d| d.marks_obtained).sum::<i32>());
        assert!(stored.completed);
        assert_eq!(stored.user_id, "user_7");

        for d in &details {
            assert!(d.marks_obtained == 0 || d.is_correct);
        }
        let text = details.iter().find(|d| d.question_id == "d").unwrap();
        assert!(text.needs_review);
        assert_eq!(text.answer_text.as_deref(), Some("rivers carve valleys"));
        let boolean = details.iter().find(|d| d.question_id == "b").unwrap();
        assert_eq!(boolean.option_id, Some(3));
    }

    #[tokio::test]
    async fn foreign_questions_are_skipped_silently() {
        let store = single_quiz();
        store.add_quiz("quiz-other", 1);
        store.add_question("quiz-other", "elsewhere", "single", 1, &[(9, "z", true), (10, "w", false)]);

        let outcome = Grader::new(store.clone())
            .submit(
                "quiz-1",
                "user_1",
                &answers(json!([
                    { "question_id": "elsewhere", "answer": ["9"] },
                    { "question_id": "missing", "answer": ["1"] },
                    { "question_id": "q1", "answer": ["1"] }
                ])),
            )
            .await
            .unwrap();

        assert_eq!(outcome.total_score, 5);
        let details = store.details_for(&outcome.response_id);
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].question_id, "q1");
    }

    #[test]
    fn storage_failures_map_to_a_generic_message() {
        let err: AppError = SubmissionError::Persistence(sqlx::Error::RowNotFound).into();
        assert!(
            matches!(err, AppError::InternalServerError(ref msg) if msg == "Failed to submit response")
        );

        let err: AppError = SubmissionError::QuizNotFound("quiz-x".to_string()).into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn repeated_answers_are_graded_once() {
        let store = single_quiz();
        let outcome = Grader::new(store.clone())
            .submit(
                "quiz-1",
                "user_1",
                &answers(json!([
                    { "question_id": "q1", "answer": ["2"] },
                    { "question_id": "q1", "answer": ["1"] },
                    { "question_id": "q1", "answer": ["1"] }
                ])),
            )
            .await
            .unwrap();

        // The first (wrong) answer is the one that counts.
        assert_eq!(outcome.total_score, 0);
        assert!(outcome.total_score <= outcome.total_marks);
        let details = store.details_for(&outcome.response_id);
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].option_id, Some(2));
    }

    #[tokio::test]
    async fn multi_select_keeps_only_the_first_option() {
        let store = multiple_quiz();
        let outcome = Grader::new(store.clone())
            .submit("quiz-2", "user_1", &answers(json!([{ "question_id": "q1", "answer": ["3", "1"] }])))
            .await
            .unwrap();

        let details = store.details_for(&outcome.response_id);
        assert_eq!(details[0].option_id, Some(3));
        assert_eq!(details[0].answer_text, None);
    }

    #[tokio::test]
    async fn unknown_option_ids_are_not_recorded() {
        let store = single_quiz();
        let outcome = Grader::new(store.clone())
            .submit("quiz-1", "user_1", &answers(json!([{ "question_id": "q1", "answer": ["77"] }])))
            .await
            .unwrap();

        assert_eq!(outcome.total_score, 0);
        assert_eq!(store.details_for(&outcome.response_id)[0].option_id, None);
    }

    #[tokio::test]
    async fn missing_quiz_writes_nothing() {
        let store = single_quiz();
        let err = Grader::new(store.clone())
            .submit("quiz-nope", "user_1", &answers(json!([])))
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::QuizNotFound(_)));
        assert!(store.attempted_response_ids().is_empty());
        assert_eq!(store.response_count(), 0);
    }

    #[tokio::test]
    async fn failed_detail_insert_rolls_back_the_response() {
        let store = Arc::new(MemoryStore::default());
        store.add_quiz("quiz-4", 2);
        store.add_question("quiz-4", "a", "single", 1, &[(1, "x", true), (2, "y", false)]);
        store.add_question("quiz-4", "b", "single", 1, &[(3, "x", true), (4, "y", false)]);
        store.fail_detail_insert(2);

        let err = Grader::new(store.clone())
            .submit(
                "quiz-4",
                "user_1",
                &answers(json!([
                    { "question_id": "a", "answer": ["1"] },
                    { "question_id": "b", "answer": ["3"] }
                ])),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::Persistence(_)));
        let attempted = store.attempted_response_ids();
        assert_eq!(attempted.len(), 1);
        assert!(store.response(&attempted[0]).is_none());
        assert!(store.details_for(&attempted[0]).is_empty());
        assert_eq!(store.response_count(), 0);

        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::InternalServerError(msg) if msg == "Failed to submit response"));
    }

    #[tokio::test]
    async fn repeated_submissions_create_separate_responses() {
        let store = single_quiz();
        let grader = Grader::new(store.clone());
        let body = answers(json!([{ "question_id": "q1", "answer": ["1"] }]));

        let (first, second) = tokio::join!(
            grader.submit_detached("quiz-1".into(), "user_1".into(), body.clone()),
            grader.submit_detached("quiz-1".into(), "user_1".into(), body),
        );

        assert_ne!(first.unwrap().response_id, second.unwrap().response_id);
        assert_eq!(store.response_count(), 2);
    }
}
