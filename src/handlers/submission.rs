// src/handlers/submission.rs

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    extract::Json,
    grading::Grader,
    models::response::{SubmitQuizRequest, SubmitQuizResponse},
    utils::jwt::Claims,
};

/// Grades and stores a quiz attempt for the authenticated user.
///
/// Answers to questions outside the quiz are ignored. The whole attempt is
/// written atomically; on any storage error nothing is kept.
pub async fn submit_quiz(
    State(grader): State<Grader>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<String>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = grader
        .submit_detached(quiz_id, claims.sub, req.answers)
        .await?;

    let pending_review = outcome.pending_review();
    let message = if pending_review.is_empty() {
        "Response submitted successfully".to_string()
    } else {
        format!(
            "Response submitted; {} answer(s) await manual review",
            pending_review.len()
        )
    };

    Ok((
        StatusCode::CREATED,
        Json(SubmitQuizResponse {
            success: true,
            response_id: outcome.response_id,
            total_score: outcome.total_score,
            total_marks: outcome.total_marks,
            pending_review,
            message,
        }),
    ))
}
