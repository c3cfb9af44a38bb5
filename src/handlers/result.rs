// src/handlers/result.rs

use axum::{
    Extension,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    extract::Json,
    handlers::quiz::fetch_owned_quiz,
    models::response::{
        AttemptListParams, AttemptStats, AttemptSummary, QuestionAnalytics, ResponseHeader,
        ResponseQuestion, ResponseReport,
    },
    utils::jwt::Claims,
};

/// Attempt statistics and per-question analytics for a quiz. Creator only.
pub async fn quiz_results(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_owned_quiz(&pool, &quiz_id, &claims).await?;

    let stats = sqlx::query_as::<_, AttemptStats>(
        r#"
        SELECT
            COUNT(*) AS total_attempts,
            COALESCE(AVG(total_score), 0)::FLOAT8 AS average_score,
            COALESCE(MAX(total_score), 0) AS highest_score
        FROM responses
        WHERE quiz_id = $1
        "#,
    )
    .bind(&quiz_id)
    .fetch_one(&pool)
    .await?;

    // Details are restricted to this quiz's responses.
    let question_analytics = sqlx::query_as::<_, QuestionAnalytics>(
        r#"
        SELECT
            q.id AS question_id,
            q.question_text,
            q.marks,
            COUNT(rd.id) AS response_count,
            COALESCE(AVG(rd.marks_obtained), 0)::FLOAT8 AS average_marks,
            COUNT(rd.id) FILTER (WHERE rd.is_correct) AS correct_count
        FROM questions q
        LEFT JOIN response_details rd
            ON rd.question_id = q.id
            AND rd.response_id IN (SELECT id FROM responses WHERE quiz_id = $1)
        WHERE q.quiz_id = $1
        GROUP BY q.id, q.question_text, q.marks, q.position
        ORDER BY q.position
        "#,
    )
    .bind(&quiz_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "quiz": { "id": quiz.id, "title": quiz.title, "total_marks": quiz.total_marks },
        "total_attempts": stats.total_attempts,
        "average_score": stats.average_score,
        "highest_score": stats.highest_score,
        "question_analytics": question_analytics,
    })))
}

/// A graded attempt with per-question feedback.
///
/// Visible to the student who made it and to the quiz's creator.
pub async fn get_response(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(response_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let header = sqlx::query_as::<_, ResponseHeader>(
        r#"
        SELECT
            r.id, r.quiz_id, r.user_id, r.total_score, r.completed_at,
            q.title AS quiz_title, q.total_marks, q.created_by AS quiz_created_by
        FROM responses r
        JOIN quizzes q ON q.id = r.quiz_id
        WHERE r.id = $1
        "#,
    )
    .bind(&response_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Response not found".to_string()))?;

    let is_taker = header.user_id == claims.user_id();
    let is_creator = header.quiz_created_by.as_deref() == Some(claims.user_id());
    if !is_taker && !is_creator {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    let questions = sqlx::query_as::<_, ResponseQuestion>(
        r#"
        SELECT
            qu.id AS question_id,
            qu.question_text,
            qu.answer_type,
            qu.marks,
            rd.marks_obtained,
            rd.is_correct,
            rd.needs_review,
            COALESCE(rd.answer_text, sel.option_text) AS user_answer,
            (
                SELECT string_agg(o.option_text, ', ' ORDER BY o.id)
                FROM options o
                WHERE o.question_id = qu.id AND o.is_correct
            ) AS correct_answer
        FROM response_details rd
        JOIN questions qu ON qu.id = rd.question_id
        LEFT JOIN options sel ON sel.id = rd.option_id
        WHERE rd.response_id = $1
        ORDER BY qu.position, rd.id
        "#,
    )
    .bind(&response_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(ResponseReport {
        response_id: header.id,
        quiz_id: header.quiz_id,
        quiz_title: header.quiz_title,
        score: header.total_score,
        total_marks: header.total_marks,
        completed_at: header.completed_at,
        questions,
    }))
}

/// A student's attempts, newest first. Students may only list their own.
pub async fn list_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
    Query(params): Query<AttemptListParams>,
) -> Result<impl IntoResponse, AppError> {
    if user_id != claims.user_id() && !claims.is_teacher() {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    let attempts = sqlx::query_as::<_, AttemptSummary>(
        r#"
        SELECT
            r.id AS response_id,
            r.quiz_id,
            q.title AS quiz_title,
            r.total_score AS score,
            q.total_marks,
            r.completed_at
        FROM responses r
        JOIN quizzes q ON q.id = r.quiz_id
        WHERE r.user_id = $1
        ORDER BY r.completed_at DESC NULLS LAST
        LIMIT $2
        "#,
    )
    .bind(&user_id)
    .bind(params.limit())
    .fetch_all(&pool)
    .await?;

    Ok(Json(attempts))
}
