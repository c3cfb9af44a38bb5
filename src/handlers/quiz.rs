// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    extract::Json,
    models::{
        question::{Question, QuestionDetail, QuestionOption, QuestionOptions},
        quiz::{CreateQuizRequest, PublishRequest, Quiz, QuizDetail, QuizSummary},
    },
    utils::{
        id::{new_question_id, new_quiz_id},
        jwt::Claims,
    },
};

const SUMMARY_COLUMNS: &str = r#"
    q.id, q.title, q.description, q.total_marks, q.is_published,
    (SELECT COUNT(*) FROM questions WHERE quiz_id = q.id) AS question_count,
    q.created_at
"#;

pub(crate) async fn fetch_quiz(pool: &PgPool, quiz_id: &str) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, title, description, total_marks, is_published, created_by, created_at
        FROM quizzes
        WHERE id = $1
        "#,
    )
    .bind(quiz_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

/// Loads a quiz and checks the caller created it.
pub(crate) async fn fetch_owned_quiz(
    pool: &PgPool,
    quiz_id: &str,
    claims: &Claims,
) -> Result<Quiz, AppError> {
    let quiz = fetch_quiz(pool, quiz_id).await?;
    if quiz.created_by.as_deref() != Some(claims.user_id()) {
        return Err(AppError::Forbidden(
            "Only the quiz creator can do this".to_string(),
        ));
    }
    Ok(quiz)
}

/// Creates a quiz with its questions and options.
///
/// * Validates per-type option rules.
/// * Computes `total_marks` as the sum of question marks.
/// * Writes everything in one transaction.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = payload.prepare()?;
    let quiz_id = new_quiz_id();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO quizzes (id, title, description, total_marks, is_published, created_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(&quiz_id)
    .bind(&quiz.title)
    .bind(&quiz.description)
    .bind(quiz.total_marks)
    .bind(quiz.is_published)
    .bind(claims.user_id())
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::internal(e, "Failed to create quiz"))?;

    for (position, question) in quiz.questions.iter().enumerate() {
        let question_id = new_question_id();

        sqlx::query(
            r#"
            INSERT INTO questions (id, quiz_id, question_text, answer_type, marks, time_limit, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&question_id)
        .bind(&quiz_id)
        .bind(&question.text)
        .bind(question.answer_type.as_str())
        .bind(question.marks)
        .bind(question.time_limit)
        .bind(position as i32)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::internal(e, "Failed to create quiz"))?;

        for (text, is_correct) in &question.options {
            sqlx::query(
                "INSERT INTO options (question_id, option_text, is_correct) VALUES ($1, $2, $3)",
            )
            .bind(&question_id)
            .bind(text)
            .bind(is_correct)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::internal(e, "Failed to create quiz"))?;
        }
    }

    tx.commit()
        .await
        .map_err(|e| AppError::internal(e, "Failed to create quiz"))?;

    tracing::info!(
        quiz_id = %quiz_id,
        created_by = %claims.user_id(),
        questions = quiz.questions.len(),
        "Quiz created"
    );

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "quiz_id": quiz_id,
            "total_marks": quiz.total_marks,
            "message": "Quiz created successfully"
        })),
    ))
}

/// Lists quizzes, newest first.
///
/// Teachers see the quizzes they created (drafts included); students see published ones.
pub async fn list_quizzes(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = if claims.is_teacher() {
        sqlx::query_as::<_, QuizSummary>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM quizzes q WHERE q.created_by = $1 ORDER BY q.created_at DESC"
        ))
        .bind(claims.user_id())
        .fetch_all(&pool)
        .await?
    } else {
        sqlx::query_as::<_, QuizSummary>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM quizzes q WHERE q.is_published ORDER BY q.created_at DESC"
        ))
        .fetch_all(&pool)
        .await?
    };

    Ok(Json(serde_json::json!({ "success": true, "quizzes": quizzes })))
}

/// Published quizzes the caller has not attempted yet.
pub async fn list_available(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = sqlx::query_as::<_, QuizSummary>(&format!(
        r#"
        SELECT {SUMMARY_COLUMNS}
        FROM quizzes q
        WHERE q.is_published
          AND NOT EXISTS (SELECT 1 FROM responses r WHERE r.quiz_id = q.id AND r.user_id = $1)
        ORDER BY q.created_at DESC
        "#
    ))
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(serde_json::json!({ "success": true, "quizzes": quizzes })))
}

/// Returns a quiz with its ordered questions and options.
///
/// Correct answers are only included for the quiz's creator. Drafts are
/// hidden from everybody else.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, &quiz_id).await?;
    let is_owner = quiz.created_by.as_deref() == Some(claims.user_id());

    if !quiz.is_published && !is_owner {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, quiz_id, question_text, answer_type, marks, time_limit, position
        FROM questions
        WHERE quiz_id = $1
        ORDER BY position, id
        "#,
    )
    .bind(&quiz_id)
    .fetch_all(&pool)
    .await?;

    let options = sqlx::query_as::<_, QuestionOption>(
        r#"
        SELECT o.id, o.question_id, o.option_text, o.is_correct
        FROM options o
        JOIN questions q ON q.id = o.question_id
        WHERE q.quiz_id = $1
        ORDER BY o.id
        "#,
    )
    .bind(&quiz_id)
    .fetch_all(&pool)
    .await?;

    let mut by_question: HashMap<String, Vec<QuestionOption>> = HashMap::new();
    for option in options {
        by_question
            .entry(option.question_id.clone())
            .or_default()
            .push(option);
    }

    let questions = questions
        .into_iter()
        .map(|question| {
            let options = by_question.remove(&question.id).unwrap_or_default();
            let options = if is_owner {
                QuestionOptions::Full(options)
            } else {
                QuestionOptions::Public(options.into_iter().map(Into::into).collect())
            };
            QuestionDetail { question, options }
        })
        .collect();

    Ok(Json(serde_json::json!({
        "success": true,
        "quiz": QuizDetail { quiz, questions },
    })))
}

/// Publishes or unpublishes a quiz. Creator only.
pub async fn set_published(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<String>,
    Json(payload): Json<PublishRequest>,
) -> Result<impl IntoResponse, AppError> {
    fetch_owned_quiz(&pool, &quiz_id, &claims).await?;

    sqlx::query("UPDATE quizzes SET is_published = $1 WHERE id = $2")
        .bind(payload.is_published)
        .bind(&quiz_id)
        .execute(&pool)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "quiz_id": quiz_id,
        "is_published": payload.is_published,
    })))
}

/// Deletes a quiz. Questions, options and attempts cascade. Creator only.
pub async fn delete_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    fetch_owned_quiz(&pool, &quiz_id, &claims).await?;

    let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
        .bind(&quiz_id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    tracing::info!(quiz_id = %quiz_id, "Quiz deleted");

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Quiz deleted successfully"
    })))
}
