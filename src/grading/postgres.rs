// src/grading/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::store::{KeyOption, KeyQuestion, NewResponseDetail, QuizKey, SubmissionStore, SubmissionTx};

/// `SubmissionStore` over the shared Postgres pool.
#[derive(Clone)]
pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct QuizKeyRow {
    id: String,
    total_marks: i32,
}

#[derive(sqlx::FromRow)]
struct KeyQuestionRow {
    id: String,
    answer_type: String,
    marks: i32,
}

#[derive(sqlx::FromRow)]
struct KeyOptionRow {
    id: i64,
    option_text: String,
    is_correct: bool,
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn find_quiz(&self, quiz_id: &str) -> Result<Option<QuizKey>, sqlx::Error> {
        let row = sqlx::query_as::<_, QuizKeyRow>(
            "SELECT id, total_marks FROM quizzes WHERE id = $1",
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| QuizKey {
            id: r.id,
            total_marks: r.total_marks,
        }))
    }

    async fn begin(&self) -> Result<Box<dyn SubmissionTx>, sqlx::Error> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSubmissionTx { tx }))
    }
}

pub struct PgSubmissionTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SubmissionTx for PgSubmissionTx {
    async fn insert_response(
        &mut self,
        response_id: &str,
        quiz_id: &str,
        user_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO responses (id, quiz_id, user_id, total_score, started_at)
            VALUES ($1, $2, $3, 0, NOW())
            "#,
        )
        .bind(response_id)
        .bind(quiz_id)
        .bind(user_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn find_question(
        &mut self,
        quiz_id: &str,
        question_id: &str,
    ) -> Result<Option<KeyQuestion>, sqlx::Error> {
        let row = sqlx::query_as::<_, KeyQuestionRow>(
            "SELECT id, answer_type, marks FROM questions WHERE id = $1 AND quiz_id = $2",
        )
        .bind(question_id)
        .bind(quiz_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(|r| KeyQuestion {
            id: r.id,
            answer_type: r.answer_type,
            marks: r.marks,
        }))
    }

    async fn options_for(&mut self, question_id: &str) -> Result<Vec<KeyOption>, sqlx::Error> {
        let rows = sqlx::query_as::<_, KeyOptionRow>(
            "SELECT id, option_text, is_correct FROM options WHERE question_id = $1 ORDER BY id",
        )
        .bind(question_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| KeyOption {
                id: r.id,
                option_text: r.option_text,
                is_correct: r.is_correct,
            })
            .collect())
    }

    async fn insert_detail(&mut self, detail: &NewResponseDetail) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO response_details
                (response_id, question_id, answer_text, option_id, is_correct, marks_obtained, needs_review)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&detail.response_id)
        .bind(&detail.question_id)
        .bind(&detail.answer_text)
        .bind(detail.option_id)
        .bind(detail.is_correct)
        .bind(detail.marks_obtained)
        .bind(detail.needs_review)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn finalize_response(
        &mut self,
        response_id: &str,
        total_score: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE responses SET total_score = $1, completed_at = NOW() WHERE id = $2")
            .bind(total_score)
            .bind(response_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}
