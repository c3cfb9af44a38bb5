// src/grading/memory.rs

//! In-memory `SubmissionStore` for tests. Writes are staged per transaction and
//! only become visible on commit; a detail insert can be made to fail on demand.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use super::store::{KeyOption, KeyQuestion, NewResponseDetail, QuizKey, SubmissionStore, SubmissionTx};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredResponse {
    pub id: String,
    pub quiz_id: String,
    pub user_id: String,
    pub total_score: i32,
    pub completed: bool,
}

#[derive(Default)]
struct Tables {
    quizzes: HashMap<String, QuizKey>,
    /// question id -> (quiz id, question)
    questions: HashMap<String, (String, KeyQuestion)>,
    options: HashMap<String, Vec<KeyOption>>,
    responses: HashMap<String, StoredResponse>,
    details: Vec<NewResponseDetail>,
}

#[derive(Default)]
struct Control {
    /// 1-based index of the detail insert that fails, counted per transaction.
    fail_detail_at: Option<usize>,
    attempted: Vec<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    control: Arc<Mutex<Control>>,
}

impl MemoryStore {
    pub fn add_quiz(&self, id: &str, total_marks: i32) {
        self.tables.lock().unwrap().quizzes.insert(
            id.to_string(),
            QuizKey {
                id: id.to_string(),
                total_marks,
            },
        );
    }

    pub fn add_question(
        &self,
        quiz_id: &str,
        id: &str,
        answer_type: &str,
        marks: i32,
        options: &[(i64, &str, bool)],
    ) {
        let mut tables = self.tables.lock().unwrap();
        tables.questions.insert(
            id.to_string(),
            (
                quiz_id.to_string(),
                KeyQuestion {
                    id: id.to_string(),
                    answer_type: answer_type.to_string(),
                    marks,
                },
            ),
        );
        tables.options.insert(
            id.to_string(),
            options
                .iter()
                .map(|(oid, text, correct)| KeyOption {
                    id: *oid,
                    option_text: text.to_string(),
                    is_correct: *correct,
                })
                .collect(),
        );
    }

    pub fn fail_detail_insert(&self, nth: usize) {
        self.control.lock().unwrap().fail_detail_at = Some(nth);
    }

    /// Every response id a transaction tried to insert, committed or not.
    pub fn attempted_response_ids(&self) -> Vec<String> {
        self.control.lock().unwrap().attempted.clone()
    }

    pub fn response(&self, id: &str) -> Option<StoredResponse> {
        self.tables.lock().unwrap().responses.get(id).cloned()
    }

    pub fn response_count(&self) -> usize {
        self.tables.lock().unwrap().responses.len()
    }

    pub fn details_for(&self, response_id: &str) -> Vec<NewResponseDetail> {
        self.tables
            .lock()
            .unwrap()
            .details
            .iter()
            .filter(|d| d.response_id == response_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn find_quiz(&self, quiz_id: &str) -> Result<Option<QuizKey>, sqlx::Error> {
        Ok(self.tables.lock().unwrap().quizzes.get(quiz_id).cloned())
    }

    async fn begin(&self) -> Result<Box<dyn SubmissionTx>, sqlx::Error> {
        Ok(Box::new(MemoryTx {
            tables: self.tables.clone(),
            control: self.control.clone(),
            responses: HashMap::new(),
            details: Vec::new(),
        }))
    }
}

struct MemoryTx {
    tables: Arc<Mutex<Tables>>,
    control: Arc<Mutex<Control>>,
    responses: HashMap<String, StoredResponse>,
    details: Vec<NewResponseDetail>,
}

#[async_trait]
impl SubmissionTx for MemoryTx {
    async fn insert_response(
        &mut self,
        response_id: &str,
        quiz_id: &str,
        user_id: &str,
    ) -> Result<(), sqlx::Error> {
        self.control
            .lock()
            .unwrap()
            .attempted
            .push(response_id.to_string());
        self.responses.insert(
            response_id.to_string(),
            StoredResponse {
                id: response_id.to_string(),
                quiz_id: quiz_id.to_string(),
                user_id: user_id.to_string(),
                total_score: 0,
                completed: false,
            },
        );
        Ok(())
    }

    async fn find_question(
        &mut self,
        quiz_id: &str,
        question_id: &str,
    ) -> Result<Option<KeyQuestion>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .questions
            .get(question_id)
            .filter(|(owner, _)| owner == quiz_id)
            .map(|(_, q)| q.clone()))
    }

    async fn options_for(&mut self, question_id: &str) -> Result<Vec<KeyOption>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.options.get(question_id).cloned().unwrap_or_default())
    }

    async fn insert_detail(&mut self, detail: &NewResponseDetail) -> Result<(), sqlx::Error> {
        let fail_at = self.control.lock().unwrap().fail_detail_at;
        if fail_at == Some(self.details.len() + 1) {
            return Err(sqlx::Error::Protocol("forced detail insert failure".into()));
        }
        self.details.push(detail.clone());
        Ok(())
    }

    async fn finalize_response(
        &mut self,
        response_id: &str,
        total_score: i32,
    ) -> Result<(), sqlx::Error> {
        let response = self
            .responses
            .get_mut(response_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        response.total_score = total_score;
        response.completed = true;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), sqlx::Error> {
        let this = *self;
        let mut tables = this.tables.lock().unwrap();
        tables.responses.extend(this.responses);
        tables.details.extend(this.details);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), sqlx::Error> {
        Ok(())
    }
}
