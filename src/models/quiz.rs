// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{AnswerType, QuestionDetail},
    utils::html::{clean_html, clean_optional},
};

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub total_marks: i32,
    pub is_published: bool,
    pub created_by: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Quiz listing row with a question count.
#[derive(Debug, Serialize, FromRow)]
pub struct QuizSummary {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub total_marks: i32,
    pub is_published: bool,
    pub question_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Full quiz returned by `GET /api/quizzes/{id}`.
#[derive(Debug, Serialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<QuestionDetail>,
}

/// DTO for creating a quiz together with its questions.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 characters."
    ))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Quizzes are published on creation unless stated otherwise.
    #[serde(default = "default_published")]
    pub is_published: bool,
    #[validate(
        length(min = 1, max = 200, message = "A quiz needs at least one question."),
        nested
    )]
    pub questions: Vec<CreateQuestionRequest>,
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    #[serde(rename = "type")]
    pub answer_type: AnswerType,
    #[validate(range(min = 1, max = 1000))]
    pub marks: Option<i32>,
    #[serde(alias = "timeLimit")]
    #[validate(range(min = 0, max = 86400))]
    pub time_limit: Option<i32>,
    #[serde(default)]
    #[validate(nested)]
    pub options: Vec<CreateOptionRequest>,
    /// Shorthand for boolean questions instead of spelling out both options.
    pub correct_answer: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateOptionRequest {
    #[validate(length(min = 1, max = 500))]
    pub text: String,
    #[serde(default, alias = "is_correct")]
    pub correct: bool,
}

/// DTO for toggling a quiz's visibility.
#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub is_published: bool,
}

/// A question that passed authoring checks, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuestion {
    pub text: String,
    pub answer_type: AnswerType,
    pub marks: i32,
    pub time_limit: i32,
    /// (option_text, is_correct)
    pub options: Vec<(String, bool)>,
}

/// A validated, sanitised quiz ready to be written in one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuiz {
    pub title: String,
    pub description: Option<String>,
    pub is_published: bool,
    pub total_marks: i32,
    pub questions: Vec<PreparedQuestion>,
}

impl CreateQuizRequest {
    /// Runs field validation plus the per-type option rules and computes `total_marks`.
    pub fn prepare(self) -> Result<PreparedQuiz, AppError> {
        self.validate()?;

        let title = clean_html(self.title.trim());
        if title.is_empty() {
            return Err(AppError::BadRequest("Quiz title is required".to_string()));
        }

        let questions = self
            .questions
            .into_iter()
            .enumerate()
            .map(|(index, q)| q.prepare(index + 1))
            .collect::<Result<Vec<_>, _>>()?;

        let total_marks = questions.iter().map(|q| q.marks).sum();

        Ok(PreparedQuiz {
            title,
            description: clean_optional(self.description.as_deref()),
            is_published: self.is_published,
            total_marks,
            questions,
        })
    }
}

impl CreateQuestionRequest {
    fn prepare(self, number: usize) -> Result<PreparedQuestion, AppError> {
        let text = clean_html(self.text.trim());
        if text.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Question {} has no text",
                number
            )));
        }

        let mut options: Vec<(String, bool)> = self
            .options
            .into_iter()
            .map(|o| (clean_html(o.text.trim()), o.correct))
            .filter(|(text, _)| !text.is_empty())
            .collect();
        let correct = options.iter().filter(|(_, c)| *c).count();

        match self.answer_type {
            AnswerType::Single => {
                if options.len() < 2 {
                    return Err(bad_question(number, "needs at least 2 options"));
                }
                if correct != 1 {
                    return Err(bad_question(number, "must have exactly one correct option"));
                }
            }
            AnswerType::Multiple => {
                if options.len() < 2 {
                    return Err(bad_question(number, "needs at least 2 options"));
                }
                if correct == 0 {
                    return Err(bad_question(number, "must have at least one correct option"));
                }
            }
            AnswerType::Boolean => {
                if let Some(answer) = self.correct_answer {
                    options = vec![
                        ("true".to_string(), answer),
                        ("false".to_string(), !answer),
                    ];
                } else {
                    for (text, _) in options.iter_mut() {
                        *text = text.to_ascii_lowercase();
                    }
                    let literals_only = options.len() == 2
                        && options.iter().any(|(t, _)| t == "true")
                        && options.iter().any(|(t, _)| t == "false");
                    if !literals_only || correct != 1 {
                        return Err(bad_question(
                            number,
                            "needs correct_answer or 'true'/'false' options with one marked correct",
                        ));
                    }
                }
            }
            AnswerType::Text | AnswerType::Number => options.clear(),
        }

        Ok(PreparedQuestion {
            text,
            answer_type: self.answer_type,
            marks: self.marks.unwrap_or(1),
            time_limit: self.time_limit.unwrap_or(0),
            options,
        })
    }
}

fn bad_question(number: usize, problem: &str) -> AppError {
    AppError::BadRequest(format!("Question {} {}", number, problem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(questions: serde_json::Value) -> CreateQuizRequest {
        serde_json::from_value(json!({
            "title": "Geography",
            "description": "  ",
            "questions": questions,
        }))
        .unwrap()
    }

    #[test]
    fn totals_marks_and_defaults_missing_fields() {
        let quiz = request(json!([
            { "text": "Capital of France?", "type": "single", "marks": 5,
              "options": [{ "text": "Paris", "correct": true }, { "text": "Rome" }] },
            { "text": "Explain erosion", "type": "text" }
        ]))
        .prepare()
        .unwrap();

        assert_eq!(quiz.total_marks, 6);
        assert!(quiz.is_published);
        assert_eq!(quiz.description, None);
        assert_eq!(quiz.questions[1].marks, 1);
        assert_eq!(quiz.questions[1].time_limit, 0);
        assert!(quiz.questions[1].options.is_empty());
    }

    #[test]
    fn single_choice_needs_exactly_one_correct_option() {
        let err = request(json!([
            { "text": "Pick", "type": "single",
              "options": [{ "text": "A", "correct": true }, { "text": "B", "correct": true }] }
        ]))
        .prepare()
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("exactly one")));
    }

    #[test]
    fn multiple_choice_needs_two_options() {
        let err = request(json!([
            { "text": "Pick", "type": "multiple", "options": [{ "text": "A", "correct": true }] }
        ]))
        .prepare()
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn boolean_shorthand_expands_to_literal_options() {
        let quiz = request(json!([
            { "text": "The earth is flat", "type": "boolean", "correct_answer": false }
        ]))
        .prepare()
        .unwrap();
        assert_eq!(
            quiz.questions[0].options,
            vec![("true".to_string(), false), ("false".to_string(), true)]
        );
    }

    #[test]
    fn boolean_options_must_be_true_and_false() {
        let err = request(json!([
            { "text": "Yes?", "type": "boolean",
              "options": [{ "text": "yes", "correct": true }, { "text": "no" }] }
        ]))
        .prepare()
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn zero_marks_fail_validation() {
        let err = request(json!([{ "text": "Q", "type": "number", "marks": 0 }]))
            .prepare()
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn empty_question_list_is_rejected() {
        let err = request(json!([])).prepare().unwrap_err();
        match err {
            AppError::BadRequest(msg) => assert!(msg.contains("at least one question")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
