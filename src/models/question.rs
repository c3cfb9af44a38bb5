// src/models/question.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// How a question is answered, stored in `questions.answer_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerType {
    Text,
    Number,
    Boolean,
    Single,
    Multiple,
}

impl AnswerType {
    pub fn as_str(self) -> &'static str {
        match self {
            AnswerType::Text => "text",
            AnswerType::Number => "number",
            AnswerType::Boolean => "boolean",
            AnswerType::Single => "single",
            AnswerType::Multiple => "multiple",
        }
    }

    /// Whether answers are checked against stored options.
    pub fn has_options(self) -> bool {
        matches!(
            self,
            AnswerType::Boolean | AnswerType::Single | AnswerType::Multiple
        )
    }
}

impl fmt::Display for AnswerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(AnswerType::Text),
            "number" => Ok(AnswerType::Number),
            "boolean" => Ok(AnswerType::Boolean),
            "single" => Ok(AnswerType::Single),
            "multiple" => Ok(AnswerType::Multiple),
            other => Err(format!("unknown answer type '{}'", other)),
        }
    }
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Question {
    pub id: String,
    pub quiz_id: String,
    pub question_text: String,
    /// One of `text`, `number`, `boolean`, `single`, `multiple`.
    pub answer_type: String,
    pub marks: i32,
    /// Seconds allowed for the question; 0 means untimed.
    pub time_limit: i32,
    pub position: i32,
}

/// Represents the 'options' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuestionOption {
    pub id: i64,
    pub question_id: String,
    pub option_text: String,
    pub is_correct: bool,
}

/// Option as shown to quiz takers (no correctness flag).
#[derive(Debug, Serialize)]
pub struct PublicOption {
    pub id: i64,
    pub option_text: String,
}

impl From<QuestionOption> for PublicOption {
    fn from(o: QuestionOption) -> Self {
        Self {
            id: o.id,
            option_text: o.option_text,
        }
    }
}

/// Options attached to a question in a quiz detail response.
/// Creators see the full rows, everybody else the public view.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QuestionOptions {
    Full(Vec<QuestionOption>),
    Public(Vec<PublicOption>),
}

/// A question with its options, as returned by `GET /api/quizzes/{id}`.
#[derive(Debug, Serialize)]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: Question,
    pub options: QuestionOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_type_parses_its_own_names() {
        for t in [
            AnswerType::Text,
            AnswerType::Number,
            AnswerType::Boolean,
            AnswerType::Single,
            AnswerType::Multiple,
        ] {
            assert_eq!(t.as_str().parse::<AnswerType>().unwrap(), t);
        }
        assert!("essay".parse::<AnswerType>().is_err());
    }

    #[test]
    fn only_choice_types_have_options() {
        assert!(AnswerType::Boolean.has_options());
        assert!(AnswerType::Multiple.has_options());
        assert!(!AnswerType::Number.has_options());
    }
}
