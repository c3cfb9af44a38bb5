// src/grading/evaluate.rs

use std::collections::HashSet;

use crate::models::{question::AnswerType, response::AnswerValue};

use super::store::KeyOption;

/// Outcome of checking one answer against the answer key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
    /// No stored key exists for this type; recorded with zero marks for a human to grade.
    PendingReview,
}

impl Verdict {
    pub fn is_correct(self) -> bool {
        self == Verdict::Correct
    }

    /// Marks are all-or-nothing.
    pub fn marks(self, question_marks: i32) -> i32 {
        if self.is_correct() { question_marks } else { 0 }
    }
}

/// Checks `answer` against the question's options.
///
/// `options` must be the full option list of the question; anything the client
/// selected outside that list simply fails to match.
pub fn evaluate(answer_type: AnswerType, options: &[KeyOption], answer: Option<&AnswerValue>) -> Verdict {
    match answer_type {
        AnswerType::Text | AnswerType::Number => Verdict::PendingReview,
        AnswerType::Single => verdict(answer.is_some_and(|a| single_matches(options, a))),
        AnswerType::Multiple => verdict(answer.is_some_and(|a| multiple_matches(options, a))),
        AnswerType::Boolean => verdict(answer.is_some_and(|a| boolean_matches(options, a))),
    }
}

fn verdict(correct: bool) -> Verdict {
    if correct { Verdict::Correct } else { Verdict::Incorrect }
}

fn correct_ids(options: &[KeyOption]) -> HashSet<i64> {
    options.iter().filter(|o| o.is_correct).map(|o| o.id).collect()
}

fn single_matches(options: &[KeyOption], answer: &AnswerValue) -> bool {
    let correct = correct_ids(options);
    match answer.selection().as_deref() {
        Some([selected]) => correct.len() == 1 && correct.contains(selected),
        _ => false,
    }
}

fn multiple_matches(options: &[KeyOption], answer: &AnswerValue) -> bool {
    let Some(selected) = answer.selection() else {
        return false;
    };
    if selected.is_empty() {
        return false;
    }
    let selected: HashSet<i64> = selected.into_iter().collect();
    selected == correct_ids(options)
}

fn boolean_matches(options: &[KeyOption], answer: &AnswerValue) -> bool {
    let Some(submitted) = answer.as_text() else {
        return false;
    };
    let submitted = submitted.trim();
    options
        .iter()
        .find(|o| o.is_correct)
        .is_some_and(|o| o.option_text.trim().eq_ignore_ascii_case(submitted))
}
