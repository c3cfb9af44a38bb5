// src/utils/id.rs

use rand::{Rng, distributions::Alphanumeric, thread_rng};
use uuid::Uuid;

const TOKEN_LEN: usize = 12;

/// Opaque, non-sequential identifier such as `resp_k3v9x0q2m1ab`.
pub fn generate_token(prefix: &str) -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}_{}", prefix, suffix)
}

pub fn new_user_id() -> String {
    generate_token("user")
}

pub fn new_response_id() -> String {
    generate_token("resp")
}

pub fn new_quiz_id() -> String {
    format!("quiz-{}", Uuid::new_v4())
}

pub fn new_question_id() -> String {
    format!("q-{}", Uuid::new_v4())
}
