use std::sync::Arc;

use crate::config::Config;
use crate::grading::{Grader, postgres::PgSubmissionStore};
use axum::extract::FromRef;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub grader: Grader,
}

impl AppState {
    /// Wires the grader to the same pool the handlers use.
    pub fn new(pool: PgPool, config: Config) -> Self {
        let grader = Grader::new(Arc::new(PgSubmissionStore::new(pool.clone())));
        Self {
            pool,
            config,
            grader,
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Grader {
    fn from_ref(state: &AppState) -> Self {
        state.grader.clone()
    }
}
