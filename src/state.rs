// src/state.rs

use std::sync::Arc;

use crate::{api::QuizApi, config::ProctorSettings, ledger::AttemptLedger};

/// Long-lived collaborators shared by every attempt in this process.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn QuizApi>,
    pub ledger: AttemptLedger,
    pub settings: ProctorSettings,
}
