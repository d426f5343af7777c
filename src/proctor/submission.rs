// src/proctor/submission.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::{
    api::QuizApi, error::AppError, ledger::AttemptLedger, models::result::QuizResult,
};

use super::session::SubmissionJob;

/// Posts a graded attempt, retrying transport failures with a fixed backoff.
///
/// On success the ledger attempt is completed and the recovery snapshot
/// cleared. Retries stop early once the owning session is torn down.
#[derive(Clone)]
pub struct SubmissionPipeline {
    pub api: Arc<dyn QuizApi>,
    pub ledger: AttemptLedger,
    pub quiz_id: i64,
    pub user_id: i64,
    pub max_retries: u32,
    pub backoff: Duration,
    pub active: Arc<AtomicBool>,
}

impl SubmissionPipeline {
    pub async fn run(&self, job: &SubmissionJob) -> Result<QuizResult, AppError> {
        let mut attempt = 0;
        let result = loop {
            attempt += 1;
            match self.api.submit_result(self.quiz_id, &job.request).await {
                Ok(result) => break result,
                Err(e) if e.is_transient() && attempt <= self.max_retries => {
                    tracing::warn!(
                        "Submission attempt {} for quiz {} failed, retrying in {:?}: {}",
                        attempt,
                        self.quiz_id,
                        self.backoff,
                        e
                    );
                    tokio::time::sleep(self.backoff).await;
                    if !self.active.load(Ordering::SeqCst) {
                        tracing::warn!("Session torn down, abandoning submission retries");
                        return Err(e);
                    }
                }
                Err(e) => {
                    tracing::error!(
                        "Submission for quiz {} failed after {} attempts: {}",
                        self.quiz_id,
                        attempt,
                        e
                    );
                    return Err(e);
                }
            }
        };

        self.ledger.complete_attempt(self.quiz_id, self.user_id).await;
        self.ledger.clear_snapshot().await;
        Ok(result)
    }
}
