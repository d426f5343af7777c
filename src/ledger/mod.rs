// src/ledger/mod.rs

//! Attempt ledger.
//!
//! Records which (quiz, user) pairs have an attempt in progress or finished,
//! in two places: the durable collection under [`ATTEMPTS_KEY`] and the single
//! current-session slot under [`CURRENT_ATTEMPT_KEY`]. The two are reconciled
//! by [`AttemptLedger::synchronize_storage`], on an interval and on unload.
//!
//! The ledger is a UX guard, not the system of record. Every operation traps
//! storage faults, logs them and fails open: a student is never locked out
//! because local storage is unreadable.

pub mod store;
pub mod sync;

use std::sync::Arc;

use chrono::Duration;

use crate::{
    config::STALE_ATTEMPT_HOURS,
    error::AppError,
    models::attempt::{AttemptRecord, RecoverySnapshot},
    utils::clock::{Clock, SystemClock},
};

pub use store::{
    ATTEMPTS_KEY, CURRENT_ATTEMPT_KEY, KeyValueStore, MemoryStore, QUIZ_STATE_KEY, SqliteStore,
};
pub use sync::LedgerSync;

#[derive(Clone)]
pub struct AttemptLedger {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    stale_after: Duration,
}

impl AttemptLedger {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            stale_after: Duration::hours(STALE_ATTEMPT_HOURS),
        }
    }

    /// True when a completed record exists for the pair, or an incomplete one
    /// younger than the staleness window. Fails open.
    pub async fn has_attempted_quiz(&self, quiz_id: i64, user_id: i64) -> bool {
        match self.try_has_attempted(quiz_id, user_id).await {
            Ok(attempted) => attempted,
            Err(e) => {
                tracing::warn!(
                    "Ledger read failed for quiz {} user {}, allowing attempt: {}",
                    quiz_id,
                    user_id,
                    e
                );
                false
            }
        }
    }

    async fn try_has_attempted(&self, quiz_id: i64, user_id: i64) -> Result<bool, AppError> {
        let now = self.clock.now();

        let in_collection = self
            .read_attempts()
            .await?
            .iter()
            .any(|r| r.matches(quiz_id, user_id) && r.blocks(now, self.stale_after));
        if in_collection {
            return Ok(true);
        }

        Ok(self
            .read_current()
            .await?
            .is_some_and(|r| r.matches(quiz_id, user_id) && r.blocks(now, self.stale_after)))
    }

    /// Creates an incomplete record in both scopes. Always returns a record,
    /// even when nothing could be persisted.
    pub async fn register_attempt(&self, quiz_id: i64, user_id: i64) -> AttemptRecord {
        let record = AttemptRecord::new(quiz_id, user_id, self.clock.now());

        let mut attempts = match self.read_attempts().await {
            Ok(attempts) => attempts,
            Err(e) => {
                tracing::warn!("Discarding unreadable attempt collection: {}", e);
                Vec::new()
            }
        };
        attempts.push(record.clone());

        if let Err(e) = self.write_attempts(&attempts).await {
            tracing::error!("Failed to persist attempt collection: {}", e);
        }
        if let Err(e) = self.write_current(&record).await {
            tracing::error!("Failed to persist current attempt: {}", e);
        }

        tracing::info!("Registered attempt for quiz {} user {}", quiz_id, user_id);
        record
    }

    /// Marks the pair's incomplete record completed in both scopes, then
    /// reconciles them.
    pub async fn complete_attempt(&self, quiz_id: i64, user_id: i64) {
        match self.read_attempts().await {
            Ok(mut attempts) => {
                let mut touched = 0;
                for record in attempts
                    .iter_mut()
                    .filter(|r| r.matches(quiz_id, user_id) && !r.completed)
                {
                    record.completed = true;
                    touched += 1;
                }
                if touched == 0 {
                    tracing::debug!("No incomplete attempt in collection for quiz {}", quiz_id);
                } else if let Err(e) = self.write_attempts(&attempts).await {
                    tracing::error!("Failed to persist completed attempt: {}", e);
                }
            }
            Err(e) => tracing::warn!("Could not read attempt collection: {}", e),
        }

        match self.read_current().await {
            Ok(Some(mut current)) if current.matches(quiz_id, user_id) && !current.completed => {
                current.completed = true;
                if let Err(e) = self.write_current(&current).await {
                    tracing::error!("Failed to persist completed current attempt: {}", e);
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Could not read current attempt: {}", e),
        }

        self.synchronize_storage().await;
        tracing::info!("Completed attempt for quiz {} user {}", quiz_id, user_id);
    }

    /// The in-progress record for the pair, preferring the current-session slot.
    pub async fn get_active_session(&self, quiz_id: i64, user_id: i64) -> Option<AttemptRecord> {
        match self.read_current().await {
            Ok(Some(current)) if current.matches(quiz_id, user_id) && !current.completed => {
                return Some(current);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Could not read current attempt: {}", e),
        }

        match self.read_attempts().await {
            Ok(attempts) => attempts
                .into_iter()
                .filter(|r| r.matches(quiz_id, user_id) && !r.completed)
                .max_by_key(|r| r.timestamp),
            Err(e) => {
                tracing::warn!("Could not read attempt collection: {}", e);
                None
            }
        }
    }

    /// Reconciles the current-session slot with the durable collection.
    ///
    /// Records with the same pair and timestamp are the same attempt and
    /// `completed` only ever moves to true, so the merge is the logical OR;
    /// the merged record is written back to whichever side differs. A session
    /// missing from the collection is appended. Idempotent.
    pub async fn synchronize_storage(&self) {
        if let Err(e) = self.try_synchronize().await {
            tracing::warn!("Ledger synchronization skipped: {}", e);
        }
    }

    async fn try_synchronize(&self) -> Result<(), AppError> {
        let Some(current) = self.read_current().await? else {
            return Ok(());
        };
        let mut attempts = self.read_attempts().await?;

        match attempts.iter_mut().find(|r| r.same_attempt(&current)) {
            Some(stored) => {
                let completed = stored.completed || current.completed;
                if stored.completed != completed {
                    stored.completed = completed;
                    self.write_attempts(&attempts).await?;
                }
                if current.completed != completed {
                    let merged = AttemptRecord {
                        completed,
                        ..current
                    };
                    self.write_current(&merged).await?;
                }
            }
            None => {
                tracing::debug!(
                    "Current attempt for quiz {} missing from collection, appending",
                    current.quiz_id
                );
                attempts.push(current);
                self.write_attempts(&attempts).await?;
            }
        }
        Ok(())
    }

    /// Drops incomplete records older than the staleness window.
    /// Completed records are kept.
    pub async fn cleanup_stale_attempts(&self) {
        let now = self.clock.now();

        match self.read_attempts().await {
            Ok(attempts) => {
                let before = attempts.len();
                let kept: Vec<AttemptRecord> = attempts
                    .into_iter()
                    .filter(|r| !r.is_stale(now, self.stale_after))
                    .collect();
                if kept.len() != before {
                    tracing::info!("Removed {} stale attempts", before - kept.len());
                    if let Err(e) = self.write_attempts(&kept).await {
                        tracing::error!("Failed to persist cleaned collection: {}", e);
                    }
                }
            }
            Err(e) => tracing::warn!("Could not read attempt collection: {}", e),
        }

        match self.read_current().await {
            Ok(Some(current)) if current.is_stale(now, self.stale_after) => {
                if let Err(e) = self.store.remove(CURRENT_ATTEMPT_KEY).await {
                    tracing::error!("Failed to clear stale current attempt: {}", e);
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Could not read current attempt: {}", e),
        }
    }

    pub async fn save_snapshot(&self, quiz_id: i64, user_id: i64, warnings: u32) {
        let snapshot = RecoverySnapshot {
            quiz_id,
            user_id,
            warnings,
            timestamp: self.clock.now(),
        };
        let result = match serde_json::to_string(&snapshot) {
            Ok(json) => self.store.set(QUIZ_STATE_KEY, &json).await,
            Err(e) => Err(AppError::from(e)),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to save recovery snapshot: {}", e);
        }
    }

    /// Snapshot left behind for the pair, if any.
    pub async fn load_snapshot(&self, quiz_id: i64, user_id: i64) -> Option<RecoverySnapshot> {
        let raw = match self.store.get(QUIZ_STATE_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!("Could not read recovery snapshot: {}", e);
                return None;
            }
        };
        match serde_json::from_str::<RecoverySnapshot>(&raw) {
            Ok(s) if s.quiz_id == quiz_id && s.user_id == user_id => Some(s),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Ignoring malformed recovery snapshot: {}", e);
                None
            }
        }
    }

    pub async fn clear_snapshot(&self) {
        if let Err(e) = self.store.remove(QUIZ_STATE_KEY).await {
            tracing::warn!("Failed to clear recovery snapshot: {}", e);
        }
    }

    async fn read_attempts(&self) -> Result<Vec<AttemptRecord>, AppError> {
        match self.store.get(ATTEMPTS_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write_attempts(&self, attempts: &[AttemptRecord]) -> Result<(), AppError> {
        let json = serde_json::to_string(attempts)?;
        self.store.set(ATTEMPTS_KEY, &json).await
    }

    async fn read_current(&self) -> Result<Option<AttemptRecord>, AppError> {
        match self.store.get(CURRENT_ATTEMPT_KEY).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn write_current(&self, record: &AttemptRecord) -> Result<(), AppError> {
        let json = serde_json::to_string(record)?;
        self.store.set(CURRENT_ATTEMPT_KEY, &json).await
    }
}
