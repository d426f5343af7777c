// src/ledger/sync.rs

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::AttemptLedger;

/// Background reconciliation of the two ledger scopes.
///
/// Every interval drops stale attempts, then synchronizes. The
/// first pass runs one interval after spawn; callers that need a clean ledger
/// before registering an attempt await
/// [`AttemptLedger::cleanup_stale_attempts`] themselves.
/// [`LedgerSync::shutdown`] plays the part of page unload: it stops the loop
/// and runs one last synchronization.
pub struct LedgerSync {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl LedgerSync {
    pub fn spawn(ledger: AttemptLedger, every: Duration) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        ledger.cleanup_stale_attempts().await;
                        ledger.synchronize_storage().await;
                    }
                    _ = &mut stop_rx => break,
                }
            }

            ledger.synchronize_storage().await;
            tracing::debug!("Ledger sync stopped");
        });

        Self {
            stop: Some(stop_tx),
            task: Some(task),
        }
    }

    /// Stops the loop after a final synchronization pass.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Ledger sync task failed: {:?}", e);
            }
        }
    }
}

impl Drop for LedgerSync {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ATTEMPTS_KEY, KeyValueStore, MemoryStore};
    use crate::models::attempt::AttemptRecord;
    use crate::utils::clock::ManualClock;
    use chrono::Utc;
    use std::sync::Arc;

    async fn stored_attempts(store: &MemoryStore) -> Vec<AttemptRecord> {
        let raw = store.get(ATTEMPTS_KEY).await.unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_restores_missing_collection_entry() {
        let store = MemoryStore::new();
        let ledger = AttemptLedger::new(Arc::new(store.clone()));
        ledger.register_attempt(5, 2).await;
        store.remove(ATTEMPTS_KEY).await.unwrap();

        let sync = LedgerSync::spawn(ledger, Duration::from_secs(5));
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(store.get(ATTEMPTS_KEY).await.unwrap().is_some());

        sync.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_runs_final_pass() {
        let store = MemoryStore::new();
        let ledger = AttemptLedger::new(Arc::new(store.clone()));
        let sync = LedgerSync::spawn(ledger.clone(), Duration::from_secs(5));
        tokio::task::yield_now().await;

        ledger.register_attempt(5, 2).await;
        store.remove(ATTEMPTS_KEY).await.unwrap();

        sync.shutdown().await;
        assert!(store.get(ATTEMPTS_KEY).await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_leaves_fresh_registration_alone() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(Utc::now());
        let ledger = AttemptLedger::with_clock(Arc::new(store.clone()), Arc::new(clock.clone()));
        ledger.register_attempt(1, 2).await;
        clock.advance(chrono::Duration::hours(25));

        let sync = LedgerSync::spawn(ledger.clone(), Duration::from_secs(5));
        tokio::task::yield_now().await;
        let fresh = ledger.register_attempt(5, 2).await;
        tokio::task::yield_now().await;

        // nothing rewrites the collection before the first interval
        let attempts = stored_attempts(&store).await;
        assert_eq!(attempts.len(), 2);
        assert!(attempts.contains(&fresh));

        sync.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_repeats_every_interval() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(Utc::now());
        let ledger = AttemptLedger::with_clock(Arc::new(store.clone()), Arc::new(clock.clone()));
        let sync = LedgerSync::spawn(ledger.clone(), Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(6)).await;
        ledger.register_attempt(1, 2).await;
        let keep = ledger.register_attempt(5, 2).await;
        ledger.complete_attempt(5, 2).await;
        clock.advance(chrono::Duration::hours(25));

        tokio::time::sleep(Duration::from_secs(5)).await;
        let attempts = stored_attempts(&store).await;
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].quiz_id, keep.quiz_id);
        assert!(attempts[0].completed);

        sync.shutdown().await;
    }
}
