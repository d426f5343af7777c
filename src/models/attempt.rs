// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One (quiz, user) attempt as stored under `quiz_knight_attempts`
/// and `quiz_knight_current_attempt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub quiz_id: i64,
    pub user_id: i64,

    /// Registration time, RFC 3339.
    pub timestamp: DateTime<Utc>,

    pub completed: bool,
}

impl AttemptRecord {
    pub fn new(quiz_id: i64, user_id: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            quiz_id,
            user_id,
            timestamp,
            completed: false,
        }
    }

    pub fn matches(&self, quiz_id: i64, user_id: i64) -> bool {
        self.quiz_id == quiz_id && self.user_id == user_id
    }

    /// Same attempt: same pair registered at the same instant.
    pub fn same_attempt(&self, other: &AttemptRecord) -> bool {
        self.matches(other.quiz_id, other.user_id) && self.timestamp == other.timestamp
    }

    /// An incomplete record this old no longer blocks a new attempt.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: chrono::Duration) -> bool {
        !self.completed && now - self.timestamp >= stale_after
    }

    /// Whether this record prevents the pair from starting again.
    pub fn blocks(&self, now: DateTime<Utc>, stale_after: chrono::Duration) -> bool {
        self.completed || !self.is_stale(now, stale_after)
    }
}

/// Crash-recovery snapshot under `quiz_state`, rewritten on every violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverySnapshot {
    pub quiz_id: i64,
    pub user_id: i64,
    pub warnings: u32,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_wire_names_are_camel_case() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let json = serde_json::to_value(AttemptRecord::new(4, 9, at)).unwrap();
        assert_eq!(json["quizId"], 4);
        assert_eq!(json["userId"], 9);
        assert_eq!(json["completed"], false);
        assert_eq!(json["timestamp"], "2025-03-01T09:30:00Z");
    }

    #[test]
    fn test_staleness() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let mut record = AttemptRecord::new(1, 1, at);
        let day = Duration::hours(24);

        assert!(record.blocks(at + Duration::hours(23), day));
        assert!(!record.blocks(at + Duration::hours(25), day));

        record.completed = true;
        assert!(!record.is_stale(at + Duration::hours(25), day));
        assert!(record.blocks(at + Duration::days(30), day));
    }
}
