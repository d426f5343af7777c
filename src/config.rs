// src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;

/// Number of counted violations that terminates an attempt.
pub const WARNING_THRESHOLD: u32 = 3;
/// Incomplete attempts older than this are treated as abandoned.
pub const STALE_ATTEMPT_HOURS: i64 = 24;
pub const SYNC_INTERVAL_SECS: u64 = 5;
/// Extra submission attempts after the first failure.
pub const SUBMIT_MAX_RETRIES: u32 = 2;
pub const SUBMIT_RETRY_BACKOFF_SECS: u64 = 1;
/// Hide/show cycles shorter than this are not violations.
pub const VISIBILITY_DEBOUNCE_MS: u64 = 1000;
pub const FULLSCREEN_REENTRY_SECS: u64 = 2;
/// Remaining seconds on a question at which the student is warned.
pub const QUESTION_WARNING_SECS: u32 = 10;
pub const POINTS_PER_CORRECT: u32 = 2;
pub const ANSWER_GUARD_MS: u64 = 300;
/// Delay between reaching the threshold and reading the final answers.
pub const VIOLATION_SETTLE_MS: u64 = 500;
pub const WEBCAM_POLL_SECS: u64 = 3;
/// Used when a quiz carries neither `timeLimit` nor `duration`.
pub const DEFAULT_QUIZ_MINUTES: u32 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub ledger_database_url: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let api_base_url = env::var("QUIZ_API_URL")
            .unwrap_or_else(|_| "http://localhost:3000/api/".to_string());

        let api_token = env::var("QUIZ_API_TOKEN").ok().filter(|t| !t.is_empty());

        let ledger_database_url = env::var("LEDGER_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://quiz_knight.db?mode=rwc".to_string());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            api_base_url,
            api_token,
            ledger_database_url,
            rust_log,
        }
    }
}

/// Timings and limits for one proctored session.
#[derive(Debug, Clone)]
pub struct ProctorSettings {
    pub warning_threshold: u32,
    pub tick_period: Duration,
    pub question_warning_secs: u32,
    pub answer_guard: Duration,
    pub violation_settle: Duration,
    pub submit_max_retries: u32,
    pub submit_backoff: Duration,
    pub visibility_debounce: Duration,
    pub fullscreen_reentry: Duration,
    pub webcam_poll: Duration,
    /// Fixed presentation-order seed. `None` draws from the thread RNG.
    pub shuffle_seed: Option<u64>,
}

impl Default for ProctorSettings {
    fn default() -> Self {
        Self {
            warning_threshold: WARNING_THRESHOLD,
            tick_period: Duration::from_secs(1),
            question_warning_secs: QUESTION_WARNING_SECS,
            answer_guard: Duration::from_millis(ANSWER_GUARD_MS),
            violation_settle: Duration::from_millis(VIOLATION_SETTLE_MS),
            submit_max_retries: SUBMIT_MAX_RETRIES,
            submit_backoff: Duration::from_secs(SUBMIT_RETRY_BACKOFF_SECS),
            visibility_debounce: Duration::from_millis(VISIBILITY_DEBOUNCE_MS),
            fullscreen_reentry: Duration::from_secs(FULLSCREEN_REENTRY_SECS),
            webcam_poll: Duration::from_secs(WEBCAM_POLL_SECS),
            shuffle_seed: None,
        }
    }
}
