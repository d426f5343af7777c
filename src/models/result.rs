// src/models/result.rs

use serde::{Deserialize, Serialize};

/// Body of `POST /quizzes/{id}/results`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResultRequest {
    /// JSON-encoded array of answer strings in canonical question order.
    pub answers: String,

    /// Percentage score, 0-100.
    pub score: u32,

    /// Seconds spent on the attempt.
    pub time_taken: u32,

    pub correct_answers: u32,
    pub wrong_answers: u32,
    pub total_questions: u32,
}

/// Persisted result echoed back by the quiz API.
/// Every field is optional because the client only needs the 2xx.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub quiz_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub points_earned: Option<i64>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
