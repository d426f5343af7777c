// src/models/quiz.rs

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_QUIZ_MINUTES;

/// Delivery mode of a quiz, sent as `quizType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuizType {
    #[default]
    Standard,
    /// Teacher-controlled window with a per-question time slice.
    Live,
}

/// Quiz metadata returned by `GET /quizzes/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    #[serde(default)]
    pub id: Option<i64>,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub quiz_type: QuizType,

    /// Live quiz window, in minutes.
    #[serde(default)]
    pub duration: Option<u32>,

    /// Standard quiz time limit, in minutes.
    #[serde(default)]
    pub time_limit: Option<u32>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Quiz {
    /// Total attempt time in seconds.
    /// `timeLimit` wins over `duration`; zero values count as absent.
    pub fn duration_secs(&self) -> u32 {
        let minutes = self
            .time_limit
            .filter(|m| *m > 0)
            .or(self.duration.filter(|m| *m > 0))
            .unwrap_or(DEFAULT_QUIZ_MINUTES);
        minutes.saturating_mul(60)
    }

    pub fn is_live(&self) -> bool {
        self.quiz_type == QuizType::Live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> Quiz {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_quiz_parses_wire_format() {
        let quiz = parse(serde_json::json!({
            "title": "Arches",
            "description": "Roman engineering",
            "quizType": "live",
            "duration": 5,
            "isActive": false
        }));
        assert!(quiz.is_live());
        assert!(!quiz.is_active);
        assert_eq!(quiz.duration_secs(), 300);
    }

    #[test]
    fn test_time_limit_wins_and_default_applies() {
        let quiz = parse(serde_json::json!({
            "title": "Domes",
            "quizType": "standard",
            "duration": 5,
            "timeLimit": 10
        }));
        assert_eq!(quiz.duration_secs(), 600);

        let bare = parse(serde_json::json!({ "title": "Vaults" }));
        assert_eq!(bare.quiz_type, QuizType::Standard);
        assert!(bare.is_active);
        assert_eq!(bare.duration_secs(), DEFAULT_QUIZ_MINUTES * 60);
    }
}
