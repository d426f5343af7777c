// src/models/question.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

/// Question type as delivered by the quiz API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    TrueFalse,
}

/// One entry of `GET /quizzes/{id}/questions`.
///
/// The correct answer ships with the question and scoring happens on the
/// client before the result is posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,

    /// The text content of the question.
    #[validate(length(min = 1, max = 2000))]
    pub question_text: String,

    pub question_type: QuestionType,

    /// Answer choices. May be empty for `true_false`, in which case the
    /// conventional pair is used.
    #[serde(default)]
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,

    #[validate(length(min = 1, max = 500))]
    pub correct_answer: String,

    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(default)]
    pub option_images: Option<Vec<Option<String>>>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    for opt in options {
        if opt.is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

impl Question {
    /// Options the student chooses from.
    pub fn choices(&self) -> Vec<String> {
        if self.options.is_empty() && self.question_type == QuestionType::TrueFalse {
            return vec!["True".to_string(), "False".to_string()];
        }
        self.options.clone()
    }

    /// Checks the question can be rendered and answered.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|e| AppError::InvalidQuiz(format!("question {}: {}", self.id, e)))?;

        if self.question_type == QuestionType::Mcq && self.options.len() < 2 {
            return Err(AppError::InvalidQuiz(format!(
                "question {} has {} options",
                self.id,
                self.options.len()
            )));
        }
        Ok(())
    }
}
