// src/api/mod.rs

pub mod http;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        question::Question,
        quiz::Quiz,
        result::{QuizResult, SubmitResultRequest},
        user::CurrentUser,
    },
};

pub use http::HttpQuizApi;

/// The quiz server as seen from an attempt.
#[async_trait]
pub trait QuizApi: Send + Sync {
    /// `GET /user`
    async fn current_user(&self) -> Result<CurrentUser, AppError>;

    /// `GET /quizzes/{id}`
    async fn get_quiz(&self, quiz_id: i64) -> Result<Quiz, AppError>;

    /// `GET /quizzes/{id}/questions`
    async fn get_questions(&self, quiz_id: i64) -> Result<Vec<Question>, AppError>;

    /// `POST /quizzes/{id}/results`. The server does not deduplicate.
    async fn submit_result(
        &self,
        quiz_id: i64,
        result: &SubmitResultRequest,
    ) -> Result<QuizResult, AppError>;
}
