// src/api/http.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::QuizApi;
use crate::{
    config::Config,
    error::AppError,
    models::{
        question::Question,
        quiz::Quiz,
        result::{QuizResult, SubmitResultRequest},
        user::CurrentUser,
    },
};

/// `QuizApi` over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpQuizApi {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl HttpQuizApi {
    /// `base_url` is the API root, e.g. `http://localhost:3000/api/`.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, AppError> {
        // Url::join drops the last segment unless the base ends with '/'
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base = Url::parse(&normalized)
            .map_err(|e| AppError::Network(format!("invalid API url {}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base,
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(&config.api_base_url, config.api_token.clone())
    }

    fn url(&self, path: &str) -> Result<Url, AppError> {
        self.base
            .join(path)
            .map_err(|e| AppError::Network(format!("invalid path {}: {}", path, e)))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T, AppError> {
        let response = self.authorize(req).send().await.map_err(|e| {
            tracing::warn!("Request for {} failed: {}", what, e);
            AppError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                tracing::error!("Malformed {} payload: {}", what, e);
                AppError::InvalidQuiz(format!("malformed {}: {}", what, e))
            });
        }

        Err(status_error(status, what))
    }
}

fn status_error(status: StatusCode, what: &str) -> AppError {
    tracing::warn!("{} returned {}", what, status);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AppError::AuthError(format!("{} returned {}", what, status))
        }
        StatusCode::NOT_FOUND => AppError::NotFound(format!("{} not found", what)),
        s if s.is_client_error() => AppError::Rejected(format!("{} returned {}", what, s)),
        _ => AppError::Network(format!("{} returned {}", what, status)),
    }
}

#[async_trait]
impl QuizApi for HttpQuizApi {
    async fn current_user(&self) -> Result<CurrentUser, AppError> {
        let url = self.url("user")?;
        self.send(self.client.get(url), "user").await
    }

    async fn get_quiz(&self, quiz_id: i64) -> Result<Quiz, AppError> {
        let url = self.url(&format!("quizzes/{}", quiz_id))?;
        self.send(self.client.get(url), "quiz").await
    }

    async fn get_questions(&self, quiz_id: i64) -> Result<Vec<Question>, AppError> {
        let url = self.url(&format!("quizzes/{}/questions", quiz_id))?;
        self.send(self.client.get(url), "questions").await
    }

    async fn submit_result(
        &self,
        quiz_id: i64,
        result: &SubmitResultRequest,
    ) -> Result<QuizResult, AppError> {
        let url = self.url(&format!("quizzes/{}/results", quiz_id))?;
        let response = self
            .authorize(self.client.post(url).json(result))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, "result"));
        }

        // The result is persisted once we see a 2xx; an odd body must not
        // turn that into a failure.
        let body = response.text().await?;
        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            tracing::debug!("Unparsed result body ({}): {}", e, body);
            QuizResult::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_join_under_base() {
        let api = HttpQuizApi::new("http://localhost:3000/api", None).unwrap();
        assert_eq!(
            api.url("quizzes/4/questions").unwrap().as_str(),
            "http://localhost:3000/api/quizzes/4/questions"
        );
    }

    #[test]
    fn test_client_errors_are_not_retried() {
        for status in [StatusCode::BAD_REQUEST, StatusCode::UNPROCESSABLE_ENTITY] {
            let err = status_error(status, "results");
            assert!(matches!(err, AppError::Rejected(_)));
            assert!(!err.is_transient());
        }
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "results"),
            AppError::AuthError(_)
        ));
        assert!(status_error(StatusCode::SERVICE_UNAVAILABLE, "results").is_transient());
        assert!(status_error(StatusCode::INTERNAL_SERVER_ERROR, "results").is_transient());
    }

    #[test]
    fn test_rejects_garbage_base() {
        assert!(HttpQuizApi::new("not a url", None).is_err());
    }
}
