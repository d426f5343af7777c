// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use quiz_knight::api::QuizApi;
use quiz_knight::config::ProctorSettings;
use quiz_knight::error::AppError;
use quiz_knight::ledger::{AttemptLedger, MemoryStore};
use quiz_knight::models::question::{Question, QuestionType};
use quiz_knight::models::quiz::{Quiz, QuizType};
use quiz_knight::models::result::{QuizResult, SubmitResultRequest};
use quiz_knight::models::user::CurrentUser;
use quiz_knight::proctor::{
    ControllerHandle, DeliveryMode, IntegrityController, SessionContext, UserNotice,
};
use quiz_knight::signals::FullscreenHost;
use quiz_knight::utils::shuffle::Permutation;
use tokio::sync::broadcast;

pub const QUIZ_ID: i64 = 11;
pub const USER_ID: i64 = 42;

pub fn question(id: i64, key: &str) -> Question {
    Question {
        id,
        question_text: format!("Question {}", id),
        question_type: QuestionType::Mcq,
        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        correct_answer: key.to_string(),
        image_url: None,
        option_images: None,
    }
}

/// Quiz server stand-in. The first `fail_first` submissions fail with a
/// network error.
pub struct MockApi {
    pub quiz: Quiz,
    pub questions: Vec<Question>,
    fail_first: AtomicU32,
    submit_calls: AtomicU32,
    submissions: Mutex<Vec<SubmitResultRequest>>,
}

impl MockApi {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            quiz: Quiz {
                id: Some(QUIZ_ID),
                title: "Orders of Architecture".to_string(),
                description: None,
                quiz_type: QuizType::Standard,
                duration: None,
                time_limit: Some(10),
                is_active: true,
            },
            questions,
            fail_first: AtomicU32::new(0),
            submit_calls: AtomicU32::new(0),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(questions: Vec<Question>, fail_first: u32) -> Self {
        let api = Self::new(questions);
        api.fail_first.store(fail_first, Ordering::SeqCst);
        api
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<SubmitResultRequest> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuizApi for MockApi {
    async fn current_user(&self) -> Result<CurrentUser, AppError> {
        Ok(CurrentUser {
            id: USER_ID,
            role: "student".to_string(),
        })
    }

    async fn get_quiz(&self, _quiz_id: i64) -> Result<Quiz, AppError> {
        Ok(self.quiz.clone())
    }

    async fn get_questions(&self, _quiz_id: i64) -> Result<Vec<Question>, AppError> {
        Ok(self.questions.clone())
    }

    async fn submit_result(
        &self,
        _quiz_id: i64,
        result: &SubmitResultRequest,
    ) -> Result<QuizResult, AppError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.fail_first.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_first.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::Network("connection reset".to_string()));
        }
        self.submissions.lock().unwrap().push(result.clone());
        Ok(QuizResult {
            score: Some(result.score as i64),
            ..QuizResult::default()
        })
    }
}

#[derive(Default)]
pub struct MockFullscreen {
    requests: AtomicU32,
}

impl MockFullscreen {
    pub fn requests(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FullscreenHost for MockFullscreen {
    async fn request_fullscreen(&self) -> Result<(), AppError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct Harness {
    pub api: Arc<MockApi>,
    pub ledger: AttemptLedger,
    pub settings: ProctorSettings,
    pub handle: ControllerHandle,
}

impl Harness {
    pub fn start(api: MockApi, duration: u32, mode: DeliveryMode) -> Self {
        let order = Permutation::identity(api.questions.len());
        Self::start_with_order(api, duration, mode, order)
    }

    pub fn start_with_order(
        api: MockApi,
        duration: u32,
        mode: DeliveryMode,
        order: Permutation,
    ) -> Self {
        let api = Arc::new(api);
        let ledger = AttemptLedger::new(Arc::new(MemoryStore::new()));
        let settings = ProctorSettings::default();
        let ctx = SessionContext {
            quiz_id: QUIZ_ID,
            user_id: USER_ID,
            api: api.clone(),
            ledger: ledger.clone(),
            settings: settings.clone(),
        };
        let handle = IntegrityController::start_with_order(
            ctx,
            api.questions.clone(),
            duration,
            mode,
            order,
        )
        .expect("session should start");

        Self {
            api,
            ledger,
            settings,
            handle,
        }
    }
}

/// Lets the controller drain its queue without advancing much time.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// Next notice matching `pred`, skipping the rest.
pub async fn next_notice(
    rx: &mut broadcast::Receiver<UserNotice>,
    mut pred: impl FnMut(&UserNotice) -> bool,
) -> UserNotice {
    loop {
        let notice = rx.recv().await.expect("notice channel closed");
        if pred(&notice) {
            return notice;
        }
    }
}
