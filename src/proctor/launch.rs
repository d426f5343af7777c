// src/proctor/launch.rs

use crate::{
    error::AppError,
    models::{
        attempt::{AttemptRecord, RecoverySnapshot},
        question::Question,
        quiz::Quiz,
        user::CurrentUser,
    },
    state::AppState,
};

use super::controller::{ControllerHandle, IntegrityController, SessionContext};

/// A started attempt.
pub struct ActiveAttempt {
    pub user: CurrentUser,
    pub quiz: Quiz,
    pub record: AttemptRecord,
    pub handle: ControllerHandle,
    /// Canonical order, as served.
    pub questions: Vec<Question>,
}

/// What to render at a display position.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionView<'a> {
    Ready {
        display_index: usize,
        question: &'a Question,
        choices: Vec<String>,
        answer: String,
    },
    /// Malformed question; shown as "unable to load" and scored unanswered.
    Unavailable { display_index: usize },
}

impl ActiveAttempt {
    /// The question shown at `display_index`, with the answer recorded so far.
    pub fn question_at(&self, display_index: usize) -> Option<QuestionView<'_>> {
        let status = self.handle.status();
        let canonical = *status.display_order.get(display_index)?;
        if status.unavailable.get(canonical).copied().unwrap_or(true) {
            return Some(QuestionView::Unavailable { display_index });
        }
        let question = self.questions.get(canonical)?;
        Some(QuestionView::Ready {
            display_index,
            question,
            choices: question.choices(),
            answer: status.answers.get(canonical).cloned().unwrap_or_default(),
        })
    }

    pub fn current_question(&self) -> Option<QuestionView<'_>> {
        self.question_at(self.handle.status().current_display_index)
    }
}

pub enum Admission {
    Started(ActiveAttempt),
    /// The ledger already holds a completed or fresh attempt for this pair.
    AlreadyAttempted {
        active: Option<AttemptRecord>,
        snapshot: Option<RecoverySnapshot>,
    },
    /// A live quiz outside its window.
    NotOpen,
}

/// Opens a quiz for the signed-in student.
///
/// * Resolves the user and the quiz.
/// * Refuses closed live quizzes and pairs the ledger says already attempted.
/// * Registers the attempt, then starts the controller.
pub async fn launch_attempt(state: &AppState, quiz_id: i64) -> Result<Admission, AppError> {
    let user = state.api.current_user().await?;

    let quiz = state.api.get_quiz(quiz_id).await?;
    if quiz.is_live() && !quiz.is_active {
        tracing::info!("Live quiz {} is not open", quiz_id);
        return Ok(Admission::NotOpen);
    }

    if state.ledger.has_attempted_quiz(quiz_id, user.id).await {
        tracing::info!("User {} already attempted quiz {}", user.id, quiz_id);
        return Ok(Admission::AlreadyAttempted {
            active: state.ledger.get_active_session(quiz_id, user.id).await,
            snapshot: state.ledger.load_snapshot(quiz_id, user.id).await,
        });
    }

    let questions = state.api.get_questions(quiz_id).await?;
    if questions.is_empty() {
        return Err(AppError::InvalidQuiz(format!("quiz {} has no questions", quiz_id)));
    }

    let record = state.ledger.register_attempt(quiz_id, user.id).await;

    let ctx = SessionContext {
        quiz_id,
        user_id: user.id,
        api: state.api.clone(),
        ledger: state.ledger.clone(),
        settings: state.settings.clone(),
    };
    let handle = IntegrityController::start(
        ctx,
        questions.clone(),
        quiz.duration_secs(),
        quiz.quiz_type.into(),
    )?;

    Ok(Admission::Started(ActiveAttempt {
        user,
        quiz,
        record,
        handle,
        questions,
    }))
}
