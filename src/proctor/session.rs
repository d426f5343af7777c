// src/proctor/session.rs

//! The attempt-integrity state machine.
//!
//! `IntegritySession` is plain data with synchronous transitions. Each
//! transition returns the [`Effect`]s the caller must carry out (notify the
//! student, arm a timer, persist the warning count, dispatch the submission).
//! It never sleeps or performs I/O, which keeps every ordering question inside
//! one `&mut self` call.

use std::time::Duration;

use serde::Serialize;

use super::notice::{TerminationCause, UserNotice, ViolationKind};
use super::scoring::{ScoreSummary, calculate_score};
use crate::{
    config::ProctorSettings,
    error::AppError,
    models::{question::Question, quiz::QuizType, result::SubmitResultRequest},
    utils::shuffle::Permutation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initializing,
    Active,
    /// Timeout or threshold reached; one submission sequence is underway.
    Terminating,
    Submitted,
}

/// Guard against duplicate submission. `InFlight` never returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    InFlight,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Self-paced, overall time limit only.
    Standard,
    /// Per-question time slice on top of the overall limit.
    Live,
}

impl From<QuizType> for DeliveryMode {
    fn from(t: QuizType) -> Self {
        match t {
            QuizType::Standard => DeliveryMode::Standard,
            QuizType::Live => DeliveryMode::Live,
        }
    }
}

/// Work the session asks to be run later, fed back as a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    ReleaseAnswerGuard,
    AutoSubmit(TerminationCause),
}

/// Everything needed to post the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionJob {
    pub request: SubmitResultRequest,
    pub summary: ScoreSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Notify(UserNotice),
    Schedule { after: Duration, action: Deferred },
    PersistWarnings(u32),
    Dispatch(SubmissionJob),
}

/// Who asked for the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    /// "Submit Quiz" button; may retry a failed submission.
    Manual,
    Auto(TerminationCause),
}

/// Read-only copy of the session published after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub phase: Phase,
    pub mode: DeliveryMode,
    pub warnings: u32,
    pub quiz_time_remaining: u32,
    pub question_time_remaining: u32,
    pub current_display_index: usize,
    /// `display_order[display] = canonical`.
    pub display_order: Vec<usize>,
    pub submission: SubmissionState,
    pub cause: Option<TerminationCause>,
    /// Canonical order, not display order.
    pub answers: Vec<String>,
    /// Canonical order; `true` for questions that failed validation.
    pub unavailable: Vec<bool>,
    pub summary: Option<ScoreSummary>,
}

#[derive(Debug, Clone)]
pub struct IntegritySession {
    phase: Phase,
    mode: DeliveryMode,
    questions: Vec<Question>,
    order: Permutation,
    answers: Vec<String>,
    unavailable: Vec<bool>,
    current: usize,
    warnings: u32,
    duration: u32,
    quiz_time_remaining: u32,
    question_time_remaining: u32,
    time_per_question: u32,
    question_warning_sent: bool,
    answer_guard: bool,
    submission: SubmissionState,
    dispatching: bool,
    cause: Option<TerminationCause>,
    summary: Option<ScoreSummary>,
    settings: ProctorSettings,
}

impl IntegritySession {
    /// Validates the quiz and moves from `Initializing` to `Active`.
    ///
    /// `order` is the presentation order; `questions` stays canonical.
    pub fn start(
        questions: Vec<Question>,
        duration: u32,
        mode: DeliveryMode,
        order: Permutation,
        settings: &ProctorSettings,
    ) -> Result<Self, AppError> {
        if questions.is_empty() {
            return Err(AppError::InvalidQuiz("quiz has no questions".to_string()));
        }
        if duration == 0 {
            return Err(AppError::InvalidQuiz("duration must be positive".to_string()));
        }
        if order.len() != questions.len() {
            return Err(AppError::InvalidQuiz(format!(
                "presentation order covers {} of {} questions",
                order.len(),
                questions.len()
            )));
        }

        let unavailable: Vec<bool> = questions
            .iter()
            .map(|q| match q.check() {
                Ok(()) => false,
                Err(e) => {
                    tracing::warn!("Question {} cannot be shown: {}", q.id, e);
                    true
                }
            })
            .collect();

        let count = questions.len() as u32;
        let time_per_question = match mode {
            DeliveryMode::Live => (duration / count).max(1),
            DeliveryMode::Standard => 0,
        };

        let mut session = Self {
            phase: Phase::Initializing,
            mode,
            answers: vec![String::new(); questions.len()],
            questions,
            order,
            unavailable,
            current: 0,
            warnings: 0,
            duration,
            quiz_time_remaining: duration,
            question_time_remaining: time_per_question,
            time_per_question,
            question_warning_sent: false,
            answer_guard: false,
            submission: SubmissionState::Idle,
            dispatching: false,
            cause: None,
            summary: None,
            settings: settings.clone(),
        };
        session.phase = Phase::Active;

        tracing::info!(
            "Session active: {} questions, {}s, {:?} mode, {}s per question",
            count,
            duration,
            mode,
            time_per_question
        );
        Ok(session)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn warnings(&self) -> u32 {
        self.warnings
    }

    pub fn submission(&self) -> SubmissionState {
        self.submission
    }

    pub fn time_per_question(&self) -> u32 {
        self.time_per_question
    }

    /// Canonical answers.
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            phase: self.phase,
            mode: self.mode,
            warnings: self.warnings,
            quiz_time_remaining: self.quiz_time_remaining,
            question_time_remaining: self.question_time_remaining,
            current_display_index: self.current,
            display_order: self.order.as_slice().to_vec(),
            submission: self.submission,
            cause: self.cause,
            answers: self.answers.clone(),
            unavailable: self.unavailable.clone(),
            summary: self.summary.clone(),
        }
    }

    /// Stores an answer against the canonical question shown at `display_index`,
    /// then moves on or, after the last question, submits.
    pub fn record_answer(&mut self, display_index: usize, answer: String) -> Vec<Effect> {
        if self.phase != Phase::Active {
            tracing::debug!("Answer ignored in {:?}", self.phase);
            return Vec::new();
        }
        if self.answer_guard {
            tracing::debug!("Answer ignored, previous selection still settling");
            return Vec::new();
        }
        let Some(canonical) = self.order.canonical(display_index) else {
            tracing::warn!("Answer for unknown display position {}", display_index);
            return Vec::new();
        };
        if self.mode == DeliveryMode::Live && display_index != self.current {
            tracing::warn!(
                "Live answer for position {} while showing {}",
                display_index,
                self.current
            );
            return Vec::new();
        }
        if self.unavailable[canonical] {
            tracing::warn!("Answer for unavailable question at {}", display_index);
            return Vec::new();
        }

        self.answers[canonical] = answer;
        self.answer_guard = true;

        let mut effects = vec![Effect::Schedule {
            after: self.settings.answer_guard,
            action: Deferred::ReleaseAnswerGuard,
        }];

        if display_index + 1 == self.questions.len() {
            effects.extend(self.begin_submission(TerminationCause::AllAnswered, true));
        } else {
            self.current = display_index;
            effects.extend(self.advance());
        }
        effects
    }

    pub fn release_answer_guard(&mut self) {
        self.answer_guard = false;
    }

    /// Free navigation; standard mode only.
    pub fn go_to(&mut self, display_index: usize) -> Vec<Effect> {
        if self.phase != Phase::Active
            || self.mode != DeliveryMode::Standard
            || display_index >= self.questions.len()
        {
            return Vec::new();
        }
        self.current = display_index;
        Vec::new()
    }

    /// One second elapsed.
    pub fn tick(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Active {
            return Vec::new();
        }

        let mut effects = Vec::new();
        self.quiz_time_remaining = self.quiz_time_remaining.saturating_sub(1);

        if self.mode == DeliveryMode::Live {
            self.question_time_remaining = self.question_time_remaining.saturating_sub(1);
            if self.question_time_remaining == self.settings.question_warning_secs
                && !self.question_warning_sent
            {
                self.question_warning_sent = true;
                effects.push(Effect::Notify(UserNotice::TimeAlmostUp {
                    display_index: self.current,
                    seconds: self.question_time_remaining,
                }));
            }
        }

        if self.quiz_time_remaining == 0 {
            tracing::info!("Quiz time expired");
            effects.extend(self.begin_submission(TerminationCause::TimeExpired, true));
        } else if self.mode == DeliveryMode::Live && self.question_time_remaining == 0 {
            if self.current + 1 == self.questions.len() {
                tracing::info!("Final question time expired");
                effects.extend(self.begin_submission(TerminationCause::TimeExpired, true));
            } else {
                tracing::debug!("Question {} time expired", self.current);
                effects.extend(self.advance());
            }
        }
        effects
    }

    /// Counts one violation. The only place `warnings` changes.
    pub fn report_violation(&mut self, kind: ViolationKind) -> Vec<Effect> {
        if self.phase != Phase::Active {
            tracing::debug!("Violation {:?} ignored in {:?}", kind, self.phase);
            return Vec::new();
        }

        self.warnings += 1;
        let threshold = self.settings.warning_threshold;
        tracing::warn!("Violation {:?}: warning {}/{}", kind, self.warnings, threshold);

        let mut effects = vec![
            Effect::PersistWarnings(self.warnings),
            Effect::Notify(UserNotice::Warning {
                count: self.warnings,
                threshold,
                kind,
            }),
        ];

        if self.warnings >= threshold {
            let cause = TerminationCause::ViolationLimit(kind);
            self.phase = Phase::Terminating;
            self.cause = Some(cause);
            effects.push(Effect::Notify(UserNotice::Terminated { cause }));
            effects.push(Effect::Schedule {
                after: self.settings.violation_settle,
                action: Deferred::AutoSubmit(cause),
            });
        }
        effects
    }

    /// Single entry point for manual and automatic submission.
    pub fn request_submit(&mut self, trigger: SubmitTrigger) -> Vec<Effect> {
        if self.phase == Phase::Initializing || self.phase == Phase::Submitted {
            return Vec::new();
        }

        match (self.submission, trigger) {
            (SubmissionState::Completed, _) => Vec::new(),
            (SubmissionState::InFlight, _) if self.dispatching => {
                tracing::debug!("Submission already in flight");
                Vec::new()
            }
            (SubmissionState::InFlight, SubmitTrigger::Manual) => {
                tracing::info!("Retrying submission on request");
                self.dispatching = true;
                vec![Effect::Dispatch(self.build_job())]
            }
            (SubmissionState::InFlight, SubmitTrigger::Auto(_)) => Vec::new(),
            (SubmissionState::Idle, SubmitTrigger::Manual) => {
                let announce = self.phase == Phase::Active;
                self.begin_submission(TerminationCause::Manual, announce)
            }
            (SubmissionState::Idle, SubmitTrigger::Auto(cause)) => {
                let announce = self.phase == Phase::Active;
                self.begin_submission(cause, announce)
            }
        }
    }

    /// Outcome of a dispatched submission pipeline.
    pub fn submission_finished(&mut self, outcome: Result<ScoreSummary, AppError>) -> Vec<Effect> {
        self.dispatching = false;
        match outcome {
            Ok(summary) => {
                self.submission = SubmissionState::Completed;
                self.phase = Phase::Submitted;
                self.summary = Some(summary.clone());
                tracing::info!("Attempt submitted with score {}", summary.score);
                vec![Effect::Notify(UserNotice::Submitted { summary })]
            }
            Err(e) => {
                tracing::error!("Submission failed, waiting for manual retry: {}", e);
                let message = e
                    .user_message()
                    .unwrap_or_else(|| "Failed to submit quiz. Please try again.".to_string());
                vec![Effect::Notify(UserNotice::SubmissionFailed { message })]
            }
        }
    }

    fn advance(&mut self) -> Vec<Effect> {
        if self.current + 1 >= self.questions.len() {
            return Vec::new();
        }
        self.current += 1;
        if self.mode == DeliveryMode::Live {
            self.question_time_remaining = self.time_per_question;
            self.question_warning_sent = false;
        }
        vec![Effect::Notify(UserNotice::QuestionAdvanced {
            display_index: self.current,
        })]
    }

    fn begin_submission(&mut self, cause: TerminationCause, announce: bool) -> Vec<Effect> {
        if self.submission != SubmissionState::Idle {
            return Vec::new();
        }

        self.phase = Phase::Terminating;
        let cause = *self.cause.get_or_insert(cause);
        self.submission = SubmissionState::InFlight;
        self.dispatching = true;

        let mut effects = Vec::new();
        if announce {
            effects.push(Effect::Notify(UserNotice::Terminated { cause }));
        }
        effects.push(Effect::Dispatch(self.build_job()));
        effects
    }

    fn build_job(&self) -> SubmissionJob {
        let summary = calculate_score(&self.questions, &self.answers);
        let answers = serde_json::to_string(&self.answers).unwrap_or_else(|e| {
            tracing::error!("Failed to encode answers: {}", e);
            "[]".to_string()
        });
        let request = SubmitResultRequest {
            answers,
            score: summary.score,
            time_taken: self.duration - self.quiz_time_remaining,
            correct_answers: summary.correct,
            wrong_answers: summary.wrong,
            total_questions: summary.total,
        };
        SubmissionJob { request, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionType;

    fn question(id: i64, key: &str) -> Question {
        Question {
            id,
            question_text: format!("Question {}", id),
            question_type: QuestionType::Mcq,
            options: vec!["A", "B", "C", "D", "E", "X"]
                .into_iter()
                .map(String::from)
                .collect(),
            correct_answer: key.to_string(),
            image_url: None,
            option_images: None,
        }
    }

    fn session(keys: &[&str], duration: u32, mode: DeliveryMode) -> IntegritySession {
        let questions = keys
            .iter()
            .enumerate()
            .map(|(i, k)| question(i as i64 + 1, k))
            .collect();
        IntegritySession::start(
            questions,
            duration,
            mode,
            Permutation::identity(keys.len()),
            &ProctorSettings::default(),
        )
        .unwrap()
    }

    fn dispatches(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, Effect::Dispatch(_)))
            .count()
    }

    #[test]
    fn test_start_rejects_bad_input() {
        let settings = ProctorSettings::default();
        assert!(
            IntegritySession::start(
                vec![],
                60,
                DeliveryMode::Standard,
                Permutation::identity(0),
                &settings
            )
            .is_err()
        );
        assert!(
            IntegritySession::start(
                vec![question(1, "A")],
                0,
                DeliveryMode::Standard,
                Permutation::identity(1),
                &settings
            )
            .is_err()
        );
        assert!(
            IntegritySession::start(
                vec![question(1, "A")],
                60,
                DeliveryMode::Standard,
                Permutation::identity(2),
                &settings
            )
            .is_err()
        );
    }

    #[test]
    fn test_live_time_per_question_is_floored() {
        let s = session(&["A", "B", "C"], 100, DeliveryMode::Live);
        assert_eq!(s.time_per_question(), 33);
        assert_eq!(s.status().question_time_remaining, 33);
        assert_eq!(s.phase(), Phase::Active);
    }

    #[test]
    fn test_answer_maps_through_shuffle() {
        let questions = vec![question(1, "A"), question(2, "B"), question(3, "C")];
        let mut s = IntegritySession::start(
            questions,
            60,
            DeliveryMode::Standard,
            Permutation::from_order(vec![2, 0, 1]).unwrap(),
            &ProctorSettings::default(),
        )
        .unwrap();

        assert_eq!(s.status().display_order, vec![2, 0, 1]);

        s.record_answer(0, "C".to_string());
        assert_eq!(s.answers(), &["", "", "C"]);
        assert_eq!(s.status().current_display_index, 1);
    }

    #[test]
    fn test_answer_guard_absorbs_double_click() {
        let mut s = session(&["A", "B", "C"], 60, DeliveryMode::Standard);
        let first = s.record_answer(0, "A".to_string());
        assert!(first.contains(&Effect::Schedule {
            after: ProctorSettings::default().answer_guard,
            action: Deferred::ReleaseAnswerGuard,
        }));

        assert!(s.record_answer(1, "B".to_string()).is_empty());
        assert_eq!(s.answers()[1], "");

        s.release_answer_guard();
        s.record_answer(1, "B".to_string());
        assert_eq!(s.answers()[1], "B");
    }

    #[test]
    fn test_last_answer_submits() {
        let mut s = session(&["A", "B"], 60, DeliveryMode::Standard);
        s.record_answer(0, "A".to_string());
        s.release_answer_guard();
        let effects = s.record_answer(1, "C".to_string());

        assert_eq!(dispatches(&effects), 1);
        assert_eq!(s.phase(), Phase::Terminating);
        assert_eq!(s.status().cause, Some(TerminationCause::AllAnswered));
        match effects.iter().find(|e| matches!(e, Effect::Dispatch(_))) {
            Some(Effect::Dispatch(job)) => {
                assert_eq!(job.request.answers, r#"["A","C"]"#);
                assert_eq!(job.request.correct_answers, 1);
                assert_eq!(job.request.wrong_answers, 1);
                assert_eq!(job.request.score, 50);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_two_violations_do_not_terminate() {
        let mut s = session(&["A", "B"], 60, DeliveryMode::Standard);
        s.report_violation(ViolationKind::TabSwitch);
        let effects = s.report_violation(ViolationKind::MultipleFaces);

        assert_eq!(s.warnings(), 2);
        assert_eq!(s.phase(), Phase::Active);
        assert!(effects.contains(&Effect::PersistWarnings(2)));
        assert!(
            !effects
                .iter()
                .any(|e| matches!(e, Effect::Schedule { action: Deferred::AutoSubmit(_), .. }))
        );
    }

    #[test]
    fn test_third_violation_terminates_once() {
        let mut s = session(&["A", "B"], 60, DeliveryMode::Standard);
        s.report_violation(ViolationKind::TabSwitch);
        s.report_violation(ViolationKind::FullscreenExit);
        let effects = s.report_violation(ViolationKind::MultipleFaces);

        assert_eq!(s.phase(), Phase::Terminating);
        let cause = TerminationCause::ViolationLimit(ViolationKind::MultipleFaces);
        assert!(effects.contains(&Effect::Schedule {
            after: ProctorSettings::default().violation_settle,
            action: Deferred::AutoSubmit(cause),
        }));

        // late signals are no-ops and the counter stays put
        assert!(s.report_violation(ViolationKind::TabSwitch).is_empty());
        assert_eq!(s.warnings(), 3);
        // answers are frozen while terminating
        assert!(s.record_answer(0, "A".to_string()).is_empty());
    }

    #[test]
    fn test_concurrent_triggers_dispatch_once() {
        let mut s = session(&["A", "B", "C"], 1, DeliveryMode::Standard);
        let mut total = 0;

        for kind in [
            ViolationKind::TabSwitch,
            ViolationKind::FullscreenExit,
            ViolationKind::MultipleFaces,
        ] {
            total += dispatches(&s.report_violation(kind));
        }
        total += dispatches(&s.tick());
        let cause = TerminationCause::ViolationLimit(ViolationKind::MultipleFaces);
        total += dispatches(&s.request_submit(SubmitTrigger::Auto(cause)));
        total += dispatches(&s.request_submit(SubmitTrigger::Manual));
        total += dispatches(&s.request_submit(SubmitTrigger::Auto(TerminationCause::TimeExpired)));

        assert_eq!(total, 1);
        assert_eq!(s.submission(), SubmissionState::InFlight);
    }

    #[test]
    fn test_timeout_then_violations_dispatch_once() {
        let mut s = session(&["A"], 1, DeliveryMode::Standard);
        let mut total = dispatches(&s.tick());
        for _ in 0..3 {
            total += dispatches(&s.report_violation(ViolationKind::TabSwitch));
        }
        assert_eq!(total, 1);
        assert_eq!(s.warnings(), 0);
        assert_eq!(s.status().cause, Some(TerminationCause::TimeExpired));
    }

    #[test]
    fn test_failed_submission_waits_for_manual_retry() {
        let mut s = session(&["A"], 60, DeliveryMode::Standard);
        assert_eq!(dispatches(&s.request_submit(SubmitTrigger::Manual)), 1);

        let effects = s.submission_finished(Err(AppError::Network("offline".into())));
        assert!(matches!(
            effects.as_slice(),
            [Effect::Notify(UserNotice::SubmissionFailed { .. })]
        ));
        assert_eq!(s.submission(), SubmissionState::InFlight);
        assert_eq!(s.phase(), Phase::Terminating);

        // automatic triggers never re-dispatch, the button does
        assert_eq!(
            dispatches(&s.request_submit(SubmitTrigger::Auto(TerminationCause::TimeExpired))),
            0
        );
        assert_eq!(dispatches(&s.request_submit(SubmitTrigger::Manual)), 1);
        assert_eq!(dispatches(&s.request_submit(SubmitTrigger::Manual)), 0);

        let summary = calculate_score(&[question(1, "A")], &[String::new()]);
        s.submission_finished(Ok(summary));
        assert_eq!(s.phase(), Phase::Submitted);
        assert_eq!(s.submission(), SubmissionState::Completed);
        assert!(s.request_submit(SubmitTrigger::Manual).is_empty());
    }

    #[test]
    fn test_live_question_timer_warns_once_and_advances() {
        // 3 questions x 12s
        let mut s = session(&["A", "B", "C"], 36, DeliveryMode::Live);

        let mut warned = Vec::new();
        let run = |s: &mut IntegritySession, ticks: u32, warned: &mut Vec<usize>| {
            for _ in 0..ticks {
                for e in s.tick() {
                    if let Effect::Notify(UserNotice::TimeAlmostUp { display_index, .. }) = e {
                        warned.push(display_index);
                    }
                }
            }
        };

        run(&mut s, 12, &mut warned);
        assert_eq!(warned, vec![0]);
        assert_eq!(s.status().current_display_index, 1);
        assert_eq!(s.status().question_time_remaining, 12);
        assert_eq!(s.status().quiz_time_remaining, 24);

        // the warning re-arms for the next question
        run(&mut s, 2, &mut warned);
        assert_eq!(warned, vec![0, 1]);
        run(&mut s, 10, &mut warned);
        assert_eq!(warned, vec![0, 1]);
        assert_eq!(s.status().current_display_index, 2);
    }

    #[test]
    fn test_live_final_question_timeout_submits() {
        let mut s = session(&["A", "B"], 20, DeliveryMode::Live);
        let mut total = 0;
        for _ in 0..10 {
            total += dispatches(&s.tick());
        }
        assert_eq!(total, 0);
        assert_eq!(s.status().current_display_index, 1);

        for _ in 0..10 {
            total += dispatches(&s.tick());
        }
        assert_eq!(total, 1);
        assert_eq!(s.status().cause, Some(TerminationCause::TimeExpired));
        assert!(s.tick().is_empty());
    }

    #[test]
    fn test_live_mode_only_answers_current_question() {
        let mut s = session(&["A", "B", "C"], 30, DeliveryMode::Live);
        assert!(s.record_answer(2, "C".to_string()).is_empty());
        assert!(s.go_to(2).is_empty());
        assert_eq!(s.status().current_display_index, 0);
    }

    #[test]
    fn test_standard_navigation() {
        let mut s = session(&["A", "B", "C"], 30, DeliveryMode::Standard);
        s.go_to(2);
        assert_eq!(s.status().current_display_index, 2);
        s.go_to(9);
        assert_eq!(s.status().current_display_index, 2);
    }

    #[test]
    fn test_malformed_question_is_unavailable() {
        let mut broken = question(2, "B");
        broken.options = vec!["only".to_string()];
        let mut s = IntegritySession::start(
            vec![question(1, "A"), broken, question(3, "C")],
            60,
            DeliveryMode::Standard,
            Permutation::identity(3),
            &ProctorSettings::default(),
        )
        .unwrap();

        assert_eq!(s.status().unavailable, vec![false, true, false]);
        assert!(s.record_answer(1, "B".to_string()).is_empty());
    }

    #[test]
    fn test_time_taken_reflects_elapsed_ticks() {
        let mut s = session(&["A"], 60, DeliveryMode::Standard);
        for _ in 0..7 {
            s.tick();
        }
        match s.request_submit(SubmitTrigger::Manual).last() {
            Some(Effect::Dispatch(job)) => assert_eq!(job.request.time_taken, 7),
            other => panic!("unexpected {:?}", other),
        }
    }
}
