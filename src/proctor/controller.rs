// src/proctor/controller.rs

//! Async owner of one [`IntegritySession`].
//!
//! Every mutation (answers, ticks, violations, submission) arrives as a
//! message on one channel and is applied by a single task, so signal sources
//! never hold or mutate their own copy of the session. Callers read state
//! through the `watch` channel, which always holds the latest status.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::notice::{UserNotice, ViolationKind};
use super::scoring::ScoreSummary;
use super::session::{
    Deferred, DeliveryMode, Effect, IntegritySession, Phase, SessionStatus, SubmitTrigger,
};
use super::submission::SubmissionPipeline;
use crate::{
    api::QuizApi, config::ProctorSettings, error::AppError, ledger::AttemptLedger,
    models::question::Question, utils::shuffle::Permutation,
};

const NOTICE_CAPACITY: usize = 64;

/// Collaborators of one attempt.
#[derive(Clone)]
pub struct SessionContext {
    pub quiz_id: i64,
    pub user_id: i64,
    pub api: Arc<dyn QuizApi>,
    pub ledger: AttemptLedger,
    pub settings: ProctorSettings,
}

#[derive(Debug)]
enum Command {
    RecordAnswer { display_index: usize, answer: String },
    GoTo(usize),
    ReportViolation(ViolationKind),
    Submit,
    Shutdown,
}

enum Internal {
    Deferred(Deferred),
    SubmissionFinished(Result<ScoreSummary, AppError>),
}

/// Cheap, cloneable entry point handed to the UI and to every signal source.
#[derive(Clone)]
pub struct ControllerHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SessionStatus>,
    notices: broadcast::Sender<UserNotice>,
    active: Arc<AtomicBool>,
}

impl ControllerHandle {
    pub fn record_answer(
        &self,
        display_index: usize,
        answer: impl Into<String>,
    ) -> Result<(), AppError> {
        self.send(Command::RecordAnswer {
            display_index,
            answer: answer.into(),
        })
    }

    pub fn go_to(&self, display_index: usize) -> Result<(), AppError> {
        self.send(Command::GoTo(display_index))
    }

    /// Safe to call from any number of sources in any order.
    pub fn report_violation(&self, kind: ViolationKind) -> Result<(), AppError> {
        self.send(Command::ReportViolation(kind))
    }

    /// Manual submission, or a retry after a failed one.
    pub fn submit(&self) -> Result<(), AppError> {
        self.send(Command::Submit)
    }

    /// Publishes a notice that does not change session state.
    pub fn notify(&self, notice: UserNotice) {
        if self.is_active() {
            let _ = self.notices.send(notice);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UserNotice> {
        self.notices.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn phase(&self) -> Phase {
        self.status.borrow().phase
    }

    pub fn watch(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    /// False once the session has been torn down.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Resolves with the first status satisfying `pred`.
    pub async fn wait_until(
        &self,
        pred: impl FnMut(&SessionStatus) -> bool,
    ) -> Result<SessionStatus, AppError> {
        let mut rx = self.status.clone();
        let status = rx
            .wait_for(pred)
            .await
            .map_err(|_| AppError::SessionClosed)?;
        Ok(status.clone())
    }

    /// Resolves once the controller task has exited.
    pub async fn closed(&self) {
        let mut rx = self.status.clone();
        while rx.changed().await.is_ok() {}
    }

    /// Unmount: later signals are dropped, timers are released.
    pub fn teardown(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            tracing::info!("Tearing down quiz session");
        }
        let _ = self.commands.send(Command::Shutdown);
    }

    fn send(&self, command: Command) -> Result<(), AppError> {
        if !self.is_active() {
            tracing::debug!("Dropping {:?} after teardown", command);
            return Err(AppError::SessionClosed);
        }
        self.commands
            .send(command)
            .map_err(|_| AppError::SessionClosed)
    }
}

pub struct IntegrityController;

impl IntegrityController {
    /// Starts a session with a freshly shuffled presentation order.
    pub fn start(
        ctx: SessionContext,
        questions: Vec<Question>,
        duration: u32,
        mode: DeliveryMode,
    ) -> Result<ControllerHandle, AppError> {
        let order = Permutation::shuffled(questions.len(), ctx.settings.shuffle_seed);
        Self::start_with_order(ctx, questions, duration, mode, order)
    }

    pub fn start_with_order(
        ctx: SessionContext,
        questions: Vec<Question>,
        duration: u32,
        mode: DeliveryMode,
        order: Permutation,
    ) -> Result<ControllerHandle, AppError> {
        let session = IntegritySession::start(questions, duration, mode, order, &ctx.settings)?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(session.status());
        let (notice_tx, _) = broadcast::channel(NOTICE_CAPACITY);
        let active = Arc::new(AtomicBool::new(true));

        let pipeline = SubmissionPipeline {
            api: ctx.api.clone(),
            ledger: ctx.ledger.clone(),
            quiz_id: ctx.quiz_id,
            user_id: ctx.user_id,
            max_retries: ctx.settings.submit_max_retries,
            backoff: ctx.settings.submit_backoff,
            active: active.clone(),
        };

        let task = ControllerTask {
            session,
            quiz_id: ctx.quiz_id,
            user_id: ctx.user_id,
            ledger: ctx.ledger,
            pipeline,
            tick_period: ctx.settings.tick_period,
            commands: command_rx,
            internal_tx,
            internal_rx,
            status: status_tx,
            notices: notice_tx.clone(),
            timers: JoinSet::new(),
            active: active.clone(),
        };
        tokio::spawn(task.run());

        Ok(ControllerHandle {
            commands: command_tx,
            status: status_rx,
            notices: notice_tx,
            active,
        })
    }
}

struct ControllerTask {
    session: IntegritySession,
    quiz_id: i64,
    user_id: i64,
    ledger: AttemptLedger,
    pipeline: SubmissionPipeline,
    tick_period: Duration,
    commands: mpsc::UnboundedReceiver<Command>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
    status: watch::Sender<SessionStatus>,
    notices: broadcast::Sender<UserNotice>,
    timers: JoinSet<()>,
    active: Arc<AtomicBool>,
}

impl ControllerTask {
    async fn run(mut self) {
        let mut ticker = interval_at(Instant::now() + self.tick_period, self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let effects = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(message) = self.internal_rx.recv() => self.handle_internal(message),
                _ = ticker.tick(), if self.session.phase() == Phase::Active => self.session.tick(),
                Some(_) = self.timers.join_next(), if !self.timers.is_empty() => Vec::new(),
            };

            self.apply(effects).await;
            self.status.send_replace(self.session.status());
        }

        self.active.store(false, Ordering::SeqCst);
        self.timers.abort_all();
        tracing::info!(
            "Session for quiz {} closed in {:?}",
            self.quiz_id,
            self.session.phase()
        );
    }

    fn handle_command(&mut self, command: Command) -> Vec<Effect> {
        match command {
            Command::RecordAnswer {
                display_index,
                answer,
            } => self.session.record_answer(display_index, answer),
            Command::GoTo(display_index) => self.session.go_to(display_index),
            Command::ReportViolation(kind) => self.session.report_violation(kind),
            Command::Submit => self.session.request_submit(SubmitTrigger::Manual),
            Command::Shutdown => Vec::new(),
        }
    }

    fn handle_internal(&mut self, message: Internal) -> Vec<Effect> {
        match message {
            Internal::Deferred(Deferred::ReleaseAnswerGuard) => {
                self.session.release_answer_guard();
                Vec::new()
            }
            Internal::Deferred(Deferred::AutoSubmit(cause)) => {
                self.session.request_submit(SubmitTrigger::Auto(cause))
            }
            Internal::SubmissionFinished(outcome) => self.session.submission_finished(outcome),
        }
    }

    async fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Notify(notice) => {
                    // no subscribers is fine
                    let _ = self.notices.send(notice);
                }
                Effect::Schedule { after, action } => {
                    let tx = self.internal_tx.clone();
                    self.timers.spawn(async move {
                        tokio::time::sleep(after).await;
                        let _ = tx.send(Internal::Deferred(action));
                    });
                }
                Effect::PersistWarnings(warnings) => {
                    self.ledger
                        .save_snapshot(self.quiz_id, self.user_id, warnings)
                        .await;
                }
                Effect::Dispatch(job) => {
                    tracing::info!(
                        "Dispatching result for quiz {}: score {}",
                        self.quiz_id,
                        job.summary.score
                    );
                    let pipeline = self.pipeline.clone();
                    let tx = self.internal_tx.clone();
                    // not tracked in `timers`: a dispatched result is not
                    // cancelled by teardown, only its retries are
                    tokio::spawn(async move {
                        let outcome = pipeline.run(&job).await.map(|_| job.summary);
                        let _ = tx.send(Internal::SubmissionFinished(outcome));
                    });
                }
            }
        }
    }
}
