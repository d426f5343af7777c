// src/proctor/mod.rs

pub mod controller;
pub mod launch;
pub mod notice;
pub mod scoring;
pub mod session;
pub mod submission;

pub use controller::{ControllerHandle, IntegrityController, SessionContext};
pub use launch::{ActiveAttempt, Admission, QuestionView, launch_attempt};
pub use notice::{TerminationCause, UserNotice, ViolationKind};
pub use scoring::{ScoreSummary, calculate_score};
pub use session::{DeliveryMode, IntegritySession, Phase, SessionStatus, SubmissionState};
