// src/proctor/notice.rs

use std::fmt;

use serde::Serialize;

use super::scoring::ScoreSummary;
use crate::signals::webcam::DeviceFault;

/// Violation categories that feed the shared warning counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    TabSwitch,
    FullscreenExit,
    MultipleFaces,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::TabSwitch => write!(f, "switching tabs"),
            ViolationKind::FullscreenExit => write!(f, "exiting fullscreen"),
            ViolationKind::MultipleFaces => write!(f, "multiple faces detected"),
        }
    }
}

/// Why an attempt stopped accepting answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationCause {
    /// The last question was answered.
    AllAnswered,
    /// The student pressed "Submit Quiz".
    Manual,
    TimeExpired,
    ViolationLimit(ViolationKind),
}

impl TerminationCause {
    pub fn is_automatic(&self) -> bool {
        matches!(
            self,
            TerminationCause::TimeExpired | TerminationCause::ViolationLimit(_)
        )
    }
}

impl fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationCause::AllAnswered => write!(f, "all questions answered"),
            TerminationCause::Manual => write!(f, "manual submission"),
            TerminationCause::TimeExpired => write!(f, "time running out"),
            TerminationCause::ViolationLimit(kind) => {
                write!(f, "too many integrity violations (last: {})", kind)
            }
        }
    }
}

/// Messages for the student, published by the controller and signal sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserNotice {
    Warning {
        count: u32,
        threshold: u32,
        kind: ViolationKind,
    },
    /// Informational; not a violation.
    TimeAlmostUp { display_index: usize, seconds: u32 },
    QuestionAdvanced { display_index: usize },
    Terminated { cause: TerminationCause },
    Submitted { summary: ScoreSummary },
    SubmissionFailed { message: String },
    ClipboardBlocked { action: String },
    HotkeyBlocked { combo: String },
    /// Persistent banner with a retry action.
    WebcamUnavailable { fault: DeviceFault },
    WebcamRestored,
    NoFaceDetected,
}

impl fmt::Display for UserNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserNotice::Warning {
                count,
                threshold,
                kind,
            } => {
                if count >= threshold {
                    write!(f, "Warning {}/{}: {}.", count, threshold, kind)
                } else {
                    write!(
                        f,
                        "Warning {}/{}: {}. The quiz will be submitted automatically after {} warnings.",
                        count, threshold, kind, threshold
                    )
                }
            }
            UserNotice::TimeAlmostUp { seconds, .. } => {
                write!(f, "{} seconds left for this question!", seconds)
            }
            UserNotice::QuestionAdvanced { display_index } => {
                write!(f, "Moved to question {}.", display_index + 1)
            }
            UserNotice::Terminated { cause } if cause.is_automatic() => write!(
                f,
                "Quiz terminated due to {}. Your answers have been automatically submitted.",
                cause
            ),
            UserNotice::Terminated { cause } => write!(f, "Submitting quiz ({}).", cause),
            UserNotice::Submitted { summary } => write!(
                f,
                "Quiz submitted: {}/{} correct, score {}%, {} points.",
                summary.correct, summary.total, summary.score, summary.points
            ),
            UserNotice::SubmissionFailed { message } => write!(f, "{}", message),
            UserNotice::ClipboardBlocked { action } => {
                write!(f, "{} is disabled during the quiz.", action)
            }
            UserNotice::HotkeyBlocked { combo } => {
                write!(f, "{} is disabled during the quiz.", combo)
            }
            UserNotice::WebcamUnavailable { fault } => {
                write!(f, "Webcam unavailable: {}. Retry to enable monitoring.", fault)
            }
            UserNotice::WebcamRestored => write!(f, "Webcam monitoring active."),
            UserNotice::NoFaceDetected => {
                write!(f, "No face detected. Please stay in view of the camera.")
            }
        }
    }
}
