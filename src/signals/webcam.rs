// src/signals/webcam.rs

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};

use super::{BrowserEvent, Disposition, SignalHub, SignalSource};
use crate::{
    error::AppError,
    proctor::{ControllerHandle, Phase, UserNotice, ViolationKind},
};

/// Why the camera could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFault {
    NotFound,
    PermissionDenied,
    InUse,
    Other(String),
}

impl fmt::Display for DeviceFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceFault::NotFound => write!(f, "no camera found"),
            DeviceFault::PermissionDenied => write!(f, "camera permission denied"),
            DeviceFault::InUse => write!(f, "camera is in use by another application"),
            DeviceFault::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl From<DeviceFault> for AppError {
    fn from(fault: DeviceFault) -> Self {
        AppError::Device(fault.to_string())
    }
}

/// Camera stream plus face counter.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// Opens the camera stream.
    async fn acquire(&self) -> Result<(), DeviceFault>;

    async fn count_faces(&self) -> Result<u32, DeviceFault>;

    async fn release(&self) {}
}

/// Turns face counts into violations.
///
/// More than one face counts once per episode; the episode ends when the
/// count drops back to one or zero. Camera faults raise a banner and never
/// block the attempt.
pub struct WebcamSignal {
    handle: ControllerHandle,
    multiple_faces: bool,
    face_missing: bool,
    faulted: bool,
}

impl WebcamSignal {
    pub fn new(handle: ControllerHandle) -> Self {
        Self {
            handle,
            multiple_faces: false,
            face_missing: false,
            faulted: false,
        }
    }
}

impl SignalSource for WebcamSignal {
    fn name(&self) -> &'static str {
        "webcam"
    }

    fn on_event(&mut self, event: &BrowserEvent, _now: Instant) -> Result<Disposition, AppError> {
        if !self.handle.is_active() {
            return Ok(Disposition::Allow);
        }

        match event {
            BrowserEvent::FacesDetected(faces) => {
                if self.faulted {
                    self.faulted = false;
                    self.handle.notify(UserNotice::WebcamRestored);
                }

                if *faces > 1 {
                    if !self.multiple_faces {
                        self.multiple_faces = true;
                        tracing::warn!("{} faces in view", faces);
                        self.handle.report_violation(ViolationKind::MultipleFaces)?;
                    }
                } else {
                    self.multiple_faces = false;
                }

                if *faces == 0 {
                    if !self.face_missing {
                        self.face_missing = true;
                        self.handle.notify(UserNotice::NoFaceDetected);
                    }
                } else {
                    self.face_missing = false;
                }
            }
            BrowserEvent::WebcamFault(fault) => {
                if !self.faulted {
                    self.faulted = true;
                    tracing::warn!("Webcam unavailable: {}", fault);
                    self.handle.notify(UserNotice::WebcamUnavailable {
                        fault: fault.clone(),
                    });
                }
            }
            _ => {}
        }
        Ok(Disposition::Allow)
    }
}

/// Polls a [`FaceDetector`] and feeds the counts through the hub.
///
/// After a camera fault the poller waits for [`WebcamPoller::retry`].
pub struct WebcamPoller {
    retry: Arc<Notify>,
    task: JoinHandle<()>,
}

impl WebcamPoller {
    pub fn spawn(
        detector: Arc<dyn FaceDetector>,
        hub: SignalHub,
        handle: ControllerHandle,
        every: Duration,
    ) -> Self {
        let retry = Arc::new(Notify::new());
        let task = tokio::spawn(poll_loop(detector, hub, handle, every, retry.clone()));
        Self { retry, task }
    }

    /// The banner's "retry" action.
    pub fn retry(&self) {
        self.retry.notify_one();
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for WebcamPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn should_poll(handle: &ControllerHandle) -> bool {
    handle.is_active() && handle.phase() != Phase::Submitted
}

async fn poll_loop(
    detector: Arc<dyn FaceDetector>,
    hub: SignalHub,
    handle: ControllerHandle,
    every: Duration,
    retry: Arc<Notify>,
) {
    while should_poll(&handle) {
        if let Err(fault) = detector.acquire().await {
            hub.dispatch(&BrowserEvent::WebcamFault(fault));
            retry.notified().await;
            continue;
        }

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let fault = loop {
            ticker.tick().await;
            if !should_poll(&handle) {
                detector.release().await;
                return;
            }
            match detector.count_faces().await {
                Ok(faces) => {
                    hub.dispatch(&BrowserEvent::FacesDetected(faces));
                }
                Err(fault) => break fault,
            }
        };

        detector.release().await;
        hub.dispatch(&BrowserEvent::WebcamFault(fault));
        retry.notified().await;
    }
    tracing::debug!("Webcam polling stopped");
}
