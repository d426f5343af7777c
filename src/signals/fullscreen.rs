// src/signals/fullscreen.rs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{BrowserEvent, Disposition, SignalSource};
use crate::{
    error::AppError,
    proctor::{ControllerHandle, Phase, ViolationKind},
};

/// Whatever can put the page back into fullscreen.
#[async_trait]
pub trait FullscreenHost: Send + Sync {
    async fn request_fullscreen(&self) -> Result<(), AppError>;
}

/// Counts fullscreen exits and asks the host to re-enter after a delay.
pub struct FullscreenSignal {
    handle: ControllerHandle,
    host: Arc<dyn FullscreenHost>,
    reentry_after: Duration,
    pending: Option<JoinHandle<()>>,
}

impl FullscreenSignal {
    pub fn new(
        handle: ControllerHandle,
        host: Arc<dyn FullscreenHost>,
        reentry_after: Duration,
    ) -> Self {
        Self {
            handle,
            host,
            reentry_after,
            pending: None,
        }
    }

    fn cancel_reentry(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }

    fn schedule_reentry(&mut self) -> Result<(), AppError> {
        self.cancel_reentry();

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| AppError::Device(format!("no runtime for fullscreen re-entry: {}", e)))?;
        let handle = self.handle.clone();
        let host = self.host.clone();
        let delay = self.reentry_after;

        self.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if !handle.is_active() || handle.phase() != Phase::Active {
                return;
            }
            match host.request_fullscreen().await {
                Ok(()) => tracing::debug!("Fullscreen restored"),
                Err(e) => tracing::warn!("Could not restore fullscreen: {}", e),
            }
        }));
        Ok(())
    }
}

impl SignalSource for FullscreenSignal {
    fn name(&self) -> &'static str {
        "fullscreen"
    }

    fn on_event(&mut self, event: &BrowserEvent, _now: Instant) -> Result<Disposition, AppError> {
        match event {
            BrowserEvent::FullscreenChanged { active: false } => {
                if !self.handle.is_active() || self.handle.phase() != Phase::Active {
                    return Ok(Disposition::Allow);
                }
                tracing::info!("Fullscreen exited");
                self.handle.report_violation(ViolationKind::FullscreenExit)?;
                self.schedule_reentry()?;
            }
            BrowserEvent::FullscreenChanged { active: true } => self.cancel_reentry(),
            _ => {}
        }
        Ok(Disposition::Allow)
    }

    fn detach(&mut self) {
        self.cancel_reentry();
    }
}
