// src/signals/visibility.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use super::{BrowserEvent, Disposition, SignalSource};
use crate::{
    error::AppError,
    proctor::{ControllerHandle, ViolationKind},
};

/// Tab-switch detection.
///
/// A hide/show cycle counts once, and only when the page stayed hidden for at
/// least the debounce window. Hotkey blocking is suspended while a cycle is
/// open so the key events the switch itself produces are not blamed on the
/// student.
pub struct VisibilitySignal {
    handle: ControllerHandle,
    debounce: Duration,
    hidden_since: Option<Instant>,
    hotkeys_suspended: Arc<AtomicBool>,
}

impl VisibilitySignal {
    pub fn new(
        handle: ControllerHandle,
        debounce: Duration,
        hotkeys_suspended: Arc<AtomicBool>,
    ) -> Self {
        Self {
            handle,
            debounce,
            hidden_since: None,
            hotkeys_suspended,
        }
    }
}

impl SignalSource for VisibilitySignal {
    fn name(&self) -> &'static str {
        "visibility"
    }

    fn on_event(&mut self, event: &BrowserEvent, now: Instant) -> Result<Disposition, AppError> {
        let BrowserEvent::VisibilityChanged { hidden } = event else {
            return Ok(Disposition::Allow);
        };
        if !self.handle.is_active() {
            return Ok(Disposition::Allow);
        }

        if *hidden {
            if self.hidden_since.is_none() {
                self.hidden_since = Some(now);
                self.hotkeys_suspended.store(true, Ordering::SeqCst);
            }
            return Ok(Disposition::Allow);
        }

        let Some(since) = self.hidden_since.take() else {
            return Ok(Disposition::Allow);
        };
        self.hotkeys_suspended.store(false, Ordering::SeqCst);

        let away = now.saturating_duration_since(since);
        if away >= self.debounce {
            tracing::info!("Page hidden for {:?}, counting tab switch", away);
            self.handle.report_violation(ViolationKind::TabSwitch)?;
        } else {
            tracing::debug!("Ignoring {:?} visibility blip", away);
        }
        Ok(Disposition::Allow)
    }

    fn detach(&mut self) {
        self.hidden_since = None;
        self.hotkeys_suspended.store(false, Ordering::SeqCst);
    }
}
