// src/signals/clipboard.rs

use tokio::time::Instant;

use super::{BrowserEvent, Disposition, SignalSource};
use crate::{
    error::AppError,
    proctor::{ControllerHandle, UserNotice},
};

/// Blocks copy, cut, paste and the context menu. Counted, never a violation.
pub struct ClipboardSignal {
    handle: ControllerHandle,
    blocked: u32,
}

impl ClipboardSignal {
    pub fn new(handle: ControllerHandle) -> Self {
        Self { handle, blocked: 0 }
    }
}

impl SignalSource for ClipboardSignal {
    fn name(&self) -> &'static str {
        "clipboard"
    }

    fn on_event(&mut self, event: &BrowserEvent, _now: Instant) -> Result<Disposition, AppError> {
        let action = match event {
            BrowserEvent::Clipboard(action) => action.to_string(),
            BrowserEvent::ContextMenu => "Right-click".to_string(),
            _ => return Ok(Disposition::Allow),
        };
        if !self.handle.is_active() {
            return Ok(Disposition::Allow);
        }

        self.blocked += 1;
        tracing::debug!("Blocked {} ({} so far)", action, self.blocked);
        self.handle.notify(UserNotice::ClipboardBlocked { action });
        Ok(Disposition::Block)
    }

    fn blocked(&self) -> u32 {
        self.blocked
    }
}
