// src/signals/hotkeys.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::time::Instant;

use super::{BrowserEvent, Disposition, KeyCombo, SignalSource};
use crate::{
    error::AppError,
    proctor::{ControllerHandle, UserNotice},
};

/// Ctrl/Cmd shortcuts for copying, printing, saving and viewing source.
const BLOCKED_WITH_CTRL: &[&str] = &["c", "v", "x", "a", "p", "s", "u"];
/// Ctrl+Shift developer tools shortcuts.
const BLOCKED_WITH_CTRL_SHIFT: &[&str] = &["i", "j", "c"];
const BLOCKED_PLAIN: &[&str] = &["F12", "PrintScreen"];

pub fn is_blocked(combo: &KeyCombo) -> bool {
    let key = combo.key.to_lowercase();
    let command = combo.ctrl || combo.meta;

    if BLOCKED_PLAIN.iter().any(|k| k.eq_ignore_ascii_case(&combo.key)) {
        return true;
    }
    if command && combo.shift && BLOCKED_WITH_CTRL_SHIFT.contains(&key.as_str()) {
        return true;
    }
    command && !combo.alt && BLOCKED_WITH_CTRL.contains(&key.as_str())
}

/// Suppresses shortcut keys. Counted separately from violations.
pub struct HotkeySignal {
    handle: ControllerHandle,
    suspended: Arc<AtomicBool>,
    blocked: u32,
}

impl HotkeySignal {
    pub fn new(handle: ControllerHandle, suspended: Arc<AtomicBool>) -> Self {
        Self {
            handle,
            suspended,
            blocked: 0,
        }
    }
}

impl SignalSource for HotkeySignal {
    fn name(&self) -> &'static str {
        "hotkeys"
    }

    fn on_event(&mut self, event: &BrowserEvent, _now: Instant) -> Result<Disposition, AppError> {
        let BrowserEvent::KeyDown(combo) = event else {
            return Ok(Disposition::Allow);
        };
        if !self.handle.is_active() || self.suspended.load(Ordering::SeqCst) {
            return Ok(Disposition::Allow);
        }
        if !is_blocked(combo) {
            return Ok(Disposition::Allow);
        }

        self.blocked += 1;
        tracing::debug!("Blocked hotkey {}", combo);
        self.handle.notify(UserNotice::HotkeyBlocked {
            combo: combo.to_string(),
        });
        Ok(Disposition::Block)
    }

    fn blocked(&self) -> u32 {
        self.blocked
    }
}
