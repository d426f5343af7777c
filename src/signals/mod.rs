// src/signals/mod.rs

//! Integrity signal sources.
//!
//! The host (browser glue, terminal runner, tests) forwards raw events to a
//! [`SignalHub`]. Each source turns them into controller calls and decides
//! whether the host should suppress the event's default action. A source
//! whose handler fails is logged and switched off; the attempt carries on
//! without that category of detection.

pub mod clipboard;
pub mod fullscreen;
pub mod hotkeys;
pub mod visibility;
pub mod webcam;

use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use tokio::time::Instant;

use crate::{config::ProctorSettings, error::AppError, proctor::ControllerHandle};

pub use clipboard::ClipboardSignal;
pub use fullscreen::{FullscreenHost, FullscreenSignal};
pub use hotkeys::HotkeySignal;
pub use visibility::VisibilitySignal;
pub use webcam::{DeviceFault, FaceDetector, WebcamPoller, WebcamSignal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardAction {
    Copy,
    Cut,
    Paste,
}

impl fmt::Display for ClipboardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardAction::Copy => write!(f, "Copy"),
            ClipboardAction::Cut => write!(f, "Cut"),
            ClipboardAction::Paste => write!(f, "Paste"),
        }
    }
}

/// A key press with its modifier state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo {
    /// `KeyboardEvent.key`, e.g. "c", "F12", "PrintScreen".
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyCombo {
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }

    pub fn ctrl(key: &str) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(key)
        }
    }

    pub fn ctrl_shift(key: &str) -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::plain(key)
        }
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.meta {
            write!(f, "Cmd+")?;
        }
        if self.alt {
            write!(f, "Alt+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        if self.key.chars().count() == 1 {
            write!(f, "{}", self.key.to_uppercase())
        } else {
            write!(f, "{}", self.key)
        }
    }
}

/// Raw host events the sources listen to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    VisibilityChanged { hidden: bool },
    FullscreenChanged { active: bool },
    Clipboard(ClipboardAction),
    ContextMenu,
    KeyDown(KeyCombo),
    FacesDetected(u32),
    WebcamFault(DeviceFault),
}

/// What the host should do with the event's default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Allow,
    Block,
}

pub trait SignalSource: Send {
    fn name(&self) -> &'static str;

    fn on_event(&mut self, event: &BrowserEvent, now: Instant) -> Result<Disposition, AppError>;

    /// Events this source suppressed without counting a violation.
    fn blocked(&self) -> u32 {
        0
    }

    /// Releases timers and tasks owned by the source.
    fn detach(&mut self) {}
}

struct Slot {
    source: Box<dyn SignalSource>,
    enabled: bool,
}

struct HubInner {
    slots: Vec<Slot>,
}

impl HubInner {
    fn detach_all(&mut self) {
        for slot in &mut self.slots {
            slot.source.detach();
        }
        self.slots.clear();
    }
}

impl Drop for HubInner {
    fn drop(&mut self) {
        self.detach_all();
    }
}

/// Listener registry for one session. Clones share the same listeners.
#[derive(Clone)]
pub struct SignalHub {
    inner: Arc<Mutex<HubInner>>,
}

impl SignalHub {
    /// Registers the standard sources against `handle`.
    pub fn attach(
        handle: &ControllerHandle,
        settings: &ProctorSettings,
        fullscreen: Arc<dyn FullscreenHost>,
    ) -> Self {
        let hotkeys_suspended = Arc::new(AtomicBool::new(false));
        let sources: Vec<Box<dyn SignalSource>> = vec![
            Box::new(VisibilitySignal::new(
                handle.clone(),
                settings.visibility_debounce,
                hotkeys_suspended.clone(),
            )),
            Box::new(FullscreenSignal::new(
                handle.clone(),
                fullscreen,
                settings.fullscreen_reentry,
            )),
            Box::new(ClipboardSignal::new(handle.clone())),
            Box::new(HotkeySignal::new(handle.clone(), hotkeys_suspended)),
            Box::new(WebcamSignal::new(handle.clone())),
        ];
        Self::with_sources(sources)
    }

    pub fn with_sources(sources: Vec<Box<dyn SignalSource>>) -> Self {
        let slots = sources
            .into_iter()
            .map(|source| Slot {
                source,
                enabled: true,
            })
            .collect();
        Self {
            inner: Arc::new(Mutex::new(HubInner { slots })),
        }
    }

    /// Runs every enabled source; any `Block` wins.
    pub fn dispatch(&self, event: &BrowserEvent) -> Disposition {
        let now = Instant::now();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut disposition = Disposition::Allow;

        for slot in inner.slots.iter_mut().filter(|s| s.enabled) {
            match slot.source.on_event(event, now) {
                Ok(Disposition::Block) => disposition = Disposition::Block,
                Ok(Disposition::Allow) => {}
                Err(AppError::SessionClosed) => {}
                Err(e) => {
                    tracing::error!(
                        "Signal source {} failed on {:?}, disabling it: {}",
                        slot.source.name(),
                        event,
                        e
                    );
                    slot.source.detach();
                    slot.enabled = false;
                }
            }
        }
        disposition
    }

    /// Per-source counts of suppressed, non-violation events.
    pub fn blocked_counts(&self) -> Vec<(&'static str, u32)> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .slots
            .iter()
            .map(|s| (s.source.name(), s.source.blocked()))
            .collect()
    }

    /// Number of sources still listening.
    pub fn active_sources(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.slots.iter().filter(|s| s.enabled).count()
    }

    /// Removes every source. Safe to call more than once.
    pub fn detach(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if !inner.slots.is_empty() {
            tracing::debug!("Detaching {} signal sources", inner.slots.len());
        }
        inner.detach_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl SignalSource for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn on_event(&mut self, _: &BrowserEvent, _: Instant) -> Result<Disposition, AppError> {
            Err(AppError::Device("camera driver crashed".to_string()))
        }
    }

    struct Blocker(u32);

    impl SignalSource for Blocker {
        fn name(&self) -> &'static str {
            "blocker"
        }

        fn on_event(&mut self, _: &BrowserEvent, _: Instant) -> Result<Disposition, AppError> {
            self.0 += 1;
            Ok(Disposition::Block)
        }

        fn blocked(&self) -> u32 {
            self.0
        }
    }

    #[test]
    fn test_failing_source_is_disabled_others_continue() {
        let hub = SignalHub::with_sources(vec![Box::new(Broken), Box::new(Blocker(0))]);

        assert_eq!(hub.dispatch(&BrowserEvent::ContextMenu), Disposition::Block);
        assert_eq!(hub.active_sources(), 1);
        assert_eq!(hub.dispatch(&BrowserEvent::ContextMenu), Disposition::Block);
        assert_eq!(hub.blocked_counts(), vec![("broken", 0), ("blocker", 2)]);
    }

    #[test]
    fn test_detach_removes_listeners() {
        let hub = SignalHub::with_sources(vec![Box::new(Blocker(0))]);
        hub.detach();
        hub.detach();
        assert_eq!(hub.active_sources(), 0);
        assert_eq!(hub.dispatch(&BrowserEvent::ContextMenu), Disposition::Allow);
    }

    #[test]
    fn test_key_combo_display() {
        assert_eq!(KeyCombo::ctrl_shift("i").to_string(), "Ctrl+Shift+I");
        assert_eq!(KeyCombo::plain("F12").to_string(), "F12");
    }
}
