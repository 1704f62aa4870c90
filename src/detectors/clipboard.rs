use chrono::{DateTime, Utc};

use crate::models::integrity::SignalEvent;

/// Raw clipboard-adjacent gestures on an answer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardInput {
    Paste,
    Drop,
    Copy,
    Cut,
    /// A keydown with modifier state; only paste shortcuts are intercepted.
    Key { ctrl_or_meta: bool, key: char },
}

/// What the host page must do with the gesture, plus the event to route
/// to the controller (if any).
#[derive(Debug, Clone)]
pub struct ClipboardAction {
    /// When true the default action is suppressed; no text is ever
    /// inserted through an intercepted path.
    pub suppress: bool,
    pub event: Option<SignalEvent>,
}

/// Intercepts paste, drag-drop and keyboard-paste attempts on answer
/// inputs. Copy and cut are suppressed unconditionally without an event.
/// Stateless: the offense counter lives in the violation ledger.
#[derive(Debug, Default)]
pub struct ClipboardGuard;

impl ClipboardGuard {
    pub fn new() -> Self {
        Self
    }

    pub fn intercept(&self, input: ClipboardInput, at: DateTime<Utc>) -> ClipboardAction {
        match input {
            ClipboardInput::Paste | ClipboardInput::Drop => ClipboardAction {
                suppress: true,
                event: Some(SignalEvent::PasteAttempt { at }),
            },
            ClipboardInput::Key { ctrl_or_meta: true, key } if key.eq_ignore_ascii_case(&'v') => {
                ClipboardAction {
                    suppress: true,
                    event: Some(SignalEvent::PasteAttempt { at }),
                }
            }
            ClipboardInput::Copy | ClipboardInput::Cut => ClipboardAction {
                suppress: true,
                event: None,
            },
            ClipboardInput::Key { .. } => ClipboardAction {
                suppress: false,
                event: None,
            },
        }
    }
}
