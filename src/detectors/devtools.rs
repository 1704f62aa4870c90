use chrono::{DateTime, Utc};

use crate::models::integrity::{DevtoolsTrigger, SignalEvent};

/// Heuristic devtools detection: outer-vs-inner window dimension delta
/// sampled on a fixed interval, known devtools keyboard shortcuts, and
/// the context-menu gesture. Any trip emits a display-only warning event;
/// this signal deliberately never feeds the termination score.
#[derive(Debug)]
pub struct DevtoolsHeuristic {
    pixel_margin: u32,
}

impl DevtoolsHeuristic {
    pub fn new(pixel_margin: u32) -> Self {
        Self { pixel_margin }
    }

    /// Periodic poll of window geometry. A docked devtools pane widens
    /// the outer-vs-inner delta beyond the calibrated margin.
    pub fn poll_window(
        &self,
        outer_width: u32,
        outer_height: u32,
        inner_width: u32,
        inner_height: u32,
        at: DateTime<Utc>,
    ) -> Option<SignalEvent> {
        let width_delta = outer_width.saturating_sub(inner_width);
        let height_delta = outer_height.saturating_sub(inner_height);
        if width_delta > self.pixel_margin || height_delta > self.pixel_margin {
            tracing::debug!(
                "Devtools window-delta trip: width_delta={}, height_delta={}",
                width_delta,
                height_delta
            );
            Some(SignalEvent::DevtoolsHint {
                trigger: DevtoolsTrigger::WindowSizeDelta,
                at,
            })
        } else {
            None
        }
    }

    /// Intercepts F12, Ctrl/Cmd+Shift+I/J/C and Ctrl+U.
    pub fn observe_key(
        &self,
        key: &str,
        ctrl_or_meta: bool,
        shift: bool,
        at: DateTime<Utc>,
    ) -> Option<SignalEvent> {
        let shortcut = key.eq_ignore_ascii_case("F12")
            || (ctrl_or_meta
                && shift
                && ["i", "j", "c"].iter().any(|k| key.eq_ignore_ascii_case(k)))
            || (ctrl_or_meta && !shift && key.eq_ignore_ascii_case("u"));

        shortcut.then_some(SignalEvent::DevtoolsHint {
            trigger: DevtoolsTrigger::KeyboardShortcut,
            at,
        })
    }

    /// The context-menu gesture is always suppressed and always warns.
    pub fn observe_context_menu(&self, at: DateTime<Utc>) -> SignalEvent {
        SignalEvent::DevtoolsHint {
            trigger: DevtoolsTrigger::ContextMenu,
            at,
        }
    }
}
