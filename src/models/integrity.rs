use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discrete observation categories produced by the signal sources.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    PasteAttempt,
    VisibilityLoss,
    DevtoolsHint,
    LivenessFailure,
    MotionAnomaly,
}

/// What tripped the devtools heuristic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DevtoolsTrigger {
    WindowSizeDelta,
    KeyboardShortcut,
    ContextMenu,
}

/// A single detector event routed to the session controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalEvent {
    PasteAttempt {
        at: DateTime<Utc>,
    },
    VisibilityLoss {
        at: DateTime<Utc>,
    },
    DevtoolsHint {
        trigger: DevtoolsTrigger,
        at: DateTime<Utc>,
    },
    LivenessFailure {
        at: DateTime<Utc>,
    },
    MotionAnomaly {
        is_valid: bool,
        confidence: f64,
        at: DateTime<Utc>,
    },
}

impl SignalEvent {
    pub fn kind(&self) -> SignalKind {
        match self {
            SignalEvent::PasteAttempt { .. } => SignalKind::PasteAttempt,
            SignalEvent::VisibilityLoss { .. } => SignalKind::VisibilityLoss,
            SignalEvent::DevtoolsHint { .. } => SignalKind::DevtoolsHint,
            SignalEvent::LivenessFailure { .. } => SignalKind::LivenessFailure,
            SignalEvent::MotionAnomaly { .. } => SignalKind::MotionAnomaly,
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            SignalEvent::PasteAttempt { at }
            | SignalEvent::VisibilityLoss { at }
            | SignalEvent::DevtoolsHint { at, .. }
            | SignalEvent::LivenessFailure { at }
            | SignalEvent::MotionAnomaly { at, .. } => *at,
        }
    }
}

/// Transient, UI-visible warning categories. Each category keeps one
/// display slot; re-raising supersedes the previous dismissal timer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    PasteBlocked,
    PasteEscalated,
    VisibilityLoss,
    DevtoolsSuspected,
    LivenessFailed,
    MotionAnomaly,
    FullscreenRequired,
    IncompleteSubmission,
}

impl WarningKind {
    pub fn message(&self) -> &'static str {
        match self {
            WarningKind::PasteBlocked => "Pasting is not allowed!",
            WarningKind::PasteEscalated => {
                "Repeated paste attempts detected. Further violations end the exam."
            }
            WarningKind::VisibilityLoss => "Leaving the exam tab is recorded as a violation.",
            WarningKind::DevtoolsSuspected => "Developer tools are not allowed during the exam.",
            WarningKind::LivenessFailed => {
                "Attention check missed. Question order has been reshuffled."
            }
            WarningKind::MotionAnomaly => "Unusual pointer activity detected.",
            WarningKind::FullscreenRequired => "Fullscreen mode is required to start the exam.",
            WarningKind::IncompleteSubmission => "Please answer all questions before submitting",
        }
    }
}

/// Integrity state persisted across page reloads for the session lifetime.
/// The score is monotonically non-decreasing; violations are never rescinded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegritySnapshot {
    pub score: u32,
    pub offense_counters: BTreeMap<SignalKind, u32>,
}

/// One raw pointer observation fed to the motion-anomaly detector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    pub at: DateTime<Utc>,
}
