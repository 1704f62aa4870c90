//! Independent signal sources. Each detector holds only its own
//! calibration, converts raw browser-style observations into
//! [`SignalEvent`]s, and feeds a single [`SignalSink`] (the session
//! controller). Adding or removing a detector is a local change.

use crate::models::integrity::SignalEvent;

pub mod clipboard;
pub mod devtools;
pub mod liveness;
pub mod motion;
pub mod visibility;

pub use clipboard::{ClipboardAction, ClipboardGuard, ClipboardInput};
pub use devtools::DevtoolsHeuristic;
pub use liveness::LivenessCheck;
pub use motion::{MotionAnomalyDetector, MotionAssessment};
pub use visibility::VisibilityGuard;

/// The one capability detectors need from their consumer.
pub trait SignalSink {
    fn emit(&mut self, event: SignalEvent);
}
