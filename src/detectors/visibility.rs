use chrono::{DateTime, Utc};

use crate::models::integrity::SignalEvent;

/// Observes document visibility transitions. Emits exactly one event per
/// visible-to-hidden transition, however long the document stays hidden.
#[derive(Debug, Default)]
pub struct VisibilityGuard {
    hidden: bool,
}

impl VisibilityGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, hidden: bool, at: DateTime<Utc>) -> Option<SignalEvent> {
        let was_hidden = std::mem::replace(&mut self.hidden, hidden);
        if hidden && !was_hidden {
            Some(SignalEvent::VisibilityLoss { at })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn emits_once_per_hidden_transition() {
        let mut guard = VisibilityGuard::new();
        assert!(guard.observe(true, now()).is_some());
        // Repeated "still hidden" observations do not re-emit.
        assert!(guard.observe(true, now()).is_none());
        assert!(guard.observe(true, now()).is_none());

        assert!(guard.observe(false, now()).is_none());
        assert!(guard.observe(true, now()).is_some());
    }

    #[test]
    fn becoming_visible_never_emits() {
        let mut guard = VisibilityGuard::new();
        assert!(guard.observe(false, now()).is_none());
        assert!(guard.observe(true, now()).is_some());
        assert!(guard.observe(false, now()).is_none());
    }
}
