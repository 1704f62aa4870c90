use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::integrity::SignalEvent;

/// Periodic attentive-presence challenge. The firing cadence belongs to
/// an external timer; this tracks the outstanding challenge and turns a
/// missed response deadline into a liveness-failure event.
#[derive(Debug)]
pub struct LivenessCheck {
    response_window: Duration,
    pending: Option<Challenge>,
}

#[derive(Debug, Clone, Copy)]
struct Challenge {
    id: Uuid,
    deadline: DateTime<Utc>,
}

impl LivenessCheck {
    pub fn new(response_window: Duration) -> Self {
        Self {
            response_window,
            pending: None,
        }
    }

    /// Issue a new challenge. A still-unanswered previous challenge is
    /// replaced; its failure is reported through `poll`, not here.
    pub fn issue(&mut self, at: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.pending = Some(Challenge {
            id,
            deadline: at + self.response_window,
        });
        tracing::debug!("Liveness challenge issued: id={}", id);
        id
    }

    /// Acknowledge the outstanding challenge. Returns false for stale or
    /// unknown ids.
    pub fn acknowledge(&mut self, id: Uuid, at: DateTime<Utc>) -> bool {
        match self.pending {
            Some(challenge) if challenge.id == id && at <= challenge.deadline => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Check the deadline; a missed one clears the challenge and emits
    /// one failure event carrying nothing beyond "failed now".
    pub fn poll(&mut self, at: DateTime<Utc>) -> Option<SignalEvent> {
        match self.pending {
            Some(challenge) if at > challenge.deadline => {
                self.pending = None;
                tracing::warn!("Liveness challenge missed: id={}", challenge.id);
                Some(SignalEvent::LivenessFailure { at })
            }
            _ => None,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    #[test]
    fn acknowledged_challenge_does_not_fail() {
        let mut check = LivenessCheck::new(Duration::seconds(15));
        let id = check.issue(t(0));
        assert!(check.acknowledge(id, t(5)));
        assert!(check.poll(t(30)).is_none());
    }

    #[test]
    fn missed_deadline_emits_exactly_one_failure() {
        let mut check = LivenessCheck::new(Duration::seconds(15));
        check.issue(t(0));
        assert!(check.poll(t(10)).is_none());
        assert!(matches!(
            check.poll(t(16)),
            Some(SignalEvent::LivenessFailure { .. })
        ));
        // Failure already consumed the challenge.
        assert!(check.poll(t(20)).is_none());
    }

    #[test]
    fn late_acknowledgement_is_rejected() {
        let mut check = LivenessCheck::new(Duration::seconds(15));
        let id = check.issue(t(0));
        assert!(!check.acknowledge(id, t(20)));
        assert!(check.poll(t(20)).is_some());
    }

    #[test]
    fn stale_id_does_not_acknowledge_a_new_challenge() {
        let mut check = LivenessCheck::new(Duration::seconds(15));
        let first = check.issue(t(0));
        let _second = check.issue(t(5));
        assert!(!check.acknowledge(first, t(6)));
        assert!(check.has_pending());
    }
}
