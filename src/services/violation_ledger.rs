use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};

use crate::models::integrity::{IntegritySnapshot, SignalKind};

/// Per-signal scoring and escalation policy. Table-driven so new signals
/// can be added without touching the session controller.
#[derive(Debug, Clone, Copy)]
pub struct SignalPolicy {
    /// Ledger points added per occurrence.
    pub points: u32,
    /// Fire an escalation on every n-th occurrence inside the rolling
    /// window. The caller resets the counter after acting on it.
    pub escalate_every: Option<u32>,
}

/// Default policy table:
/// paste 1 point + escalation every 3rd, visibility loss 2 points,
/// liveness failure 3 points, devtools and motion warn-only (0 points).
pub fn default_policies(paste_escalation_every: u32) -> HashMap<SignalKind, SignalPolicy> {
    HashMap::from([
        (
            SignalKind::PasteAttempt,
            SignalPolicy {
                points: 1,
                escalate_every: Some(paste_escalation_every),
            },
        ),
        (
            SignalKind::VisibilityLoss,
            SignalPolicy {
                points: 2,
                escalate_every: None,
            },
        ),
        (
            SignalKind::DevtoolsHint,
            SignalPolicy {
                points: 0,
                escalate_every: None,
            },
        ),
        (
            SignalKind::LivenessFailure,
            SignalPolicy {
                points: 3,
                escalate_every: None,
            },
        ),
        (
            SignalKind::MotionAnomaly,
            SignalPolicy {
                points: 0,
                escalate_every: None,
            },
        ),
    ])
}

#[derive(Debug, Clone, Copy)]
pub struct LedgerOutcome {
    pub score: u32,
    pub points_added: u32,
    pub escalated: bool,
}

/// Accumulates violation points for the session. The score is
/// monotonically non-decreasing; offense counters per signal live in a
/// rolling time window.
pub struct ViolationLedger {
    score: u32,
    window: Duration,
    policies: HashMap<SignalKind, SignalPolicy>,
    offenses: HashMap<SignalKind, VecDeque<DateTime<Utc>>>,
}

impl ViolationLedger {
    pub fn new(window: Duration, policies: HashMap<SignalKind, SignalPolicy>) -> Self {
        Self {
            score: 0,
            window,
            policies,
            offenses: HashMap::new(),
        }
    }

    /// Record one occurrence of `kind` at `at`. Returns the new score and
    /// whether the signal's escalation rule fired.
    pub fn record(&mut self, kind: SignalKind, at: DateTime<Utc>) -> LedgerOutcome {
        let policy = self.policies.get(&kind).copied().unwrap_or(SignalPolicy {
            points: 0,
            escalate_every: None,
        });

        self.score += policy.points;

        let mut escalated = false;
        if let Some(every) = policy.escalate_every {
            let count = {
                let offenses = self.offenses.entry(kind).or_default();
                Self::prune(offenses, at - self.window);
                offenses.push_back(at);
                offenses.len() as u32
            };
            if every > 0 && count % every == 0 {
                escalated = true;
                tracing::warn!(
                    "Escalation fired for signal {:?}: {} offenses within window",
                    kind,
                    count
                );
            }
        }

        if policy.points > 0 {
            tracing::info!(
                "Violation recorded: signal={:?}, points={}, score={}",
                kind,
                policy.points,
                self.score
            );
        }

        LedgerOutcome {
            score: self.score,
            points_added: policy.points,
            escalated,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Clear the offense counter for one signal. Called after an
    /// escalation has been acted on, so repeated low-grade offenses of
    /// the same kind do not all fire the same escalation.
    pub fn reset(&mut self, kind: SignalKind) {
        if let Some(offenses) = self.offenses.get_mut(&kind) {
            offenses.clear();
        }
    }

    pub fn offense_count(&mut self, kind: SignalKind, now: DateTime<Utc>) -> u32 {
        match self.offenses.get_mut(&kind) {
            Some(offenses) => {
                Self::prune(offenses, now - self.window);
                offenses.len() as u32
            }
            None => 0,
        }
    }

    /// Persisted view of the ledger at `now`. Offenses that already aged
    /// out of the rolling window are not carried; a reload must not
    /// resurrect them.
    pub fn snapshot(&self, now: DateTime<Utc>) -> IntegritySnapshot {
        let cutoff = now - self.window;
        IntegritySnapshot {
            score: self.score,
            offense_counters: self
                .offenses
                .iter()
                .filter_map(|(kind, offenses)| {
                    let live = offenses.iter().filter(|at| **at >= cutoff).count() as u32;
                    (live > 0).then_some((*kind, live))
                })
                .collect(),
        }
    }

    /// Rehydrate from a persisted snapshot. The score never moves
    /// backwards; carried offense counters are re-anchored at `now`
    /// because their original timestamps did not survive the reload.
    pub fn restore(&mut self, snapshot: &IntegritySnapshot, now: DateTime<Utc>) {
        self.score = self.score.max(snapshot.score);
        for (kind, count) in &snapshot.offense_counters {
            let offenses = self.offenses.entry(*kind).or_default();
            offenses.clear();
            for _ in 0..*count {
                offenses.push_back(now);
            }
        }
        tracing::info!("Integrity state rehydrated: score={}", self.score);
    }

    fn prune(offenses: &mut VecDeque<DateTime<Utc>>, cutoff: DateTime<Utc>) {
        while offenses.front().is_some_and(|at| *at < cutoff) {
            offenses.pop_front();
        }
    }
}
