use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;

use crate::config::Config;
use crate::detectors::SignalSink;
use crate::error::SessionError;
use crate::models::integrity::{IntegritySnapshot, SignalEvent, SignalKind, WarningKind};
use crate::models::{GradeReport, Question};
use crate::storage::SessionStore;

use super::grading_service::AnswerGrader;
use super::violation_ledger::{default_policies, ViolationLedger};

/// External collaborator ending the authenticated session. Invoked at
/// most once per session when the termination threshold is crossed.
pub trait SessionTerminator {
    fn terminate(&mut self, destination: &str);
}

/// External fullscreen capability gating the whole exam interaction.
pub trait FullscreenProvider {
    fn is_fullscreen(&self) -> bool;
    /// Request fullscreen; the execution environment may deny it.
    fn enter(&mut self) -> anyhow::Result<()>;
}

/// Session lifecycle. `Submitted` carries the grade report, so grading
/// can only ever happen on the one transition that constructs it.
#[derive(Debug)]
pub enum Phase {
    AwaitingFullscreen,
    Active,
    Submitted(GradeReport),
    Terminated,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::AwaitingFullscreen => "awaiting_fullscreen",
            Phase::Active => "active",
            Phase::Submitted(_) => "submitted",
            Phase::Terminated => "terminated",
        }
    }
}

/// Per-category transient warning slots with auto-dismissal. Re-raising
/// a category supersedes its previous dismissal deadline (last-write-wins
/// on the display timer only, never on ledger state).
#[derive(Debug, Default)]
struct WarningBoard {
    raised: HashMap<WarningKind, DateTime<Utc>>,
}

impl WarningBoard {
    fn raise(&mut self, kind: WarningKind, at: DateTime<Utc>) {
        tracing::warn!("Warning raised: {:?} ({})", kind, kind.message());
        self.raised.insert(kind, at);
    }

    fn active(&self, now: DateTime<Utc>, ttl: Duration) -> Vec<WarningKind> {
        let mut kinds: Vec<WarningKind> = self
            .raised
            .iter()
            .filter(|(_, raised_at)| now - **raised_at < ttl)
            .map(|(kind, _)| *kind)
            .collect();
        kinds.sort();
        kinds
    }

    fn clear(&mut self) {
        self.raised.clear();
    }
}

/// Orchestrates the exam session: owns the question order, the answer
/// set, the violation ledger and the warning board; routes detector
/// events; decides grading and termination.
pub struct ExamSession {
    session_id: String,
    config: Config,
    questions: Vec<Question>,
    order: Vec<String>,
    answers: HashMap<String, String>,
    ledger: ViolationLedger,
    warnings: WarningBoard,
    grader: AnswerGrader,
    phase: Phase,
    store: Box<dyn SessionStore>,
    terminator: Box<dyn SessionTerminator>,
}

impl ExamSession {
    /// Mount a session. The initial question order is a fresh random
    /// permutation; any integrity state persisted under this session id
    /// is rehydrated so a page reload cannot reset the score.
    pub fn new(
        session_id: impl Into<String>,
        config: Config,
        questions: Vec<Question>,
        store: Box<dyn SessionStore>,
        terminator: Box<dyn SessionTerminator>,
        now: DateTime<Utc>,
    ) -> Self {
        let session_id = session_id.into();
        let mut order: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();
        order.shuffle(&mut rand::rng());

        let mut ledger = ViolationLedger::new(
            Duration::seconds(config.offense_window_seconds),
            default_policies(config.paste_escalation_every),
        );

        match store.get(&integrity_key(&session_id)) {
            Ok(Some(raw)) => match serde_json::from_str::<IntegritySnapshot>(&raw) {
                Ok(snapshot) => ledger.restore(&snapshot, now),
                Err(e) => tracing::warn!("Discarding unreadable integrity snapshot: {:#}", e),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to read integrity snapshot: {:#}", e),
        }

        let grader = AnswerGrader::new(config.default_similarity_threshold);

        tracing::info!(
            "Session mounted: id={}, questions={}, score={}",
            session_id,
            questions.len(),
            ledger.score()
        );

        Self {
            session_id,
            config,
            questions,
            order,
            answers: HashMap::new(),
            ledger,
            warnings: WarningBoard::default(),
            grader,
            phase: Phase::AwaitingFullscreen,
            store,
            terminator,
        }
    }

    /// Move from `AwaitingFullscreen` to `Active` once the fullscreen
    /// precondition holds. A denied request is reported and the session
    /// stays put. A rehydrated score already past the threshold
    /// terminates instead of activating.
    pub fn activate(
        &mut self,
        fullscreen: &mut dyn FullscreenProvider,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        if !matches!(self.phase, Phase::AwaitingFullscreen) {
            return Err(SessionError::NotActive(self.phase.name()));
        }

        if !fullscreen.is_fullscreen() {
            if let Err(e) = fullscreen.enter() {
                self.warnings.raise(WarningKind::FullscreenRequired, now);
                return Err(SessionError::FullscreenDenied(format!("{e:#}")));
            }
        }

        if self.ledger.score() >= self.config.termination_threshold {
            self.terminate_session();
            return Ok(());
        }

        self.phase = Phase::Active;
        tracing::info!("Session activated: id={}", self.session_id);
        Ok(())
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Active)
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.phase, Phase::Terminated)
    }

    pub fn score(&self) -> u32 {
        self.ledger.score()
    }

    /// Current question order, a permutation of question ids. Replaced
    /// wholesale on liveness failure; answers are keyed by id and never
    /// shift with it.
    pub fn question_order(&self) -> &[String] {
        &self.order
    }

    pub fn answer(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    /// Record or replace an answer. Only while `Active`; after grading
    /// the answer set is frozen.
    pub fn set_answer(&mut self, question_id: &str, text: &str) -> Result<(), SessionError> {
        if !self.is_active() {
            return Err(SessionError::NotActive(self.phase.name()));
        }
        if !self.questions.iter().any(|q| q.id == question_id) {
            return Err(SessionError::UnknownQuestion(question_id.to_string()));
        }
        self.answers
            .insert(question_id.to_string(), text.to_string());
        Ok(())
    }

    /// Route one detector event. Outside `Active` this is a no-op;
    /// within it every event yields a score change, a warning, or both.
    pub fn handle_signal(&mut self, event: SignalEvent) {
        if !self.is_active() {
            tracing::debug!(
                "Ignoring {:?} signal in the {} phase",
                event.kind(),
                self.phase.name()
            );
            return;
        }

        let at = event.at();
        match event {
            SignalEvent::PasteAttempt { .. } => {
                let outcome = self.ledger.record(SignalKind::PasteAttempt, at);
                if outcome.escalated {
                    self.warnings.raise(WarningKind::PasteEscalated, at);
                    self.ledger.reset(SignalKind::PasteAttempt);
                } else {
                    self.warnings.raise(WarningKind::PasteBlocked, at);
                }
                self.persist_integrity(at);
            }
            SignalEvent::VisibilityLoss { .. } => {
                self.ledger.record(SignalKind::VisibilityLoss, at);
                self.warnings.raise(WarningKind::VisibilityLoss, at);
                self.persist_integrity(at);
            }
            SignalEvent::DevtoolsHint { trigger, .. } => {
                // Deliberately low-severity: warns, never scores.
                self.ledger.record(SignalKind::DevtoolsHint, at);
                tracing::debug!("Devtools hint: trigger={:?}", trigger);
                self.warnings.raise(WarningKind::DevtoolsSuspected, at);
            }
            SignalEvent::LivenessFailure { .. } => {
                self.ledger.record(SignalKind::LivenessFailure, at);
                self.warnings.raise(WarningKind::LivenessFailed, at);
                self.reshuffle_order();
                self.persist_integrity(at);
            }
            SignalEvent::MotionAnomaly {
                is_valid,
                confidence,
                ..
            } => {
                self.ledger.record(SignalKind::MotionAnomaly, at);
                if !is_valid && confidence < self.config.motion_confidence_floor {
                    self.warnings.raise(WarningKind::MotionAnomaly, at);
                } else {
                    tracing::debug!(
                        "Motion verdict not actionable: valid={}, confidence={:.2}",
                        is_valid,
                        confidence
                    );
                }
            }
        }

        if self.ledger.score() >= self.config.termination_threshold {
            self.terminate_session();
        }
    }

    /// Submit all answers. Rejected without a state change when any
    /// question is blank; otherwise grades exactly once and freezes the
    /// session in `Submitted`.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<GradeReport, SessionError> {
        if !self.is_active() {
            return Err(SessionError::NotActive(self.phase.name()));
        }

        let missing: Vec<String> = self
            .order
            .iter()
            .filter(|id| {
                self.answers
                    .get(*id)
                    .map(|a| a.trim().is_empty())
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        if !missing.is_empty() {
            self.warnings.raise(WarningKind::IncompleteSubmission, now);
            return Err(SessionError::Incomplete { missing });
        }

        let report = self.grader.grade(&self.questions, &self.answers);
        let out = report.clone();

        self.discard_integrity();
        self.warnings.clear();
        self.phase = Phase::Submitted(report);
        tracing::info!(
            "Session submitted: id={}, correct={}/{}",
            self.session_id,
            out.correct_count,
            out.total_count
        );

        Ok(out)
    }

    /// Grade report once `Submitted`; None in every other phase.
    pub fn report(&self) -> Option<&GradeReport> {
        match &self.phase {
            Phase::Submitted(report) => Some(report),
            _ => None,
        }
    }

    /// Warnings still on display at `now` (3 s auto-dismissal).
    pub fn active_warnings(&self, now: DateTime<Utc>) -> Vec<WarningKind> {
        self.warnings
            .active(now, Duration::seconds(self.config.warning_dismiss_seconds))
    }

    fn reshuffle_order(&mut self) {
        if self.order.len() < 2 {
            return;
        }
        let previous = self.order.clone();
        let mut rng = rand::rng();
        // Re-draw until the permutation actually changes; a repeat would
        // leave the answer-sharing countermeasure toothless.
        for _ in 0..16 {
            self.order.shuffle(&mut rng);
            if self.order != previous {
                break;
            }
        }
        tracing::info!("Question order replaced: session={}", self.session_id);
    }

    fn persist_integrity(&mut self, now: DateTime<Utc>) {
        let snapshot = self.ledger.snapshot(now);
        match serde_json::to_string(&snapshot) {
            Ok(raw) => {
                // Best-effort: a failed write must not stall the exam.
                if let Err(e) = self.store.put(&integrity_key(&self.session_id), &raw) {
                    tracing::warn!("Failed to persist integrity snapshot: {:#}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize integrity snapshot: {:#}", e),
        }
    }

    fn discard_integrity(&mut self) {
        if let Err(e) = self.store.remove(&integrity_key(&self.session_id)) {
            tracing::warn!("Failed to discard integrity snapshot: {:#}", e);
        }
    }

    fn terminate_session(&mut self) {
        if self.is_terminated() {
            return;
        }
        tracing::warn!(
            "Terminating session: id={}, score={}, threshold={}",
            self.session_id,
            self.ledger.score(),
            self.config.termination_threshold
        );
        self.discard_integrity();
        self.warnings.clear();
        self.terminator
            .terminate(&self.config.termination_destination);
        self.phase = Phase::Terminated;
    }
}

impl SignalSink for ExamSession {
    fn emit(&mut self, event: SignalEvent) {
        self.handle_signal(event);
    }
}

fn integrity_key(session_id: &str) -> String {
    format!("integrity:{}", session_id)
}
