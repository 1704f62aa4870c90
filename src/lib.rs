//! Exam-integrity monitor and answer-grading core for an
//! online-assessment page. Detectors observe browser-style signals
//! (clipboard, visibility, devtools heuristics, liveness, pointer
//! motion), a violation ledger turns them into an escalating score, and
//! the session controller drives warnings, question re-randomization and
//! forced termination. Grading reconciles free-text answers against a
//! reference via normalized edit-distance similarity.

pub mod config;
pub mod detectors;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use config::Config;
pub use error::{BankError, SessionError};
pub use models::integrity::{DevtoolsTrigger, SignalEvent, SignalKind, WarningKind};
pub use models::{parse_bank, GradeReport, Question, QuestionKind, VerdictSet};
pub use services::grading_service::AnswerGrader;
pub use services::session_service::{ExamSession, FullscreenProvider, Phase, SessionTerminator};
pub use services::violation_ledger::{SignalPolicy, ViolationLedger};
pub use storage::{MemoryStore, SessionStore};
