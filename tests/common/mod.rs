#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use examguard::{
    Config, ExamSession, FullscreenProvider, MemoryStore, Question, QuestionKind,
    SessionTerminator,
};

/// Terminator that records every invocation for assertions.
#[derive(Clone, Default)]
pub struct RecordingTerminator {
    pub calls: Rc<RefCell<Vec<String>>>,
}

impl SessionTerminator for RecordingTerminator {
    fn terminate(&mut self, destination: &str) {
        self.calls.borrow_mut().push(destination.to_string());
    }
}

/// Fullscreen provider stub; `granted` controls whether `enter` succeeds.
pub struct StubFullscreen {
    pub granted: bool,
}

impl FullscreenProvider for StubFullscreen {
    fn is_fullscreen(&self) -> bool {
        false
    }

    fn enter(&mut self) -> anyhow::Result<()> {
        if self.granted {
            Ok(())
        } else {
            Err(anyhow::anyhow!("denied by the execution environment"))
        }
    }
}

pub fn t(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap() + Duration::seconds(seconds)
}

pub fn free_text(id: &str, reference: &str) -> Question {
    Question {
        id: id.to_string(),
        prompt: format!("prompt for {id}"),
        kind: QuestionKind::FreeText {
            reference_answer: reference.to_string(),
            similarity_threshold: None,
        },
    }
}

pub fn choice(id: &str, options: &[&str], correct: &str) -> Question {
    Question {
        id: id.to_string(),
        prompt: format!("prompt for {id}"),
        kind: QuestionKind::Choice {
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_option: correct.to_string(),
        },
    }
}

/// Bank of n free-text questions q1..qn, each answered by its own id.
pub fn bank(n: usize) -> Vec<Question> {
    (1..=n)
        .map(|i| free_text(&format!("q{i}"), &format!("answer {i}")))
        .collect()
}

pub fn mounted_session(
    questions: Vec<Question>,
    store: MemoryStore,
    terminator: RecordingTerminator,
) -> ExamSession {
    ExamSession::new(
        "session-under-test",
        Config::default(),
        questions,
        Box::new(store),
        Box::new(terminator),
        t(0),
    )
}

/// Session already moved to the Active phase.
pub fn active_session(
    questions: Vec<Question>,
    store: MemoryStore,
    terminator: RecordingTerminator,
) -> ExamSession {
    let mut session = mounted_session(questions, store, terminator);
    session
        .activate(&mut StubFullscreen { granted: true }, t(0))
        .expect("activation should succeed");
    session
}
