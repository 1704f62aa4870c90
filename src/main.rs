use chrono::{Duration, Utc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use examguard::detectors::{ClipboardGuard, ClipboardInput, VisibilityGuard};
use examguard::{parse_bank, Config, ExamSession, FullscreenProvider, MemoryStore, SessionTerminator};

const SAMPLE_BANK: &str = r#"[
    {"id": "capital", "kind": "free_text", "prompt": "What is the capital of France?",
     "reference_answer": "Paris"},
    {"id": "largest-planet", "kind": "choice", "prompt": "Largest planet in the solar system?",
     "options": ["Earth", "Jupiter", "Saturn"], "correct_option": "Jupiter"},
    {"id": "ownership", "kind": "free_text", "prompt": "Which keyword moves ownership in Rust?",
     "reference_answer": "move", "similarity_threshold": 0.75}
]"#;

struct AlwaysFullscreen;

impl FullscreenProvider for AlwaysFullscreen {
    fn is_fullscreen(&self) -> bool {
        true
    }

    fn enter(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

struct RedirectTerminator;

impl SessionTerminator for RedirectTerminator {
    fn terminate(&mut self, destination: &str) {
        tracing::warn!("Session terminated, redirecting to {}", destination);
    }
}

/// Replays a short scripted exam session against the monitor so the
/// warning and grading flow can be observed from the log output.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "examguard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting examguard demo session");

    let config = Config::load()?;
    let bank = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE_BANK.to_string(),
    };
    let questions = parse_bank(&bank)?;

    let now = Utc::now();
    let session_id = Uuid::new_v4().to_string();
    let mut session = ExamSession::new(
        session_id,
        config,
        questions,
        Box::new(MemoryStore::new()),
        Box::new(RedirectTerminator),
        now,
    );

    session.activate(&mut AlwaysFullscreen, now)?;
    tracing::info!("Question order: {:?}", session.question_order());

    // Two blocked paste attempts while answering.
    let clipboard = ClipboardGuard::new();
    for offset in [1, 2] {
        let action = clipboard.intercept(ClipboardInput::Paste, now + Duration::seconds(offset));
        if let Some(event) = action.event {
            session.handle_signal(event);
        }
    }

    // One tab switch.
    let mut visibility = VisibilityGuard::new();
    if let Some(event) = visibility.observe(true, now + Duration::seconds(3)) {
        session.handle_signal(event);
    }
    let _ = visibility.observe(false, now + Duration::seconds(4));

    tracing::info!(
        "Score {} with warnings {:?}",
        session.score(),
        session.active_warnings(now + Duration::seconds(4))
    );

    session.set_answer("capital", "paris")?;
    session.set_answer("largest-planet", "Jupiter")?;
    session.set_answer("ownership", "move")?;

    let report = session.submit(now + Duration::seconds(10))?;
    tracing::info!(
        "Result: {}/{} correct, verdicts {:?}",
        report.correct_count,
        report.total_count,
        report.verdicts
    );

    Ok(())
}
