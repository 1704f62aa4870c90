use thiserror::Error;

/// Contract violations surfaced by the session controller. Recoverable
/// ones (incomplete submission, denied fullscreen) leave the session
/// state unchanged.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is not accepting input in the {0} phase")]
    NotActive(&'static str),
    #[error("unknown question id: {0}")]
    UnknownQuestion(String),
    #[error("submission incomplete: {} question(s) unanswered", .missing.len())]
    Incomplete { missing: Vec<String> },
    #[error("fullscreen request denied: {0}")]
    FullscreenDenied(String),
}

/// Question-bank loading failures.
#[derive(Debug, Error)]
pub enum BankError {
    #[error("invalid question bank JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("question {id} failed validation: {errors}")]
    Invalid {
        id: String,
        errors: validator::ValidationErrors,
    },
    #[error("duplicate question id: {0}")]
    DuplicateId(String),
}
