use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::BankError;

pub mod integrity;

/// A question as the grading engine sees it, converted from a validated
/// [`QuestionRecord`]. Immutable once loaded; the question bank is the
/// source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub kind: QuestionKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionKind {
    Choice {
        options: Vec<String>,
        correct_option: String,
    },
    FreeText {
        reference_answer: String,
        /// Overrides the configured default (0.9) when set. Range (0, 1].
        similarity_threshold: Option<f64>,
    },
}

impl Question {
    pub fn is_choice(&self) -> bool {
        matches!(self.kind, QuestionKind::Choice { .. })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKindTag {
    Choice,
    FreeText,
}

/// Wire-format question record as delivered by the question bank.
/// Validated before conversion into the domain [`Question`].
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = validate_kind_fields))]
pub struct QuestionRecord {
    #[validate(length(min = 1, message = "Question id must not be empty"))]
    pub id: String,
    pub kind: QuestionKindTag,
    #[validate(length(min = 1, message = "Prompt must not be empty"))]
    pub prompt: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub correct_option: Option<String>,
    #[serde(default)]
    pub reference_answer: Option<String>,
    #[serde(default)]
    #[validate(range(
        exclusive_min = 0.0,
        max = 1.0,
        message = "Similarity threshold must be in (0, 1]"
    ))]
    pub similarity_threshold: Option<f64>,
}

fn validate_kind_fields(record: &QuestionRecord) -> Result<(), ValidationError> {
    match record.kind {
        QuestionKindTag::Choice => {
            let options = record
                .options
                .as_ref()
                .ok_or_else(|| ValidationError::new("choice_options_missing"))?;
            if options.len() < 2 {
                return Err(ValidationError::new("choice_needs_two_options"));
            }
            let correct = record
                .correct_option
                .as_ref()
                .ok_or_else(|| ValidationError::new("choice_correct_option_missing"))?;
            if !options.contains(correct) {
                return Err(ValidationError::new("choice_correct_option_not_listed"));
            }
        }
        QuestionKindTag::FreeText => {
            let reference = record
                .reference_answer
                .as_ref()
                .ok_or_else(|| ValidationError::new("free_text_reference_missing"))?;
            if reference.trim().is_empty() {
                return Err(ValidationError::new("free_text_reference_blank"));
            }
        }
    }
    Ok(())
}

impl TryFrom<QuestionRecord> for Question {
    type Error = BankError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        record.validate().map_err(|errors| BankError::Invalid {
            id: record.id.clone(),
            errors,
        })?;

        let kind = match record.kind {
            // Presence is guaranteed by validation above.
            QuestionKindTag::Choice => QuestionKind::Choice {
                options: record.options.unwrap_or_default(),
                correct_option: record.correct_option.unwrap_or_default(),
            },
            QuestionKindTag::FreeText => QuestionKind::FreeText {
                reference_answer: record.reference_answer.unwrap_or_default(),
                similarity_threshold: record.similarity_threshold,
            },
        };

        Ok(Question {
            id: record.id,
            prompt: record.prompt,
            kind,
        })
    }
}

/// Parse and validate a JSON question bank into domain questions.
/// Ids must be unique; they key answers and verdicts for the whole session.
pub fn parse_bank(json: &str) -> Result<Vec<Question>, BankError> {
    let records: Vec<QuestionRecord> = serde_json::from_str(json)?;

    let mut questions = Vec::with_capacity(records.len());
    for record in records {
        let question = Question::try_from(record)?;
        if questions.iter().any(|q: &Question| q.id == question.id) {
            return Err(BankError::DuplicateId(question.id));
        }
        questions.push(question);
    }
    Ok(questions)
}

/// One correctness verdict per question id. Produced exactly once per
/// submission and never mutated afterward.
pub type VerdictSet = BTreeMap<String, bool>;

/// Grading outcome handed to the external report view.
#[derive(Debug, Clone, Serialize)]
pub struct GradeReport {
    pub correct_count: usize,
    pub total_count: usize,
    pub verdicts: VerdictSet,
    /// Correct option revealed for each incorrectly answered choice question.
    pub revealed_answers: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bank_accepts_valid_records() {
        let json = r#"[
            {"id": "q1", "kind": "choice", "prompt": "Pick one",
             "options": ["a", "b"], "correct_option": "b"},
            {"id": "q2", "kind": "free_text", "prompt": "Capital of France?",
             "reference_answer": "Paris"}
        ]"#;

        let questions = parse_bank(json).unwrap();
        assert_eq!(questions.len(), 2);
        assert!(questions[0].is_choice());
        assert!(!questions[1].is_choice());
    }

    #[test]
    fn parse_bank_rejects_duplicate_ids() {
        let json = r#"[
            {"id": "q1", "kind": "free_text", "prompt": "A?", "reference_answer": "a"},
            {"id": "q1", "kind": "free_text", "prompt": "B?", "reference_answer": "b"}
        ]"#;

        assert!(matches!(parse_bank(json), Err(BankError::DuplicateId(id)) if id == "q1"));
    }

    #[test]
    fn choice_record_requires_listed_correct_option() {
        let json = r#"[
            {"id": "q1", "kind": "choice", "prompt": "Pick one",
             "options": ["a", "b"], "correct_option": "c"}
        ]"#;

        assert!(matches!(parse_bank(json), Err(BankError::Invalid { .. })));
    }

    #[test]
    fn similarity_threshold_must_stay_in_range() {
        let json = r#"[
            {"id": "q1", "kind": "free_text", "prompt": "A?",
             "reference_answer": "a", "similarity_threshold": 1.5}
        ]"#;

        assert!(matches!(parse_bank(json), Err(BankError::Invalid { .. })));
    }

    #[test]
    fn zero_similarity_threshold_is_rejected() {
        let json = r#"[
            {"id": "q1", "kind": "free_text", "prompt": "A?",
             "reference_answer": "a", "similarity_threshold": 0.0}
        ]"#;

        assert!(matches!(parse_bank(json), Err(BankError::Invalid { .. })));
    }
}
