use std::collections::{BTreeMap, HashMap};

use crate::models::{GradeReport, Question, QuestionKind};

use super::similarity;

/// Grades a question set against submitted answers. Pure and total:
/// every question gets exactly one verdict, and identical inputs yield
/// identical output. The once-per-session restriction is enforced by the
/// session controller, not here.
pub struct AnswerGrader {
    default_threshold: f64,
}

impl AnswerGrader {
    pub fn new(default_threshold: f64) -> Self {
        Self { default_threshold }
    }

    pub fn grade(&self, questions: &[Question], answers: &HashMap<String, String>) -> GradeReport {
        let mut verdicts = BTreeMap::new();
        let mut revealed_answers = BTreeMap::new();

        for question in questions {
            let answer = answers.get(&question.id).map(String::as_str).unwrap_or("");
            let correct = self.grade_one(question, answer);
            verdicts.insert(question.id.clone(), correct);

            // The report view shows the expected option for missed choice
            // questions; free-text references stay hidden.
            if !correct {
                if let QuestionKind::Choice { correct_option, .. } = &question.kind {
                    revealed_answers.insert(question.id.clone(), correct_option.clone());
                }
            }
        }

        let correct_count = verdicts.values().filter(|v| **v).count();
        let report = GradeReport {
            correct_count,
            total_count: questions.len(),
            verdicts,
            revealed_answers,
        };

        tracing::info!(
            "Graded {} questions: {} correct",
            report.total_count,
            report.correct_count
        );

        report
    }

    fn grade_one(&self, question: &Question, answer: &str) -> bool {
        // Blank and missing answers are always incorrect.
        if answer.trim().is_empty() {
            return false;
        }

        match &question.kind {
            // Options are presented as discrete buttons; the match is
            // byte-exact, no normalization.
            QuestionKind::Choice { correct_option, .. } => answer == correct_option,
            QuestionKind::FreeText {
                reference_answer,
                similarity_threshold,
            } => {
                let threshold = similarity_threshold.unwrap_or(self.default_threshold);
                let score = similarity::score(answer, reference_answer);
                tracing::debug!(
                    "Free-text grading: question={}, score={:.3}, threshold={:.3}",
                    question.id,
                    score,
                    threshold
                );
                score >= threshold
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(id: &str, options: &[&str], correct: &str) -> Question {
        Question {
            id: id.to_string(),
            prompt: format!("prompt {id}"),
            kind: QuestionKind::Choice {
                options: options.iter().map(|s| s.to_string()).collect(),
                correct_option: correct.to_string(),
            },
        }
    }

    fn free_text(id: &str, reference: &str, threshold: Option<f64>) -> Question {
        Question {
            id: id.to_string(),
            prompt: format!("prompt {id}"),
            kind: QuestionKind::FreeText {
                reference_answer: reference.to_string(),
                similarity_threshold: threshold,
            },
        }
    }

    fn answers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn every_question_gets_exactly_one_verdict() {
        let grader = AnswerGrader::new(0.9);
        let questions = vec![
            choice("q1", &["a", "b"], "a"),
            free_text("q2", "Paris", None),
            free_text("q3", "Berlin", None),
        ];
        let report = grader.grade(&questions, &answers(&[("q1", "a")]));

        assert_eq!(report.verdicts.len(), 3);
        assert_eq!(report.total_count, 3);
        assert_eq!(report.correct_count, 1);
    }

    #[test]
    fn grading_is_idempotent() {
        let grader = AnswerGrader::new(0.9);
        let questions = vec![choice("q1", &["a", "b"], "b"), free_text("q2", "Paris", None)];
        let submitted = answers(&[("q1", "b"), ("q2", "paris")]);

        let first = grader.grade(&questions, &submitted);
        let second = grader.grade(&questions, &submitted);
        assert_eq!(first.verdicts, second.verdicts);
        assert_eq!(first.correct_count, second.correct_count);
    }

    #[test]
    fn choice_match_is_exact() {
        let grader = AnswerGrader::new(0.9);
        let questions = vec![choice("q1", &["a", "b"], "a")];

        let report = grader.grade(&questions, &answers(&[("q1", "a ")]));
        assert_eq!(report.verdicts["q1"], false);

        let report = grader.grade(&questions, &answers(&[("q1", "a")]));
        assert_eq!(report.verdicts["q1"], true);
    }

    #[test]
    fn free_text_accepts_case_variant_at_default_threshold() {
        let grader = AnswerGrader::new(0.9);
        let questions = vec![free_text("q1", "Paris", None)];
        let report = grader.grade(&questions, &answers(&[("q1", "paris")]));
        assert_eq!(report.verdicts["q1"], true);
    }

    #[test]
    fn per_question_threshold_overrides_default() {
        let grader = AnswerGrader::new(0.9);
        // "pariss" vs "Paris" scores 1 - 1/6 ~ 0.833.
        let questions = vec![free_text("q1", "Paris", Some(0.8))];
        let report = grader.grade(&questions, &answers(&[("q1", "pariss")]));
        assert_eq!(report.verdicts["q1"], true);
    }

    #[test]
    fn missing_and_blank_answers_are_incorrect() {
        let grader = AnswerGrader::new(0.9);
        let questions = vec![free_text("q1", "Paris", None), choice("q2", &["a", "b"], "a")];
        let report = grader.grade(&questions, &answers(&[("q1", "   ")]));

        assert_eq!(report.verdicts["q1"], false);
        assert_eq!(report.verdicts["q2"], false);
    }

    #[test]
    fn wrong_choice_answers_reveal_the_correct_option() {
        let grader = AnswerGrader::new(0.9);
        let questions = vec![choice("q1", &["a", "b"], "a"), free_text("q2", "Paris", None)];
        let report = grader.grade(&questions, &answers(&[("q1", "b"), ("q2", "Rome")]));

        assert_eq!(report.revealed_answers.get("q1"), Some(&"a".to_string()));
        assert!(!report.revealed_answers.contains_key("q2"));
    }
}
