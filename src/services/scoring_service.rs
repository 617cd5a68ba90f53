use std::collections::HashMap;

use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::models::question::{QuestionType, QuestionWithOptions};
use crate::models::test_answer::TestAnswer;

/// Why an answer was excluded from scoring instead of graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The question was deleted from the test after the answer was saved.
    QuestionMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
    Skipped(SkipReason),
}

impl Verdict {
    pub fn is_correct(&self) -> bool {
        matches!(self, Verdict::Correct)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Verdict::Skipped(_))
    }
}

/// The authoritative correct-answer data for one question.
#[derive(Debug, Clone)]
pub struct KeyQuestion {
    pub id: Uuid,
    pub text: String,
    pub question_type: QuestionType,
    /// Sorted, so multiple-choice comparison is a plain equality check.
    pub correct_option_ids: Vec<Uuid>,
    pub option_texts: HashMap<Uuid, String>,
    pub correct_text_answer: Option<String>,
}

impl KeyQuestion {
    fn new(entry: &QuestionWithOptions) -> Self {
        let mut correct_option_ids: Vec<Uuid> = entry
            .options
            .iter()
            .filter(|opt| opt.is_correct)
            .map(|opt| opt.id)
            .collect();
        correct_option_ids.sort();

        let option_texts = entry
            .options
            .iter()
            .map(|opt| (opt.id, opt.text.clone()))
            .collect();

        Self {
            id: entry.question.id,
            text: entry.question.text.clone(),
            question_type: entry.question.question_type,
            correct_option_ids,
            option_texts,
            correct_text_answer: entry.question.correct_text_answer.clone(),
        }
    }

    /// One verdict per (question, answer) pair:
    /// - single choice: the selected option is one of the correct ones;
    /// - multiple choice: the selected set equals the correct set exactly,
    ///   order-insensitively, no partial credit;
    /// - text input: case-insensitive equality with surrounding whitespace
    ///   trimmed on both sides.
    pub fn score(&self, answer: &TestAnswer) -> Verdict {
        let correct = match self.question_type {
            QuestionType::SingleChoice => answer
                .selected_option_id
                .map(|id| self.correct_option_ids.contains(&id))
                .unwrap_or(false),
            QuestionType::MultipleChoice => {
                let mut selected = answer.selected_ids().unwrap_or_default();
                selected.sort();
                selected == self.correct_option_ids
            }
            QuestionType::TextInput => match (&self.correct_text_answer, &answer.text_answer) {
                (Some(expected), Some(given)) => {
                    expected.trim().to_lowercase() == given.trim().to_lowercase()
                }
                _ => false,
            },
        };

        if correct {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        }
    }

    pub fn correct_answer_display(&self) -> JsonValue {
        match self.question_type {
            QuestionType::SingleChoice => self
                .correct_option_ids
                .first()
                .map(|id| self.option_text(id))
                .unwrap_or(JsonValue::Null),
            QuestionType::MultipleChoice => JsonValue::Array(
                self.correct_option_ids
                    .iter()
                    .map(|id| self.option_text(id))
                    .collect(),
            ),
            QuestionType::TextInput => self
                .correct_text_answer
                .as_ref()
                .map(|t| json!(t))
                .unwrap_or(JsonValue::Null),
        }
    }

    pub fn user_answer_display(&self, answer: &TestAnswer) -> JsonValue {
        match self.question_type {
            QuestionType::SingleChoice => answer
                .selected_option_id
                .map(|id| self.option_text(&id))
                .unwrap_or(JsonValue::Null),
            QuestionType::MultipleChoice => match answer.selected_ids() {
                Some(ids) => JsonValue::Array(ids.iter().map(|id| self.option_text(id)).collect()),
                None => JsonValue::Null,
            },
            QuestionType::TextInput => answer
                .text_answer
                .as_ref()
                .map(|t| json!(t))
                .unwrap_or(JsonValue::Null),
        }
    }

    fn option_text(&self, id: &Uuid) -> JsonValue {
        self.option_texts
            .get(id)
            .map(|t| json!(t))
            .unwrap_or_else(|| json!(id))
    }
}

/// Answer key for a whole test, resolved once per submission.
#[derive(Debug, Clone)]
pub struct AnswerKey {
    by_id: HashMap<Uuid, KeyQuestion>,
    total_questions: usize,
}

impl AnswerKey {
    pub fn new(questions: &[QuestionWithOptions]) -> Self {
        Self {
            by_id: questions
                .iter()
                .map(|q| (q.question.id, KeyQuestion::new(q)))
                .collect(),
            total_questions: questions.len(),
        }
    }

    /// Denominator for the percentage: every question on the test, answered
    /// or not.
    pub fn total_questions(&self) -> usize {
        self.total_questions
    }

    pub fn question(&self, id: &Uuid) -> Option<&KeyQuestion> {
        self.by_id.get(id)
    }

    pub fn score(&self, answer: &TestAnswer) -> Verdict {
        match self.by_id.get(&answer.question_id) {
            Some(question) => question.score(answer),
            None => Verdict::Skipped(SkipReason::QuestionMissing),
        }
    }
}

/// Raw echo of an answer whose question no longer exists.
pub fn orphan_answer_display(answer: &TestAnswer) -> JsonValue {
    if let Some(id) = answer.selected_option_id {
        return json!(id);
    }
    if let Some(ids) = answer.selected_ids() {
        return json!(ids);
    }
    answer
        .text_answer
        .as_ref()
        .map(|t| json!(t))
        .unwrap_or(JsonValue::Null)
}
