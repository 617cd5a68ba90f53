use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::question::QuestionType;
use crate::models::test_answer::TestAnswer;
use crate::models::test_attempt::{AttemptStatus, TestAttempt};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_answer_payload"))]
pub struct SaveAnswerRequest {
    pub question_id: Uuid,
    pub selected_option_id: Option<Uuid>,
    pub selected_option_ids: Option<Vec<Uuid>>,
    pub text_answer: Option<String>,
}

fn validate_answer_payload(req: &SaveAnswerRequest) -> Result<(), ValidationError> {
    if req.selected_option_id.is_none()
        && req.selected_option_ids.is_none()
        && req.text_answer.is_none()
    {
        return Err(ValidationError::new("empty_answer"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptWithAnswers {
    pub attempt: TestAttempt,
    pub answers: Vec<TestAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerBreakdown {
    pub question_id: Uuid,
    pub question_text: String,
    pub question_type: Option<QuestionType>,
    pub is_correct: bool,
    pub skipped: bool,
    pub user_answer: JsonValue,
    pub correct_answer: JsonValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResultsSummary {
    pub attempt_id: Uuid,
    pub test_id: Uuid,
    pub score: i32,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub percentage: f64,
    pub grade: u8,
    pub grade_label: String,
    pub time_spent_seconds: i64,
    pub answers: Vec<AnswerBreakdown>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptStatusResponse {
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    pub time_remaining_seconds: Option<i64>,
    pub questions_answered: i32,
    pub total_questions: i32,
}
