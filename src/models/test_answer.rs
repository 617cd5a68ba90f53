use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One answer per (attempt, question); overwritten in place on re-save.
/// `selected_option_ids` is stored as JSON text so an explicitly empty
/// selection stays distinct from no selection at all.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestAnswer {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub question_id: Uuid,
    pub selected_option_id: Option<Uuid>,
    pub selected_option_ids: Option<String>,
    pub text_answer: Option<String>,
    pub is_correct: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TestAnswer {
    pub fn selected_ids(&self) -> Option<Vec<Uuid>> {
        self.selected_option_ids
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }

    pub fn encode_selected_ids(ids: &[Uuid]) -> String {
        serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string())
    }
}
