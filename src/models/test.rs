use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TestStatus {
    Draft,
    Active,
    Completed,
    Archived,
}

/// Authored by teachers through the (separate) authoring service; the attempt
/// core only ever reads these rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Test {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub time_limit_minutes: i32,
    pub due_date: Option<DateTime<Utc>>,
    pub status: TestStatus,
    pub created_by: Uuid,
    pub class_schedules: JsonValue,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSchedule {
    pub class_number: i32,
    pub class_letter: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_attempts: Option<i32>,
}

impl ClassSchedule {
    /// Letter comparison is case-insensitive; class letters are commonly
    /// Cyrillic, so full Unicode folding rather than ASCII.
    pub fn matches(&self, class_number: i32, class_letter: &str) -> bool {
        self.class_number == class_number
            && self.class_letter.to_lowercase() == class_letter.to_lowercase()
    }
}

impl Test {
    pub fn schedules(&self) -> Vec<ClassSchedule> {
        serde_json::from_value(self.class_schedules.clone()).unwrap_or_default()
    }
}
