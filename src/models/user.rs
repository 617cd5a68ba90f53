use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub class_number: Option<i32>,
    pub class_letter: Option<String>,
    pub grade_excellent: Option<f64>,
    pub grade_good: Option<f64>,
    pub grade_satisfactory: Option<f64>,
    pub grade_poor: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn grading_criteria(&self) -> Option<GradingCriteria> {
        match (
            self.grade_excellent,
            self.grade_good,
            self.grade_satisfactory,
            self.grade_poor,
        ) {
            (Some(excellent), Some(good), Some(satisfactory), Some(poor)) => {
                Some(GradingCriteria {
                    excellent,
                    good,
                    satisfactory,
                    poor,
                })
            }
            _ => None,
        }
    }
}

/// Per-teacher grade boundaries, percentages. Invariant:
/// 100 >= excellent > good > satisfactory > poor >= 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradingCriteria {
    pub excellent: f64,
    pub good: f64,
    pub satisfactory: f64,
    pub poor: f64,
}

impl GradingCriteria {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.excellent > 100.0 {
            return Err(crate::error::Error::BadRequest(
                "Excellent threshold must not exceed 100".to_string(),
            ));
        }
        if self.poor < 0.0 {
            return Err(crate::error::Error::BadRequest(
                "Poor threshold must not be negative".to_string(),
            ));
        }
        if !(self.excellent > self.good
            && self.good > self.satisfactory
            && self.satisfactory > self.poor)
        {
            return Err(crate::error::Error::BadRequest(
                "Grade thresholds must be strictly decreasing: excellent > good > satisfactory > poor"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
