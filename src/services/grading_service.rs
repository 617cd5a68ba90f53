use serde::Serialize;

use crate::models::user::GradingCriteria;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Grade {
    pub value: u8,
    pub label: &'static str,
}

pub struct GradingService;

impl GradingService {
    /// Map a percentage onto the 2..5 grade scale. Falls back to the fixed
    /// school-wide boundaries when the teacher has not configured their own.
    pub fn percentage_to_grade(percentage: f64, criteria: Option<&GradingCriteria>) -> Grade {
        let value = match criteria {
            Some(c) => {
                if percentage >= c.excellent {
                    5
                } else if percentage >= c.good {
                    4
                } else if percentage >= c.satisfactory {
                    3
                } else {
                    2
                }
            }
            None => {
                if percentage >= 85.0 {
                    5
                } else if percentage >= 70.0 {
                    4
                } else if percentage >= 50.0 {
                    3
                } else {
                    2
                }
            }
        };

        Self::grade(value)
    }

    fn grade(value: u8) -> Grade {
        let label = match value {
            5 => "Отлично",
            4 => "Хорошо",
            3 => "Удовлетворительно",
            _ => "Неудовлетворительно",
        };
        Grade { value, label }
    }
}
