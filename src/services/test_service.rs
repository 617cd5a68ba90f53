use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::question::{Question, QuestionOption, QuestionWithOptions};
use crate::models::test::Test;
use crate::models::user::{GradingCriteria, User};

#[derive(Clone)]
pub struct TestService {
    pool: PgPool,
}

impl TestService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_test_by_id(&self, test_id: Uuid) -> Result<Test> {
        sqlx::query_as::<_, Test>(r#"SELECT * FROM tests WHERE id = $1"#)
            .bind(test_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Test not found".to_string()))
    }

    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    /// Loads a test's questions with their options attached, ordered the way
    /// they are presented to students.
    pub async fn get_questions_with_options(
        &self,
        test_id: Uuid,
    ) -> Result<Vec<QuestionWithOptions>> {
        let questions = sqlx::query_as::<_, Question>(
            r#"SELECT * FROM questions WHERE test_id = $1 ORDER BY position, id"#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;

        let options = sqlx::query_as::<_, QuestionOption>(
            r#"
            SELECT o.* FROM question_options o
            JOIN questions q ON q.id = o.question_id
            WHERE q.test_id = $1
            ORDER BY o.position, o.id
            "#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_question: HashMap<Uuid, Vec<QuestionOption>> = HashMap::new();
        for option in options {
            by_question.entry(option.question_id).or_default().push(option);
        }

        Ok(questions
            .into_iter()
            .map(|question| {
                let options = by_question.remove(&question.id).unwrap_or_default();
                QuestionWithOptions { question, options }
            })
            .collect())
    }

    /// The test creator's grade boundaries, when they have configured a full,
    /// valid set. Anything else falls back to the defaults.
    pub async fn get_grading_criteria(&self, teacher_id: Uuid) -> Result<Option<GradingCriteria>> {
        let user = match self.get_user_by_id(teacher_id).await {
            Ok(user) => user,
            Err(Error::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let Some(criteria) = user.grading_criteria() else {
            return Ok(None);
        };

        if let Err(e) = criteria.validate() {
            tracing::warn!(
                "Ignoring malformed grading criteria for teacher {}: {}",
                teacher_id,
                e
            );
            return Ok(None);
        }

        Ok(Some(criteria))
    }
}
