use chrono::Utc;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::attempt_dto::{
    AnswerBreakdown, AttemptStatusResponse, AttemptWithAnswers, SaveAnswerRequest,
    TestResultsSummary,
};
use crate::error::{Error, Result};
use crate::models::test::ClassSchedule;
use crate::models::test_answer::TestAnswer;
use crate::models::test_attempt::{AttemptStatus, TestAttempt};
use crate::services::grading_service::GradingService;
use crate::services::scoring_service::{orphan_answer_display, AnswerKey, Verdict};
use crate::services::test_service::TestService;
use crate::utils::time;

/// Expired attempts stay open this long past their deadline before the
/// sweeper marks them abandoned, so a client auto-submit racing the clock
/// still finds the row in progress.
const ABANDON_GRACE_SECONDS: i64 = 60;

#[derive(Clone)]
pub struct AttemptService {
    pool: PgPool,
    tests: TestService,
}

impl AttemptService {
    pub fn new(pool: PgPool) -> Self {
        let tests = TestService::new(pool.clone());
        Self { pool, tests }
    }

    pub async fn create_attempt(&self, test_id: Uuid, student_id: Uuid) -> Result<TestAttempt> {
        let test = self.tests.get_test_by_id(test_id).await?;

        let active: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM test_attempts
            WHERE user_id = $1 AND test_id = $2 AND status = 'in_progress'
            "#,
        )
        .bind(student_id)
        .bind(test_id)
        .fetch_one(&self.pool)
        .await?;

        if active > 0 {
            return Err(Error::Conflict(
                "An attempt for this test is already in progress".to_string(),
            ));
        }

        let student = self.tests.get_user_by_id(student_id).await?;

        let completed: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM test_attempts
            WHERE user_id = $1 AND test_id = $2 AND status = 'completed'
            "#,
        )
        .bind(student_id)
        .bind(test_id)
        .fetch_one(&self.pool)
        .await?;

        if let Some(remaining) = remaining_attempts(
            &test.schedules(),
            student.class_number,
            student.class_letter.as_deref(),
            completed,
        ) {
            if remaining == 0 {
                return Err(Error::Conflict(
                    "The attempt limit for this test has been reached".to_string(),
                ));
            }
        }

        let attempt = sqlx::query_as::<_, TestAttempt>(
            r#"
            INSERT INTO test_attempts (user_id, test_id, started_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(student_id)
        .bind(test_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            "Attempt {} started: test={} student={}",
            attempt.id,
            test_id,
            student_id
        );

        Ok(attempt)
    }

    pub async fn get_attempt(
        &self,
        test_id: Uuid,
        attempt_id: Uuid,
        caller: Uuid,
    ) -> Result<AttemptWithAnswers> {
        let attempt = self.load_attempt(test_id, attempt_id).await?;
        ensure_owner(&attempt, caller)?;
        let answers = self.load_answers(attempt_id).await?;
        Ok(AttemptWithAnswers { attempt, answers })
    }

    pub async fn save_answer(
        &self,
        test_id: Uuid,
        attempt_id: Uuid,
        caller: Uuid,
        req: SaveAnswerRequest,
    ) -> Result<TestAnswer> {
        let attempt = self.load_attempt(test_id, attempt_id).await?;
        ensure_owner(&attempt, caller)?;

        if attempt.status.is_terminal() {
            return Err(Error::Conflict(
                "The attempt is no longer in progress".to_string(),
            ));
        }

        let test = self.tests.get_test_by_id(test_id).await?;
        if time::is_expired(attempt.started_at, test.time_limit_minutes, Utc::now()) {
            return Err(Error::Forbidden("The attempt time has expired".to_string()));
        }

        let encoded_ids = req
            .selected_option_ids
            .as_deref()
            .map(TestAnswer::encode_selected_ids);

        let answer = sqlx::query_as::<_, TestAnswer>(
            r#"
            INSERT INTO test_answers (attempt_id, question_id, selected_option_id, selected_option_ids, text_answer)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (attempt_id, question_id)
            DO UPDATE SET
                selected_option_id = EXCLUDED.selected_option_id,
                selected_option_ids = EXCLUDED.selected_option_ids,
                text_answer = EXCLUDED.text_answer,
                is_correct = NULL,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(attempt_id)
        .bind(req.question_id)
        .bind(req.selected_option_id)
        .bind(encoded_ids)
        .bind(req.text_answer)
        .fetch_one(&self.pool)
        .await?;

        Ok(answer)
    }

    pub async fn submit(
        &self,
        test_id: Uuid,
        attempt_id: Uuid,
        caller: Uuid,
    ) -> Result<TestResultsSummary> {
        let attempt = self.load_attempt(test_id, attempt_id).await?;
        ensure_owner(&attempt, caller)?;

        match attempt.status {
            AttemptStatus::Completed => {
                return Err(Error::Conflict(
                    "The attempt has already been submitted".to_string(),
                ))
            }
            AttemptStatus::Abandoned => {
                return Err(Error::Conflict("The attempt was abandoned".to_string()))
            }
            AttemptStatus::InProgress => {}
        }

        let test = self.tests.get_test_by_id(test_id).await?;
        if time::is_expired(attempt.started_at, test.time_limit_minutes, Utc::now()) {
            return Err(Error::Forbidden("The attempt time has expired".to_string()));
        }

        let questions = self.tests.get_questions_with_options(test_id).await?;
        let answers = self.load_answers(attempt_id).await?;

        let key = AnswerKey::new(&questions);
        let verdicts: Vec<(TestAnswer, Verdict)> = answers
            .into_iter()
            .map(|answer| {
                let verdict = key.score(&answer);
                (answer, verdict)
            })
            .collect();

        let correct_answers = verdicts.iter().filter(|(_, v)| v.is_correct()).count() as i32;
        let total_questions = key.total_questions() as i32;
        let percentage = if total_questions == 0 {
            0.0
        } else {
            round2(correct_answers as f64 / total_questions as f64 * 100.0)
        };

        let now = Utc::now();
        let score = Decimal::from_f64(percentage)
            .unwrap_or_else(|| Decimal::new(0, 0))
            .round_dp(2);

        // Compare-and-swap on status: exactly one concurrent submit wins, and
        // a second submit of a finished attempt is a 409, not a re-score.
        let updated = sqlx::query_as::<_, TestAttempt>(
            r#"
            UPDATE test_attempts
            SET status = 'completed', completed_at = $2, score = $3,
                correct_answers = $4, total_questions = $5, updated_at = $2
            WHERE id = $1 AND status = 'in_progress'
            RETURNING *
            "#,
        )
        .bind(attempt_id)
        .bind(now)
        .bind(score)
        .bind(correct_answers)
        .bind(total_questions)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::Conflict("The attempt has already been submitted".to_string()))?;

        for (answer, verdict) in &verdicts {
            if verdict.is_skipped() {
                continue;
            }
            sqlx::query(
                r#"UPDATE test_answers SET is_correct = $2, updated_at = NOW() WHERE id = $1"#,
            )
            .bind(answer.id)
            .bind(verdict.is_correct())
            .execute(&self.pool)
            .await?;
        }

        tracing::info!(
            "Attempt {} submitted: {}/{} correct, {}%",
            attempt_id,
            correct_answers,
            total_questions,
            percentage
        );

        let criteria = self.tests.get_grading_criteria(test.created_by).await?;
        let grade = GradingService::percentage_to_grade(percentage, criteria.as_ref());

        let breakdown = verdicts
            .iter()
            .map(|(answer, verdict)| {
                breakdown_entry(&key, answer, verdict.is_correct(), verdict.is_skipped())
            })
            .collect();

        Ok(TestResultsSummary {
            attempt_id: updated.id,
            test_id,
            score: correct_answers,
            correct_answers,
            total_questions,
            percentage,
            grade: grade.value,
            grade_label: grade.label.to_string(),
            time_spent_seconds: (now - updated.started_at).num_seconds(),
            answers: breakdown,
        })
    }

    /// Read path: replays the already-persisted verdicts, never re-scores.
    pub async fn get_results(
        &self,
        test_id: Uuid,
        attempt_id: Uuid,
        caller: Uuid,
    ) -> Result<TestResultsSummary> {
        let attempt = self.load_attempt(test_id, attempt_id).await?;
        ensure_owner(&attempt, caller)?;

        if attempt.status != AttemptStatus::Completed {
            return Err(Error::NotFound(
                "The attempt has not been submitted".to_string(),
            ));
        }
        let completed_at = attempt.completed_at.ok_or_else(|| {
            Error::NotFound("The attempt has not been submitted".to_string())
        })?;

        let test = self.tests.get_test_by_id(test_id).await?;
        let questions = self.tests.get_questions_with_options(test_id).await?;
        let answers = self.load_answers(attempt_id).await?;

        let key = AnswerKey::new(&questions);
        let breakdown = answers
            .iter()
            .map(|answer| {
                breakdown_entry(
                    &key,
                    answer,
                    answer.is_correct.unwrap_or(false),
                    answer.is_correct.is_none(),
                )
            })
            .collect();

        let percentage = attempt
            .score
            .as_ref()
            .and_then(|d| d.to_f64())
            .unwrap_or(0.0);
        let criteria = self.tests.get_grading_criteria(test.created_by).await?;
        let grade = GradingService::percentage_to_grade(percentage, criteria.as_ref());

        Ok(TestResultsSummary {
            attempt_id: attempt.id,
            test_id,
            score: attempt.correct_answers.unwrap_or(0),
            correct_answers: attempt.correct_answers.unwrap_or(0),
            total_questions: attempt.total_questions.unwrap_or(0),
            percentage,
            grade: grade.value,
            grade_label: grade.label.to_string(),
            time_spent_seconds: (completed_at - attempt.started_at).num_seconds(),
            answers: breakdown,
        })
    }

    pub async fn get_status(
        &self,
        test_id: Uuid,
        attempt_id: Uuid,
        caller: Uuid,
    ) -> Result<AttemptStatusResponse> {
        let attempt = self.load_attempt(test_id, attempt_id).await?;
        ensure_owner(&attempt, caller)?;

        let test = self.tests.get_test_by_id(test_id).await?;

        let answered: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM test_answers WHERE attempt_id = $1"#)
                .bind(attempt_id)
                .fetch_one(&self.pool)
                .await?;
        let total: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM questions WHERE test_id = $1"#)
            .bind(test_id)
            .fetch_one(&self.pool)
            .await?;

        let time_remaining_seconds = match attempt.status {
            AttemptStatus::InProgress => Some(time::remaining_seconds(
                attempt.started_at,
                test.time_limit_minutes,
                Utc::now(),
            )),
            _ => None,
        };

        Ok(AttemptStatusResponse {
            status: attempt.status,
            started_at: attempt.started_at,
            time_remaining_seconds,
            questions_answered: answered as i32,
            total_questions: total as i32,
        })
    }

    /// Sweeper body: flips in-progress attempts whose deadline lapsed past the
    /// grace window into the abandoned terminal state. Scores stay NULL.
    pub async fn abandon_expired(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE test_attempts ta
            SET status = 'abandoned',
                completed_at = ta.started_at + make_interval(mins => t.time_limit_minutes),
                updated_at = NOW()
            FROM tests t
            WHERE ta.test_id = t.id
              AND ta.status = 'in_progress'
              AND ta.started_at + make_interval(mins => t.time_limit_minutes)
                  < NOW() - make_interval(secs => $1)
            "#,
        )
        .bind(ABANDON_GRACE_SECONDS as f64)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn load_attempt(&self, test_id: Uuid, attempt_id: Uuid) -> Result<TestAttempt> {
        sqlx::query_as::<_, TestAttempt>(
            r#"SELECT * FROM test_attempts WHERE id = $1 AND test_id = $2"#,
        )
        .bind(attempt_id)
        .bind(test_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Attempt not found".to_string()))
    }

    async fn load_answers(&self, attempt_id: Uuid) -> Result<Vec<TestAnswer>> {
        let answers = sqlx::query_as::<_, TestAnswer>(
            r#"SELECT * FROM test_answers WHERE attempt_id = $1 ORDER BY created_at, id"#,
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(answers)
    }
}

fn ensure_owner(attempt: &TestAttempt, caller: Uuid) -> Result<()> {
    if attempt.user_id != caller {
        return Err(Error::Forbidden(
            "Only the attempt owner may access it".to_string(),
        ));
    }
    Ok(())
}

fn breakdown_entry(
    key: &AnswerKey,
    answer: &TestAnswer,
    is_correct: bool,
    skipped: bool,
) -> AnswerBreakdown {
    match key.question(&answer.question_id) {
        Some(question) => AnswerBreakdown {
            question_id: answer.question_id,
            question_text: question.text.clone(),
            question_type: Some(question.question_type),
            is_correct,
            skipped,
            user_answer: question.user_answer_display(answer),
            correct_answer: question.correct_answer_display(),
        },
        None => AnswerBreakdown {
            question_id: answer.question_id,
            question_text: String::new(),
            question_type: None,
            is_correct: false,
            skipped: true,
            user_answer: orphan_answer_display(answer),
            correct_answer: serde_json::Value::Null,
        },
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Attempt-quota policy. `None` means the student's class has no schedule
/// entry on this test, which leaves the attempt count unrestricted.
pub fn remaining_attempts(
    schedules: &[ClassSchedule],
    class_number: Option<i32>,
    class_letter: Option<&str>,
    completed_attempts: i64,
) -> Option<i64> {
    let (number, letter) = match (class_number, class_letter) {
        (Some(n), Some(l)) => (n, l),
        _ => return None,
    };

    let schedule = schedules.iter().find(|s| s.matches(number, letter))?;
    let max_attempts = i64::from(schedule.max_attempts.unwrap_or(1));
    Some((max_attempts - completed_attempts).max(0))
}
