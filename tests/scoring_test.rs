use chrono::{Duration, Utc};
use uuid::Uuid;

use schooltest_backend::models::question::{
    Question, QuestionOption, QuestionType, QuestionWithOptions,
};
use schooltest_backend::models::test::ClassSchedule;
use schooltest_backend::models::test_answer::TestAnswer;
use schooltest_backend::services::attempt_service::remaining_attempts;
use schooltest_backend::services::scoring_service::{AnswerKey, SkipReason, Verdict};
use schooltest_backend::utils::time;

fn question(question_type: QuestionType) -> QuestionWithOptions {
    QuestionWithOptions {
        question: Question {
            id: Uuid::new_v4(),
            test_id: Uuid::new_v4(),
            text: "What is the capital of France?".to_string(),
            question_type,
            position: 0,
            correct_text_answer: None,
        },
        options: Vec::new(),
    }
}

fn option(question_id: Uuid, is_correct: bool) -> QuestionOption {
    QuestionOption {
        id: Uuid::new_v4(),
        question_id,
        text: format!("option-{}", if is_correct { "right" } else { "wrong" }),
        is_correct,
        position: 0,
    }
}

fn answer(question_id: Uuid) -> TestAnswer {
    TestAnswer {
        id: Uuid::new_v4(),
        attempt_id: Uuid::new_v4(),
        question_id,
        selected_option_id: None,
        selected_option_ids: None,
        text_answer: None,
        is_correct: None,
        created_at: None,
        updated_at: None,
    }
}

#[test]
fn single_choice_correct_option_is_correct() {
    let mut q = question(QuestionType::SingleChoice);
    let right = option(q.question.id, true);
    let wrong = option(q.question.id, false);
    let right_id = right.id;
    q.options = vec![wrong, right];

    let key = AnswerKey::new(std::slice::from_ref(&q));

    let mut a = answer(q.question.id);
    a.selected_option_id = Some(right_id);
    assert_eq!(key.score(&a), Verdict::Correct);
}

#[test]
fn single_choice_other_selection_is_incorrect() {
    let mut q = question(QuestionType::SingleChoice);
    let right = option(q.question.id, true);
    let wrong = option(q.question.id, false);
    let wrong_id = wrong.id;
    q.options = vec![wrong, right];

    let key = AnswerKey::new(std::slice::from_ref(&q));

    let mut a = answer(q.question.id);
    a.selected_option_id = Some(wrong_id);
    assert_eq!(key.score(&a), Verdict::Incorrect);

    // No selection at all is just as wrong.
    let empty = answer(q.question.id);
    assert_eq!(key.score(&empty), Verdict::Incorrect);
}

#[test]
fn multiple_choice_requires_exact_set_in_any_order() {
    let mut q = question(QuestionType::MultipleChoice);
    let a1 = option(q.question.id, true);
    let a2 = option(q.question.id, true);
    let a3 = option(q.question.id, false);
    let (id1, id2, id3) = (a1.id, a2.id, a3.id);
    q.options = vec![a1, a2, a3];

    let key = AnswerKey::new(std::slice::from_ref(&q));

    let mut exact = answer(q.question.id);
    exact.selected_option_ids = Some(TestAnswer::encode_selected_ids(&[id2, id1]));
    assert_eq!(key.score(&exact), Verdict::Correct);

    let mut subset = answer(q.question.id);
    subset.selected_option_ids = Some(TestAnswer::encode_selected_ids(&[id1]));
    assert_eq!(key.score(&subset), Verdict::Incorrect);

    let mut superset = answer(q.question.id);
    superset.selected_option_ids = Some(TestAnswer::encode_selected_ids(&[id1, id2, id3]));
    assert_eq!(key.score(&superset), Verdict::Incorrect);

    let mut disjoint = answer(q.question.id);
    disjoint.selected_option_ids = Some(TestAnswer::encode_selected_ids(&[id3]));
    assert_eq!(key.score(&disjoint), Verdict::Incorrect);
}

#[test]
fn text_input_matches_case_insensitively() {
    let mut q = question(QuestionType::TextInput);
    q.question.correct_text_answer = Some("paris".to_string());

    let key = AnswerKey::new(std::slice::from_ref(&q));

    let mut a = answer(q.question.id);
    a.text_answer = Some("Paris".to_string());
    assert_eq!(key.score(&a), Verdict::Correct);

    let mut wrong = answer(q.question.id);
    wrong.text_answer = Some("London".to_string());
    assert_eq!(key.score(&wrong), Verdict::Incorrect);
}

#[test]
fn text_input_tolerates_surrounding_whitespace() {
    let mut q = question(QuestionType::TextInput);
    q.question.correct_text_answer = Some("Paris".to_string());

    let key = AnswerKey::new(std::slice::from_ref(&q));

    let mut a = answer(q.question.id);
    a.text_answer = Some("Paris ".to_string());
    assert_eq!(key.score(&a), Verdict::Correct);
}

#[test]
fn missing_text_answer_is_incorrect() {
    let mut q = question(QuestionType::TextInput);
    q.question.correct_text_answer = Some("Paris".to_string());

    let key = AnswerKey::new(std::slice::from_ref(&q));
    assert_eq!(key.score(&answer(q.question.id)), Verdict::Incorrect);
}

#[test]
fn answer_to_deleted_question_is_skipped() {
    let q = question(QuestionType::SingleChoice);
    let key = AnswerKey::new(std::slice::from_ref(&q));

    let orphan = answer(Uuid::new_v4());
    assert_eq!(
        key.score(&orphan),
        Verdict::Skipped(SkipReason::QuestionMissing)
    );
}

#[test]
fn total_questions_counts_every_question_on_the_test() {
    let questions = vec![
        question(QuestionType::SingleChoice),
        question(QuestionType::MultipleChoice),
        question(QuestionType::TextInput),
    ];
    let key = AnswerKey::new(&questions);
    assert_eq!(key.total_questions(), 3);
}

#[test]
fn selected_ids_round_trip_keeps_empty_distinct_from_absent() {
    let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
    let mut a = answer(Uuid::new_v4());

    a.selected_option_ids = Some(TestAnswer::encode_selected_ids(&ids));
    assert_eq!(a.selected_ids(), Some(ids));

    a.selected_option_ids = Some(TestAnswer::encode_selected_ids(&[]));
    assert_eq!(a.selected_ids(), Some(Vec::new()));

    a.selected_option_ids = None;
    assert_eq!(a.selected_ids(), None);
}

fn schedule(class_number: i32, class_letter: &str, max_attempts: Option<i32>) -> ClassSchedule {
    ClassSchedule {
        class_number,
        class_letter: class_letter.to_string(),
        due_date: None,
        max_attempts,
    }
}

#[test]
fn quota_counts_down_completed_attempts() {
    let schedules = vec![schedule(9, "А", Some(2))];

    assert_eq!(remaining_attempts(&schedules, Some(9), Some("А"), 0), Some(2));
    assert_eq!(remaining_attempts(&schedules, Some(9), Some("А"), 1), Some(1));
    assert_eq!(remaining_attempts(&schedules, Some(9), Some("А"), 2), Some(0));
    // Never negative, even if more attempts somehow slipped through.
    assert_eq!(remaining_attempts(&schedules, Some(9), Some("А"), 3), Some(0));
}

#[test]
fn quota_matches_class_letter_case_insensitively() {
    let schedules = vec![schedule(9, "А", Some(2))];
    assert_eq!(remaining_attempts(&schedules, Some(9), Some("а"), 1), Some(1));
}

#[test]
fn quota_defaults_to_one_attempt() {
    let schedules = vec![schedule(9, "А", None)];
    assert_eq!(remaining_attempts(&schedules, Some(9), Some("А"), 0), Some(1));
    assert_eq!(remaining_attempts(&schedules, Some(9), Some("А"), 1), Some(0));
}

#[test]
fn quota_is_unrestricted_without_a_matching_schedule() {
    let schedules = vec![schedule(9, "А", Some(2))];
    assert_eq!(remaining_attempts(&schedules, Some(10), Some("А"), 0), None);
    assert_eq!(remaining_attempts(&schedules, Some(9), Some("Б"), 0), None);
    assert_eq!(remaining_attempts(&schedules, None, None, 0), None);
    assert_eq!(remaining_attempts(&[], Some(9), Some("А"), 0), None);
}

#[test]
fn remaining_seconds_ticks_down_and_clamps_at_zero() {
    let started = Utc::now();

    assert_eq!(
        time::remaining_seconds(started, 30, started + Duration::minutes(10)),
        20 * 60
    );
    assert_eq!(
        time::remaining_seconds(started, 30, started + Duration::minutes(45)),
        0
    );
}

#[test]
fn expiry_starts_exactly_at_the_deadline() {
    let started = Utc::now();

    assert!(!time::is_expired(
        started,
        30,
        started + Duration::minutes(29)
    ));
    assert!(time::is_expired(started, 30, started + Duration::minutes(30)));
    assert!(time::is_expired(started, 30, started + Duration::minutes(31)));
}
