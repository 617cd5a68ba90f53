use schooltest_backend::models::user::GradingCriteria;
use schooltest_backend::services::grading_service::GradingService;

#[test]
fn default_thresholds_map_to_grades() {
    let cases = [
        (100.0, 5),
        (85.0, 5),
        (84.99, 4),
        (70.0, 4),
        (69.99, 3),
        (50.0, 3),
        (49.99, 2),
        (0.0, 2),
    ];
    for (percentage, expected) in cases {
        let grade = GradingService::percentage_to_grade(percentage, None);
        assert_eq!(grade.value, expected, "percentage {}", percentage);
    }
}

#[test]
fn default_labels_are_russian_grade_names() {
    assert_eq!(GradingService::percentage_to_grade(90.0, None).label, "Отлично");
    assert_eq!(GradingService::percentage_to_grade(75.0, None).label, "Хорошо");
    assert_eq!(
        GradingService::percentage_to_grade(55.0, None).label,
        "Удовлетворительно"
    );
    assert_eq!(
        GradingService::percentage_to_grade(10.0, None).label,
        "Неудовлетворительно"
    );
}

#[test]
fn custom_criteria_override_the_defaults() {
    let criteria = GradingCriteria {
        excellent: 90.0,
        good: 75.0,
        satisfactory: 60.0,
        poor: 0.0,
    };

    let cases = [(90.0, 5), (89.0, 4), (75.0, 4), (60.0, 3), (59.0, 2)];
    for (percentage, expected) in cases {
        let grade = GradingService::percentage_to_grade(percentage, Some(&criteria));
        assert_eq!(grade.value, expected, "percentage {}", percentage);
    }
}

#[test]
fn criteria_must_be_strictly_decreasing() {
    let valid = GradingCriteria {
        excellent: 85.0,
        good: 70.0,
        satisfactory: 50.0,
        poor: 20.0,
    };
    assert!(valid.validate().is_ok());

    let equal_boundaries = GradingCriteria {
        excellent: 85.0,
        good: 85.0,
        satisfactory: 50.0,
        poor: 20.0,
    };
    assert!(equal_boundaries.validate().is_err());

    let inverted = GradingCriteria {
        excellent: 50.0,
        good: 70.0,
        satisfactory: 85.0,
        poor: 20.0,
    };
    assert!(inverted.validate().is_err());
}

#[test]
fn criteria_are_bounded_by_zero_and_one_hundred() {
    let too_high = GradingCriteria {
        excellent: 101.0,
        good: 70.0,
        satisfactory: 50.0,
        poor: 20.0,
    };
    assert!(too_high.validate().is_err());

    let negative_poor = GradingCriteria {
        excellent: 85.0,
        good: 70.0,
        satisfactory: 50.0,
        poor: -1.0,
    };
    assert!(negative_poor.validate().is_err());

    // A zero floor is allowed; the floor grade just never fires above it.
    let zero_poor = GradingCriteria {
        excellent: 85.0,
        good: 70.0,
        satisfactory: 50.0,
        poor: 0.0,
    };
    assert!(zero_poor.validate().is_ok());
}
