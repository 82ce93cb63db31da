use serde_json::json;

use qa_spec::{
    AnswerStore, AnswerValue, FormSpec, QuestionSpec, ValidationError, Validator, answers_schema,
    scholarship_form, validate, validate_answer, validate_json, validate_raw,
};

fn question(spec: &FormSpec, id: &str) -> QuestionSpec {
    spec.question(id).cloned().expect("question exists")
}

#[test]
fn gpa_boundaries() {
    let spec = scholarship_form();
    let gpa = question(&spec, "gpa");
    assert!(validate_raw(&gpa, "0.00"));
    assert!(validate_raw(&gpa, "4.00"));
    assert!(!validate_raw(&gpa, "-0.01"));
    assert!(!validate_raw(&gpa, "4.01"));
    assert!(!validate_raw(&gpa, "abc"));
}

#[test]
fn major_name_boundaries() {
    let spec = scholarship_form();
    let major = question(&spec, "major");
    assert!(!validate_raw(&major, "a"));
    assert!(validate_raw(&major, "ab"));
}

#[test]
fn unparseable_number_is_a_parse_failure() {
    let spec = scholarship_form();
    let gpa = question(&spec, "gpa");
    let value = AnswerValue::coerce(&gpa, "three").expect("non-blank");
    assert_eq!(
        validate_answer(&gpa, Some(&value)),
        Err(ValidationError::NumericParse {
            question_id: "gpa".into()
        })
    );
}

#[test]
fn required_question_rejects_missing_answer() {
    let spec = scholarship_form();
    let level = question(&spec, "level");
    let err = validate_answer(&level, None).unwrap_err();
    assert_eq!(err.code(), "missing");
    assert!(validate_answer(&level.clone().optional(), None).is_ok());
}

#[test]
fn select_rejects_values_outside_options() {
    let spec = scholarship_form();
    let level = question(&spec, "level");
    assert!(validate_raw(&level, "Senior"));
    assert!(!validate_raw(&level, "Postdoc"));
}

#[test]
fn custom_validator_runs_after_constraints() {
    let even = Validator::new("even", |value| {
        value.as_f64().is_some_and(|number| number % 2.0 == 0.0)
    });
    let spec = QuestionSpec::number("count", "How many?").with_validator(even);
    assert!(validate_raw(&spec, "4"));
    let err = validate_answer(&spec, AnswerValue::coerce(&spec, "3").as_ref()).unwrap_err();
    assert_eq!(err.code(), "rejected");
}

#[test]
fn whole_form_validation_reports_each_problem() {
    let spec = scholarship_form();
    let mut answers = AnswerStore::new();
    answers.insert("level", AnswerValue::Choice("Senior".into()));
    answers.insert("gpa", AnswerValue::Number(5.0));
    answers.insert("shoe", AnswerValue::Text("42".into()));

    let result = validate(&spec, &answers);
    assert!(!result.valid);
    assert_eq!(result.missing_required, vec!["major", "financialNeed"]);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code(), "max");
    assert_eq!(result.unknown_fields, vec!["shoe"]);
}

#[test]
fn fixture_matches_built_in_form() {
    let spec: FormSpec =
        serde_json::from_str(include_str!("fixtures/scholarship_form.json")).expect("fixture");
    spec.check().expect("fixture is well formed");
    let built_in = scholarship_form();
    assert_eq!(spec.questions, built_in.questions);
}

#[test]
fn answers_schema_lists_required_fields() {
    let schema = answers_schema(&scholarship_form());
    let props = schema["properties"].as_object().expect("properties");
    assert_eq!(props["gpa"]["maximum"], json!(4.0));
    assert_eq!(props["major"]["minLength"], json!(2));
    assert_eq!(props["level"]["enum"][3], "Senior");
    assert_eq!(schema["required"].as_array().map(Vec::len), Some(4));
}

#[test]
fn json_answers_report_type_mismatch_and_unknown_ids() {
    let spec = scholarship_form();
    let result = validate_json(
        &spec,
        &json!({ "level": "Senior", "major": "CS", "gpa": true, "shoe": 42 }),
    )
    .expect("answers object");

    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code(), "type_mismatch");
    assert_eq!(result.errors[0].question_id(), "gpa");
    assert_eq!(result.missing_required, vec!["financialNeed"]);
    assert_eq!(result.unknown_fields, vec!["shoe"]);
}

#[test]
fn json_answers_must_be_an_object() {
    let err = validate_json(&scholarship_form(), &json!(["Senior"])).unwrap_err();
    assert_eq!(err, qa_spec::SpecError::AnswersNotObject);
}
