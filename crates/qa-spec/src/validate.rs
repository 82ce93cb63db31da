use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::answers::{AnswerStore, AnswerValue};
use crate::spec::form::{FormSpec, SpecError};
use crate::spec::question::{Constraint, QuestionSpec};

/// Reason a single answer was rejected.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("an answer is required")]
    Missing { question_id: String },
    #[error("please enter a number")]
    NumericParse { question_id: String },
    #[error("expected a {expected} answer")]
    KindMismatch {
        question_id: String,
        expected: &'static str,
    },
    #[error("'{value}' is not one of the options")]
    NotAnOption { question_id: String, value: String },
    #[error("{message}")]
    Constraint {
        question_id: String,
        rule: &'static str,
        message: String,
    },
    #[error("please enter a valid value")]
    Rejected { question_id: String },
}

impl ValidationError {
    pub fn question_id(&self) -> &str {
        match self {
            ValidationError::Missing { question_id }
            | ValidationError::NumericParse { question_id }
            | ValidationError::KindMismatch { question_id, .. }
            | ValidationError::NotAnOption { question_id, .. }
            | ValidationError::Constraint { question_id, .. }
            | ValidationError::Rejected { question_id } => question_id,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::Missing { .. } => "missing",
            ValidationError::NumericParse { .. } => "not_a_number",
            ValidationError::KindMismatch { .. } => "type_mismatch",
            ValidationError::NotAnOption { .. } => "enum_mismatch",
            ValidationError::Constraint { rule, .. } => *rule,
            ValidationError::Rejected { .. } => "rejected",
        }
    }
}

/// Outcome of validating a whole answer store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub missing_required: Vec<String>,
    pub unknown_fields: Vec<String>,
}

/// Validates one answer against its question.
pub fn validate_answer(
    question: &QuestionSpec,
    value: Option<&AnswerValue>,
) -> Result<(), ValidationError> {
    let Some(value) = value else {
        return if question.required {
            Err(ValidationError::Missing {
                question_id: question.id.clone(),
            })
        } else {
            Ok(())
        };
    };

    if value.kind() != question.kind {
        return Err(ValidationError::KindMismatch {
            question_id: question.id.clone(),
            expected: question.kind.as_str(),
        });
    }

    match value {
        AnswerValue::Number(number) if number.is_nan() => {
            return Err(ValidationError::NumericParse {
                question_id: question.id.clone(),
            });
        }
        AnswerValue::Text(text) if question.required && text.trim().is_empty() => {
            return Err(ValidationError::Missing {
                question_id: question.id.clone(),
            });
        }
        AnswerValue::Choice(choice) if !question.options().contains(choice) => {
            return Err(ValidationError::NotAnOption {
                question_id: question.id.clone(),
                value: choice.clone(),
            });
        }
        _ => {}
    }

    if let Some(constraint) = &question.constraint {
        enforce_constraint(question, value, constraint)?;
    }

    if let Some(validator) = &question.validator
        && !validator.accepts(value)
    {
        return Err(ValidationError::Rejected {
            question_id: question.id.clone(),
        });
    }

    Ok(())
}

/// Coerces raw input the way the flow stores it, then validates it.
pub fn validate_raw(question: &QuestionSpec, raw: &str) -> bool {
    validate_answer(question, AnswerValue::coerce(question, raw).as_ref()).is_ok()
}

/// Validates every question of `spec` against `answers`.
pub fn validate(spec: &FormSpec, answers: &AnswerStore) -> ValidationResult {
    let mut errors = Vec::new();
    let mut missing_required = Vec::new();

    for question in &spec.questions {
        match validate_answer(question, answers.get(&question.id)) {
            Ok(()) => {}
            Err(ValidationError::Missing { question_id }) => missing_required.push(question_id),
            Err(error) => errors.push(error),
        }
    }

    let unknown_fields: Vec<String> = answers
        .iter()
        .map(|(id, _)| id)
        .filter(|id| spec.question(id).is_none())
        .cloned()
        .collect();

    ValidationResult {
        valid: errors.is_empty() && missing_required.is_empty() && unknown_fields.is_empty(),
        errors,
        missing_required,
        unknown_fields,
    }
}

/// Validates a plain JSON answers object such as `{"gpa": 3.7}`.
///
/// Mistyped entries become `KindMismatch` errors and unknown ids are listed
/// in `unknown_fields`; only a non-object input is an error.
pub fn validate_json(spec: &FormSpec, answers: &Value) -> Result<ValidationResult, SpecError> {
    let map = answers.as_object().ok_or(SpecError::AnswersNotObject)?;
    let mut store = AnswerStore::new();
    let mut mistyped = Vec::new();

    for (id, value) in map {
        let Some(question) = spec.question(id) else {
            store.insert(id.clone(), AnswerValue::Text(value.to_string()));
            continue;
        };
        match AnswerValue::from_json(question, value) {
            Ok(Some(answer)) => store.insert(id.clone(), answer),
            Ok(None) => {}
            Err(SpecError::AnswerType { .. }) => mistyped.push(ValidationError::KindMismatch {
                question_id: question.id.clone(),
                expected: question.kind.as_str(),
            }),
            Err(other) => return Err(other),
        }
    }

    let mut result = validate(spec, &store);
    result
        .missing_required
        .retain(|id| !mistyped.iter().any(|error| error.question_id() == id));
    if !mistyped.is_empty() {
        result.valid = false;
        result.errors.extend(mistyped);
    }
    Ok(result)
}

fn enforce_constraint(
    question: &QuestionSpec,
    value: &AnswerValue,
    constraint: &Constraint,
) -> Result<(), ValidationError> {
    if let Some(pattern) = &constraint.pattern
        && let Some(text) = value.as_str()
        && let Ok(regex) = Regex::new(pattern)
        && !regex.is_match(text)
    {
        return Err(base_error(
            question,
            "value does not match the expected format".into(),
            "pattern_mismatch",
        ));
    }

    if let Some(min_len) = constraint.min_len
        && let Some(text) = value.as_str()
        && text.chars().count() < min_len
    {
        return Err(base_error(
            question,
            format!("must be at least {} characters", min_len),
            "min_length",
        ));
    }

    if let Some(max_len) = constraint.max_len
        && let Some(text) = value.as_str()
        && text.chars().count() > max_len
    {
        return Err(base_error(
            question,
            format!("must be at most {} characters", max_len),
            "max_length",
        ));
    }

    if let Some(min) = constraint.min
        && let Some(number) = value.as_f64()
        && number < min
    {
        return Err(base_error(question, format!("must be at least {}", min), "min"));
    }

    if let Some(max) = constraint.max
        && let Some(number) = value.as_f64()
        && number > max
    {
        return Err(base_error(question, format!("must be at most {}", max), "max"));
    }

    Ok(())
}

fn base_error(question: &QuestionSpec, message: String, rule: &'static str) -> ValidationError {
    ValidationError::Constraint {
        question_id: question.id.clone(),
        rule,
        message,
    }
}
