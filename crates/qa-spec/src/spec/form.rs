use std::collections::BTreeSet;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::question::{QuestionKind, QuestionSpec};

/// Problems detected in a question set or in answers supplied for it.
#[derive(Debug, Error, PartialEq)]
pub enum SpecError {
    #[error("form '{0}' has no questions")]
    Empty(String),
    #[error("question id '{0}' is used more than once")]
    DuplicateId(String),
    #[error("select question '{0}' must list at least one option")]
    MissingOptions(String),
    #[error("question '{question_id}' lists option '{option}' more than once")]
    DuplicateOption { question_id: String, option: String },
    #[error("{kind} question '{question_id}' cannot define options")]
    UnexpectedOptions {
        question_id: String,
        kind: &'static str,
    },
    #[error("question '{question_id}' has an invalid pattern: {message}")]
    InvalidPattern {
        question_id: String,
        message: String,
    },
    #[error("answer for unknown question '{0}'")]
    UnknownQuestion(String),
    #[error("answer for '{question_id}' must be {expected}")]
    AnswerType {
        question_id: String,
        expected: &'static str,
    },
    #[error("answers must be a JSON object")]
    AnswersNotObject,
}

/// Ordered, immutable question set driving one questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormSpec {
    pub id: String,
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Vec<QuestionSpec>,
}

impl FormSpec {
    /// Checks the structural invariants a flow relies on.
    pub fn check(&self) -> Result<(), SpecError> {
        if self.questions.is_empty() {
            return Err(SpecError::Empty(self.id.clone()));
        }

        let mut seen = BTreeSet::new();
        for question in &self.questions {
            if !seen.insert(question.id.as_str()) {
                return Err(SpecError::DuplicateId(question.id.clone()));
            }
            check_options(question)?;
            if let Some(pattern) = question
                .constraint
                .as_ref()
                .and_then(|constraint| constraint.pattern.as_deref())
                && let Err(err) = Regex::new(pattern)
            {
                return Err(SpecError::InvalidPattern {
                    question_id: question.id.clone(),
                    message: err.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn question(&self, id: &str) -> Option<&QuestionSpec> {
        self.questions.iter().find(|question| question.id == id)
    }

}

fn check_options(question: &QuestionSpec) -> Result<(), SpecError> {
    match question.kind {
        QuestionKind::Select => {
            let options = question.options();
            if options.is_empty() {
                return Err(SpecError::MissingOptions(question.id.clone()));
            }
            // Options are matched case-insensitively, so duplicates are too.
            let mut seen = BTreeSet::new();
            for option in options {
                if !seen.insert(option.to_ascii_lowercase()) {
                    return Err(SpecError::DuplicateOption {
                        question_id: question.id.clone(),
                        option: option.clone(),
                    });
                }
            }
            Ok(())
        }
        QuestionKind::Text | QuestionKind::Number => {
            if question.options.is_some() {
                Err(SpecError::UnexpectedOptions {
                    question_id: question.id.clone(),
                    kind: question.kind.as_str(),
                })
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::question::Constraint;

    fn form(questions: Vec<QuestionSpec>) -> FormSpec {
        FormSpec {
            id: "form".into(),
            title: "Form".into(),
            version: "1.0.0".into(),
            description: None,
            questions,
        }
    }

    #[test]
    fn empty_form_is_rejected() {
        assert_eq!(form(vec![]).check(), Err(SpecError::Empty("form".into())));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let spec = form(vec![
            QuestionSpec::text("name", "Name"),
            QuestionSpec::number("name", "Again"),
        ]);
        assert_eq!(spec.check(), Err(SpecError::DuplicateId("name".into())));
    }

    #[test]
    fn select_requires_options() {
        let mut question = QuestionSpec::select("pick", "Pick", &[]);
        assert_eq!(
            form(vec![question.clone()]).check(),
            Err(SpecError::MissingOptions("pick".into()))
        );
        question.options = Some(vec!["a".into(), "a".into()]);
        assert!(matches!(
            form(vec![question]).check(),
            Err(SpecError::DuplicateOption { .. })
        ));
    }

    #[test]
    fn options_differing_only_in_case_are_duplicates() {
        let question = QuestionSpec::select("need", "Need?", &["Yes", "yes"]);
        assert_eq!(
            form(vec![question]).check(),
            Err(SpecError::DuplicateOption {
                question_id: "need".into(),
                option: "yes".into(),
            })
        );
    }

    #[test]
    fn text_question_cannot_carry_options() {
        let mut question = QuestionSpec::text("major", "Major");
        question.options = Some(vec!["x".into()]);
        assert!(matches!(
            form(vec![question]).check(),
            Err(SpecError::UnexpectedOptions { kind: "text", .. })
        ));
    }

    #[test]
    fn broken_pattern_is_reported() {
        let question = QuestionSpec::text("code", "Code").with_constraint(Constraint {
            pattern: Some("([a-z".into()),
            ..Constraint::default()
        });
        assert!(matches!(
            form(vec![question]).check(),
            Err(SpecError::InvalidPattern { .. })
        ));
    }
}
