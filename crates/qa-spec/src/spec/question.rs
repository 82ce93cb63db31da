use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::AnswerValue;

/// Input kinds supported by the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// One of the enumerated options.
    Select,
    /// Free-form text.
    Text,
    /// Free-form text coerced to a floating-point number.
    Number,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Select => "select",
            QuestionKind::Text => "text",
            QuestionKind::Number => "number",
        }
    }
}

/// Declarative validation rules that can be loaded alongside a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct Constraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Constraint {
    pub fn length(min_len: usize) -> Self {
        Self {
            min_len: Some(min_len),
            ..Self::default()
        }
    }

    pub fn range(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..Self::default()
        }
    }
}

/// Custom pure predicate attached to a question in code.
///
/// Validators are shared between clones of a spec and compared by identity.
#[derive(Clone)]
pub struct Validator {
    name: String,
    check: Arc<dyn Fn(&AnswerValue) -> bool + Send + Sync>,
}

impl Validator {
    pub fn new(
        name: impl Into<String>,
        check: impl Fn(&AnswerValue) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accepts(&self, value: &AnswerValue) -> bool {
        (self.check)(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Validator {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.check, &other.check)
    }
}

fn default_required() -> bool {
    true
}

/// A single question of the questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionSpec {
    pub id: String,
    #[serde(alias = "question", alias = "title")]
    pub prompt: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
    #[serde(skip)]
    pub validator: Option<Validator>,
}

impl QuestionSpec {
    pub fn select(id: impl Into<String>, prompt: impl Into<String>, options: &[&str]) -> Self {
        Self {
            options: Some(options.iter().map(|option| option.to_string()).collect()),
            ..Self::base(id, prompt, QuestionKind::Select)
        }
    }

    pub fn text(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::base(id, prompt, QuestionKind::Text)
    }

    pub fn number(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::base(id, prompt, QuestionKind::Number)
    }

    fn base(id: impl Into<String>, prompt: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            kind,
            options: None,
            placeholder: None,
            required: true,
            constraint: None,
            validator: None,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Options of a select question; empty for other kinds.
    pub fn options(&self) -> &[String] {
        self.options.as_deref().unwrap_or_default()
    }

    /// Resolves user input to the canonical option label, ignoring case.
    pub fn match_option(&self, raw: &str) -> Option<&str> {
        let needle = raw.trim();
        self.options()
            .iter()
            .find(|option| option.eq_ignore_ascii_case(needle))
            .map(String::as_str)
    }
}
