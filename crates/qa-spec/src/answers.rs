use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::spec::form::{FormSpec, SpecError};
use crate::spec::question::{QuestionKind, QuestionSpec};

/// Answer captured for a single question, tagged by the question kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    /// `NaN` marks input that could not be parsed as a number.
    Number(f64),
    Choice(String),
}

impl AnswerValue {
    /// Coerces raw input into the value shape expected by `kind`.
    ///
    /// Returns `None` when the input is blank, i.e. no value was supplied.
    pub fn coerce(question: &QuestionSpec, raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }
        let value = match question.kind {
            QuestionKind::Select => AnswerValue::Choice(
                question
                    .match_option(raw)
                    .map(str::to_string)
                    .unwrap_or_else(|| raw.trim().to_string()),
            ),
            QuestionKind::Text => AnswerValue::Text(raw.to_string()),
            QuestionKind::Number => AnswerValue::Number(parse_number(raw)),
        };
        Some(value)
    }

    pub fn kind(&self) -> QuestionKind {
        match self {
            AnswerValue::Text(_) => QuestionKind::Text,
            AnswerValue::Number(_) => QuestionKind::Number,
            AnswerValue::Choice(_) => QuestionKind::Select,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) | AnswerValue::Choice(text) => Some(text),
            AnswerValue::Number(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Reads a JSON answer for `question`; `null` and blank strings are no answer.
    pub fn from_json(question: &QuestionSpec, value: &Value) -> Result<Option<Self>, SpecError> {
        match (question.kind, value) {
            (QuestionKind::Number, Value::Number(number)) => number
                .as_f64()
                .map(|number| Some(AnswerValue::Number(number)))
                .ok_or_else(|| type_error(question)),
            (_, Value::String(raw)) => Ok(AnswerValue::coerce(question, raw)),
            (_, Value::Null) => Ok(None),
            _ => Err(type_error(question)),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            AnswerValue::Text(text) | AnswerValue::Choice(text) => Value::String(text.clone()),
            AnswerValue::Number(value) => serde_json::Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Text(text) | AnswerValue::Choice(text) => f.write_str(text),
            AnswerValue::Number(value) if value.is_nan() => f.write_str("(not a number)"),
            AnswerValue::Number(value) => write!(f, "{}", value),
        }
    }
}

/// Parses numeric input; unparseable or non-finite text yields `NaN`.
pub fn parse_number(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(f64::NAN)
}

/// Answers collected during one session, keyed by question id.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct AnswerStore {
    entries: BTreeMap<String, AnswerValue>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the coerced raw input for `question`; blank input clears the entry.
    pub fn set_raw(&mut self, question: &QuestionSpec, raw: &str) -> Option<&AnswerValue> {
        match AnswerValue::coerce(question, raw) {
            Some(value) => {
                self.entries.insert(question.id.clone(), value);
                self.entries.get(&question.id)
            }
            None => {
                self.entries.remove(&question.id);
                None
            }
        }
    }

    pub fn insert(&mut self, id: impl Into<String>, value: AnswerValue) {
        self.entries.insert(id.into(), value);
    }

    pub fn get(&self, id: &str) -> Option<&AnswerValue> {
        self.entries.get(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<AnswerValue> {
        self.entries.remove(id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnswerValue)> {
        self.entries.iter()
    }

    /// Builds a store from a plain JSON object such as `{"gpa": 3.7}`.
    pub fn from_json(spec: &FormSpec, answers: &Value) -> Result<Self, SpecError> {
        let map = answers.as_object().ok_or(SpecError::AnswersNotObject)?;
        let mut store = Self::new();
        for (id, value) in map {
            let question = spec
                .question(id)
                .ok_or_else(|| SpecError::UnknownQuestion(id.clone()))?;
            if let Some(coerced) = AnswerValue::from_json(question, value)? {
                store.insert(id.clone(), coerced);
            }
        }
        Ok(store)
    }

    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(id, value)| (id.clone(), value.to_value()))
            .collect();
        Value::Object(map)
    }
}

fn type_error(question: &QuestionSpec) -> SpecError {
    SpecError::AnswerType {
        question_id: question.id.clone(),
        expected: match question.kind {
            QuestionKind::Select => "one of the option labels",
            QuestionKind::Text => "a string",
            QuestionKind::Number => "a number or numeric string",
        },
    }
}

/// Final payload handed to the submission step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerSet {
    pub form_id: String,
    pub spec_version: String,
    pub answers: AnswerStore,
}

impl AnswerSet {
    pub fn new(spec: &FormSpec, answers: AnswerStore) -> Self {
        Self {
            form_id: spec.id.clone(),
            spec_version: spec.version.clone(),
            answers,
        }
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Intermediate form used when reading answer sets back, e.g. from CBOR.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAnswerSet {
    pub form_id: String,
    pub spec_version: String,
    pub answers: Value,
}

impl RawAnswerSet {
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, serde_cbor::Error> {
        serde_cbor::from_slice(bytes)
    }

    pub fn resolve(self, spec: &FormSpec) -> Result<AnswerSet, SpecError> {
        let answers = AnswerStore::from_json(spec, &self.answers)?;
        Ok(AnswerSet {
            form_id: self.form_id,
            spec_version: self.spec_version,
            answers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::scholarship_form;
    use serde_json::json;

    #[test]
    fn number_coercion_marks_garbage_as_nan() {
        assert_eq!(parse_number(" 3.7 "), 3.7);
        assert!(parse_number("abc").is_nan());
        assert!(parse_number("inf").is_nan());
        assert!(parse_number("3.7abc").is_nan());
    }

    #[test]
    fn blank_input_clears_the_entry() {
        let spec = scholarship_form();
        let major = spec.question("major").expect("major");
        let mut store = AnswerStore::new();
        store.set_raw(major, "CS");
        assert_eq!(store.get("major"), Some(&AnswerValue::Text("CS".into())));
        store.set_raw(major, "   ");
        assert!(store.get("major").is_none());
    }

    #[test]
    fn select_input_is_normalized_to_option_label() {
        let spec = scholarship_form();
        let level = spec.question("level").expect("level");
        assert_eq!(
            AnswerValue::coerce(level, "senior"),
            Some(AnswerValue::Choice("Senior".into()))
        );
    }

    #[test]
    fn from_json_respects_kinds() {
        let spec = scholarship_form();
        let store = AnswerStore::from_json(
            &spec,
            &json!({ "level": "Junior", "gpa": "3.25", "major": "Math" }),
        )
        .expect("answers");
        assert_eq!(store.get("gpa"), Some(&AnswerValue::Number(3.25)));
        assert_eq!(store.get("level"), Some(&AnswerValue::Choice("Junior".into())));

        let err = AnswerStore::from_json(&spec, &json!({ "gpa": true })).unwrap_err();
        assert!(matches!(err, SpecError::AnswerType { .. }));
        let err = AnswerStore::from_json(&spec, &json!({ "shoe": "42" })).unwrap_err();
        assert_eq!(err, SpecError::UnknownQuestion("shoe".into()));
    }

    #[test]
    fn answer_set_survives_cbor() {
        let spec = scholarship_form();
        let mut store = AnswerStore::new();
        store.insert("level", AnswerValue::Choice("Senior".into()));
        store.insert("gpa", AnswerValue::Number(3.7));
        let set = AnswerSet::new(&spec, store);

        let bytes = set.to_cbor().expect("cbor");
        let decoded = RawAnswerSet::from_cbor(&bytes)
            .expect("decode")
            .resolve(&spec)
            .expect("resolve");
        assert_eq!(decoded, set);
    }
}
