use serde_json::{Map, Value, json};

use crate::spec::{
    form::FormSpec,
    question::{QuestionKind, QuestionSpec},
};

/// JSON Schema describing a complete, valid answers object for `spec`.
pub fn generate(spec: &FormSpec) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for question in &spec.questions {
        properties.insert(question.id.clone(), question_schema(question));
        if question.required {
            required.push(Value::String(question.id.clone()));
        }
    }

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": format!("{} answers", spec.title),
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn question_schema(question: &QuestionSpec) -> Value {
    let mut schema = Map::new();
    schema.insert("description".into(), Value::String(question.prompt.clone()));
    match question.kind {
        QuestionKind::Select => {
            schema.insert("type".into(), Value::String("string".into()));
            schema.insert(
                "enum".into(),
                Value::Array(
                    question
                        .options()
                        .iter()
                        .map(|option| Value::String(option.clone()))
                        .collect(),
                ),
            );
        }
        QuestionKind::Text => {
            schema.insert("type".into(), Value::String("string".into()));
            let min_len = question
                .constraint
                .as_ref()
                .and_then(|constraint| constraint.min_len)
                .unwrap_or(if question.required { 1 } else { 0 });
            if min_len > 0 {
                schema.insert("minLength".into(), json!(min_len));
            }
            if let Some(constraint) = &question.constraint {
                if let Some(max_len) = constraint.max_len {
                    schema.insert("maxLength".into(), json!(max_len));
                }
                if let Some(pattern) = &constraint.pattern {
                    schema.insert("pattern".into(), Value::String(pattern.clone()));
                }
            }
        }
        QuestionKind::Number => {
            schema.insert("type".into(), Value::String("number".into()));
            if let Some(constraint) = &question.constraint {
                if let Some(min) = constraint.min {
                    schema.insert("minimum".into(), json!(min));
                }
                if let Some(max) = constraint.max {
                    schema.insert("maximum".into(), json!(max));
                }
            }
        }
    }
    Value::Object(schema)
}
