#![allow(missing_docs)]

pub mod answers;
pub mod answers_schema;
pub mod catalog;
pub mod render;
pub mod spec;
pub mod validate;

pub use answers::{AnswerSet, AnswerStore, AnswerValue, RawAnswerSet, parse_number};
pub use answers_schema::generate as answers_schema;
pub use catalog::scholarship_form;
pub use render::{
    FlowView, RenderProgress, RenderQuestion, RenderStatus, build_view, progress_bar,
    render_json_ui, render_text,
};
pub use spec::{Constraint, FormSpec, QuestionKind, QuestionSpec, SpecError, Validator};
pub use validate::{
    ValidationError, ValidationResult, validate, validate_answer, validate_json, validate_raw,
};
