pub mod form;
pub mod question;

pub use form::{FormSpec, SpecError};
pub use question::{Constraint, QuestionKind, QuestionSpec, Validator};
