//! Built-in question set shipped with the binary.

use crate::spec::form::FormSpec;
use crate::spec::question::{Constraint, QuestionSpec};

pub const SCHOLARSHIP_FORM_ID: &str = "scholarship-intake";

/// Scholarship intake questionnaire: study level, major, GPA, financial need.
pub fn scholarship_form() -> FormSpec {
    FormSpec {
        id: SCHOLARSHIP_FORM_ID.into(),
        title: "Scholarship Match".into(),
        version: "1.0.0".into(),
        description: Some("A few questions to match you with scholarships.".into()),
        questions: vec![
            QuestionSpec::select(
                "level",
                "What is your level of study?",
                &["Freshman", "Sophomore", "Junior", "Senior", "Graduate"],
            ),
            QuestionSpec::text("major", "What is your major?")
                .with_placeholder("e.g. Computer Science")
                .with_constraint(Constraint::length(2)),
            QuestionSpec::number("gpa", "What is your GPA?")
                .with_placeholder("0.00 - 4.00")
                .with_constraint(Constraint::range(0.0, 4.0)),
            QuestionSpec::select(
                "financialNeed",
                "Do you have financial need?",
                &["Yes", "No", "Prefer not to say"],
            ),
        ],
    }
}
