use serde_json::{Map, Value, json};

use crate::{
    answers::{AnswerStore, AnswerValue},
    spec::{
        form::FormSpec,
        question::{QuestionKind, QuestionSpec},
    },
};

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// The current question is waiting for input.
    NeedInput,
    /// The submission step is in flight.
    Submitting,
    /// The questionnaire was submitted.
    Complete,
}

impl RenderStatus {
    /// Human-friendly label that matches the renderer requirements.
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Submitting => "submitting",
            RenderStatus::Complete => "complete",
        }
    }
}

/// Position of the active question in the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderProgress {
    /// 1-based position of the active question.
    pub position: usize,
    pub total: usize,
}

impl RenderProgress {
    /// Fraction in `(0, 1]` shown by the progress indicator.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.position as f64 / self.total as f64
        }
    }
}

/// Describes the active question for render outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderQuestion {
    pub id: String,
    pub prompt: String,
    pub kind: QuestionKind,
    pub placeholder: Option<String>,
    pub required: bool,
    pub options: Vec<String>,
}

impl From<&QuestionSpec> for RenderQuestion {
    fn from(question: &QuestionSpec) -> Self {
        Self {
            id: question.id.clone(),
            prompt: question.prompt.clone(),
            kind: question.kind,
            placeholder: question.placeholder.clone(),
            required: question.required,
            options: question.options().to_vec(),
        }
    }
}

/// Everything a presentation surface needs to draw the current step.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowView {
    pub form_id: String,
    pub form_title: String,
    pub status: RenderStatus,
    pub question: RenderQuestion,
    pub current_value: Option<AnswerValue>,
    pub error: Option<String>,
    pub progress: RenderProgress,
    pub is_first: bool,
    pub is_last: bool,
    pub is_submitting: bool,
    /// A delayed advance has been scheduled after a select answer.
    pub auto_advance_pending: bool,
    /// Number of inbound events the flow has fully processed.
    pub events_handled: u64,
}

impl FlowView {
    /// Label of the primary action for the current step.
    pub fn action_label(&self) -> &'static str {
        if self.is_last { "Submit" } else { "Next" }
    }

    pub fn progress_fraction(&self) -> f64 {
        self.progress.fraction()
    }
}

/// Build the base view for the question at `index`.
///
/// `index` is clamped into the question range; callers overlay flow state
/// such as `status` and `error` on the returned value.
pub fn build_view(spec: &FormSpec, answers: &AnswerStore, index: usize) -> FlowView {
    let total = spec.questions.len();
    let index = index.min(total.saturating_sub(1));
    let question = spec
        .questions
        .get(index)
        .map(RenderQuestion::from)
        .unwrap_or_else(|| RenderQuestion {
            id: String::new(),
            prompt: String::new(),
            kind: QuestionKind::Text,
            placeholder: None,
            required: false,
            options: Vec::new(),
        });
    let current_value = answers.get(&question.id).cloned();

    FlowView {
        form_id: spec.id.clone(),
        form_title: spec.title.clone(),
        status: RenderStatus::NeedInput,
        question,
        current_value,
        error: None,
        progress: RenderProgress {
            position: index + 1,
            total,
        },
        is_first: index == 0,
        is_last: index + 1 >= total,
        is_submitting: false,
        auto_advance_pending: false,
        events_handled: 0,
    }
}

/// Render the view as a structured JSON-friendly value.
pub fn render_json_ui(view: &FlowView) -> Value {
    let mut question = Map::new();
    question.insert("id".into(), Value::String(view.question.id.clone()));
    question.insert("prompt".into(), Value::String(view.question.prompt.clone()));
    question.insert(
        "type".into(),
        Value::String(view.question.kind.as_str().to_string()),
    );
    question.insert("required".into(), Value::Bool(view.question.required));
    if let Some(placeholder) = &view.question.placeholder {
        question.insert("placeholder".into(), Value::String(placeholder.clone()));
    }
    if !view.question.options.is_empty() {
        question.insert(
            "options".into(),
            Value::Array(
                view.question
                    .options
                    .iter()
                    .map(|option| Value::String(option.clone()))
                    .collect(),
            ),
        );
    }
    if let Some(value) = &view.current_value {
        question.insert("current_value".into(), value.to_value());
    }

    json!({
        "form_id": view.form_id,
        "form_title": view.form_title,
        "status": view.status.as_str(),
        "question": Value::Object(question),
        "error": view.error,
        "progress": {
            "position": view.progress.position,
            "total": view.progress.total,
            "fraction": view.progress.fraction(),
        },
        "is_first": view.is_first,
        "is_last": view.is_last,
        "is_submitting": view.is_submitting,
        "action": view.action_label(),
    })
}

/// Render the view as human-friendly text.
pub fn render_text(view: &FlowView) -> String {
    let mut lines = Vec::new();
    lines.push(progress_bar(&view.progress, 20));

    match view.status {
        RenderStatus::Complete => {
            lines.push("All questions are answered and submitted.".to_string());
            return lines.join("\n");
        }
        RenderStatus::Submitting => {
            lines.push("↻ Submitting...".to_string());
            return lines.join("\n");
        }
        RenderStatus::NeedInput => {}
    }

    lines.push(view.question.prompt.clone());
    match view.question.kind {
        QuestionKind::Select => {
            let selected = view.current_value.as_ref().and_then(AnswerValue::as_str);
            for (index, option) in view.question.options.iter().enumerate() {
                let marker = if selected == Some(option.as_str()) {
                    '>'
                } else {
                    ' '
                };
                lines.push(format!(" {} {}. {}", marker, index + 1, option));
            }
        }
        QuestionKind::Text | QuestionKind::Number => {
            let mut entry = String::from("  > ");
            match (&view.current_value, &view.question.placeholder) {
                (Some(value), _) => entry.push_str(&value.to_string()),
                (None, Some(placeholder)) => entry.push_str(&format!("({})", placeholder)),
                (None, None) => {}
            }
            lines.push(entry);
        }
    }

    if let Some(error) = &view.error {
        lines.push(format!("  ! {}", error));
    }

    let mut actions = Vec::new();
    if !view.is_first {
        actions.push("[:back]".to_string());
    }
    actions.push(format!("[{}]", view.action_label()));
    lines.push(actions.join(" "));

    lines.join("\n")
}

/// Textual progress indicator, e.g. `[##########----------] 2/4`.
pub fn progress_bar(progress: &RenderProgress, width: usize) -> String {
    let filled = ((progress.fraction() * width as f64).round() as usize).min(width);
    format!(
        "[{}{}] {}/{}",
        "#".repeat(filled),
        "-".repeat(width - filled),
        progress.position,
        progress.total
    )
}
