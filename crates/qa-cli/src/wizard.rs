use qa_flow::{SessionOutcome, SessionReport};
use qa_spec::{AnswerSet, FlowView, RenderStatus, render_json_ui, render_text};

use crate::config::RenderFormat;

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: question prompts only.
    Clean,
    /// Verbose output: status, progress and question ids.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints views published by the session and the final outcome.
pub struct WizardPresenter {
    verbosity: Verbosity,
    format: RenderFormat,
    header_printed: bool,
    show_answers_json: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, format: RenderFormat, show_answers_json: bool) -> Self {
        Self {
            verbosity,
            format,
            header_printed: false,
            show_answers_json,
        }
    }

    pub fn show_header(&mut self, view: &FlowView) {
        if self.header_printed {
            return;
        }
        println!("Form: {}", view.form_title);
        if self.verbosity.is_verbose() {
            println!(
                "Questions: {} (type an answer, empty line to confirm, :back, :next, :quit)",
                view.progress.total
            );
        }
        self.header_printed = true;
    }

    pub fn show_view(&mut self, view: &FlowView) {
        self.show_header(view);
        if self.verbosity.is_verbose() {
            println!(
                "Status: {} ({}/{}) question={}",
                view.status.as_str(),
                view.progress.position,
                view.progress.total,
                view.question.id
            );
        }
        match self.format {
            RenderFormat::Text => println!("{}", render_text(view)),
            RenderFormat::Json => match serde_json::to_string_pretty(&render_json_ui(view)) {
                Ok(json) => println!("{}", json),
                Err(err) => eprintln!("Failed to render view as JSON: {}", err),
            },
        }
    }

    /// Progress line printed while the submission step runs.
    pub fn show_submitting(&mut self, view: &FlowView) {
        if view.status == RenderStatus::Submitting {
            self.show_view(view);
        }
    }

    pub fn show_unknown_command(&self, command: &str) {
        eprintln!(
            "Unknown command '{}'; use :back, :next or :quit.",
            command
        );
    }

    pub fn show_outcome(&self, report: &SessionReport) {
        if self.verbosity.is_verbose() {
            println!("Submissions started: {}", report.submissions);
        }
        match &report.outcome {
            SessionOutcome::Submitted => self.show_completion(&report.answers),
            SessionOutcome::SubmittedWithError(err) => {
                eprintln!("Submission failed: {}", err);
                self.show_completion(&report.answers);
            }
            SessionOutcome::TornDown => println!("Questionnaire closed before submission."),
        }
    }

    pub fn show_completion(&self, answer_set: &AnswerSet) {
        println!("Done ✅");
        match answer_set.to_cbor() {
            Ok(bytes) => {
                println!("Answers (CBOR hex): {}", encode_hex(&bytes));
            }
            Err(err) => {
                eprintln!("Failed to serialize answers to CBOR: {}", err);
            }
        }
        if self.show_answers_json {
            match answer_set.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => {
                    eprintln!("Failed to serialize answers to JSON: {}", err);
                }
            }
        }
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase_and_padded() {
        assert_eq!(encode_hex(&[0x00, 0x0f, 0xa1]), "000fa1");
        assert_eq!(encode_hex(&[]), "");
    }

    #[test]
    fn verbosity_from_flag() {
        assert!(Verbosity::from_verbose(true).is_verbose());
        assert!(!Verbosity::from_verbose(false).is_verbose());
    }
}
