//! Question-flow controller for step-by-step questionnaires.
//!
//! [`controller::FlowController`] holds the navigation and validation rules;
//! [`session::Session`] runs one controller on a tokio task together with the
//! auto-advance timer, the keyboard subscription and the submission step.

pub mod config;
pub mod controller;
pub mod error;
pub mod keys;
pub mod session;
pub mod submit;

pub use config::{FlowConfig, SubmitFailurePolicy};
pub use controller::{AnswerOutcome, FlowController, FlowState, Phase, Transition};
pub use error::{FlowError, SessionError, SubmissionError};
pub use keys::{Key, KeySource};
pub use session::{Intent, Session, SessionBuilder, SessionHandle, SessionOutcome, SessionReport};
pub use submit::{SimulatedSubmitter, Submitter};
