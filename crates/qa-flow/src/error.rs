use qa_spec::ValidationError;
use thiserror::Error;

/// Failure reported by the injected submission step.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmissionError {
    #[error("submission rejected: {0}")]
    Rejected(String),
    #[error("submission was aborted")]
    Aborted,
}

/// Error shown to the user for the current step.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    #[error("Please enter a valid value: {0}")]
    Validation(#[from] ValidationError),
    #[error("Submission failed, press Submit to retry ({0})")]
    Submission(#[from] SubmissionError),
}

impl FlowError {
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            FlowError::Validation(err) => Some(err),
            FlowError::Submission(_) => None,
        }
    }
}

/// Errors raised by the session handle.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is no longer running")]
    Closed,
    #[error("session task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
