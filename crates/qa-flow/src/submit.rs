use std::time::Duration;

use async_trait::async_trait;
use qa_spec::AnswerSet;
use tracing::debug;

use crate::error::SubmissionError;

/// Side effect run once all questions are answered.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, answers: &AnswerSet) -> Result<(), SubmissionError>;
}

/// Stand-in for a real backend: waits, then reports the configured outcome.
#[derive(Debug, Clone)]
pub struct SimulatedSubmitter {
    delay: Duration,
    failure: Option<String>,
}

impl SimulatedSubmitter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            failure: None,
        }
    }

    /// Always rejects with `reason` after the delay.
    pub fn failing(delay: Duration, reason: impl Into<String>) -> Self {
        Self {
            delay,
            failure: Some(reason.into()),
        }
    }
}

impl Default for SimulatedSubmitter {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}

#[async_trait]
impl Submitter for SimulatedSubmitter {
    async fn submit(&self, answers: &AnswerSet) -> Result<(), SubmissionError> {
        debug!(form = %answers.form_id, answers = answers.answers.len(), delay_ms = self.delay.as_millis() as u64, "simulating submission");
        tokio::time::sleep(self.delay).await;
        match &self.failure {
            Some(reason) => Err(SubmissionError::Rejected(reason.clone())),
            None => Ok(()),
        }
    }
}
