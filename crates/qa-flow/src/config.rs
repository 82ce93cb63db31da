use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happens when the submission step reports a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmitFailurePolicy {
    /// Return to the last question with the error shown; advancing retries.
    #[default]
    Surface,
    /// Log the failure and finish anyway.
    BestEffort,
}

/// Tunables of a questionnaire session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Delay before a select answer advances on its own; `None` disables it.
    pub auto_advance_ms: Option<u64>,
    pub on_submit_failure: SubmitFailurePolicy,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            auto_advance_ms: Some(500),
            on_submit_failure: SubmitFailurePolicy::Surface,
        }
    }
}

impl FlowConfig {
    pub fn auto_advance_delay(&self) -> Option<Duration> {
        self.auto_advance_ms.map(Duration::from_millis)
    }

    pub fn without_auto_advance(mut self) -> Self {
        self.auto_advance_ms = None;
        self
    }
}
