//! Sequential navigation, validation and submission triggering.
//!
//! [`FlowController`] is a plain state machine: it performs no I/O and owns
//! no timers. The session runtime feeds it events one at a time and acts on
//! the [`Transition`]s it returns.

use std::sync::Arc;

use qa_spec::{
    AnswerSet, AnswerStore, FlowView, FormSpec, QuestionKind, QuestionSpec, RenderStatus,
    SpecError, build_view, validate_answer,
};
use tracing::{debug, info, warn};

use crate::config::SubmitFailurePolicy;
use crate::error::{FlowError, SubmissionError};

/// Coarse lifecycle of a questionnaire session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Answering,
    Submitting,
    Done,
}

/// Result of applying a navigation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Moved { from: usize, to: usize },
    /// Validation failed; the flow stays on the current question.
    Blocked(FlowError),
    /// The last question passed validation and the flow entered `Submitting`.
    SubmitRequested,
    /// The request does not apply in the current state.
    Ignored,
}

/// Result of recording an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub recorded: bool,
    /// The answer picked a valid option and the flow should advance shortly.
    pub auto_advance: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowState {
    pub current_index: usize,
    pub error: Option<FlowError>,
    pub phase: Phase,
}

impl Default for FlowState {
    fn default() -> Self {
        Self {
            current_index: 0,
            error: None,
            phase: Phase::Answering,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FlowController {
    spec: Arc<FormSpec>,
    answers: AnswerStore,
    state: FlowState,
}

impl FlowController {
    /// Starts a fresh session over `spec`, rejecting specs that fail [`FormSpec::check`].
    pub fn new(spec: Arc<FormSpec>) -> Result<Self, SpecError> {
        Self::with_answers(spec, AnswerStore::new())
    }

    /// Starts a session with answers collected elsewhere.
    pub fn with_answers(spec: Arc<FormSpec>, answers: AnswerStore) -> Result<Self, SpecError> {
        spec.check()?;
        Ok(Self {
            spec,
            answers,
            state: FlowState::default(),
        })
    }

    pub fn spec(&self) -> &FormSpec {
        &self.spec
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn error(&self) -> Option<&FlowError> {
        self.state.error.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.state.phase == Phase::Submitting
    }

    pub fn is_first(&self) -> bool {
        self.state.current_index == 0
    }

    pub fn is_last(&self) -> bool {
        self.state.current_index + 1 >= self.spec.questions.len()
    }

    pub fn progress_fraction(&self) -> f64 {
        (self.state.current_index + 1) as f64 / self.spec.questions.len() as f64
    }

    pub fn current_question(&self) -> &QuestionSpec {
        &self.spec.questions[self.state.current_index]
    }

    pub fn answer_set(&self) -> AnswerSet {
        AnswerSet::new(&self.spec, self.answers.clone())
    }

    /// Records raw input for the current question and clears the error.
    pub fn answer(&mut self, raw: &str) -> AnswerOutcome {
        if self.state.phase != Phase::Answering {
            return AnswerOutcome {
                recorded: false,
                auto_advance: false,
            };
        }

        let question = &self.spec.questions[self.state.current_index];
        self.answers.set_raw(question, raw);
        self.state.error = None;

        let auto_advance =
            question.kind == QuestionKind::Select && question.match_option(raw).is_some();
        debug!(question = %question.id, auto_advance, "answer recorded");
        AnswerOutcome {
            recorded: true,
            auto_advance,
        }
    }

    /// Validates the current answer and moves forward or into submission.
    pub fn advance(&mut self) -> Transition {
        if self.state.phase != Phase::Answering {
            return Transition::Ignored;
        }

        let question = &self.spec.questions[self.state.current_index];
        if let Err(err) = validate_answer(question, self.answers.get(&question.id)) {
            debug!(question = %question.id, code = err.code(), "advance blocked");
            let err = FlowError::from(err);
            self.state.error = Some(err.clone());
            return Transition::Blocked(err);
        }

        self.state.error = None;
        if self.is_last() {
            info!(form = %self.spec.id, "all questions answered, submitting");
            self.state.phase = Phase::Submitting;
            return Transition::SubmitRequested;
        }

        let from = self.state.current_index;
        self.state.current_index += 1;
        debug!(from, to = from + 1, "advanced");
        Transition::Moved { from, to: from + 1 }
    }

    /// Steps back one question without validating anything.
    pub fn retreat(&mut self) -> Transition {
        if self.state.phase != Phase::Answering || self.state.current_index == 0 {
            return Transition::Ignored;
        }
        let from = self.state.current_index;
        self.state.current_index -= 1;
        self.state.error = None;
        debug!(from, to = from - 1, "retreated");
        Transition::Moved { from, to: from - 1 }
    }

    /// Leaves `Submitting` once the submission step has settled.
    pub fn finish_submission(
        &mut self,
        result: Result<(), SubmissionError>,
        policy: SubmitFailurePolicy,
    ) -> Phase {
        if self.state.phase != Phase::Submitting {
            return self.state.phase;
        }
        match (result, policy) {
            (Ok(()), _) => {
                info!(form = %self.spec.id, "submission complete");
                self.state.phase = Phase::Done;
            }
            (Err(err), SubmitFailurePolicy::BestEffort) => {
                warn!(error = %err, "submission failed, finishing anyway");
                self.state.phase = Phase::Done;
            }
            (Err(err), SubmitFailurePolicy::Surface) => {
                warn!(error = %err, "submission failed");
                self.state.phase = Phase::Answering;
                self.state.error = Some(FlowError::Submission(err));
            }
        }
        self.state.phase
    }

    /// Discards answers and position, as when a new session starts.
    pub fn reset(&mut self) {
        self.answers.clear();
        self.state = FlowState::default();
    }

    /// Derived state for the presentation surface.
    pub fn view(&self) -> FlowView {
        let mut view = build_view(&self.spec, &self.answers, self.state.current_index);
        view.error = self.state.error.as_ref().map(ToString::to_string);
        view.is_submitting = self.is_submitting();
        view.status = match self.state.phase {
            Phase::Answering => RenderStatus::NeedInput,
            Phase::Submitting => RenderStatus::Submitting,
            Phase::Done => RenderStatus::Complete,
        };
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_spec::{ValidationError, scholarship_form};

    fn controller() -> FlowController {
        FlowController::new(Arc::new(scholarship_form())).expect("built-in form is valid")
    }

    /// Answers the first `count` questions with valid values, advancing after each.
    fn walk_to(flow: &mut FlowController, count: usize) {
        let valid = ["Senior", "CS", "3.7", "Yes"];
        for raw in valid.iter().take(count) {
            flow.answer(raw);
            assert!(matches!(
                flow.advance(),
                Transition::Moved { .. } | Transition::SubmitRequested
            ));
        }
    }

    #[test]
    fn advance_moves_forward_from_every_non_last_index() {
        for index in 0..3 {
            let mut flow = controller();
            walk_to(&mut flow, index);
            flow.answer(["Senior", "CS", "3.7"][index]);
            assert_eq!(
                flow.advance(),
                Transition::Moved {
                    from: index,
                    to: index + 1
                }
            );
        }
    }

    #[test]
    fn advance_from_last_index_requests_submission() {
        let mut flow = controller();
        walk_to(&mut flow, 3);
        flow.answer("No");
        assert_eq!(flow.advance(), Transition::SubmitRequested);
        assert!(flow.is_submitting());
        assert_eq!(flow.current_index(), 3);
    }

    #[test]
    fn retreat_undoes_advance_but_keeps_answers() {
        let mut flow = controller();
        walk_to(&mut flow, 2);
        assert_eq!(flow.retreat(), Transition::Moved { from: 2, to: 1 });
        assert_eq!(flow.current_index(), 1);
        assert_eq!(flow.answers().get("major").map(ToString::to_string), Some("CS".into()));
    }

    #[test]
    fn retreat_on_first_question_is_ignored() {
        let mut flow = controller();
        assert_eq!(flow.retreat(), Transition::Ignored);
        assert_eq!(flow.current_index(), 0);
    }

    #[test]
    fn retreat_skips_validation_of_previous_answer() {
        let mut flow = controller();
        walk_to(&mut flow, 2);
        flow.answer("not a number");
        assert_eq!(flow.retreat(), Transition::Moved { from: 2, to: 1 });
        assert!(flow.error().is_none());
    }

    #[test]
    fn progress_moves_by_one_step() {
        let mut flow = controller();
        let step = 1.0 / 4.0;
        assert_eq!(flow.progress_fraction(), step);
        walk_to(&mut flow, 2);
        assert_eq!(flow.progress_fraction(), 3.0 * step);
        flow.retreat();
        assert_eq!(flow.progress_fraction(), 2.0 * step);
    }

    #[test]
    fn repeated_invalid_advance_is_idempotent() {
        let mut flow = controller();
        walk_to(&mut flow, 2);
        flow.answer("5.0");
        let first = flow.advance();
        let second = flow.advance();
        assert_eq!(first, second);
        assert!(matches!(first, Transition::Blocked(_)));
        assert_eq!(flow.current_index(), 2);
    }

    #[test]
    fn answering_clears_the_error() {
        let mut flow = controller();
        walk_to(&mut flow, 1);
        flow.answer("a");
        let Transition::Blocked(err) = flow.advance() else {
            panic!("expected blocked advance");
        };
        assert_eq!(err.validation().map(ValidationError::code), Some("min_length"));
        assert!(flow.view().error.is_some());

        flow.answer("ab");
        assert!(flow.error().is_none());
    }

    #[test]
    fn empty_text_is_missing() {
        let mut flow = controller();
        walk_to(&mut flow, 1);
        flow.answer("");
        let Transition::Blocked(FlowError::Validation(err)) = flow.advance() else {
            panic!("expected blocked advance");
        };
        assert_eq!(err.code(), "missing");
    }

    #[test]
    fn select_answers_request_auto_advance_only_for_known_options() {
        let mut flow = controller();
        assert!(flow.answer("senior").auto_advance);
        assert!(!flow.answer("Postdoc").auto_advance);
        flow.answer("Senior");
        flow.advance();
        assert!(!flow.answer("Physics").auto_advance);
    }

    #[test]
    fn navigation_is_ignored_while_submitting() {
        let mut flow = controller();
        walk_to(&mut flow, 3);
        flow.answer("Yes");
        assert_eq!(flow.advance(), Transition::SubmitRequested);
        assert_eq!(flow.advance(), Transition::Ignored);
        assert_eq!(flow.retreat(), Transition::Ignored);
        assert!(!flow.answer("No").recorded);
    }

    #[test]
    fn surfaced_submission_failure_allows_retry() {
        let mut flow = controller();
        walk_to(&mut flow, 4);
        let phase = flow.finish_submission(
            Err(SubmissionError::Rejected("offline".into())),
            SubmitFailurePolicy::Surface,
        );
        assert_eq!(phase, Phase::Answering);
        assert!(matches!(flow.error(), Some(FlowError::Submission(_))));
        assert_eq!(flow.advance(), Transition::SubmitRequested);
        assert_eq!(
            flow.finish_submission(Ok(()), SubmitFailurePolicy::Surface),
            Phase::Done
        );
        assert_eq!(flow.view().status, RenderStatus::Complete);
    }

    #[test]
    fn best_effort_submission_failure_still_finishes() {
        let mut flow = controller();
        walk_to(&mut flow, 4);
        let phase = flow.finish_submission(
            Err(SubmissionError::Aborted),
            SubmitFailurePolicy::BestEffort,
        );
        assert_eq!(phase, Phase::Done);
        assert!(flow.error().is_none());
    }

    #[test]
    fn reset_clears_answers_and_position() {
        let mut flow = controller();
        walk_to(&mut flow, 2);
        flow.reset();
        assert_eq!(flow.current_index(), 0);
        assert!(flow.answers().is_empty());
        assert_eq!(flow.phase(), Phase::Answering);
    }

    #[test]
    fn malformed_spec_is_rejected_up_front() {
        let mut spec = scholarship_form();
        spec.questions.clear();
        let err = FlowController::new(Arc::new(spec)).unwrap_err();
        assert_eq!(err, SpecError::Empty("scholarship-intake".into()));
    }
}
