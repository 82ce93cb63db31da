//! Event loop driving a [`FlowController`].
//!
//! ```text
//! SessionHandle ── Intent ──> inbox ─┐
//! KeySubscription ── Confirm ──> ────┤      SessionRunner (tokio::spawn)
//!                                    ├──> select! { cancel, submission, auto-advance, inbox }
//!                                    │         └── watch<FlowView> ──> presentation surface
//! ```
//!
//! Every event runs to completion before the next one is polled, so the
//! controller never sees overlapping mutation.

use std::future;
use std::pin::Pin;
use std::sync::Arc;

use qa_spec::{AnswerSet, AnswerStore, FlowView, FormSpec, SpecError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Sleep, sleep};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::config::FlowConfig;
use crate::controller::{FlowController, Phase, Transition};
use crate::error::{SessionError, SubmissionError};
use crate::keys::{KeySource, KeySubscription};
use crate::submit::{SimulatedSubmitter, Submitter};

/// User intents reported by the presentation surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    AnswerChanged(String),
    AdvanceRequested,
    RetreatRequested,
    ConfirmKeyPressed,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Submitted,
    /// Finished under the best-effort policy although the submission failed.
    SubmittedWithError(SubmissionError),
    /// Torn down before the submission completed.
    TornDown,
}

/// Summary returned once the session task has stopped.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub answers: AnswerSet,
    pub outcome: SessionOutcome,
    /// Number of times the submission step was started.
    pub submissions: usize,
}

pub struct Session;

impl Session {
    pub fn builder(spec: Arc<FormSpec>) -> SessionBuilder {
        SessionBuilder {
            spec,
            answers: AnswerStore::new(),
            config: FlowConfig::default(),
            submitter: Arc::new(SimulatedSubmitter::default()),
            keys: None,
        }
    }
}

pub struct SessionBuilder {
    spec: Arc<FormSpec>,
    answers: AnswerStore,
    config: FlowConfig,
    submitter: Arc<dyn Submitter>,
    keys: Option<Box<dyn KeySource>>,
}

impl SessionBuilder {
    pub fn config(mut self, config: FlowConfig) -> Self {
        self.config = config;
        self
    }

    /// Pre-populates the answer store.
    pub fn answers(mut self, answers: AnswerStore) -> Self {
        self.answers = answers;
        self
    }

    pub fn submitter(mut self, submitter: Arc<dyn Submitter>) -> Self {
        self.submitter = submitter;
        self
    }

    /// Keyboard source subscribed to for the lifetime of the session.
    pub fn keys(mut self, keys: impl KeySource) -> Self {
        self.keys = Some(Box::new(keys));
        self
    }

    /// Starts the session task. Must be called from within a tokio runtime.
    pub fn spawn(self) -> Result<SessionHandle, SpecError> {
        let controller = FlowController::with_answers(self.spec, self.answers)?;
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(controller.view());
        let cancel = CancellationToken::new();
        let keys = match self.keys {
            Some(source) => KeySubscription::spawn(source, inbox_tx.clone()),
            None => KeySubscription::none(),
        };

        info!(form = %controller.spec().id, questions = controller.spec().len(), "session started");
        let runner = SessionRunner {
            controller,
            config: self.config,
            submitter: self.submitter,
            inbox: inbox_rx,
            view_tx,
            cancel: cancel.clone(),
            keys,
            auto_advance: None,
            submission: None,
            submissions: 0,
            events_handled: 0,
            last_failure: None,
        };
        let task = tokio::spawn(runner.run());

        Ok(SessionHandle {
            inbox: inbox_tx,
            view: view_rx,
            guard: cancel.clone().drop_guard(),
            cancel,
            task,
        })
    }
}

/// Owner side of a running session. Dropping it tears the session down.
pub struct SessionHandle {
    inbox: mpsc::UnboundedSender<Intent>,
    view: watch::Receiver<FlowView>,
    cancel: CancellationToken,
    task: JoinHandle<SessionReport>,
    guard: DropGuard,
}

impl SessionHandle {
    pub fn send(&self, intent: Intent) -> Result<(), SessionError> {
        self.inbox.send(intent).map_err(|_| SessionError::Closed)
    }

    pub fn answer(&self, raw: impl Into<String>) -> Result<(), SessionError> {
        self.send(Intent::AnswerChanged(raw.into()))
    }

    pub fn advance(&self) -> Result<(), SessionError> {
        self.send(Intent::AdvanceRequested)
    }

    pub fn retreat(&self) -> Result<(), SessionError> {
        self.send(Intent::RetreatRequested)
    }

    pub fn confirm(&self) -> Result<(), SessionError> {
        self.send(Intent::ConfirmKeyPressed)
    }

    /// Latest published view.
    pub fn current(&self) -> FlowView {
        self.view.borrow().clone()
    }

    /// Receiver for view updates, for presentation surfaces.
    pub fn subscribe(&self) -> watch::Receiver<FlowView> {
        self.view.clone()
    }

    /// Waits until a published view satisfies `predicate`.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&FlowView) -> bool,
    ) -> Result<FlowView, SessionError> {
        let mut view = self.view.clone();
        let result = view.wait_for(predicate).await;
        result
            .map(|view| view.clone())
            .map_err(|_| SessionError::Closed)
    }

    /// Waits for the session to finish on its own.
    pub async fn join(self) -> Result<SessionReport, SessionError> {
        let SessionHandle {
            inbox,
            view,
            cancel,
            task,
            guard,
        } = self;
        let report = task.await?;
        drop((inbox, view, cancel, guard));
        Ok(report)
    }

    /// Stops the session, cancelling any pending timer or submission.
    pub async fn teardown(self) -> Result<SessionReport, SessionError> {
        self.cancel.cancel();
        self.join().await
    }
}

struct AutoAdvance {
    sleep: Pin<Box<Sleep>>,
    index: usize,
}

struct SessionRunner {
    controller: FlowController,
    config: FlowConfig,
    submitter: Arc<dyn Submitter>,
    inbox: mpsc::UnboundedReceiver<Intent>,
    view_tx: watch::Sender<FlowView>,
    cancel: CancellationToken,
    keys: KeySubscription,
    auto_advance: Option<AutoAdvance>,
    submission: Option<JoinHandle<Result<(), SubmissionError>>>,
    submissions: usize,
    events_handled: u64,
    last_failure: Option<SubmissionError>,
}

impl SessionRunner {
    async fn run(mut self) -> SessionReport {
        let outcome = loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break SessionOutcome::TornDown,

                result = wait_submission(&mut self.submission) => {
                    self.finish_submission(result);
                }

                index = wait_auto_advance(&mut self.auto_advance) => {
                    self.fire_auto_advance(index);
                }

                intent = self.inbox.recv() => match intent {
                    Some(intent) => {
                        self.handle(intent);
                        self.events_handled += 1;
                    }
                    None => break SessionOutcome::TornDown,
                },
            }

            self.publish();
            if self.controller.phase() == Phase::Done {
                break match self.last_failure.take() {
                    Some(err) => SessionOutcome::SubmittedWithError(err),
                    None => SessionOutcome::Submitted,
                };
            }
        };

        self.shutdown(&outcome);
        SessionReport {
            answers: self.controller.answer_set(),
            outcome,
            submissions: self.submissions,
        }
    }

    fn handle(&mut self, intent: Intent) {
        debug!(?intent, index = self.controller.current_index(), "intent");
        match intent {
            Intent::AnswerChanged(raw) => {
                let outcome = self.controller.answer(&raw);
                if !outcome.recorded {
                    return;
                }
                self.auto_advance = None;
                if outcome.auto_advance
                    && let Some(delay) = self.config.auto_advance_delay()
                {
                    self.auto_advance = Some(AutoAdvance {
                        sleep: Box::pin(sleep(delay)),
                        index: self.controller.current_index(),
                    });
                }
            }
            Intent::AdvanceRequested => self.advance(),
            Intent::ConfirmKeyPressed => {
                if self.controller.is_submitting() {
                    debug!("confirm key ignored while submitting");
                } else {
                    self.advance();
                }
            }
            Intent::RetreatRequested => {
                self.auto_advance = None;
                self.controller.retreat();
            }
        }
    }

    fn advance(&mut self) {
        self.auto_advance = None;
        if self.controller.advance() == Transition::SubmitRequested {
            self.start_submission();
        }
    }

    fn fire_auto_advance(&mut self, index: usize) {
        if self.controller.phase() == Phase::Answering && self.controller.current_index() == index
        {
            debug!(index, "auto-advancing");
            self.advance();
        } else {
            debug!(index, "stale auto-advance dropped");
        }
    }

    fn start_submission(&mut self) {
        if self.submission.is_some() {
            return;
        }
        self.submissions += 1;
        let submitter = Arc::clone(&self.submitter);
        let answers = self.controller.answer_set();
        info!(attempt = self.submissions, "starting submission");
        self.submission = Some(tokio::spawn(
            async move { submitter.submit(&answers).await },
        ));
    }

    fn finish_submission(&mut self, result: Result<(), SubmissionError>) {
        self.last_failure = result.as_ref().err().cloned();
        self.controller
            .finish_submission(result, self.config.on_submit_failure);
    }

    fn publish(&self) {
        let mut view = self.controller.view();
        view.auto_advance_pending = self.auto_advance.is_some();
        view.events_handled = self.events_handled;
        self.view_tx.send_replace(view);
    }

    fn shutdown(&mut self, outcome: &SessionOutcome) {
        if let Some(task) = self.submission.take() {
            warn!("session ended with a submission in flight; aborting it");
            task.abort();
        }
        self.auto_advance = None;
        self.keys.release();
        self.publish();
        info!(?outcome, "session finished");
    }
}

async fn wait_submission(
    slot: &mut Option<JoinHandle<Result<(), SubmissionError>>>,
) -> Result<(), SubmissionError> {
    let joined = match slot.as_mut() {
        Some(task) => task.await,
        None => future::pending().await,
    };
    *slot = None;
    joined.unwrap_or_else(|err| {
        warn!(error = %err, "submission task did not complete");
        Err(SubmissionError::Aborted)
    })
}

async fn wait_auto_advance(slot: &mut Option<AutoAdvance>) -> usize {
    let index = match slot.as_mut() {
        Some(pending) => {
            pending.sleep.as_mut().await;
            pending.index
        }
        None => future::pending().await,
    };
    *slot = None;
    index
}
