//! Line-oriented surface driving a session from stdin.
//!
//! Each line is interpreted only once the session has processed every
//! event sent so far, so typed-ahead input lands on the question it was
//! meant for.

use std::io::{self, BufRead};
use std::thread;

use qa_flow::{Key, SessionHandle, SessionReport};
use qa_spec::{FlowView, QuestionKind, RenderStatus};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::CliResult;
use crate::wizard::WizardPresenter;

/// What a single input line asks the session to do.
#[derive(Debug, Clone, PartialEq)]
pub enum LineAction {
    /// Answer the current question, optionally followed by the confirm key.
    Answer { raw: String, confirm: bool },
    Confirm,
    Next,
    Back,
    Quit,
    Unknown(String),
}

/// Interprets `line` against the question currently shown.
///
/// Select questions accept an option label or its 1-based number. A
/// recognised option relies on auto-advance when it is enabled; anything
/// else is confirmed right away so the validation error shows up.
pub fn parse_line(line: &str, view: &FlowView, auto_advance: bool) -> LineAction {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineAction::Confirm;
    }
    if let Some(command) = trimmed.strip_prefix(':') {
        return match command {
            "back" | "b" => LineAction::Back,
            "next" | "n" => LineAction::Next,
            "quit" | "q" => LineAction::Quit,
            _ => LineAction::Unknown(trimmed.to_string()),
        };
    }

    match view.question.kind {
        QuestionKind::Select => {
            let options = &view.question.options;
            let chosen = trimmed
                .parse::<usize>()
                .ok()
                .and_then(|number| number.checked_sub(1))
                .and_then(|index| options.get(index))
                .or_else(|| {
                    options
                        .iter()
                        .find(|option| option.eq_ignore_ascii_case(trimmed))
                });
            match chosen {
                Some(option) => LineAction::Answer {
                    raw: option.clone(),
                    confirm: !auto_advance,
                },
                None => LineAction::Answer {
                    raw: trimmed.to_string(),
                    confirm: true,
                },
            }
        }
        QuestionKind::Text | QuestionKind::Number => LineAction::Answer {
            raw: trimmed.to_string(),
            confirm: true,
        },
    }
}

pub struct LineSurface {
    session: SessionHandle,
    keys: mpsc::UnboundedSender<Key>,
    auto_advance: bool,
    sent: u64,
}

impl LineSurface {
    /// `keys` must feed the key source the session was built with.
    pub fn new(session: SessionHandle, keys: mpsc::UnboundedSender<Key>, auto_advance: bool) -> Self {
        Self {
            session,
            keys,
            auto_advance,
            sent: 0,
        }
    }

    pub async fn drive(mut self, presenter: &mut WizardPresenter) -> CliResult<SessionReport> {
        let mut lines = spawn_stdin_reader();

        loop {
            let Some(view) = self.settle(presenter).await else {
                break;
            };
            if view.status == RenderStatus::Complete {
                break;
            }
            presenter.show_view(&view);

            let Some(line) = lines.recv().await else {
                debug!("input closed before completion");
                self.session.teardown().await?;
                return Err("input ended before the questionnaire was complete".into());
            };
            trace!(line = %line, "input line");

            match parse_line(&line, &view, self.auto_advance) {
                LineAction::Answer { raw, confirm } => {
                    self.session.answer(raw)?;
                    self.sent += 1;
                    if confirm {
                        self.press_enter()?;
                    }
                }
                LineAction::Confirm => self.press_enter()?,
                LineAction::Next => {
                    self.session.advance()?;
                    self.sent += 1;
                }
                LineAction::Back => {
                    self.session.retreat()?;
                    self.sent += 1;
                }
                LineAction::Quit => return Ok(self.session.teardown().await?),
                LineAction::Unknown(command) => presenter.show_unknown_command(&command),
            }
        }

        Ok(self.session.join().await?)
    }

    fn press_enter(&mut self) -> CliResult<()> {
        self.keys.send(Key::Enter)?;
        self.sent += 1;
        Ok(())
    }

    /// Waits until every sent event is handled, no auto-advance is pending
    /// and no submission is in flight. `None` once the session has stopped.
    async fn settle(&self, presenter: &mut WizardPresenter) -> Option<FlowView> {
        let sent = self.sent;
        let view = self
            .session
            .wait_for(|view| view.events_handled >= sent && !view.auto_advance_pending)
            .await
            .ok()?;
        if !view.is_submitting {
            return Some(view);
        }
        presenter.show_submitting(&view);
        self.session
            .wait_for(|view| !view.is_submitting)
            .await
            .ok()
    }
}

fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
