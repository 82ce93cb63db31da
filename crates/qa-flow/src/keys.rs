//! Keyboard subscription owned by a session.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::session::Intent;

/// Key presses observed by the presentation surface, whatever has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Char(char),
}

/// Source of key presses; `None` means the source is exhausted.
#[async_trait]
pub trait KeySource: Send + 'static {
    async fn next_key(&mut self) -> Option<Key>;
}

#[async_trait]
impl KeySource for mpsc::UnboundedReceiver<Key> {
    async fn next_key(&mut self) -> Option<Key> {
        self.recv().await
    }
}

#[async_trait]
impl KeySource for mpsc::Receiver<Key> {
    async fn next_key(&mut self) -> Option<Key> {
        self.recv().await
    }
}

/// Listener task forwarding confirm keys into the session inbox.
///
/// Released exactly once: either explicitly on teardown or on drop.
pub(crate) struct KeySubscription {
    task: Option<JoinHandle<()>>,
}

impl KeySubscription {
    pub(crate) fn spawn(
        mut source: Box<dyn KeySource>,
        inbox: mpsc::UnboundedSender<Intent>,
    ) -> Self {
        let task = tokio::spawn(async move {
            while let Some(key) = source.next_key().await {
                trace!(?key, "key pressed");
                if key != Key::Enter {
                    continue;
                }
                if inbox.send(Intent::ConfirmKeyPressed).is_err() {
                    break;
                }
            }
        });
        Self { task: Some(task) }
    }

    /// A subscription that listens to nothing.
    pub(crate) fn none() -> Self {
        Self { task: None }
    }

    pub(crate) fn release(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("releasing key subscription");
            task.abort();
        }
    }
}

impl Drop for KeySubscription {
    fn drop(&mut self) {
        self.release();
    }
}
