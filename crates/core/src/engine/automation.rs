//! Automation runner: replays a saved list of prompts.
//!
//! Finite lists are drained in order, each prompt running to completion before
//! the next is taken. Infinite lists rotate each dispatched prompt to the tail
//! and pause between dispatches until stopped.

use async_trait::async_trait;
use cf_protocol::automation_models::AutomationQueue;
use cf_protocol::ipc::Event;
use cf_protocol::run_models::Run;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Something that can execute one prompt as a full run.
#[async_trait]
pub trait PromptDispatcher: Send + Sync {
    /// Run `prompt` to completion. Returns `None` if the run could not start.
    async fn dispatch(&self, prompt: String, cancel: CancellationToken) -> Option<Run>;
}

/// Drives an [`AutomationQueue`] through a [`PromptDispatcher`].
pub struct AutomationRunner {
    queue: Arc<Mutex<AutomationQueue>>,
    delay: Duration,
}

impl AutomationRunner {
    /// Create a runner.
    ///
    /// # Arguments
    ///
    /// * `queue` - Prompts to replay
    /// * `delay` - Pause between infinite-loop dispatches
    pub fn new(queue: AutomationQueue, delay: Duration) -> Self {
        Self {
            queue: Arc::new(Mutex::new(queue)),
            delay,
        }
    }

    /// Shared handle to the live queue.
    pub fn queue(&self) -> Arc<Mutex<AutomationQueue>> {
        Arc::clone(&self.queue)
    }

    /// Prompts still queued, head first.
    pub async fn pending(&self) -> Vec<String> {
        self.queue.lock().await.pending()
    }

    /// Dispatch prompts until the queue drains or `stop` is cancelled.
    ///
    /// `stop` is checked before every dequeue and also ends the wait between
    /// infinite-loop dispatches. A run already in flight is allowed to finish;
    /// it only sees cancellation through `cancel`.
    ///
    /// # Returns
    ///
    /// The number of prompts dispatched.
    pub async fn run(
        &self,
        dispatcher: &dyn PromptDispatcher,
        stop: &CancellationToken,
        cancel: &CancellationToken,
        events_tx: &Sender<Event>,
    ) -> usize {
        let mut dispatched = 0;

        loop {
            if stop.is_cancelled() {
                break;
            }

            let (prompt, infinite) = {
                let mut queue = self.queue.lock().await;
                match queue.next_prompt() {
                    Some(prompt) => (prompt, queue.infinite_loop),
                    None => break,
                }
            };

            dispatched += 1;
            tracing::info!(iteration = dispatched, infinite, "dispatching automation prompt");
            let _ = events_tx
                .send(Event::AutomationDispatched {
                    prompt: prompt.clone(),
                    iteration: dispatched,
                })
                .await;

            if dispatcher.dispatch(prompt, cancel.child_token()).await.is_none() {
                tracing::warn!(iteration = dispatched, "automation prompt could not start a run");
            }

            if infinite {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }
        }

        tracing::info!(dispatched, "automation stopped");
        let _ = events_tx.send(Event::AutomationStopped { dispatched }).await;
        dispatched
    }
}
