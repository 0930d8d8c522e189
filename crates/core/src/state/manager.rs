//! Session manager coordinating runs, automation and user toggles.
//!
//! The SessionManager is what a host talks to. It owns the orchestrator,
//! keeps at most one run active (a new prompt supersedes the current one),
//! remembers the last completed run for rating and debugging, and drives
//! the automation runner in the background.

use crate::engine::{
    AutomationRunner, Orchestrator, OrchestratorError, OrchestratorSettings, PromptDispatcher,
};
use crate::state::error::{SessionError, SessionResult};
use crate::store::records::{Records, MAX_VALIDATION_SCORE};
use async_trait::async_trait;
use cf_protocol::automation_models::AutomationQueue;
use cf_protocol::ipc::{Event, Op};
use cf_protocol::run_models::{InteractionRecord, Run, RunStatus};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// State shared with the background tasks the manager spawns.
struct SessionShared {
    orchestrator: Orchestrator,

    /// Current toggles. Each run takes a snapshot when it starts.
    settings: RwLock<OrchestratorSettings>,

    /// The most recently completed run.
    last_run: Mutex<Option<Run>>,

    /// In-memory interaction log for this session.
    interactions: Mutex<Vec<InteractionRecord>>,

    /// Optional persistent copy of the interaction log.
    records: Option<Records>,

    /// Channel for sending events to the host.
    events_tx: mpsc::Sender<Event>,
}

/// A spawned task's handle. Whoever awaits it holds the lock until the task
/// ends and then clears it, so a finished handle is never polled again.
type TaskSlot<T> = Arc<Mutex<Option<JoinHandle<T>>>>;

struct ActiveRun {
    cancel: CancellationToken,
    handle: TaskSlot<Option<Run>>,
}

struct ActiveAutomation {
    stop: CancellationToken,
    cancel: CancellationToken,
    queue: Arc<Mutex<AutomationQueue>>,
    handle: TaskSlot<usize>,
}

/// Manages the runs of one user session.
pub struct SessionManager {
    shared: Arc<SessionShared>,
    active: Mutex<Option<ActiveRun>>,
    automation: Mutex<Option<ActiveAutomation>>,

    /// Held from superseding the current work until the new task is stored.
    dispatch: Mutex<()>,
}

impl SessionShared {
    /// Run one prompt with a snapshot of the current settings.
    async fn execute(&self, prompt: String, cancel: CancellationToken) -> Option<Run> {
        let settings = self.settings.read().await.clone();
        match self
            .orchestrator
            .run(&prompt, &settings, &cancel, self.events_tx.clone())
            .await
        {
            Ok(run) => {
                self.remember(&run).await;
                Some(run)
            }
            Err(e) => {
                tracing::warn!(error = %e, "run could not start");
                None
            }
        }
    }

    async fn debug(&self, code: String, cancel: CancellationToken) -> Option<Run> {
        let settings = self.settings.read().await.clone();
        match self
            .orchestrator
            .debug_code(&code, &settings, &cancel, self.events_tx.clone())
            .await
        {
            Ok(run) => {
                self.remember(&run).await;
                Some(run)
            }
            Err(e) => {
                tracing::warn!(error = %e, "debug run could not start");
                None
            }
        }
    }

    /// Log a completed run and make it the target of the next rating.
    async fn remember(&self, run: &Run) {
        if run.status != RunStatus::Complete {
            return;
        }

        let record = InteractionRecord {
            run_id: run.id,
            prompt: run.initial_prompt.clone(),
            code: run.visible_code().map(str::to_string),
            validated: false,
            validation_score: 0,
            debugged: run.debugged,
            timestamp: Utc::now(),
        };
        if let Some(records) = &self.records {
            if let Err(e) = records.log_interaction(record.clone()).await {
                tracing::warn!(run_id = %run.id, error = %e, "failed to persist interaction");
            }
        }
        self.interactions.lock().await.push(record);
        *self.last_run.lock().await = Some(run.clone());
    }
}

#[async_trait]
impl PromptDispatcher for SessionShared {
    async fn dispatch(&self, prompt: String, cancel: CancellationToken) -> Option<Run> {
        self.execute(prompt, cancel).await
    }
}

impl SessionManager {
    /// Create a new SessionManager.
    ///
    /// # Arguments
    ///
    /// * `orchestrator` - The orchestrator every run goes through
    /// * `settings` - Initial toggles
    /// * `events_tx` - Channel for sending events to the host
    pub fn new(
        orchestrator: Orchestrator,
        settings: OrchestratorSettings,
        events_tx: mpsc::Sender<Event>,
    ) -> Self {
        Self::build(orchestrator, settings, events_tx, None)
    }

    /// Like [`SessionManager::new`], but also append interactions to `records`.
    pub fn with_records(
        orchestrator: Orchestrator,
        settings: OrchestratorSettings,
        events_tx: mpsc::Sender<Event>,
        records: Records,
    ) -> Self {
        Self::build(orchestrator, settings, events_tx, Some(records))
    }

    fn build(
        orchestrator: Orchestrator,
        settings: OrchestratorSettings,
        events_tx: mpsc::Sender<Event>,
        records: Option<Records>,
    ) -> Self {
        Self {
            shared: Arc::new(SessionShared {
                orchestrator,
                settings: RwLock::new(settings),
                last_run: Mutex::new(None),
                interactions: Mutex::new(Vec::new()),
                records,
                events_tx,
            }),
            active: Mutex::new(None),
            automation: Mutex::new(None),
            dispatch: Mutex::new(()),
        }
    }

    /// Start a run for `prompt` in the background.
    ///
    /// Any active run is cancelled and awaited first, and a running
    /// automation is stopped, so runs never interleave.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt is blank.
    pub async fn submit_prompt(&self, prompt: impl Into<String>) -> SessionResult<()> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(SessionError::EmptyPrompt);
        }

        let _dispatch = self.dispatch.lock().await;
        self.supersede().await;

        let shared = Arc::clone(&self.shared);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { shared.execute(prompt, token).await });
        *self.active.lock().await = Some(ActiveRun {
            cancel,
            handle: Arc::new(Mutex::new(Some(handle))),
        });
        Ok(())
    }

    /// Run a debug pass over `code`, or over the last completed run's code.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no code to debug.
    pub async fn request_debug(&self, code: Option<String>) -> SessionResult<()> {
        let code = match code {
            Some(code) => code,
            None => match self.last_run().await.as_ref().and_then(Run::visible_code) {
                Some(code) => code.to_string(),
                None => return Err(OrchestratorError::NothingToDebug.into()),
            },
        };
        if code.trim().is_empty() {
            return Err(OrchestratorError::NothingToDebug.into());
        }

        let _dispatch = self.dispatch.lock().await;
        self.supersede().await;

        let shared = Arc::clone(&self.shared);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { shared.debug(code, token).await });
        *self.active.lock().await = Some(ActiveRun {
            cancel,
            handle: Arc::new(Mutex::new(Some(handle))),
        });
        Ok(())
    }

    /// Wait for the active run to finish and return it.
    ///
    /// The run stays cancellable while this waits. Only one waiter receives
    /// the run; later calls return `None`.
    pub async fn wait(&self) -> Option<Run> {
        let handle = Arc::clone(&self.active.lock().await.as_ref()?.handle);
        join(&handle).await.flatten()
    }

    /// Stop the active run before its next step.
    pub async fn cancel_run(&self) {
        if let Some(active) = self.active.lock().await.as_ref() {
            tracing::info!("cancelling active run");
            active.cancel.cancel();
        }
    }

    /// Start replaying `prompts` in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if `prompts` is empty.
    pub async fn start_automation(
        &self,
        prompts: Vec<String>,
        infinite_loop: bool,
    ) -> SessionResult<()> {
        if prompts.is_empty() {
            return Err(SessionError::NoPrompts);
        }

        let _dispatch = self.dispatch.lock().await;
        self.supersede().await;

        let delay = self.shared.settings.read().await.automation_delay;
        let runner = AutomationRunner::new(AutomationQueue::new(prompts, infinite_loop), delay);
        let queue = runner.queue();
        let stop = CancellationToken::new();
        let cancel = CancellationToken::new();

        let shared = Arc::clone(&self.shared);
        let (stop_token, cancel_token) = (stop.clone(), cancel.clone());
        let handle = tokio::spawn(async move {
            let events_tx = shared.events_tx.clone();
            runner
                .run(shared.as_ref(), &stop_token, &cancel_token, &events_tx)
                .await
        });

        *self.automation.lock().await = Some(ActiveAutomation {
            stop,
            cancel,
            queue,
            handle: Arc::new(Mutex::new(Some(handle))),
        });
        Ok(())
    }

    /// Stop the automation before its next dispatch. A run in flight finishes.
    pub async fn stop_automation(&self) {
        if let Some(automation) = self.automation.lock().await.as_ref() {
            tracing::info!("stopping automation");
            automation.stop.cancel();
        }
    }

    /// Wait for the automation to exit and return how many prompts it dispatched.
    ///
    /// The automation can still be stopped while this waits.
    pub async fn wait_automation(&self) -> Option<usize> {
        let handle = Arc::clone(&self.automation.lock().await.as_ref()?.handle);
        join(&handle).await
    }

    /// Prompts still queued in the running automation, head first.
    pub async fn automation_pending(&self) -> Vec<String> {
        match self.automation.lock().await.as_ref() {
            Some(automation) => automation.queue.lock().await.pending(),
            None => Vec::new(),
        }
    }

    /// Rate the most recently completed run.
    ///
    /// The score is stored on the run and its interaction record, and is sent
    /// along with later requests. Resubmitting overwrites.
    ///
    /// # Errors
    ///
    /// Returns an error if the score is above 10 or no run has completed yet.
    pub async fn submit_validation_score(&self, score: u8) -> SessionResult<()> {
        if score > MAX_VALIDATION_SCORE {
            return Err(SessionError::InvalidScore(score));
        }

        let run_id = {
            let mut last_run = self.shared.last_run.lock().await;
            let Some(run) = last_run.as_mut() else {
                return Err(SessionError::NothingToRate);
            };
            run.validation_score = Some(score);
            run.id
        };

        if let Some(record) = self
            .shared
            .interactions
            .lock()
            .await
            .iter_mut()
            .rev()
            .find(|record| record.run_id == run_id)
        {
            record.validated = true;
            record.validation_score = score;
        }
        if let Some(records) = &self.shared.records {
            records.score_last_interaction(score).await?;
        }

        self.shared.settings.write().await.validation_score = Some(score);
        tracing::info!(%run_id, score, "run rated");
        Ok(())
    }

    pub async fn set_auto_debug(&self, enabled: bool) {
        self.shared.settings.write().await.auto_debug = enabled;
    }

    pub async fn set_thinking_mode(&self, enabled: bool) {
        self.shared.settings.write().await.thinking_mode = enabled;
    }

    pub async fn set_system_prompt(&self, system_prompt: Option<String>) {
        self.shared.settings.write().await.system_prompt = system_prompt;
    }

    /// A copy of the current toggles.
    pub async fn settings(&self) -> OrchestratorSettings {
        self.shared.settings.read().await.clone()
    }

    pub async fn last_run(&self) -> Option<Run> {
        self.shared.last_run.lock().await.clone()
    }

    pub async fn interactions(&self) -> Vec<InteractionRecord> {
        self.shared.interactions.lock().await.clone()
    }

    pub fn is_processing(&self) -> bool {
        self.shared.orchestrator.is_processing()
    }

    /// Apply one operation from the host.
    ///
    /// # Returns
    ///
    /// `false` once the session has shut down.
    ///
    /// # Errors
    ///
    /// Returns the error of the operation that was applied.
    pub async fn handle_op(&self, op: Op) -> SessionResult<bool> {
        match op {
            Op::SubmitPrompt { prompt } => self.submit_prompt(prompt).await?,
            Op::StartAutomation {
                prompts,
                infinite_loop,
            } => self.start_automation(prompts, infinite_loop).await?,
            Op::StopAutomation => self.stop_automation().await,
            Op::CancelRun => self.cancel_run().await,
            Op::SubmitValidationScore { score } => self.submit_validation_score(score).await?,
            Op::SetAutoDebug { enabled } => self.set_auto_debug(enabled).await,
            Op::SetThinkingMode { enabled } => self.set_thinking_mode(enabled).await,
            Op::RequestDebug { code } => self.request_debug(code).await?,
            Op::Shutdown => {
                self.shutdown().await;
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Cancel the active run and automation and wait for both to end.
    pub async fn shutdown(&self) {
        let _dispatch = self.dispatch.lock().await;
        self.supersede().await;
    }

    async fn supersede(&self) {
        let automation = self.automation.lock().await.take();
        if let Some(automation) = automation {
            automation.stop.cancel();
            automation.cancel.cancel();
            join(&automation.handle).await;
        }

        let active = self.active.lock().await.take();
        if let Some(active) = active {
            active.cancel.cancel();
            join(&active.handle).await;
        }
    }
}

/// Await the task in `slot` unless another caller already has.
async fn join<T>(slot: &Mutex<Option<JoinHandle<T>>>) -> Option<T> {
    let mut slot = slot.lock().await;
    let result = slot.as_mut()?.await;
    *slot = None;
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!(error = %e, "session task failed");
            None
        }
    }
}
