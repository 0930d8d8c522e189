//! Workflow orchestration engine.
//!
//! The Orchestrator takes one prompt, decides how many sequential model calls
//! it needs and drives them, reporting progress as [`Event`]s over a channel.
//! Two run modes exist:
//!
//! - simple: plan, N generation steps, optional auto-debug ([`simple`])
//! - structured: chat, think, code x N, debug ([`workflow`])
//!
//! Saved prompt lists are replayed by the [`automation`] runner.

pub mod automation;
pub mod error;
pub mod settings;
mod simple;
mod workflow;

pub use automation::{AutomationRunner, PromptDispatcher};
pub use error::OrchestratorError;
pub use settings::OrchestratorSettings;

use crate::parser::{self, ParsedResponse};
use crate::prompts;
use crate::security;
use crate::state::run::{
    announce_run, cancel_run, complete_run, create_run, fail_run, post_message, record_step,
    transition,
};
use crate::transport::{ChatMode, ChatRequest, Transport, TransportError};
use crate::vector::VectorSearch;
use cf_protocol::ipc::{Event, MessageRole};
use cf_protocol::run_models::{Run, RunMode, RunStatus, StepResult, StepRole};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

/// The main workflow orchestrator.
///
/// Holds the transport (already wrapped for retries by the caller) and an
/// optional vector searcher. Only one run dispatches at a time; a second call
/// while one is in flight fails with [`OrchestratorError::Busy`].
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    searcher: Option<Arc<dyn VectorSearch>>,
    processing: AtomicBool,
}

/// Clears the processing flag when a run ends, however it ends.
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Orchestrator {
    /// Create a new Orchestrator.
    ///
    /// # Arguments
    ///
    /// * `transport` - Transport every model call goes through
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            searcher: None,
            processing: AtomicBool::new(false),
        }
    }

    /// Attach a vector searcher used to add examples to the first simple-mode step.
    pub fn with_vector_search(mut self, searcher: Arc<dyn VectorSearch>) -> Self {
        self.searcher = Some(searcher);
        self
    }

    /// Whether a run is currently dispatching.
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Result<ProcessingGuard<'_>, OrchestratorError> {
        self.processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| OrchestratorError::Busy)?;
        Ok(ProcessingGuard(&self.processing))
    }

    /// Execute one prompt and return the final Run state.
    ///
    /// This is the main entry point. It:
    /// 1. Creates a new Run in the mode the settings select
    /// 2. Emits RunStarted
    /// 3. Fails fast when no provider is configured
    /// 4. Drives the simple or structured sequence
    /// 5. Returns the Run in a terminal status
    ///
    /// Model-call failures do not surface as `Err`; they end the run in
    /// `Error` status with partial results kept.
    ///
    /// # Arguments
    ///
    /// * `prompt` - The user's prompt
    /// * `settings` - Snapshot of the user's choices for this run
    /// * `cancel` - Checked before every step; cancelling ends the run as Cancelled
    /// * `events_tx` - Channel for progress events
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Busy`] if another run is in flight.
    pub async fn run(
        &self,
        prompt: &str,
        settings: &OrchestratorSettings,
        cancel: &CancellationToken,
        events_tx: Sender<Event>,
    ) -> Result<Run, OrchestratorError> {
        let _guard = self.acquire()?;

        let mut run = create_run(prompt.to_string(), settings.run_mode());
        tracing::info!(run_id = %run.id, mode = ?run.mode, "starting run");
        announce_run(&run, &events_tx).await;

        if !self.ensure_configured(&mut run, &events_tx).await {
            return Ok(run);
        }

        match run.mode {
            RunMode::Simple => self.run_simple(&mut run, settings, cancel, &events_tx).await,
            RunMode::Structured => {
                self.run_structured(&mut run, settings, cancel, &events_tx)
                    .await
            }
        }

        Ok(run)
    }

    /// Run a single debug call over `code` as its own Run.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Busy`] if another run is in flight, or
    /// [`OrchestratorError::NothingToDebug`] if `code` is blank.
    pub async fn debug_code(
        &self,
        code: &str,
        settings: &OrchestratorSettings,
        cancel: &CancellationToken,
        events_tx: Sender<Event>,
    ) -> Result<Run, OrchestratorError> {
        if code.trim().is_empty() {
            return Err(OrchestratorError::NothingToDebug);
        }
        let _guard = self.acquire()?;

        let mut run = create_run(code.to_string(), RunMode::Simple);
        run.accumulated_code = code.to_string();
        announce_run(&run, &events_tx).await;

        if !self.ensure_configured(&mut run, &events_tx).await {
            return Ok(run);
        }
        if cancel.is_cancelled() {
            cancel_run(&mut run, &events_tx).await;
            return Ok(run);
        }

        transition(&mut run, RunStatus::Debugging, &events_tx).await;
        let message = prompts::with_system_prompt(
            settings.system_prompt.as_deref(),
            &prompts::snippet_debug_prompt(code),
        );
        match self.call(message, ChatMode::Debug, settings).await {
            Ok(parsed) => {
                run.debugged = true;
                self.report_debug(&mut run, &parsed, &events_tx).await;
                complete_run(&mut run, parsed.code, &events_tx).await;
            }
            Err(e) => fail_run(&mut run, &events_tx, e.to_string()).await,
        }
        Ok(run)
    }

    async fn ensure_configured(&self, run: &mut Run, events_tx: &Sender<Event>) -> bool {
        if self.transport.is_configured().await {
            return true;
        }
        fail_run(run, events_tx, TransportError::NotConfigured.to_string()).await;
        false
    }

    /// Send one message and parse the reply.
    async fn call(
        &self,
        message: String,
        mode: ChatMode,
        settings: &OrchestratorSettings,
    ) -> Result<ParsedResponse, TransportError> {
        let request = ChatRequest::new(message, mode)
            .with_session(settings.session_id.clone())
            .with_validation_score(settings.validation_score)
            .with_model(settings.model_id());
        let raw = self.transport.chat(&request).await?;
        Ok(parser::parse(&raw))
    }

    /// Record a reply as the run's next step.
    async fn push_step(
        &self,
        run: &mut Run,
        role: StepRole,
        parsed: &ParsedResponse,
        events_tx: &Sender<Event>,
    ) {
        let step = StepResult {
            step_index: run.steps.len(),
            role,
            raw_text: parsed.response.clone(),
            extracted_code: parsed.code.clone(),
            code_chunks: parsed.code_chunks.clone(),
        };
        record_step(run, step, events_tx).await;
    }

    /// Record a debug reply and emit it.
    async fn report_debug(&self, run: &mut Run, parsed: &ParsedResponse, events_tx: &Sender<Event>) {
        self.push_step(run, StepRole::Debug, parsed, events_tx).await;
        if let Some(code) = &parsed.code {
            self.scan(run, code, events_tx).await;
        }
        let _ = events_tx
            .send(Event::DebugResponse {
                run_id: run.id,
                response: parsed.response.clone(),
                code: parsed.code.clone(),
            })
            .await;
        post_message(run, events_tx, MessageRole::Assistant, parsed.response.clone()).await;
    }

    /// Warn the host about unsafe constructs in generated code.
    async fn scan(&self, run: &Run, code: &str, events_tx: &Sender<Event>) {
        let report = security::scan_code(code);
        if report.is_safe() {
            return;
        }
        tracing::warn!(run_id = %run.id, warnings = report.warnings.len(), "generated code matched unsafe patterns");
        let _ = events_tx
            .send(Event::SecurityWarning {
                run_id: run.id,
                warnings: report.warnings,
            })
            .await;
    }
}
