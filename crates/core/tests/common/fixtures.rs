//! Test fixtures for orchestrator and session tests.

#![allow(dead_code)]

use async_trait::async_trait;
use cf_core::engine::OrchestratorSettings;
use cf_core::transport::{ChatMode, ChatRequest, MockTransport, Transport, TransportError};
use cf_protocol::config_models::ModuleId;
use cf_protocol::ipc::Event;
use std::time::Duration;
use tokio::sync::mpsc;

/// Settings with every module of the structured workflow enabled.
pub fn structured_settings() -> OrchestratorSettings {
    OrchestratorSettings {
        modules: vec![ModuleId::Chat, ModuleId::Think, ModuleId::Code, ModuleId::Debug],
        ..OrchestratorSettings::default()
    }
}

/// Settings for simple mode with no delay between automation dispatches.
pub fn simple_settings() -> OrchestratorSettings {
    OrchestratorSettings {
        modules: vec![ModuleId::Code, ModuleId::Debug],
        automation_delay: Duration::ZERO,
        ..OrchestratorSettings::default()
    }
}

/// A planner reply asking for `steps` steps.
pub fn plan_reply(steps: usize) -> String {
    format!("Sure. {{\"tokenLimit\": 2000, \"steps\": {steps}}}")
}

/// A reply with prose followed by one fenced block.
pub fn code_reply(text: &str, lang: &str, code: &str) -> String {
    format!("{text}\n\n```{lang}\n{code}\n```")
}

/// Forty 23-character lines, about nine hundred and sixty characters in total.
pub fn fibonacci_source() -> String {
    (0..40)
        .map(|i| format!("let f{i:02} = fib_iter({i:02});"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A transport answering planner calls with `steps` and every other call
/// through `reply`.
pub fn planned_transport<F>(steps: usize, reply: F) -> MockTransport
where
    F: Fn(&ChatRequest) -> Result<String, TransportError> + Send + Sync + 'static,
{
    MockTransport::with_responder(move |request| {
        if request.mode == ChatMode::Query {
            Ok(plan_reply(steps))
        } else {
            reply(request)
        }
    })
}

/// Delays every call to an inner mock, so a run is still in flight when a
/// test acts on it.
pub struct SlowTransport {
    pub inner: MockTransport,
    pub latency: Duration,
}

#[async_trait]
impl Transport for SlowTransport {
    async fn is_configured(&self) -> bool {
        self.inner.is_configured().await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String, TransportError> {
        tokio::time::sleep(self.latency).await;
        self.inner.chat(request).await
    }
}

/// An events channel large enough that no test blocks on it.
pub fn events_channel() -> (mpsc::Sender<Event>, mpsc::Receiver<Event>) {
    mpsc::channel(1000)
}

/// Everything currently buffered in the channel.
pub fn drain(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
