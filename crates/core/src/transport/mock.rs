//! Mock transport implementation for testing.

use crate::transport::base::{ChatRequest, Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Responder = dyn Fn(&ChatRequest) -> Result<String, TransportError> + Send + Sync;

/// A transport that replays scripted replies and records every request.
///
/// Replies are consumed in order; once the script is exhausted the fallback
/// responder (by default an empty reply) answers every further call.
#[derive(Clone)]
pub struct MockTransport {
    configured: bool,
    replies: Arc<Mutex<VecDeque<Result<String, TransportError>>>>,
    fallback: Arc<Responder>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockTransport {
    pub fn new(replies: Vec<Result<String, TransportError>>) -> Self {
        Self {
            configured: true,
            replies: Arc::new(Mutex::new(replies.into())),
            fallback: Arc::new(|_| Ok(String::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A transport that answers every request through `responder`.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&ChatRequest) -> Result<String, TransportError> + Send + Sync + 'static,
    {
        Self {
            fallback: Arc::new(responder),
            ..Self::new(Vec::new())
        }
    }

    /// A transport with no provider configured.
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new(Vec::new())
        }
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .map(|requests| requests.len())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn is_configured(&self) -> bool {
        self.configured
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String, TransportError> {
        if !self.configured {
            return Err(TransportError::NotConfigured);
        }

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let scripted = self
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front());

        match scripted {
            Some(reply) => reply,
            None => (self.fallback)(request),
        }
    }
}
