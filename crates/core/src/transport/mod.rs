//! Transport abstraction to model providers.
//!
//! This module provides the `Transport` trait, the retry wrapper that every
//! orchestrator call goes through, an HTTP implementation and a scripted
//! mock for tests.

pub mod base;
pub mod http;
pub mod mock;
pub mod retry;

pub use base::{ChatMode, ChatRequest, Transport, TransportError};
pub use http::HttpTransport;
pub use mock::MockTransport;
pub use retry::{RetryPolicy, RetryingTransport};
