//! Common test utilities shared by the integration suites.
//!
//! This module provides:
//! - Fixtures (settings, scripted transports, canned replies)
//! - Event assertions

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
