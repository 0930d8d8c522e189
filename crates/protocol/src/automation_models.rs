//! Automation models for `.codeflow/automations/*.yaml` and the runtime queue.
//!
//! An automation is a saved, ordered list of prompts that can be replayed
//! once or looped forever.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use ts_rs::TS;

/// A saved automation.
///
/// # Example
///
/// ```yaml
/// id: nightly-refactor
/// name: Nightly refactor
/// infinite-loop: false
/// prompts:
///   - "Write a fibonacci function"
///   - "Add unit tests for it"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct Automation {
    /// Unique identifier, used for upserts and deletes.
    pub id: String,

    /// Human-readable name shown in the host.
    pub name: String,

    /// Prompts dispatched in order.
    pub prompts: Vec<String>,

    /// Re-queue each prompt after dispatch instead of draining the list.
    #[serde(default)]
    pub infinite_loop: bool,
}

/// Ordered prompt queue consumed by the automation runner.
///
/// With `infinite_loop` set, a dequeued prompt is appended back to the tail,
/// making the queue self-refilling.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
pub struct AutomationQueue {
    #[ts(type = "Array<string>")]
    prompts: VecDeque<String>,
    pub infinite_loop: bool,
}

impl AutomationQueue {
    pub fn new(prompts: Vec<String>, infinite_loop: bool) -> Self {
        Self {
            prompts: prompts.into(),
            infinite_loop,
        }
    }

    /// Take the head prompt, re-appending it to the tail in infinite mode.
    pub fn next_prompt(&mut self) -> Option<String> {
        let prompt = self.prompts.pop_front()?;
        if self.infinite_loop {
            self.prompts.push_back(prompt.clone());
        }
        Some(prompt)
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Remaining prompts in dispatch order.
    pub fn pending(&self) -> Vec<String> {
        self.prompts.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.prompts.clear();
    }
}

impl From<&Automation> for AutomationQueue {
    fn from(automation: &Automation) -> Self {
        AutomationQueue::new(automation.prompts.clone(), automation.infinite_loop)
    }
}
