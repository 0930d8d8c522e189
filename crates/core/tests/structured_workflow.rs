//! Integration tests for the structured chat, think, code, debug workflow.

mod common;

use common::*;
use cf_core::engine::Orchestrator;
use cf_core::transport::{ChatMode, ChatRequest, MockTransport, TransportError};
use cf_protocol::ipc::Event;
use cf_protocol::run_models::{RunMode, RunStatus, StepRole};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A transport that answers each stage of the workflow.
fn workflow_transport(
    analysis: &'static str,
    code_phases: bool,
    debug_code: Option<&'static str>,
) -> MockTransport {
    let phase = AtomicUsize::new(0);
    MockTransport::with_responder(move |request: &ChatRequest| {
        let reply = match request.mode {
            ChatMode::Chat => "Sure, here is how I would approach it.".to_string(),
            ChatMode::Think => analysis.to_string(),
            ChatMode::Code => {
                let n = phase.fetch_add(1, Ordering::SeqCst) + 1;
                if code_phases {
                    code_reply(&format!("Phase {n}."), "rust", &format!("part{n}"))
                } else {
                    format!("Phase {n} needs no code.")
                }
            }
            ChatMode::Debug => match debug_code {
                Some(code) => code_reply("Looks good after one fix.", "rust", code),
                None => "No issues found.".to_string(),
            },
            ChatMode::Query => return Err(TransportError::InvalidResponse("unexpected".into())),
        };
        Ok(reply)
    })
}

#[tokio::test]
async fn test_recommended_step_count_drives_code_phases() {
    // Given: an analysis recommending four steps
    let mock = workflow_transport("I recommend 4 steps for this.", true, Some("final"));
    let orchestrator = Orchestrator::new(Arc::new(mock.clone()));
    let (tx, mut rx) = events_channel();

    // When
    let run = orchestrator
        .run(
            "build a todo app",
            &structured_settings(),
            &CancellationToken::new(),
            tx,
        )
        .await
        .unwrap();

    // Then: exactly four code phases ran, each reporting four total steps
    assert_eq!(run.mode, RunMode::Structured);
    assert_eq!(run.status, RunStatus::Complete);
    assert_eq!(run.total_steps, 4);
    assert!(run.multi_step_complete);
    assert!(run.debugged);
    assert_eq!(run.accumulated_code, "part1\n\npart2\n\npart3\n\npart4");
    assert_eq!(run.final_code.as_deref(), Some("final"));

    let events = drain(&mut rx);
    let phases: Vec<(usize, usize)> = events
        .iter()
        .filter_map(|e| match e {
            Event::CodeResponse {
                step, total_steps, ..
            } => Some((*step, *total_steps)),
            _ => None,
        })
        .collect();
    assert_eq!(phases, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::ThinkResponse { steps: 4, .. })));
    assert_eq!(
        status_sequence(&events),
        vec![
            RunStatus::Chatting,
            RunStatus::Thinking,
            RunStatus::Generating,
            RunStatus::Debugging,
            RunStatus::Complete,
        ]
    );
    assert_event_sequence(&events);

    let requests = mock.requests();
    let modes: Vec<_> = requests.iter().map(|r| r.mode).collect();
    assert_eq!(
        modes,
        vec![
            ChatMode::Chat,
            ChatMode::Think,
            ChatMode::Code,
            ChatMode::Code,
            ChatMode::Code,
            ChatMode::Code,
            ChatMode::Debug,
        ]
    );
    assert!(requests[2].message.contains("Implement only the first phase"));
    assert!(requests[2].message.contains("I recommend 4 steps for this."));
    assert!(requests[3].message.contains("Here's what we have so far:\n\npart1"));
    assert!(requests[3].message.contains("Now implement phase 2 of the request."));
    assert!(requests[6].message.ends_with("part1\n\npart2\n\npart3\n\npart4"));
}

#[tokio::test]
async fn test_missing_step_count_defaults_to_three() {
    let mock = workflow_transport("Let me think about the pieces.", true, None);
    let orchestrator = Orchestrator::new(Arc::new(mock));
    let (tx, _rx) = events_channel();

    let run = orchestrator
        .run("build it", &structured_settings(), &CancellationToken::new(), tx)
        .await
        .unwrap();

    // Debug found nothing to change, so the accumulated code is final
    assert_eq!(run.total_steps, 3);
    assert_eq!(run.final_code.as_deref(), Some("part1\n\npart2\n\npart3"));
    let roles: Vec<_> = run.steps.iter().map(|s| s.role).collect();
    assert_eq!(
        roles,
        vec![
            StepRole::Chat,
            StepRole::Think,
            StepRole::Code,
            StepRole::Code,
            StepRole::Code,
            StepRole::Debug,
        ]
    );
}

#[tokio::test]
async fn test_no_code_skips_debug() {
    let mock = workflow_transport("2 steps", false, Some("never"));
    let orchestrator = Orchestrator::new(Arc::new(mock.clone()));
    let (tx, mut rx) = events_channel();

    let run = orchestrator
        .run("explain it", &structured_settings(), &CancellationToken::new(), tx)
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Complete);
    assert_eq!(run.final_code, None);
    assert!(!run.debugged);
    assert!(mock.requests().iter().all(|r| r.mode != ChatMode::Debug));
    assert!(drain(&mut rx)
        .iter()
        .any(|e| matches!(e, Event::RunCompleted { final_code: None, .. })));
}

#[tokio::test]
async fn test_stage_failure_stops_workflow() {
    // Given: the think stage is rejected
    let mock = MockTransport::new(vec![
        Ok("Happy to help.".to_string()),
        Err(TransportError::Provider {
            status: 401,
            body: "invalid key".to_string(),
        }),
    ]);
    let orchestrator = Orchestrator::new(Arc::new(mock.clone()));
    let (tx, mut rx) = events_channel();

    // When
    let run = orchestrator
        .run("build it", &structured_settings(), &CancellationToken::new(), tx)
        .await
        .unwrap();

    // Then
    assert_eq!(run.status, RunStatus::Error);
    assert_eq!(run.steps.len(), 1);
    assert_eq!(mock.call_count(), 2);
    let events = drain(&mut rx);
    assert_event_sequence(&events);
    assert!(!has_run_completed(&events));
}

#[tokio::test]
async fn test_cancel_before_debug() {
    // Given: the token is cancelled during the last code phase
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let mock = MockTransport::with_responder(move |request| match request.mode {
        ChatMode::Think => Ok("1 step".to_string()),
        ChatMode::Code => {
            trigger.cancel();
            Ok(code_reply("Done.", "rust", "part1"))
        }
        _ => Ok("ok".to_string()),
    });
    let orchestrator = Orchestrator::new(Arc::new(mock.clone()));
    let (tx, _rx) = events_channel();

    // When
    let run = orchestrator
        .run("build it", &structured_settings(), &cancel, tx)
        .await
        .unwrap();

    // Then: the code is kept and debug is never dispatched
    assert_eq!(run.status, RunStatus::Cancelled);
    assert_eq!(run.accumulated_code, "part1");
    assert!(mock.requests().iter().all(|r| r.mode != ChatMode::Debug));
}
