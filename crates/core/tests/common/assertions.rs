//! Event assertion helpers.

#![allow(dead_code)]

use cf_protocol::ipc::Event;
use cf_protocol::run_models::RunStatus;

pub fn has_run_started(events: &[Event]) -> bool {
    events.iter().any(|e| matches!(e, Event::RunStarted { .. }))
}

pub fn has_run_completed(events: &[Event]) -> bool {
    events.iter().any(|e| matches!(e, Event::RunCompleted { .. }))
}

pub fn has_status_update(events: &[Event], status: RunStatus) -> bool {
    events.iter().any(|e| {
        matches!(
            e,
            Event::RunStatusUpdate { status: s, .. } if *s == status
        )
    })
}

/// Statuses in the order they were reported, without repeats.
pub fn status_sequence(events: &[Event]) -> Vec<RunStatus> {
    let mut statuses: Vec<RunStatus> = Vec::new();
    for event in events {
        if let Event::RunStatusUpdate { status, .. } = event {
            if statuses.last() != Some(status) {
                statuses.push(*status);
            }
        }
    }
    statuses
}

/// Assert the run was announced first and ended with exactly one terminal event.
pub fn assert_event_sequence(events: &[Event]) {
    assert!(
        matches!(events.first(), Some(Event::RunStarted { .. })),
        "First event should be RunStarted, got: {:?}",
        events.first()
    );

    let terminal = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                Event::RunCompleted { .. } | Event::RunError { .. } | Event::RunCancelled { .. }
            )
        })
        .count();
    assert_eq!(terminal, 1, "expected exactly one terminal event");
}

/// All conversation lines, in order.
pub fn conversation(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::ConversationMessage { content, .. } => Some(content.clone()),
            _ => None,
        })
        .collect()
}
