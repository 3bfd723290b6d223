// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The bundled sample scripts parse, pass `check` and play to the end.

use chatreel_bus::EventKind;
use chatreel_core::{Conversation, check_script};
use chatreel_test_utils::PlaybackHarness;

const LOYALTY_DEMO: &str = include_str!("../scripts/loyalty-demo.json");

fn loyalty_demo() -> Conversation {
    Conversation::from_json_str(LOYALTY_DEMO).expect("sample script parses")
}

#[test]
fn loyalty_demo_has_no_issues() {
    let conversation = loyalty_demo();
    assert_eq!(conversation.len(), 5);
    assert_eq!(conversation.flow_at(3).map(|f| f.steps.len()), Some(3));
    assert!(conversation.messages[4].is_final);
    assert_eq!(check_script(&conversation), Vec::new());
}

#[tokio::test(start_paused = true)]
async fn loyalty_demo_plays_through_its_flow() {
    let mut harness = PlaybackHarness::builder()
        .with_conversation(loyalty_demo())
        .build()
        .unwrap();
    let types = harness.run_to_completion().await.unwrap();

    assert_eq!(types.first(), Some(&"conversation.started"));
    assert_eq!(types.last(), Some(&"conversation.completed"));
    assert_eq!(harness.recorder.count("message.sent"), 5);
    assert_eq!(harness.recorder.count("flow.step_completed"), 3);
    assert_eq!(harness.recorder.count("conversation.error"), 0);

    let completed = harness.recorder.of_type("flow.completed");
    let [event] = completed.as_slice() else {
        panic!("expected one flow.completed, got {}", completed.len());
    };
    let EventKind::FlowCompleted { result, .. } = &event.kind else {
        unreachable!();
    };
    assert_eq!(result.points(), 120);
    assert_eq!(result.selected_reward().map(|r| r.id.as_str()), Some("espresso"));
}
