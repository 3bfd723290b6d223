// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the timeline engine on Tokio's paused clock.

use std::sync::Arc;
use std::time::Duration;

use chatreel_bus::{ConversationEvent, EventKind};
use chatreel_core::{
    ConversationBuilder, Flow, Message, MessageStatus, PlaybackStatus, TriggerKind,
};
use chatreel_engine::{EngineError, TimelineEngine};
use chatreel_test_utils::fixtures::{self, fast_config, simple_conversation};
use chatreel_test_utils::{EventRecorder, MockHook, PlaybackHarness};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn sent_indices(events: &[ConversationEvent]) -> Vec<usize> {
    events
        .iter()
        .filter(|e| e.event_type() == "message.sent")
        .filter_map(ConversationEvent::message_index)
        .collect()
}

fn harness_for(conversation: chatreel_core::Conversation) -> PlaybackHarness {
    PlaybackHarness::builder()
        .with_conversation(conversation)
        .build()
        .expect("valid harness")
}

#[tokio::test(start_paused = true)]
async fn n_messages_are_sent_in_order_and_complete_once() {
    let mut h = harness_for(simple_conversation(5));
    h.run_to_completion().await.unwrap();

    assert_eq!(sent_indices(h.recorder.events()), vec![0, 1, 2, 3, 4]);
    let completed = h.recorder.of_type("conversation.completed");
    assert_eq!(completed.len(), 1);
    assert!(matches!(
        completed[0].kind,
        EventKind::ConversationCompleted { final_index: 4, .. }
    ));
    assert_eq!(h.engine.status(), PlaybackStatus::Completed);

    // Nothing else happens afterwards.
    h.advance(Duration::from_secs(30)).await;
    assert_eq!(h.recorder.count("conversation.completed"), 1);
    assert_eq!(h.engine.outstanding_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn end_to_end_flow_ordering() {
    let mut h = PlaybackHarness::new().unwrap();
    let types = h.run_to_completion().await.unwrap();

    assert_eq!(
        types,
        vec![
            "conversation.started",
            "message.queued",
            "message.typing_started",
            "message.typing_stopped",
            "message.sent",
            "message.delivered",
            "message.read",
            "message.queued",
            "message.typing_started",
            "message.typing_stopped",
            "message.sent",
            "flow.triggered",
            "flow.step_started",
            "flow.step_completed",
            "flow.step_started",
            "flow.step_completed",
            "flow.completed",
            "message.delivered",
            "message.read",
            "message.queued",
            "message.typing_started",
            "message.typing_stopped",
            "message.sent",
            "message.delivered",
            "message.read",
            "conversation.completed",
        ]
    );

    let completed = h.recorder.of_type("flow.completed");
    match &completed[0].kind {
        EventKind::FlowCompleted { result, .. } => {
            assert_eq!(result.outcomes.len(), 2);
            assert_eq!(result.points(), 120);
            assert_eq!(
                result.selected_reward().map(|r| r.id.as_str()),
                Some("espresso")
            );
        }
        other => panic!("unexpected {other:?}"),
    }

    // 100 + 100 + (50 + 40 + 60 + 10 + 20 + 30) + 100 + 100
    assert_eq!(h.engine.progress().elapsed, ms(610));
}

#[tokio::test(start_paused = true)]
async fn queued_event_carries_estimated_send_time() {
    let mut h = PlaybackHarness::new().unwrap();
    h.engine.start().unwrap();
    h.recorder.until("message.typing_started").await;
    let queued = h.recorder.of_type("message.queued");
    assert!(matches!(
        queued[0].kind,
        EventKind::MessageQueued {
            index: 0,
            estimated_send_ms: fixtures::TYPING_MS,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn pause_then_immediate_resume_matches_unpaused_run() {
    let mut baseline = PlaybackHarness::new().unwrap();
    let expected = baseline.run_to_completion().await.unwrap();
    let expected_elapsed = baseline.engine.progress().elapsed;

    let mut h = PlaybackHarness::new().unwrap();
    h.engine.start().unwrap();
    tokio::time::sleep(ms(60)).await;
    h.engine.pause().unwrap();
    h.engine.resume().unwrap();
    h.recorder.until("conversation.completed").await;

    let actual: Vec<&str> = h
        .recorder
        .types()
        .into_iter()
        .filter(|t| *t != "conversation.paused" && *t != "conversation.resumed")
        .collect();
    assert_eq!(actual, expected);
    assert_eq!(h.engine.progress().elapsed, expected_elapsed);
}

#[tokio::test(start_paused = true)]
async fn pause_keeps_remaining_delay() {
    let mut h = harness_for(simple_conversation(2));
    h.engine.start().unwrap();
    // Sent at 50ms; delivered is due at 70ms.
    h.advance(ms(60)).await;
    assert_eq!(h.recorder.count("message.sent"), 1);

    h.engine.pause().unwrap();
    assert_eq!(h.engine.status(), PlaybackStatus::Paused);
    h.advance(Duration::from_secs(10)).await;
    assert_eq!(h.recorder.count("message.delivered"), 0);

    h.engine.resume().unwrap();
    h.advance(ms(5)).await;
    assert_eq!(h.recorder.count("message.delivered"), 0);
    h.advance(ms(10)).await;
    assert_eq!(h.recorder.count("message.delivered"), 1);
}

#[tokio::test(start_paused = true)]
async fn jump_while_playing_skips_typing_for_skipped_indices() {
    let mut h = harness_for(simple_conversation(5));
    h.engine.start().unwrap();
    h.advance(ms(10)).await;

    h.engine.jump(3).unwrap();
    assert_eq!(h.engine.progress().current_index, 3);
    for i in 0..3 {
        assert_eq!(h.engine.message_status(i), Some(MessageStatus::Read));
    }
    assert_eq!(h.engine.message_status(3), None);

    h.recorder.until("conversation.completed").await;
    let events = h.recorder.events();
    let jumped_at = events
        .iter()
        .position(|e| e.event_type() == "conversation.jumped")
        .expect("jumped event");
    assert!(matches!(
        events[jumped_at].kind,
        EventKind::ConversationJumped {
            from_index: 0,
            to_index: 3
        }
    ));

    let typing_after: Vec<usize> = events[jumped_at..]
        .iter()
        .filter(|e| e.event_type() == "message.typing_started")
        .filter_map(ConversationEvent::message_index)
        .collect();
    assert_eq!(typing_after, vec![3, 4]);
    assert_eq!(sent_indices(events), vec![3, 4]);
}

#[tokio::test(start_paused = true)]
async fn jump_from_idle_lands_paused_and_resume_continues_there() {
    let mut h = harness_for(simple_conversation(4));
    h.engine.jump(2).unwrap();
    assert_eq!(h.engine.status(), PlaybackStatus::Paused);
    assert_eq!(h.engine.progress().current_index, 2);

    h.advance(Duration::from_secs(5)).await;
    assert_eq!(h.recorder.count("message.queued"), 0);

    h.engine.resume().unwrap();
    h.recorder.until("conversation.completed").await;
    assert_eq!(sent_indices(h.recorder.events()), vec![2, 3]);
}

#[tokio::test(start_paused = true)]
async fn jump_out_of_range_changes_nothing() {
    let mut h = harness_for(simple_conversation(5));
    h.engine.start().unwrap();
    let err = h.engine.jump(5).unwrap_err();
    assert_eq!(err, EngineError::IndexOutOfRange { index: 5, len: 5 });
    assert_eq!(h.engine.status(), PlaybackStatus::Playing);
    h.recorder.drain();
    assert_eq!(h.recorder.count("conversation.jumped"), 0);
}

#[tokio::test(start_paused = true)]
async fn reset_returns_to_idle_and_silences_pending_timers() {
    let mut h = PlaybackHarness::new().unwrap();
    h.engine.start().unwrap();
    h.advance(ms(260)).await;

    h.engine.reset();
    let progress = h.engine.progress();
    assert_eq!(progress.status, PlaybackStatus::Idle);
    assert_eq!(progress.current_index, 0);
    assert_eq!(h.engine.message_status(0), None);
    assert_eq!(h.engine.outstanding_timers(), 0);
    assert!(h.engine.active_flow().is_none());

    h.recorder.drain();
    assert_eq!(h.recorder.types().last(), Some(&"conversation.reset"));
    h.recorder.clear();

    h.advance(Duration::from_secs(60)).await;
    assert!(h.recorder.events().is_empty(), "{:?}", h.recorder.types());
}

#[tokio::test(start_paused = true)]
async fn speed_change_applies_only_to_later_delays() {
    let mut h = harness_for(simple_conversation(3));
    h.engine.start().unwrap();
    // Sent at 50ms; delivered (20ms) is already in flight.
    h.advance(ms(60)).await;
    h.engine.set_speed(2.0).unwrap();

    h.advance(ms(9)).await;
    assert_eq!(h.recorder.count("message.delivered"), 0);
    h.advance(ms(2)).await;
    assert_eq!(h.recorder.count("message.delivered"), 1);

    // Read delay 30ms is now halved: due at 85ms.
    h.advance(ms(13)).await;
    assert_eq!(h.recorder.count("message.read"), 0);
    h.advance(ms(2)).await;
    assert_eq!(h.recorder.count("message.read"), 1);

    let changed = h.recorder.of_type("conversation.speed_changed");
    assert!(matches!(
        changed[0].kind,
        EventKind::ConversationSpeedChanged { previous, current }
            if previous == 1.0 && current == 2.0
    ));
    assert_eq!(h.engine.progress().speed_multiplier, 2.0);
}

#[tokio::test(start_paused = true)]
async fn invalid_calls_are_rejected() {
    let h = PlaybackHarness::new().unwrap();
    assert_eq!(
        h.engine.pause(),
        Err(EngineError::InvalidTransition {
            from: PlaybackStatus::Idle,
            action: "pause"
        })
    );
    assert!(h.engine.resume().is_err());
    h.engine.start().unwrap();
    assert!(matches!(
        h.engine.start(),
        Err(EngineError::InvalidTransition {
            from: PlaybackStatus::Playing,
            ..
        })
    ));
    assert_eq!(h.engine.set_speed(0.0), Err(EngineError::InvalidSpeed(0.0)));
    assert_eq!(
        h.engine.set_speed(10.5),
        Err(EngineError::InvalidSpeed(10.5))
    );
    assert!(h.engine.set_speed(10.0).is_ok());
}

#[tokio::test(start_paused = true)]
async fn vanishing_speed_is_rejected_and_playback_continues() {
    let mut h = harness_for(simple_conversation(3));
    h.engine.start().unwrap();
    assert_eq!(
        h.engine.set_speed(1e-22),
        Err(EngineError::InvalidSpeed(1e-22))
    );
    assert_eq!(
        h.engine.set_speed(0.05),
        Err(EngineError::InvalidSpeed(0.05))
    );
    assert!(h.engine.set_speed(chatreel_engine::MIN_SPEED).is_ok());
    assert!(h.engine.set_speed(1.0).is_ok());

    assert!(h.recorder.until("conversation.completed").await);
    assert_eq!(h.engine.status(), PlaybackStatus::Completed);
    assert_eq!(h.recorder.count("conversation.speed_changed"), 2);
    assert_eq!(h.recorder.count("conversation.error"), 0);
}

#[tokio::test(start_paused = true)]
async fn failing_flow_hands_control_back() {
    let mut h = harness_for(fixtures::failing_flow_conversation());
    h.run_to_completion().await.unwrap();

    let failed = h.recorder.of_type("flow.failed");
    assert_eq!(failed.len(), 1);
    assert!(matches!(
        &failed[0].kind,
        EventKind::FlowFailed { step_index: Some(1), reason, .. } if reason.contains("out of range")
    ));
    assert_eq!(h.recorder.count("flow.completed"), 0);
    assert_eq!(sent_indices(h.recorder.events()), vec![0, 1, 2]);
    assert_eq!(h.engine.status(), PlaybackStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn flow_without_steps_fails_immediately() {
    let conversation = ConversationBuilder::new("empty-flow")
        .message(Message::user("m0", "hi").with_flow_trigger())
        .message(Message::business("m1", "bye"))
        .flow(Flow::new("nothing", "Nothing", 0))
        .build();
    let mut h = harness_for(conversation);
    h.run_to_completion().await.unwrap();

    let types = h.recorder.types();
    let triggered = types.iter().position(|t| *t == "flow.triggered").unwrap();
    assert_eq!(types[triggered + 1], "flow.failed");
    assert_eq!(types[triggered + 2], "message.delivered");
    assert!(matches!(
        h.recorder.of_type("flow.failed")[0].kind,
        EventKind::FlowFailed {
            step_index: None,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn empty_message_is_a_non_recoverable_error() {
    let conversation = ConversationBuilder::new("broken")
        .message(Message::user("m0", "hello"))
        .message(Message::business("m1", "   "))
        .build();
    let mut h = harness_for(conversation);
    h.engine.start().unwrap();
    h.recorder.until("conversation.error").await;

    let error = h.recorder.of_type("conversation.error");
    assert!(matches!(
        error[0].kind,
        EventKind::ConversationError {
            recoverable: false,
            index: Some(1),
            ..
        }
    ));
    assert_eq!(h.engine.status(), PlaybackStatus::Error);
    assert!(h.engine.resume().is_err());
    assert_eq!(sent_indices(h.recorder.events()), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn structural_script_error_stops_start() {
    let conversation = ConversationBuilder::new("empty").build();
    let mut h = harness_for(conversation);
    h.engine.start().unwrap();
    h.recorder.drain();

    assert_eq!(h.recorder.types(), vec!["conversation.error"]);
    assert_eq!(h.engine.status(), PlaybackStatus::Error);
    assert_eq!(h.engine.outstanding_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn hook_failure_is_recoverable() {
    let hook = Arc::new(MockHook::failing_at(1));
    let mut h = PlaybackHarness::builder()
        .with_hook(hook.clone())
        .build()
        .unwrap();
    h.engine.start().unwrap();
    h.recorder.until("conversation.error").await;

    let types = h.recorder.types();
    let n = types.len();
    assert_eq!(&types[n - 3..], &["message.sent", "debug.log", "conversation.error"]);
    assert!(matches!(
        h.recorder.of_type("conversation.error")[0].kind,
        EventKind::ConversationError {
            recoverable: true,
            index: Some(1),
            ..
        }
    ));
    assert_eq!(h.engine.status(), PlaybackStatus::Error);

    // Stays halted until resumed.
    h.advance(Duration::from_secs(5)).await;
    assert_eq!(h.recorder.count("flow.triggered"), 0);

    h.engine.resume().unwrap();
    h.recorder.until("conversation.completed").await;
    assert_eq!(h.recorder.count("flow.completed"), 1);
    assert_eq!(hook.calls(), vec![(TriggerKind::Gamification, 1)]);
}

#[tokio::test(start_paused = true)]
async fn panicking_hook_becomes_a_recoverable_error() {
    let hook = Arc::new(MockHook::panicking_at(1));
    let mut h = PlaybackHarness::builder()
        .with_hook(hook.clone())
        .build()
        .unwrap();
    h.engine.start().unwrap();
    assert!(h.recorder.until("conversation.error").await);

    let errors = h.recorder.of_type("conversation.error");
    let EventKind::ConversationError {
        message,
        recoverable,
        index,
    } = &errors[0].kind
    else {
        unreachable!();
    };
    assert!(*recoverable);
    assert_eq!(*index, Some(1));
    assert!(message.contains("backend crashed"), "{message}");
    assert_eq!(h.engine.status(), PlaybackStatus::Error);
    assert_eq!(h.engine.outstanding_timers(), 0);

    h.engine.resume().unwrap();
    assert!(h.recorder.until("conversation.completed").await);
    assert_eq!(h.recorder.count("flow.completed"), 1);
    assert_eq!(hook.calls(), vec![(TriggerKind::Gamification, 1)]);
}

#[tokio::test(start_paused = true)]
async fn huge_restart_delay_is_armed_without_overflow() {
    let conversation = ConversationBuilder::new("forever")
        .user("one")
        .auto_restart(u64::MAX)
        .build();
    let mut h = harness_for(conversation);
    h.run_to_completion().await.unwrap();

    h.advance(Duration::from_secs(3600)).await;
    assert_eq!(h.engine.status(), PlaybackStatus::Completed);
    assert_eq!(h.recorder.count("conversation.restarted"), 0);
    assert_eq!(h.recorder.count("conversation.error"), 0);
}

#[tokio::test(start_paused = true)]
async fn auto_restart_replays_from_the_top() {
    let conversation = ConversationBuilder::new("looping")
        .user("one")
        .business_says("two")
        .auto_restart(500)
        .build();
    let mut h = harness_for(conversation);
    h.run_to_completion().await.unwrap();
    assert_eq!(h.engine.status(), PlaybackStatus::Completed);

    assert!(h.recorder.until("conversation.restarted").await);
    assert_eq!(h.engine.iteration(), 1);
    assert!(matches!(
        h.recorder.of_type("conversation.restarted")[0].kind,
        EventKind::ConversationRestarted { iteration: 1 }
    ));

    assert!(h.recorder.until("conversation.completed").await);
    assert_eq!(sent_indices(h.recorder.events()), vec![0, 1, 0, 1]);

    h.engine.reset();
    assert_eq!(h.engine.iteration(), 0);
}

#[tokio::test(start_paused = true)]
async fn final_flag_ends_playback_early() {
    let conversation = ConversationBuilder::new("final")
        .message(Message::user("m0", "hi"))
        .message(Message::business("m1", "bye").final_message())
        .message(Message::business("m2", "never shown"))
        .build();
    let mut h = harness_for(conversation);
    h.run_to_completion().await.unwrap();
    assert_eq!(sent_indices(h.recorder.events()), vec![0, 1]);
}

#[tokio::test(start_paused = true)]
async fn receipts_apply_to_every_sender() {
    let mut h = harness_for(simple_conversation(4));
    h.run_to_completion().await.unwrap();
    assert_eq!(h.recorder.count("message.delivered"), 4);
    assert_eq!(h.recorder.count("message.read"), 4);
    for i in 0..4 {
        assert_eq!(h.engine.message_status(i), Some(MessageStatus::Read));
    }
}

#[tokio::test(start_paused = true)]
async fn state_snapshots_only_when_debug_events_enabled() {
    let mut quiet = PlaybackHarness::new().unwrap();
    quiet.run_to_completion().await.unwrap();
    assert_eq!(quiet.recorder.count("debug.state_snapshot"), 0);

    let mut config = fast_config();
    config.playback.debug_events = true;
    let mut loud = PlaybackHarness::builder().with_config(config).build().unwrap();
    loud.run_to_completion().await.unwrap();
    // started + one per read + completed
    assert_eq!(loud.recorder.count("debug.state_snapshot"), 5);
}

#[tokio::test(start_paused = true)]
async fn engines_do_not_share_buses() {
    let config = fast_config();
    let a = TimelineEngine::new(simple_conversation(2), &config).unwrap();
    let b = TimelineEngine::new(simple_conversation(3), &config).unwrap();
    let mut rec_a = EventRecorder::attach(a.bus());
    let mut rec_b = EventRecorder::attach(b.bus());

    a.start().unwrap();
    b.start().unwrap();
    rec_a.until("conversation.completed").await;
    rec_b.until("conversation.completed").await;

    assert_eq!(rec_a.count("message.sent"), 2);
    assert_eq!(rec_b.count("message.sent"), 3);
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let mut config = fast_config();
    config.playback.typing_min_ms = 900;
    config.playback.typing_max_ms = 100;
    let err = TimelineEngine::new(simple_conversation(1), &config).unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfig(msg) if msg.contains("typing_min_ms")));
}
