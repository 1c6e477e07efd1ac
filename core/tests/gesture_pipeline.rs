// core/tests/gesture_pipeline.rs
//
// End-to-end tests through the Keyboard facade: touch events in, bundles
// out of the worker.

mod common;

use glide_core::{Config, GestureOutcome, Keyboard, RequestKind, TouchPhase, TouchSample};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

fn keyboard() -> Keyboard {
    let mut kb = Keyboard::new(&Config::default(), common::assets()).unwrap();
    kb.on_layout_changed(common::layout());
    kb
}

/// Replay samples as Down, Move..., Up and return the final outcome.
fn replay(kb: &mut Keyboard, samples: &[TouchSample]) -> GestureOutcome {
    let (first, rest) = samples.split_first().expect("samples");
    assert_eq!(
        kb.on_gesture_event(TouchPhase::Down, first.x, first.y, first.t_ms),
        GestureOutcome::Pending
    );
    let (last, middle) = rest.split_last().expect("more than one sample");
    for s in middle {
        kb.on_gesture_event(TouchPhase::Move, s.x, s.y, s.t_ms);
    }
    kb.on_gesture_event(TouchPhase::Up, last.x, last.y, last.t_ms)
}

#[test]
fn swipe_produces_word_bundle() {
    let mut kb = keyboard();
    let samples = common::trace_word(kb.geometry(), "hello", 60);
    let seq = match replay(&mut kb, &samples) {
        GestureOutcome::Submitted(seq) => seq,
        other => panic!("expected submission, got {:?}", other),
    };
    let delivery = kb.wait_for_bundle(WAIT).expect("bundle");
    assert_eq!(delivery.kind, RequestKind::Swipe);
    assert_eq!(delivery.sequence(), seq);
    assert_eq!(delivery.bundle.top(), Some("hello"));
    assert!(delivery.bundle.emojis.is_empty());
}

#[test]
fn quick_swipe_is_rejected_without_request() {
    let mut kb = keyboard();
    let samples = common::trace_word(kb.geometry(), "hello", 5);
    assert_eq!(replay(&mut kb, &samples), GestureOutcome::Rejected);
    // only the touch-down took a number
    assert_eq!(kb.latest_sequence(), 1);
    assert!(kb.wait_for_bundle(Duration::from_millis(100)).is_none());
}

#[test]
fn text_requests_correct_complete_and_predict() {
    let kb = keyboard();

    kb.on_text_committed("I said teh");
    let bundle = kb.wait_for_bundle(WAIT).expect("bundle").bundle;
    assert_eq!(bundle.top(), Some("the"));

    kb.on_text_committed("Good mor");
    let bundle = kb.wait_for_bundle(WAIT).expect("bundle").bundle;
    assert_eq!(bundle.top(), Some("morning"));

    kb.on_text_committed("good ");
    let bundle = kb.wait_for_bundle(WAIT).expect("bundle").bundle;
    assert_eq!(bundle.word_texts(), vec!["morning", "night"]);
    assert!(bundle.emojis.is_empty());
}

#[test]
fn trigger_word_brings_emoji() {
    let kb = keyboard();
    kb.on_text_committed("thanks ");
    let bundle = kb.wait_for_bundle(WAIT).expect("bundle").bundle;
    assert_eq!(bundle.top(), Some("you"));
    assert!(!bundle.emojis.is_empty());
    assert!(bundle.emojis.len() <= 2);
    assert!(bundle.words.len() + bundle.emojis.len() <= 5);
}

#[test]
fn finalized_words_are_learned() {
    let kb = keyboard();
    for _ in 0..3 {
        kb.on_word_finalized(&["good"], "luck");
    }
    kb.on_text_committed("good ");
    let bundle = kb.wait_for_bundle(WAIT).expect("bundle").bundle;
    assert_eq!(bundle.top(), Some("luck"));
}

#[test]
fn tap_is_reported_to_host() {
    let mut kb = keyboard();
    let (x, y) = kb.geometry().key_for_letter('g').unwrap().bounds.center();
    kb.on_gesture_event(TouchPhase::Down, x, y, 0);
    kb.on_gesture_event(TouchPhase::Move, x + 3.0, y, 30);
    match kb.on_gesture_event(TouchPhase::Up, x + 4.0, y, 70) {
        GestureOutcome::Tap { letter, .. } => assert_eq!(letter, Some('g')),
        other => panic!("expected tap, got {:?}", other),
    }
}
