//! Host-facing facade.
//!
//! A `Keyboard` lives on the host's input thread. Gesture sampling and key
//! mapping run right there (cheap, allocation-light); everything else is
//! queued to the worker and comes back as `Delivery` values that the host
//! collects with `poll` or `wait_for_bundle`.
//!
//! Every swipe or text request takes the next sequence number, and so does
//! every touch-down, since a new gesture makes pending results obsolete. A
//! delivery older than the latest issued number is stale and is never
//! returned.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::assets::Assets;
use crate::autocorrect::CorrectionHistory;
use crate::geometry::KeyboardLayoutGeometry;
use crate::gesture::{GestureEnd, GestureSampler, TouchSample};
use crate::keyhit::map_to_keys;
use crate::worker::{Delivery, Job, Worker};
use crate::Config;

/// Platform touch phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// What a touch event amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// Contact still in progress (or an event with no live contact).
    Pending,
    /// Released without becoming a swipe; `letter` is the key under the
    /// touch-down point, if it types a letter.
    Tap {
        sample: TouchSample,
        letter: Option<char>,
    },
    /// Swipe accepted and queued for decoding under this sequence number.
    Submitted(u64),
    /// Swipe too short or too quick.
    Rejected,
    Cancelled,
}

pub struct Keyboard {
    language: String,
    geometry: Arc<KeyboardLayoutGeometry>,
    sampler: GestureSampler,
    corrections: CorrectionHistory,
    latest: Arc<AtomicU64>,
    results: Receiver<Delivery>,
    worker: Worker,
}

impl Keyboard {
    /// Start a keyboard session and its worker thread.
    pub fn new(config: &Config, assets: Arc<Assets>) -> anyhow::Result<Self> {
        let latest = Arc::new(AtomicU64::new(0));
        let (tx, results) = mpsc::channel();
        let worker = Worker::spawn(config, assets, latest.clone(), tx)?;
        info!(language = %config.default_language, "keyboard session started");
        Ok(Self {
            language: config.default_language.clone(),
            geometry: Arc::new(KeyboardLayoutGeometry::default()),
            sampler: GestureSampler::new(config),
            corrections: CorrectionHistory::new(config.revert_window_ms),
            latest,
            results,
            worker,
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Switch the language used by later requests.
    pub fn set_language(&mut self, language: &str) {
        debug!(from = %self.language, to = %language, "language changed");
        self.language = language.to_string();
    }

    pub fn geometry(&self) -> &KeyboardLayoutGeometry {
        &self.geometry
    }

    /// Most recently issued sequence number (0 before any request).
    pub fn latest_sequence(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }

    fn next_sequence(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Replace the active layout.
    pub fn on_layout_changed(&mut self, geometry: KeyboardLayoutGeometry) {
        let geometry = Arc::new(geometry);
        self.geometry = geometry.clone();
        self.worker.submit(Job::Layout(geometry));
    }

    /// Feed one touch event.
    pub fn on_gesture_event(&mut self, phase: TouchPhase, x: f32, y: f32, t_ms: u64) -> GestureOutcome {
        let sample = TouchSample::new(x, y, t_ms);
        match phase {
            TouchPhase::Down => {
                // a new gesture supersedes whatever is still in flight
                let sequence = self.next_sequence();
                trace!(sequence, "touch down");
                self.sampler.begin(sample);
                GestureOutcome::Pending
            }
            TouchPhase::Move => {
                self.sampler.extend(sample);
                GestureOutcome::Pending
            }
            TouchPhase::Cancel => {
                self.sampler.cancel();
                GestureOutcome::Cancelled
            }
            TouchPhase::Up => match self.sampler.end(sample) {
                GestureEnd::Tap(first) => GestureOutcome::Tap {
                    sample: first,
                    letter: self.geometry.key_at(first.x, first.y).and_then(|k| k.letter()),
                },
                GestureEnd::Swipe(state) => {
                    let keys = map_to_keys(state.samples(), &self.geometry);
                    let sequence = self.next_sequence();
                    trace!(sequence, letters = %keys.letters(), "swipe submitted");
                    self.worker.submit(Job::Swipe {
                        sequence,
                        language: self.language.clone(),
                        keys,
                    });
                    GestureOutcome::Submitted(sequence)
                }
                GestureEnd::Rejected => GestureOutcome::Rejected,
                GestureEnd::NoContact => GestureOutcome::Pending,
            },
        }
    }

    /// The text before the cursor changed. Returns the request's sequence
    /// number.
    pub fn on_text_committed(&self, trailing_context: &str) -> u64 {
        let sequence = self.next_sequence();
        self.worker.submit(Job::Text {
            sequence,
            language: self.language.clone(),
            context: trailing_context.to_string(),
        });
        sequence
    }

    /// The user settled on `chosen_word` after `context`; teach the model.
    pub fn on_word_finalized<S: AsRef<str>>(&self, context: &[S], chosen_word: &str) {
        self.worker.submit(Job::Learn {
            language: self.language.clone(),
            context: context.iter().map(|w| w.as_ref().to_string()).collect(),
            word: chosen_word.to_string(),
        });
    }

    /// The host replaced `original` with `corrected` at `t_ms`.
    pub fn on_correction_applied(&mut self, original: &str, corrected: &str, t_ms: u64) {
        trace!(%original, %corrected, "correction applied");
        self.corrections.record(original, corrected, t_ms);
    }

    /// Undo the last applied correction if it is still inside the revert
    /// window. Returns the word to put back; the correction is not offered
    /// again.
    pub fn revert_correction(&mut self, t_ms: u64) -> Option<String> {
        let applied = self.corrections.take_revert(t_ms)?;
        debug!(original = %applied.original, corrected = %applied.corrected, "correction reverted");
        self.on_correction_rejected(&applied.original, &applied.corrected);
        Some(applied.original)
    }

    /// Never again correct `original` to `corrected`.
    pub fn on_correction_rejected(&self, original: &str, corrected: &str) {
        self.worker.submit(Job::Reject {
            original: original.to_string(),
            corrected: corrected.to_string(),
        });
    }

    fn is_current(&self, delivery: &Delivery) -> bool {
        delivery.sequence() >= self.latest_sequence()
    }

    /// Newest non-stale delivery already waiting, without blocking.
    pub fn poll(&self) -> Option<Delivery> {
        let mut fresh = None;
        while let Ok(delivery) = self.results.try_recv() {
            if self.is_current(&delivery) {
                fresh = Some(delivery);
            } else {
                trace!(sequence = delivery.sequence(), "discarding stale bundle");
            }
        }
        fresh
    }

    /// Block until the delivery for the latest request arrives or `timeout`
    /// passes.
    pub fn wait_for_bundle(&self, timeout: Duration) -> Option<Delivery> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.results.recv_timeout(remaining) {
                Ok(delivery) if self.is_current(&delivery) => return Some(delivery),
                Ok(delivery) => {
                    trace!(sequence = delivery.sequence(), "discarding stale bundle");
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return None
                }
            }
        }
    }

    /// Stop the worker after it drains the queue. Also done on drop.
    pub fn shutdown(&mut self) {
        self.worker.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::CandidateSource;
    use crate::lexicon::Dictionary;
    use crate::ngram::LanguageModel;

    fn keyboard() -> Keyboard {
        let model = LanguageModel::new();
        model.train(["good morning", "good night", "good morning"]);
        let assets = Assets::new().with_pack(
            "en",
            Dictionary::from_words("en", [("good", 10), ("morning", 5), ("night", 4)]),
            model,
        );
        Keyboard::new(&Config::default(), Arc::new(assets)).unwrap()
    }

    #[test]
    fn text_request_round_trip() {
        let kb = keyboard();
        let seq = kb.on_text_committed("good ");
        assert_eq!(seq, 1);
        let delivery = kb.wait_for_bundle(Duration::from_secs(5)).unwrap();
        assert_eq!(delivery.sequence(), seq);
        assert_eq!(delivery.bundle.top(), Some("morning"));
    }

    #[test]
    fn tap_reports_letter() {
        let mut kb = keyboard();
        kb.on_layout_changed(KeyboardLayoutGeometry::qwerty(40.0, 60.0));
        assert_eq!(kb.on_gesture_event(TouchPhase::Down, 5.0, 5.0, 0), GestureOutcome::Pending);
        match kb.on_gesture_event(TouchPhase::Up, 6.0, 5.0, 60) {
            GestureOutcome::Tap { letter, .. } => assert_eq!(letter, Some('q')),
            other => panic!("expected tap, got {:?}", other),
        }
        // the touch-down took a number, the tap itself none
        assert_eq!(kb.latest_sequence(), 1);
    }

    #[test]
    fn touch_down_discards_pending_swipe_result() {
        let mut kb = keyboard();
        kb.on_layout_changed(KeyboardLayoutGeometry::qwerty(40.0, 60.0));
        let centre = |kb: &Keyboard, c: char| kb.geometry().key_for_letter(c).unwrap().bounds.center();
        let (gx, gy) = centre(&kb, 'g');
        let (ox, oy) = centre(&kb, 'o');
        let (dx, dy) = centre(&kb, 'd');

        kb.on_gesture_event(TouchPhase::Down, gx, gy, 0);
        kb.on_gesture_event(TouchPhase::Move, ox, oy, 150);
        kb.on_gesture_event(TouchPhase::Move, ox, oy, 300);
        let submitted = kb.on_gesture_event(TouchPhase::Up, dx, dy, 450);
        assert!(matches!(submitted, GestureOutcome::Submitted(_)));

        // next gesture starts before the result is collected, then is a tap
        kb.on_gesture_event(TouchPhase::Down, gx, gy, 1000);
        assert!(matches!(
            kb.on_gesture_event(TouchPhase::Up, gx, gy, 1050),
            GestureOutcome::Tap { .. }
        ));
        assert!(kb.wait_for_bundle(Duration::from_millis(300)).is_none());
        assert!(kb.poll().is_none());
    }

    #[test]
    fn cancel_and_stray_up() {
        let mut kb = keyboard();
        kb.on_gesture_event(TouchPhase::Down, 0.0, 0.0, 0);
        kb.on_gesture_event(TouchPhase::Move, 80.0, 0.0, 100);
        assert_eq!(kb.on_gesture_event(TouchPhase::Cancel, 80.0, 0.0, 120), GestureOutcome::Cancelled);
        assert_eq!(kb.on_gesture_event(TouchPhase::Up, 200.0, 0.0, 600), GestureOutcome::Pending);
    }

    #[test]
    fn set_language_switches_pack() {
        let mut kb = keyboard();
        kb.set_language("fr");
        assert_eq!(kb.language(), "fr");
        kb.on_text_committed("good ");
        let delivery = kb.wait_for_bundle(Duration::from_secs(5)).unwrap();
        assert!(delivery.bundle.is_empty());
    }

    #[test]
    fn revert_restores_original_and_blacklists() {
        let mut kb = keyboard();
        kb.on_text_committed("godo");
        let delivery = kb.wait_for_bundle(Duration::from_secs(5)).unwrap();
        assert_eq!(delivery.bundle.top(), Some("good"));
        assert_eq!(delivery.bundle.words[0].source, CandidateSource::Autocorrect);

        kb.on_correction_applied("godo", "good", 10_000);
        assert_eq!(kb.revert_correction(13_000), None);
        kb.on_correction_applied("godo", "good", 20_000);
        assert_eq!(kb.revert_correction(21_000), Some("godo".to_string()));
        assert_eq!(kb.revert_correction(21_100), None);

        kb.on_text_committed("godo");
        let delivery = kb.wait_for_bundle(Duration::from_secs(5)).unwrap();
        assert!(delivery.bundle.word_texts().iter().all(|w| *w != "good"));
    }

    #[test]
    fn unknown_languages_do_not_share_learning() {
        let mut kb = keyboard();
        kb.set_language("fr");
        kb.on_word_finalized(&["bonjour"], "monde");
        kb.set_language("de");
        kb.on_text_committed("hallo ");
        let delivery = kb.wait_for_bundle(Duration::from_secs(5)).unwrap();
        assert!(delivery.bundle.is_empty());
        kb.on_text_committed("bonjour ");
        let delivery = kb.wait_for_bundle(Duration::from_secs(5)).unwrap();
        assert!(delivery.bundle.is_empty());
    }
}
