//! Tap/swipe classification for a single touch contact.
//!
//! The sampler owns at most one `GestureState` at a time. A state is created
//! on touch-down and leaves the sampler on touch-up or cancel: accepted
//! swipes are handed to the caller, everything else is dropped. Nothing here
//! allocates beyond the sample vector or performs I/O, so it is safe to run
//! on the input thread.
use tracing::trace;

use crate::Config;

/// One raw touch sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    pub x: f32,
    pub y: f32,
    /// Monotonic timestamp in milliseconds.
    pub t_ms: u64,
}

impl TouchSample {
    pub fn new(x: f32, y: f32, t_ms: u64) -> Self {
        Self { x, y, t_ms }
    }

    pub fn distance_to(&self, other: &TouchSample) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Lifecycle of a touch contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GesturePhase {
    /// Touch is down but has not moved far enough to be a swipe (a tap so far).
    #[default]
    Idle,
    /// Movement threshold crossed; samples are being collected as a swipe.
    Tracking,
    /// Released and accepted; ready for key mapping and decoding.
    Decoding,
    /// Cancelled by the platform or rejected on release.
    Cancelled,
}

/// Samples and bookkeeping for one touch-down-to-up interval.
#[derive(Debug, Clone)]
pub struct GestureState {
    samples: Vec<TouchSample>,
    phase: GesturePhase,
    start_time: u64,
    total_path_length: f32,
}

impl GestureState {
    fn start(sample: TouchSample) -> Self {
        Self {
            samples: vec![sample],
            phase: GesturePhase::Idle,
            start_time: sample.t_ms,
            total_path_length: 0.0,
        }
    }

    fn push(&mut self, sample: TouchSample) {
        if let Some(last) = self.samples.last() {
            self.total_path_length += last.distance_to(&sample);
        }
        self.samples.push(sample);
    }

    /// Straight-line distance between the first and the latest sample.
    fn displacement(&self) -> f32 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => first.distance_to(last),
            _ => 0.0,
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.samples
            .last()
            .map(|s| s.t_ms.saturating_sub(self.start_time))
            .unwrap_or(0)
    }

    pub fn samples(&self) -> &[TouchSample] {
        &self.samples
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    pub fn total_path_length(&self) -> f32 {
        self.total_path_length
    }
}

/// How a touch contact ended.
#[derive(Debug, Clone)]
pub enum GestureEnd {
    /// Never crossed the movement threshold: an ordinary key tap.
    Tap(TouchSample),
    /// Accepted swipe, phase `Decoding`.
    Swipe(GestureState),
    /// Swipe too short or too quick; discarded.
    Rejected,
    /// `end` without a live contact.
    NoContact,
}

/// Accumulates samples for one contact and classifies it.
#[derive(Debug, Clone)]
pub struct GestureSampler {
    start_distance: f32,
    min_duration_ms: u64,
    min_path: f32,
    state: Option<GestureState>,
}

impl GestureSampler {
    pub fn new(config: &Config) -> Self {
        Self {
            start_distance: config.swipe_start_distance,
            min_duration_ms: config.min_swipe_duration_ms,
            min_path: config.min_swipe_path,
            state: None,
        }
    }

    /// Start a new contact, discarding any contact still in progress.
    pub fn begin(&mut self, sample: TouchSample) {
        if self.state.is_some() {
            trace!("touch-down while a contact was live; dropping previous gesture");
        }
        self.state = Some(GestureState::start(sample));
    }

    /// Append a sample to the live contact. Ignored when there is none.
    pub fn extend(&mut self, sample: TouchSample) {
        let start_distance = self.start_distance;
        if let Some(state) = self.state.as_mut() {
            state.push(sample);
            if state.phase == GesturePhase::Idle && state.displacement() > start_distance {
                state.phase = GesturePhase::Tracking;
                trace!(samples = state.samples.len(), "gesture became a swipe");
            }
        }
    }

    /// Finish the live contact with its release sample.
    pub fn end(&mut self, sample: TouchSample) -> GestureEnd {
        self.extend(sample);
        let Some(mut state) = self.state.take() else {
            return GestureEnd::NoContact;
        };

        match state.phase {
            GesturePhase::Idle => GestureEnd::Tap(state.samples[0]),
            GesturePhase::Tracking => {
                let elapsed = state.elapsed_ms();
                if elapsed >= self.min_duration_ms && state.total_path_length >= self.min_path {
                    state.phase = GesturePhase::Decoding;
                    trace!(
                        elapsed,
                        path = state.total_path_length,
                        "swipe accepted for decoding"
                    );
                    GestureEnd::Swipe(state)
                } else {
                    state.phase = GesturePhase::Cancelled;
                    trace!(
                        elapsed,
                        path = state.total_path_length,
                        "swipe rejected: below duration or distance threshold"
                    );
                    GestureEnd::Rejected
                }
            }
            GesturePhase::Decoding | GesturePhase::Cancelled => GestureEnd::Rejected,
        }
    }

    /// Discard the live contact.
    pub fn cancel(&mut self) {
        if let Some(mut state) = self.state.take() {
            state.phase = GesturePhase::Cancelled;
            trace!(samples = state.samples.len(), "gesture cancelled");
        }
    }

    /// Phase of the live contact, if any.
    pub fn phase(&self) -> Option<GesturePhase> {
        self.state.as_ref().map(|s| s.phase)
    }

    pub fn is_tracking(&self) -> bool {
        self.phase() == Some(GesturePhase::Tracking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampler() -> GestureSampler {
        GestureSampler::new(&Config::default())
    }

    /// Horizontal drag from (0, 0) to (`length`, 0) over `duration` ms.
    fn drag(s: &mut GestureSampler, length: f32, duration: u64) -> GestureEnd {
        s.begin(TouchSample::new(0.0, 0.0, 0));
        let steps = 10u64;
        for i in 1..steps {
            let f = i as f32 / steps as f32;
            s.extend(TouchSample::new(length * f, 0.0, duration * i / steps));
        }
        s.end(TouchSample::new(length, 0.0, duration))
    }

    #[test]
    fn test_short_touch_is_tap() {
        let mut s = sampler();
        s.begin(TouchSample::new(10.0, 10.0, 0));
        s.extend(TouchSample::new(12.0, 11.0, 40));
        assert_eq!(s.phase(), Some(GesturePhase::Idle));
        match s.end(TouchSample::new(13.0, 11.0, 80)) {
            GestureEnd::Tap(first) => assert_eq!(first, TouchSample::new(10.0, 10.0, 0)),
            other => panic!("expected tap, got {:?}", other),
        }
        assert_eq!(s.phase(), None);
    }

    #[test]
    fn test_threshold_crossing_starts_tracking() {
        let mut s = sampler();
        s.begin(TouchSample::new(0.0, 0.0, 0));
        s.extend(TouchSample::new(30.0, 0.0, 50));
        assert_eq!(s.phase(), Some(GesturePhase::Idle));
        s.extend(TouchSample::new(60.0, 0.0, 100));
        assert!(s.is_tracking());
    }

    #[test]
    fn test_long_swipe_is_accepted() {
        let mut s = sampler();
        match drag(&mut s, 200.0, 400) {
            GestureEnd::Swipe(state) => {
                assert_eq!(state.phase(), GesturePhase::Decoding);
                assert_eq!(state.samples().len(), 11);
                assert!((state.total_path_length() - 200.0).abs() < 1e-3);
                assert_eq!(state.start_time(), 0);
            }
            other => panic!("expected swipe, got {:?}", other),
        }
    }

    #[test]
    fn test_quick_swipe_is_rejected() {
        let mut s = sampler();
        assert!(matches!(drag(&mut s, 200.0, 299), GestureEnd::Rejected));
    }

    #[test]
    fn test_short_path_is_rejected() {
        let mut s = sampler();
        // Crosses the 50px start threshold but stays under 100px of path.
        assert!(matches!(drag(&mut s, 90.0, 500), GestureEnd::Rejected));
    }

    #[test]
    fn test_back_and_forth_counts_full_path() {
        let mut s = sampler();
        s.begin(TouchSample::new(0.0, 0.0, 0));
        s.extend(TouchSample::new(60.0, 0.0, 100));
        s.extend(TouchSample::new(10.0, 0.0, 200));
        // displacement back under threshold does not revert to Idle
        assert!(s.is_tracking());
        match s.end(TouchSample::new(60.0, 0.0, 320)) {
            GestureEnd::Swipe(state) => assert!((state.total_path_length() - 160.0).abs() < 1e-3),
            other => panic!("expected swipe, got {:?}", other),
        }
    }

    #[test]
    fn test_cancel_discards_contact() {
        let mut s = sampler();
        s.begin(TouchSample::new(0.0, 0.0, 0));
        s.extend(TouchSample::new(80.0, 0.0, 100));
        s.cancel();
        assert_eq!(s.phase(), None);
        assert!(matches!(
            s.end(TouchSample::new(200.0, 0.0, 500)),
            GestureEnd::NoContact
        ));
    }

    #[test]
    fn test_extend_without_begin_is_ignored() {
        let mut s = sampler();
        s.extend(TouchSample::new(10.0, 10.0, 10));
        assert_eq!(s.phase(), None);
    }
}
