//! The single background worker.
//!
//! All decoding, correction, prediction, ranking and learning happens on one
//! thread fed through an mpsc queue, so jobs run in submission order. Swipe
//! and text jobs carry the sequence number they were issued with; a job whose
//! number is already behind the latest issued one is skipped, and the host
//! side discards late results the same way.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use ahash::AHashSet;
use tracing::{debug, trace, warn};

use crate::assets::Assets;
use crate::autocorrect::AutocorrectEngine;
use crate::candidate::{sort_by_score, Candidate, CandidateSource, SuggestionBundle};
use crate::geometry::KeyboardLayoutGeometry;
use crate::keyhit::KeyHitSequence;
use crate::normalize::{match_case, split_trailing};
use crate::ranker::SuggestionRanker;
use crate::swipe::SwipeDecoder;
use crate::Config;

/// Work items, in the order the host issued them.
#[derive(Debug, Clone)]
pub enum Job {
    /// A new layout: rebuild autocorrect adjacency.
    Layout(Arc<KeyboardLayoutGeometry>),
    Swipe {
        sequence: u64,
        language: String,
        keys: KeyHitSequence,
    },
    /// Text before the cursor changed.
    Text {
        sequence: u64,
        language: String,
        context: String,
    },
    /// The user settled on `word` after `context`.
    Learn {
        language: String,
        context: Vec<String>,
        word: String,
    },
    /// The user undid the correction of `original` to `corrected`.
    Reject { original: String, corrected: String },
}

/// Which request a delivery answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Swipe,
    Text,
}

/// A finished bundle on its way back to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub kind: RequestKind,
    pub bundle: SuggestionBundle,
}

impl Delivery {
    pub fn sequence(&self) -> u64 {
        self.bundle.sequence
    }
}

/// Handle to the worker thread. Dropping it closes the queue and joins the
/// thread after the queued jobs are done.
pub struct Worker {
    sender: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Start the worker. `latest` is the most recently issued sequence
    /// number, shared with the issuing side; results go to `results`.
    pub fn spawn(
        config: &Config,
        assets: Arc<Assets>,
        latest: Arc<AtomicU64>,
        results: Sender<Delivery>,
    ) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let state = WorkerState::new(config, assets, latest, results);
        let handle = std::thread::Builder::new()
            .name("glide-worker".to_string())
            .spawn(move || state.run(receiver))?;
        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queue a job. Returns false (and logs) when the worker is gone.
    pub fn submit(&self, job: Job) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };
        match sender.send(job) {
            Ok(()) => true,
            Err(err) => {
                warn!(job = ?err.0, "worker is gone; request dropped");
                false
            }
        }
    }

    /// Close the queue and wait for the thread to finish.
    pub fn shutdown(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Everything the worker thread owns.
struct WorkerState {
    config: Config,
    assets: Arc<Assets>,
    latest: Arc<AtomicU64>,
    results: Sender<Delivery>,
    decoder: SwipeDecoder,
    autocorrect: AutocorrectEngine,
    ranker: SuggestionRanker,
}

impl WorkerState {
    fn new(
        config: &Config,
        assets: Arc<Assets>,
        latest: Arc<AtomicU64>,
        results: Sender<Delivery>,
    ) -> Self {
        Self {
            config: config.clone(),
            decoder: SwipeDecoder::new(config),
            autocorrect: AutocorrectEngine::new(config, assets.clone()),
            ranker: SuggestionRanker::new(config),
            assets,
            latest,
            results,
        }
    }

    fn run(mut self, receiver: Receiver<Job>) {
        debug!("worker started");
        for job in receiver {
            self.handle(job);
        }
        debug!("worker stopped");
    }

    fn is_stale(&self, sequence: u64) -> bool {
        sequence < self.latest.load(Ordering::Acquire)
    }

    fn handle(&mut self, job: Job) {
        match job {
            Job::Layout(geometry) => self.autocorrect.set_layout(&geometry),
            Job::Swipe {
                sequence,
                language,
                keys,
            } => {
                if self.is_stale(sequence) {
                    trace!(sequence, "skipping stale swipe");
                    return;
                }
                let bundle = self.swipe_bundle(sequence, &language, &keys);
                self.deliver(RequestKind::Swipe, bundle);
            }
            Job::Text {
                sequence,
                language,
                context,
            } => {
                if self.is_stale(sequence) {
                    trace!(sequence, "skipping stale text request");
                    return;
                }
                let bundle = self.text_bundle(sequence, &language, &context);
                self.deliver(RequestKind::Text, bundle);
            }
            Job::Learn {
                language,
                context,
                word,
            } => {
                // the fallback pack is shared by every unknown language
                if !self.assets.has_language(&language) {
                    debug!(%language, %word, "no pack for language; not learned");
                    return;
                }
                self.assets.pack(&language).model.learn(context.as_slice(), &word)
            }
            Job::Reject {
                original,
                corrected,
            } => self.autocorrect.blacklist_correction(&original, &corrected),
        }
    }

    fn deliver(&self, kind: RequestKind, bundle: SuggestionBundle) {
        if self.results.send(Delivery { kind, bundle }).is_err() {
            debug!("result queue closed; bundle dropped");
        }
    }

    fn swipe_bundle(&self, sequence: u64, language: &str, keys: &KeyHitSequence) -> SuggestionBundle {
        let pack = self.assets.pack(language);
        let candidates = self.decoder.decode(keys, &pack.dictionary);
        // The swiped letters stand in for the word being typed: words only.
        self.ranker
            .rank(sequence, &keys.letters(), None, &candidates, &[])
    }

    fn text_bundle(&self, sequence: u64, language: &str, context: &str) -> SuggestionBundle {
        let (previous, current) = split_trailing(context);
        let previous_word = previous.last().map(String::as_str);
        let max = self.config.max_suggestions;

        let (words, emojis) = if current.is_empty() {
            let pack = self.assets.pack(language);
            let words = pack.model.predict(previous.as_slice(), max);
            let emojis = previous_word
                .map(|w| self.assets.emoji().lookup(w, self.config.max_emoji))
                .unwrap_or_default();
            (words, emojis)
        } else {
            (self.word_candidates(&current, language, max), Vec::new())
        };

        self.ranker
            .rank(sequence, &current, previous_word, &words, &emojis)
    }

    /// Candidates for a partly typed word: the correction (score 1.0),
    /// completions scaled to 0.9 and further corrections, sorted by score.
    /// Equal scores keep that order.
    fn word_candidates(&self, current: &str, language: &str, max: usize) -> Vec<Candidate> {
        let pack = self.assets.pack(language);
        let mut out = Vec::with_capacity(max * 2);

        if let Some(fix) = self.autocorrect.correct(current, language) {
            out.push(Candidate::new(fix, 1.0, CandidateSource::Autocorrect));
        }

        let completions = pack.dictionary.complete(current, max);
        let top = completions.first().map(|(_, f)| *f).unwrap_or(0).max(1) as f64;
        out.extend(completions.into_iter().map(|(word, freq)| {
            Candidate::new(
                match_case(current, &word),
                0.9 * freq as f64 / top,
                CandidateSource::Completion,
            )
        }));

        out.extend(self.autocorrect.suggest(current, language, max));
        sort_by_score(&mut out);

        let mut seen = AHashSet::new();
        out.retain(|c| seen.insert(c.text.to_lowercase()));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Dictionary;
    use crate::ngram::LanguageModel;
    use std::time::Duration;

    fn assets() -> Arc<Assets> {
        let dict = Dictionary::from_words(
            "en",
            [("the", 5000), ("then", 300), ("there", 900), ("ten", 200), ("hello", 100)],
        );
        let model = LanguageModel::new();
        model.train(["good morning", "good morning", "good night"]);
        Arc::new(Assets::new().with_pack("en", dict, model))
    }

    fn state() -> (WorkerState, Receiver<Delivery>) {
        let (tx, rx) = mpsc::channel();
        let latest = Arc::new(AtomicU64::new(0));
        (WorkerState::new(&Config::default(), assets(), latest, tx), rx)
    }

    #[test]
    fn text_with_partial_word_completes() {
        let (s, _rx) = state();
        let bundle = s.text_bundle(1, "en", "I said the");
        assert_eq!(bundle.top(), Some("the"));
        assert!(bundle.word_texts().contains(&"there"));
        assert!(bundle.emojis.is_empty());
    }

    #[test]
    fn text_with_typo_offers_correction_first() {
        let (s, _rx) = state();
        let bundle = s.text_bundle(1, "en", "Teh");
        assert_eq!(bundle.top(), Some("The"));
    }

    #[test]
    fn partial_word_bundle_is_sorted_by_score() {
        let dict = Dictionary::from_words("en", [("thin", 10), ("thing", 1), ("than", 1000)]);
        let assets = Arc::new(Assets::new().with_pack("en", dict, LanguageModel::new()));
        let (tx, _rx) = mpsc::channel();
        let s = WorkerState::new(&Config::default(), assets, Arc::new(AtomicU64::new(0)), tx);

        let bundle = s.text_bundle(1, "en", "thin");
        assert_eq!(bundle.top(), Some("thin"));
        assert!(bundle.words.windows(2).all(|w| w[0].score >= w[1].score));
        let texts = bundle.word_texts();
        let than = texts.iter().position(|w| *w == "than");
        let thing = texts.iter().position(|w| *w == "thing");
        assert!(than.is_some() && than < thing);
    }

    #[test]
    fn text_after_space_predicts() {
        let (s, _rx) = state();
        let bundle = s.text_bundle(4, "en", "so good ");
        assert_eq!(bundle.sequence, 4);
        assert_eq!(bundle.word_texts(), vec!["morning", "night"]);
    }

    #[test]
    fn trigger_word_adds_emoji() {
        let (s, _rx) = state();
        let bundle = s.text_bundle(1, "en", "I love ");
        assert!(!bundle.emojis.is_empty());
        assert!(bundle.emojis.len() <= 2);
    }

    #[test]
    fn learning_under_unknown_language_is_ignored() {
        let (mut s, _rx) = state();
        s.handle(Job::Learn {
            language: "fr".into(),
            context: vec!["bonjour".into()],
            word: "monde".into(),
        });
        assert!(s.assets.pack("fr").model.is_empty());
        let bundle = s.text_bundle(1, "de", "bonjour ");
        assert!(bundle.is_empty());
    }

    #[test]
    fn rejected_correction_is_not_offered_again() {
        let (mut s, _rx) = state();
        assert_eq!(s.text_bundle(1, "en", "teh").top(), Some("the"));
        s.handle(Job::Reject {
            original: "teh".into(),
            corrected: "the".into(),
        });
        let bundle = s.text_bundle(2, "en", "teh");
        assert!(bundle.word_texts().iter().all(|w| *w != "the"));
    }

    #[test]
    fn swipe_job_decodes() {
        let (s, _rx) = state();
        let keys = KeyHitSequence::from_letters("helo");
        let bundle = s.swipe_bundle(2, "en", &keys);
        assert_eq!(bundle.top(), Some("hello"));
    }

    #[test]
    fn stale_jobs_are_skipped() {
        let (tx, rx) = mpsc::channel();
        let latest = Arc::new(AtomicU64::new(5));
        let mut s = WorkerState::new(&Config::default(), assets(), latest, tx);
        s.handle(Job::Text {
            sequence: 4,
            language: "en".into(),
            context: "good ".into(),
        });
        assert!(rx.try_recv().is_err());
        s.handle(Job::Text {
            sequence: 5,
            language: "en".into(),
            context: "good ".into(),
        });
        assert_eq!(rx.try_recv().map(|d| d.sequence()).ok(), Some(5));
    }

    #[test]
    fn spawned_worker_processes_in_order() {
        let (tx, rx) = mpsc::channel();
        let latest = Arc::new(AtomicU64::new(1));
        let assets = assets();
        let mut worker = Worker::spawn(&Config::default(), assets.clone(), latest, tx).unwrap();
        assert!(worker.submit(Job::Learn {
            language: "en".into(),
            context: vec!["good".into()],
            word: "luck".into(),
        }));
        assert!(worker.submit(Job::Text {
            sequence: 1,
            language: "en".into(),
            context: "good ".into(),
        }));
        let delivery = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(delivery.kind, RequestKind::Text);
        assert!(delivery.bundle.word_texts().contains(&"luck"));
        worker.shutdown();
        assert!(!worker.submit(Job::Layout(Arc::new(KeyboardLayoutGeometry::qwerty(
            10.0, 10.0
        )))));
    }
}
