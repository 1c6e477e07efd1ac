//! Line-oriented driver for a `Keyboard` session.
//!
//! Plain lines are sent as the text before the cursor (keep a trailing space
//! to ask for next-word predictions). Commands:
//!
//! - `/swipe WORD` trace WORD across a QWERTY layout
//! - `/learn WORD... NEXT` teach that NEXT follows the preceding words
//! - `/lang TAG` switch language
//! - `/quit`
use anyhow::Result;
use glide_core::{
    Assets, Config, Delivery, GestureOutcome, Keyboard, KeyboardLayoutGeometry, TouchPhase,
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const KEY_WIDTH: f32 = 40.0;
const KEY_HEIGHT: f32 = 60.0;
const WAIT: Duration = Duration::from_secs(2);

pub fn run(config: &Config, assets: Assets, language: &str) -> Result<()> {
    let mut keyboard = Keyboard::new(config, Arc::new(assets))?;
    keyboard.set_language(language);
    keyboard.on_layout_changed(KeyboardLayoutGeometry::qwerty(KEY_WIDTH, KEY_HEIGHT));

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(rest) = line.strip_prefix('/') {
            let mut parts = rest.split_whitespace();
            match parts.next() {
                Some("quit") | Some("q") => break,
                Some("swipe") => match parts.next() {
                    Some(word) => swipe(&mut keyboard, word),
                    None => println!("usage: /swipe WORD"),
                },
                Some("learn") => {
                    let mut words: Vec<&str> = parts.collect();
                    match words.pop() {
                        Some(next) => {
                            keyboard.on_word_finalized(words.as_slice(), next);
                            println!("learned {:?} -> {}", words, next);
                        }
                        None => println!("usage: /learn WORD... NEXT"),
                    }
                }
                Some("lang") => match parts.next() {
                    Some(tag) => keyboard.set_language(tag),
                    None => println!("language: {}", keyboard.language()),
                },
                _ => println!("commands: /swipe /learn /lang /quit"),
            }
        } else {
            keyboard.on_text_committed(line);
            print_delivery(keyboard.wait_for_bundle(WAIT));
        }

        write!(stdout, "> ")?;
        stdout.flush()?;
    }
    Ok(())
}

/// Replay `word` as a swipe through its key centres.
fn swipe(keyboard: &mut Keyboard, word: &str) {
    let points: Vec<(f32, f32)> = word
        .chars()
        .filter_map(|c| keyboard.geometry().key_for_letter(c))
        .map(|k| k.bounds.center())
        .collect();
    let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) else {
        println!("no keys for {:?}", word);
        return;
    };

    let step = 80;
    keyboard.on_gesture_event(TouchPhase::Down, first.0, first.1, 0);
    let mut t = 0;
    for (x, y) in &points {
        t += step;
        keyboard.on_gesture_event(TouchPhase::Move, *x, *y, t);
    }
    t += step;
    match keyboard.on_gesture_event(TouchPhase::Up, last.0, last.1, t) {
        GestureOutcome::Submitted(_) => print_delivery(keyboard.wait_for_bundle(WAIT)),
        outcome => println!("{:?}", outcome),
    }
}

fn print_delivery(delivery: Option<Delivery>) {
    match delivery {
        Some(d) => {
            println!("words:  {}", d.bundle.word_texts().join(" | "));
            if !d.bundle.emojis.is_empty() {
                println!("emoji:  {}", d.bundle.emoji_texts().join(" "));
            }
        }
        None => warn!("no suggestions before timeout"),
    }
}
