//! One-time asset loading.
//!
//! Word lists and corpora are plain text; built assets are bincode. An asset
//! manifest in TOML ties a set of files together:
//!
//! ```toml
//! emoji = "emoji.json"
//!
//! [languages.en]
//! dictionary = "en.dict.bin"
//! model = "en.ngram.bin"
//! ```
//!
//! Relative paths are resolved against the manifest's directory. Only this
//! module and the bincode helpers on `Dictionary`/`LanguageModel` touch the
//! filesystem, and only at initialization.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::assets::{Assets, LanguagePack};
use crate::emoji::EmojiIndex;
use crate::lexicon::Dictionary;
use crate::ngram::LanguageModel;
use crate::Config;

/// Files making up one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackManifest {
    /// Word list (`.txt`/`.tsv`) or built dictionary (`.bin`).
    pub dictionary: PathBuf,
    /// Corpus text or built model (`.bin`). Optional.
    #[serde(default)]
    pub model: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetManifest {
    #[serde(default)]
    pub emoji: Option<PathBuf>,
    #[serde(default)]
    pub languages: BTreeMap<String, PackManifest>,
}

impl AssetManifest {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

fn is_bincode(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("bin")
}

/// Read a frequency list: one word per line, optionally followed by
/// whitespace and a frequency. Missing frequencies count as 1; blank lines
/// and `#` comments are skipped, lines with an unreadable frequency are
/// skipped with a warning.
pub fn read_word_list<P: AsRef<Path>>(path: P) -> Result<Vec<(String, u32)>> {
    let p = path.as_ref();
    let f = File::open(p).with_context(|| format!("opening word list {}", p.display()))?;
    let mut words = Vec::new();
    for (lineno, line) in BufReader::new(f).lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", p.display()))?;
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let mut parts = s.split_whitespace();
        let Some(word) = parts.next() else {
            continue;
        };
        match parts.next().map(str::parse::<u32>) {
            None => words.push((word.to_string(), 1)),
            Some(Ok(freq)) => words.push((word.to_string(), freq)),
            Some(Err(_)) => warn!(line = lineno + 1, file = %p.display(), "bad frequency; line skipped"),
        }
    }
    Ok(words)
}

/// Read a corpus into sentences. Lines are split further at `.`, `!` and
/// `?`; empty sentences are dropped.
pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let p = path.as_ref();
    let f = File::open(p).with_context(|| format!("opening corpus {}", p.display()))?;
    let mut sentences = Vec::new();
    for line in BufReader::new(f).lines() {
        let line = line.with_context(|| format!("reading {}", p.display()))?;
        sentences.extend(
            line.split(['.', '!', '?'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
    }
    Ok(sentences)
}

/// Load a dictionary from a word list or a `.bin` built by `Dictionary::save_bincode`.
///
/// A `.bin` keeps the language it was built for; a mismatch with `language`
/// is logged and the dictionary is returned unchanged.
pub fn load_dictionary<P: AsRef<Path>>(path: P, language: &str) -> Result<Dictionary> {
    let p = path.as_ref();
    let dict = if is_bincode(p) {
        let dict = Dictionary::load_bincode(p)
            .with_context(|| format!("loading dictionary {}", p.display()))?;
        if !dict.language().eq_ignore_ascii_case(language) {
            warn!(
                expected = language,
                found = dict.language(),
                file = %p.display(),
                "dictionary was built for another language"
            );
        }
        dict
    } else {
        Dictionary::from_words(language, read_word_list(p)?)
    };
    info!(language, words = dict.len(), file = %p.display(), "dictionary loaded");
    Ok(dict)
}

/// Load a language model from a corpus or a `.bin` built by `LanguageModel::save_bincode`.
pub fn load_model<P: AsRef<Path>>(path: P, config: &Config) -> Result<LanguageModel> {
    let p = path.as_ref();
    let model = if is_bincode(p) {
        LanguageModel::load_bincode(p, config)
            .with_context(|| format!("loading language model {}", p.display()))?
    } else {
        let model = LanguageModel::with_config(config);
        model.train(read_corpus(p)?);
        model
    };
    info!(contexts = model.len(), file = %p.display(), "language model loaded");
    Ok(model)
}

/// Load every file named by the manifest at `path`.
pub fn load_assets<P: AsRef<Path>>(path: P, config: &Config) -> Result<Assets> {
    let p = path.as_ref();
    let content =
        std::fs::read_to_string(p).with_context(|| format!("reading manifest {}", p.display()))?;
    let manifest = AssetManifest::from_toml_str(&content)
        .with_context(|| format!("parsing manifest {}", p.display()))?;
    let base = p.parent().unwrap_or_else(|| Path::new("."));
    assets_from_manifest(&manifest, base, config)
}

pub fn assets_from_manifest(manifest: &AssetManifest, base: &Path, config: &Config) -> Result<Assets> {
    let mut assets = Assets::new();
    if let Some(emoji) = &manifest.emoji {
        assets = assets.with_emoji(EmojiIndex::load_json(base.join(emoji))?);
    }
    for (language, files) in &manifest.languages {
        let dictionary = load_dictionary(base.join(&files.dictionary), language)?;
        let model = match &files.model {
            Some(m) => load_model(base.join(m), config)?,
            None => LanguageModel::with_config(config),
        };
        assets.insert_pack(language, LanguagePack::new(dictionary, model));
    }
    Ok(assets)
}
