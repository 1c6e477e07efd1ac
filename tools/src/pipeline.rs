use anyhow::{bail, Context, Result};
use glide_core::store;
use glide_core::{Assets, Config, Dictionary, DictionaryEntry, LanguageModel, NGramEntry};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Word list (or built dictionary) to bincode.
pub fn build_dict(input: &Path, language: &str, out: &Path) -> Result<()> {
    let dict = store::load_dictionary(input, language)?;
    if dict.is_empty() {
        bail!("{} contains no usable words", input.display());
    }
    dict.save_bincode(out)
        .with_context(|| format!("writing dictionary {}", out.display()))?;
    info!(words = dict.len(), "wrote {}", out.display());
    Ok(())
}

/// One or more corpora to a bincode n-gram model.
pub fn build_ngram(corpora: &[PathBuf], out: &Path, config: &Config) -> Result<()> {
    if corpora.is_empty() {
        bail!("no corpus given");
    }
    let model = LanguageModel::with_config(config);
    for path in corpora {
        let sentences = store::read_corpus(path)?;
        info!(sentences = sentences.len(), "counting {}", path.display());
        model.train(sentences);
    }
    model
        .save_bincode(out)
        .with_context(|| format!("writing model {}", out.display()))?;
    info!(contexts = model.len(), "wrote {}", out.display());
    Ok(())
}

#[derive(Serialize)]
struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    dictionary: Option<DictionaryReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ngram: Option<NGramReport>,
}

#[derive(Serialize)]
struct DictionaryReport {
    language: String,
    words: usize,
    most_frequent: Vec<DictionaryEntry>,
}

#[derive(Serialize)]
struct NGramReport {
    contexts: usize,
    rows: usize,
    heaviest: Vec<NGramEntry>,
}

pub fn inspect(dict: Option<&Path>, ngram: Option<&Path>, limit: usize, config: &Config) -> Result<()> {
    if dict.is_none() && ngram.is_none() {
        bail!("nothing to inspect: pass --dict and/or --ngram");
    }

    let dictionary = match dict {
        Some(path) => {
            let d = Dictionary::load_bincode(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let mut entries = d.entries();
            entries.sort_by(|a, b| b.frequency.cmp(&a.frequency).then_with(|| a.word.cmp(&b.word)));
            entries.truncate(limit);
            Some(DictionaryReport {
                language: d.language().to_string(),
                words: d.len(),
                most_frequent: entries,
            })
        }
        None => None,
    };

    let ngram = match ngram {
        Some(path) => {
            let m = LanguageModel::load_bincode(path, config)
                .with_context(|| format!("reading {}", path.display()))?;
            let mut rows = m.entries();
            let total = rows.len();
            rows.sort_by(|a, b| b.weight.total_cmp(&a.weight));
            rows.truncate(limit);
            Some(NGramReport {
                contexts: m.len(),
                rows: total,
                heaviest: rows,
            })
        }
        None => None,
    };

    let report = Report { dictionary, ngram };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Assets from a manifest, or from a single dictionary/model pair.
pub fn load_assets(
    manifest: Option<&Path>,
    dict: Option<&Path>,
    ngram: Option<&Path>,
    language: &str,
    config: &Config,
) -> Result<Assets> {
    if let Some(manifest) = manifest {
        return store::load_assets(manifest, config);
    }
    let Some(dict) = dict else {
        bail!("pass --manifest or --dict");
    };
    let dictionary = store::load_dictionary(dict, language)?;
    let model = match ngram {
        Some(path) => store::load_model(path, config)?,
        None => LanguageModel::with_config(config),
    };
    Ok(Assets::new().with_pack(language, dictionary, model))
}
