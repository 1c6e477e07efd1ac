mod pipeline;
mod repl;

use anyhow::Result;
use clap::{Parser, Subcommand};
use glide_core::Config;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "glide", about = "Asset pipeline and suggestion REPL for glide-core")]
struct Cli {
    /// Config file (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a bincode dictionary from a word-frequency list
    BuildDict {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "en")]
        language: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Count a text corpus into a bincode n-gram model
    BuildNgram {
        #[arg(long, num_args = 1..)]
        corpus: Vec<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print built assets as JSON
    Inspect {
        #[arg(long)]
        dict: Option<PathBuf>,
        #[arg(long)]
        ngram: Option<PathBuf>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Write the default configuration
    InitConfig {
        #[arg(long, default_value = "glide.toml")]
        out: PathBuf,
    },
    /// Interactive suggestion loop over stdin
    Suggest {
        /// Asset manifest (TOML)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Word list or built dictionary, used when no manifest is given
        #[arg(long)]
        dict: Option<PathBuf>,
        /// Corpus or built model, used when no manifest is given
        #[arg(long)]
        ngram: Option<PathBuf>,
        #[arg(long, default_value = "en")]
        language: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_toml(path)?,
        None => Config::default(),
    };

    match cli.command {
        Command::BuildDict {
            input,
            language,
            out,
        } => pipeline::build_dict(&input, &language, &out)?,
        Command::BuildNgram { corpus, out } => pipeline::build_ngram(&corpus, &out, &config)?,
        Command::Inspect { dict, ngram, limit } => {
            pipeline::inspect(dict.as_deref(), ngram.as_deref(), limit, &config)?
        }
        Command::InitConfig { out } => {
            config.save_toml(&out)?;
            info!("wrote {}", out.display());
        }
        Command::Suggest {
            manifest,
            dict,
            ngram,
            language,
        } => {
            let assets = pipeline::load_assets(
                manifest.as_deref(),
                dict.as_deref(),
                ngram.as_deref(),
                &language,
                &config,
            )?;
            repl::run(&config, assets, &language)?
        }
    }
    Ok(())
}
