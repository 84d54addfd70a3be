//! CLI for the ytdm download engine.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use ytdm_core::config;
use ytdm_core::downloading::QualityPreference;
use ytdm_core::youtube::Container;

use commands::{run_config, run_download, run_options};

/// Top-level CLI for the ytdm download engine.
#[derive(Debug, Parser)]
#[command(name = "ytdm")]
#[command(about = "ytdm: YouTube video and playlist downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Resolve queries and download everything they yield.
    Download {
        /// Video URLs or IDs, playlist URLs, channel URLs or @handles, or
        /// free-form search terms (prefix with `?` to force a search).
        #[arg(required = true)]
        queries: Vec<String>,

        /// Output directory (default: current directory).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Download up to N videos concurrently (default from config).
        #[arg(long, value_name = "N")]
        parallel: Option<usize>,

        /// Target container: mp4, webm, mp3, or ogg.
        #[arg(long)]
        container: Option<Container>,

        /// Quality to prefer: highest or lowest.
        #[arg(long)]
        quality: Option<QualityPreference>,

        /// Shortcut for `--container mp3`.
        #[arg(long, conflicts_with = "container")]
        audio_only: bool,
    },

    /// List the downloadable options for a single video.
    Options {
        /// Video URL or ID.
        query: String,
    },

    /// Show the effective configuration and where it is loaded from.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Download {
                queries,
                output,
                parallel,
                container,
                quality,
                audio_only,
            } => {
                let output = match output {
                    Some(dir) => dir,
                    None => std::env::current_dir()?,
                };
                let container = container.or(audio_only.then_some(Container::Mp3));
                run_download(&cfg, &queries, &output, parallel, container, quality).await?;
            }
            CliCommand::Options { query } => run_options(&cfg, &query).await?,
            CliCommand::Config => run_config(&cfg)?,
        }

        Ok(())
    }
}
