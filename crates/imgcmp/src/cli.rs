use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::config::{BatchConfig, DiffConfig};

#[derive(Parser)]
#[command(
    name = "imgcmp",
    about = "Perceptual image comparison, one pair or a whole batch"
)]
pub struct Cli {
    /// Show debug logs (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Config file (default: ./imgcmp.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare two images (exit 0 = same, 98 = differ)
    Compare {
        /// First image (path or http(s) URL)
        left: String,
        /// Second image (path or http(s) URL)
        right: String,
        /// Write a PNG highlighting differing pixels
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        #[command(flatten)]
        diff: DiffConfig,
    },

    /// Print the dimensions of one image
    Info {
        /// Image path or http(s) URL
        image: String,
    },

    /// Run every comparison in a JSON manifest and report the ones that differ
    Batch {
        /// Manifest: {"diffs": [{"img": ..., "baselines": [...]}]}
        manifest: PathBuf,
        /// Write the JSON report here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        #[command(flatten)]
        diff: DiffConfig,
        #[command(flatten)]
        batch: BatchConfig,
    },

    /// Create imgcmp.toml with commented defaults
    Init {
        /// Overwrite an existing config
        #[arg(long, short = 'f')]
        force: bool,
    },
}
