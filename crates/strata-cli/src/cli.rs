//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use strata_core::ListFormat;

#[derive(Parser, Debug)]
#[command(name = "strata", author, version, about = "Index and query dataset directories", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ~/.config/strata/config.toml).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a dataset in DIR (default: current directory).
    Init { dir: Option<PathBuf> },

    /// Add files and directories to the index.
    Add {
        /// Add everything below the given directories.
        #[arg(short, long)]
        recursive: bool,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Remove entries (directories with their contents) from the index.
    #[command(alias = "remove")]
    Rm {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List indexed entries. Paths may contain `*` wildcards.
    #[command(alias = "list")]
    Ls {
        #[arg(short, long)]
        recursive: bool,
        /// Levels to descend when recursive; negative means unlimited.
        #[arg(short = 'd', long, allow_negative_numbers = true)]
        max_depth: Option<i32>,
        #[arg(short, long)]
        format: Option<ListFormat>,
        paths: Vec<PathBuf>,
    },

    /// Show or set the dataset tag (`[registry/]org/dataset`).
    Tag {
        tag: Option<String>,
        /// Registry shown for tags that do not name one.
        #[arg(short, long)]
        registry: Option<String>,
    },
}
