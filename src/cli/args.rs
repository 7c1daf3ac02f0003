//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Builds the include hierarchy of a domain-list-community dataset and renders it as JSON and HTML
#[derive(Parser, Debug)]
#[command(name = "cattree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Local config file (default: ./cattree.toml if present)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Ignore the global config file
    #[arg(long, global = true)]
    pub no_global: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write domain_tree.json and domain_tree.html
    Export {
        /// Dataset directory (overrides data_dir)
        #[arg(value_hint = ValueHint::DirPath)]
        data_dir: Option<PathBuf>,
        /// Output directory (overrides output_dir)
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        output_dir: Option<PathBuf>,
    },

    /// Print the category hierarchy to the terminal
    Tree {
        /// Dataset directory (overrides data_dir)
        #[arg(value_hint = ValueHint::DirPath)]
        data_dir: Option<PathBuf>,
    },

    /// Print the JSON document to stdout
    Json {
        /// Dataset directory (overrides data_dir)
        #[arg(value_hint = ValueHint::DirPath)]
        data_dir: Option<PathBuf>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Show config file locations
    Path,
    /// Print a commented config template
    Template,
}
