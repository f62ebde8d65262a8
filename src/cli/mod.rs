//! CLI adapter for nodex
//!
//! Provides a command-line interface over a JSON node dump: index its
//! workspaces, search them and run structured queries.
//!
//! # Architecture
//!
//! ```text
//!              +------------------+
//!              |     core/        |
//!              |  (domain logic)  |
//!              +--------+---------+
//!                       |
//!                       v
//!              +------------------+
//!              |      cli/        |
//!              | (clap adapter)   |
//!              +------------------+
//! ```

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// nodex - search indexing for hierarchical content
///
/// Indexes the nodes of a content source into per-workspace paths and
/// content indexes, then answers free-text searches and structured
/// queries against them.
#[derive(Parser, Debug)]
#[command(name = "nodex")]
#[command(version)]
#[command(about = "Search indexing for hierarchical content", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// JSON node dump backing the workspaces
    #[arg(long, global = true, env = "NODEX_SOURCE")]
    pub source: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index the content of a workspace
    Index(commands::IndexArgs),

    /// Apply a JSON file of change notifications
    Apply(commands::ApplyArgs),

    /// Free-text search within a workspace
    Search(commands::SearchArgs),

    /// Run a structured query against a workspace
    Query(commands::QueryArgs),

    /// Merge index segments
    Optimize(commands::OptimizeArgs),

    /// Show current configuration
    #[command(name = "show-config")]
    ShowConfig(commands::ConfigArgs),

    /// Generate shell completion scripts
    ///
    /// Output completion script to stdout. To install:
    ///
    ///   bash:  nodex completions bash > ~/.local/share/bash-completion/completions/nodex
    ///   zsh:   nodex completions zsh > ~/.zfunc/_nodex
    ///   fish:  nodex completions fish > ~/.config/fish/completions/nodex.fish
    Completions(commands::CompletionsArgs),
}

/// Run the CLI with the provided arguments
pub fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    use crate::core::config::Config;
    use crate::core::engine::InMemorySource;
    use crate::core::services::Services;
    use crate::core::xdg::XdgDirs;
    use std::sync::Arc;

    // Handle commands that don't need services
    match cli.command {
        Commands::Completions(args) => return commands::completions::execute(args),
        Commands::ShowConfig(args) => {
            let config = Config::load()?;
            return commands::config::execute(args, &config, cli.format);
        }
        _ => {}
    }

    let Some(source_path) = cli.source.as_ref() else {
        return Err("No content source given. Pass --source <dump.json> or set NODEX_SOURCE.".into());
    };

    // Initialize XDG directories
    let xdg = XdgDirs::new();
    xdg.ensure_dirs_exist()?;
    xdg.log_paths();

    // Load configuration
    let config = Config::load_with_xdg(&xdg)?;
    config.log_config();

    // Create services
    let source = Arc::new(InMemorySource::from_file(source_path)?);
    let services = Arc::new(Services::new(config, source));

    // Execute command
    match cli.command {
        Commands::Index(args) => commands::index::execute(args, &services, cli.format),
        Commands::Apply(args) => commands::index::execute_apply(args, &services, cli.format),
        Commands::Search(args) => commands::search::execute(args, &services, cli.format),
        Commands::Query(args) => commands::query::execute(args, &services, cli.format),
        Commands::Optimize(args) => commands::optimize::execute(args, &services, cli.format),
        Commands::ShowConfig(_) | Commands::Completions(_) => unreachable!(), // Handled above
    }
}
