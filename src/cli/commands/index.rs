//! Index commands - crawl a workspace or apply change notifications

use crate::cli::output::{colors, format_duration, print_success};
use crate::cli::OutputFormat;
use crate::core::engine::{Change, IndexingStats};
use crate::core::graph::Path;
use crate::core::services::Services;
use clap::Args;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Arguments for the index command
#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Workspace to index (default: every workspace of the source)
    #[arg(long, short = 'w')]
    pub workspace: Option<String>,

    /// Subtree to re-index
    #[arg(long, short = 'p', default_value = "/")]
    pub path: String,

    /// Levels read from the source per batch (default: indexing.read_depth)
    #[arg(long, short = 'd')]
    pub depth: Option<usize>,
}

/// Arguments for the apply command
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// JSON file holding an array of changes
    pub changes: PathBuf,
}

/// Indexing result for one workspace
#[derive(Debug, Serialize)]
pub struct WorkspaceIndexed {
    pub workspace: String,
    pub path: String,
    #[serde(flatten)]
    pub stats: IndexingStats,
}

/// Indexing result response
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub workspaces: Vec<WorkspaceIndexed>,
    pub duration_secs: f64,
}

/// Change application response
#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    pub changes: usize,
    #[serde(flatten)]
    pub stats: IndexingStats,
    pub duration_secs: f64,
}

/// Execute the index command
pub fn execute(
    args: IndexArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::parse(&args.path)?;
    let workspaces = match args.workspace {
        Some(workspace) => vec![workspace],
        None => services.engine.source().workspace_names(),
    };

    let start = Instant::now();
    let mut indexed = Vec::with_capacity(workspaces.len());
    for workspace in workspaces {
        let stats = services.engine.index_content(&workspace, &path, args.depth)?;
        indexed.push(WorkspaceIndexed {
            workspace,
            path: path.to_string(),
            stats,
        });
    }
    let response = IndexResponse {
        workspaces: indexed,
        duration_secs: start.elapsed().as_secs_f64(),
    };

    match format {
        OutputFormat::Human => {
            for result in &response.workspaces {
                println!(
                    "{} {} at {}: {} indexed, {} removed",
                    colors::label("Indexed"),
                    colors::workspace(&result.workspace),
                    colors::node_path(&result.path),
                    colors::number(&result.stats.indexed.to_string()),
                    colors::number(&result.stats.removed.to_string()),
                );
            }
            print_success(&format!(
                "Done in {}",
                format_duration(response.duration_secs)
            ));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

/// Execute the apply command
pub fn execute_apply(
    args: ApplyArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(&args.changes).map_err(|e| {
        format!(
            "Cannot read changes file '{}': {}",
            args.changes.display(),
            e
        )
    })?;
    let changes: Vec<Change> = serde_json::from_str(&contents)?;

    let start = Instant::now();
    let stats = services.engine.index_changes(&changes)?;
    let response = ApplyResponse {
        changes: changes.len(),
        stats,
        duration_secs: start.elapsed().as_secs_f64(),
    };

    match format {
        OutputFormat::Human => {
            println!(
                "Applied {} change(s): {} indexed, {} removed, {} moved",
                colors::number(&response.changes.to_string()),
                colors::number(&stats.indexed.to_string()),
                colors::number(&stats.removed.to_string()),
                colors::number(&stats.moved.to_string()),
            );
            print_success(&format!(
                "Done in {}",
                format_duration(response.duration_secs)
            ));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
