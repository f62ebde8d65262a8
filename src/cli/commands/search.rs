//! Search command - free-text search within a workspace

use crate::cli::output::{colors, format_location};
use crate::cli::OutputFormat;
use crate::core::graph::Location;
use crate::core::services::Services;
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Workspace to search
    pub workspace: String,

    /// Search text (supports AND, OR, NOT, phrases and +/- prefixes)
    pub text: String,

    /// Maximum number of results (default: search.default_max_results)
    #[arg(long, short = 'k')]
    pub limit: Option<usize>,

    /// Number of best hits to skip
    #[arg(long, default_value = "0")]
    pub offset: usize,
}

/// Search result item
#[derive(Debug, Serialize)]
pub struct SearchResultItem {
    pub rank: usize,
    pub location: Location,
    pub score: f32,
}

/// Search response
#[derive(Debug, Serialize)]
pub struct SearchResponseOutput {
    pub query: String,
    pub workspace: String,
    pub total_results: usize,
    pub results: Vec<SearchResultItem>,
}

/// Execute the search command
pub fn execute(
    args: SearchArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let hits = services.engine.full_text_search_hits(
        &args.workspace,
        &args.text,
        args.limit,
        args.offset,
    )?;

    let output = SearchResponseOutput {
        query: args.text.clone(),
        workspace: args.workspace.clone(),
        total_results: hits.len(),
        results: hits
            .into_iter()
            .enumerate()
            .map(|(i, hit)| SearchResultItem {
                rank: args.offset + i + 1,
                location: hit.location,
                score: hit.score,
            })
            .collect(),
    };

    match format {
        OutputFormat::Human => {
            if output.results.is_empty() {
                println!(
                    "No results found for '{}' in workspace '{}'",
                    colors::label(&args.text),
                    colors::workspace(&output.workspace)
                );
            } else {
                println!(
                    "Found {} result(s) in '{}':\n",
                    colors::number(&output.total_results.to_string()),
                    colors::workspace(&output.workspace)
                );
                for result in &output.results {
                    println!(
                        "[{}] {} {}",
                        colors::rank(&result.rank.to_string()),
                        format_location(&result.location),
                        colors::score(&format!("(score: {:.2})", result.score))
                    );
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
