//! Optimize command - merge index segments

use crate::cli::output::{colors, print_success};
use crate::cli::OutputFormat;
use crate::core::services::Services;
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for the optimize command
#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// Workspace to optimize (default: every workspace)
    pub workspace: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub workspaces_optimized: usize,
}

/// Execute the optimize command
pub fn execute(
    args: OptimizeArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let count = services.engine.optimize(args.workspace.as_deref())?;
    let response = OptimizeResponse {
        workspaces_optimized: count,
    };

    match format {
        OutputFormat::Human => match &args.workspace {
            Some(workspace) => print_success(&format!("Optimized '{workspace}'")),
            None => println!(
                "{} {} workspace(s)",
                colors::success("Optimized"),
                colors::number(&count.to_string())
            ),
        },
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
