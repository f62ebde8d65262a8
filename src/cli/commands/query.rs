//! Query command - run one structured access against a workspace

use crate::cli::output::{colors, format_location, print_output, truncate};
use crate::cli::OutputFormat;
use crate::core::search::{Constraint, QueryCommand};
use crate::core::services::Services;
use clap::Args;
use std::sync::Arc;

/// Arguments for the query command
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Workspace to query
    pub workspace: String,

    /// Constraint as JSON, e.g. '{"type":"child_node","parent":"/docs"}'
    #[arg(long, short = 'c')]
    pub constraint: Option<String>,

    /// Property to project (can be specified multiple times)
    #[arg(long = "column")]
    pub columns: Vec<String>,

    /// Include the full-text score of each row
    #[arg(long)]
    pub score: bool,

    /// Maximum number of rows (default: search.max_results)
    #[arg(long, short = 'k')]
    pub limit: Option<usize>,

    /// Number of rows to skip
    #[arg(long, default_value = "0")]
    pub offset: usize,
}

impl QueryArgs {
    /// Build the access request these arguments describe
    pub fn command(&self) -> Result<QueryCommand, Box<dyn std::error::Error>> {
        let mut command = QueryCommand::new("nodes").with_columns(self.columns.iter().cloned());
        if let Some(json) = &self.constraint {
            let constraint: Constraint = serde_json::from_str(json)
                .map_err(|e| format!("Invalid constraint JSON: {e}"))?;
            command = command.with_constraint(constraint);
        }
        if self.score {
            command = command.with_score();
        }
        command.limit = self.limit;
        command.offset = self.offset;
        Ok(command)
    }
}

/// Execute the query command
pub fn execute(
    args: QueryArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let command = args.command()?;
    let results = services.engine.execute(&args.workspace, &command)?;

    match format {
        OutputFormat::Human => {
            println!(
                "{} row(s) from '{}' in {}ms\n",
                colors::number(&results.len().to_string()),
                colors::workspace(&args.workspace),
                results.duration_ms
            );
            for tuple in &results.tuples {
                match tuple.score {
                    Some(score) => println!(
                        "{} {}",
                        format_location(&tuple.location),
                        colors::score(&format!("(score: {score:.2})"))
                    ),
                    None => println!("{}", format_location(&tuple.location)),
                }
                for (column, value) in results.columns.iter().zip(&tuple.values) {
                    let shown = value.as_deref().map_or_else(
                        || colors::dim("<none>").to_string(),
                        |v| truncate(v, 100),
                    );
                    println!("    {}: {}", colors::label(column), shown);
                }
            }
        }
        OutputFormat::Json => print_output(&results, format),
    }

    Ok(())
}
