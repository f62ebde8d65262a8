//! nodex CLI - index and search hierarchical content
//!
//! # Examples
//!
//! ```bash
//! # Index every workspace of a node dump
//! nodex --source repo.json index
//!
//! # Re-index one subtree, two levels per read
//! nodex --source repo.json index --workspace default --path /docs --depth 2
//!
//! # Free-text search
//! nodex --source repo.json search default "annual report"
//!
//! # Children of /docs with their titles
//! nodex --source repo.json query default \
//!     --constraint '{"type":"child_node","parent":"/docs"}' --column title
//!
//! # Show configuration
//! nodex show-config
//! ```

use clap::Parser;
use nodex::cli::output::print_error;
use nodex::cli::{run, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "nodex=info".into());
    // Logs go to stderr so stdout stays parseable
    if cli.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    if let Err(e) = run(cli) {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}
