//! Config command - show current configuration

use crate::cli::output::print_header;
use crate::cli::OutputFormat;
use crate::core::config::Config;
use crate::core::xdg::XdgDirs;
use clap::Args;
use serde::Serialize;

/// Arguments for the show-config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Also list the property rule overrides
    #[arg(long, short = 'a')]
    pub all: bool,
}

/// Configuration response
#[derive(Debug, Serialize)]
pub struct ConfigResponse<'a> {
    pub config_file: String,
    #[serde(flatten)]
    pub config: &'a Config,
}

/// Execute the show-config command
pub fn execute(
    args: ConfigArgs,
    config: &Config,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let xdg = XdgDirs::new();
    let response = ConfigResponse {
        config_file: xdg.config_file().to_string_lossy().into_owned(),
        config,
    };

    match format {
        OutputFormat::Human => {
            print_header("Configuration:");
            println!("  config_file: {}", response.config_file);
            println!("  storage:");
            println!("    index_dir: {}", config.storage.index_dir.display());
            println!("    in_memory: {}", config.storage.in_memory);
            println!("  indexing:");
            println!("    writer_heap_bytes: {}", config.indexing.writer_heap_bytes);
            println!("    delete_batch_size: {}", config.indexing.delete_batch_size);
            println!("    read_depth: {}", config.indexing.read_depth);
            println!(
                "    optimize_after_changes: {}",
                config.indexing.optimize_after_changes
            );
            println!("  search:");
            println!(
                "    default_max_results: {}",
                config.search.default_max_results
            );
            println!("    max_results: {}", config.search.max_results);
            println!("    max_query_length: {}", config.search.max_query_length);
            if args.all {
                let rules = &config.rules;
                println!("  rules:");
                println!("    skip: {:?}", rules.skip);
                println!("    index: {:?}", rules.index);
                println!("    analyze: {:?}", rules.analyze);
                println!("    store: {:?}", rules.store);
                println!("    full_text: {:?}", rules.full_text);
                println!("    dates: {:?}", rules.dates);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
