//! Tests for the show-config and optimize CLI commands

use crate::cli::test_helpers::create_indexed_services;
use nodex::cli::commands::config::{self, ConfigArgs};
use nodex::cli::commands::optimize::{self, OptimizeArgs};
use nodex::cli::OutputFormat;
use nodex::core::config::Config;

#[test]
fn test_show_config_human() {
    let config = Config::default();
    assert!(config::execute(ConfigArgs { all: true }, &config, OutputFormat::Human).is_ok());
}

#[test]
fn test_show_config_json() {
    let config = Config::default();
    assert!(config::execute(ConfigArgs { all: false }, &config, OutputFormat::Json).is_ok());
}

#[test]
fn test_optimize_all_workspaces() {
    let (services, _source, _temp) = create_indexed_services();
    let args = OptimizeArgs { workspace: None };
    assert!(optimize::execute(args, &services, OutputFormat::Human).is_ok());
}

#[test]
fn test_optimize_unknown_workspace() {
    let (services, _source, _temp) = create_indexed_services();
    let args = OptimizeArgs {
        workspace: Some("missing".to_string()),
    };
    assert!(optimize::execute(args, &services, OutputFormat::Json).is_err());
}
