//! Tests for the search CLI command
//!
//! - Valid queries with results
//! - Empty results
//! - Workspace not found errors
//! - Rejected queries

use crate::cli::test_helpers::create_indexed_services;
use nodex::cli::commands::search::{execute, SearchArgs};
use nodex::cli::OutputFormat;

fn args(workspace: &str, text: &str) -> SearchArgs {
    SearchArgs {
        workspace: workspace.to_string(),
        text: text.to_string(),
        limit: Some(10),
        offset: 0,
    }
}

#[test]
fn test_search_valid_query_human() {
    let (services, _source, _temp) = create_indexed_services();
    let result = execute(args("default", "leaf"), &services, OutputFormat::Human);
    assert!(result.is_ok(), "Search should succeed: {:?}", result.err());
}

#[test]
fn test_search_valid_query_json() {
    let (services, _source, _temp) = create_indexed_services();
    let result = execute(args("default", "child AND number"), &services, OutputFormat::Json);
    assert!(result.is_ok(), "JSON search should succeed: {:?}", result.err());
}

#[test]
fn test_search_empty_results() {
    let (services, _source, _temp) = create_indexed_services();
    let result = execute(args("default", "nonexistent_term_xyz"), &services, OutputFormat::Human);
    assert!(result.is_ok(), "Search with no results should succeed");
}

#[test]
fn test_search_workspace_not_found() {
    let (services, _source, _temp) = create_indexed_services();
    let err = execute(args("missing", "leaf"), &services, OutputFormat::Human).unwrap_err();
    assert!(err.to_string().contains("missing"));
}

#[test]
fn test_search_rejects_internal_field() {
    let (services, _source, _temp) = create_indexed_services();
    let err = execute(args("default", "props:leaf"), &services, OutputFormat::Human).unwrap_err();
    assert!(err.to_string().contains("props"));
}

#[test]
fn test_search_rejects_long_query() {
    let (services, _source, _temp) = create_indexed_services();
    let long = "word ".repeat(200);
    assert!(execute(args("default", &long), &services, OutputFormat::Human).is_err());
}
