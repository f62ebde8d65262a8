//! Tests for the index and apply CLI commands

use crate::cli::test_helpers::{create_cli_test_services, create_indexed_services};
use nodex::cli::commands::index::{execute, execute_apply, ApplyArgs, IndexArgs};
use nodex::cli::OutputFormat;
use nodex::core::graph::Path;
use std::fs;

#[test]
fn test_index_every_workspace() {
    let (services, source, _temp) = create_cli_test_services();
    source.create_workspace("drafts");

    let args = IndexArgs {
        workspace: None,
        path: "/".to_string(),
        depth: None,
    };
    let result = execute(args, &services, OutputFormat::Json);
    assert!(result.is_ok(), "Index should succeed: {:?}", result.err());

    let hits = services
        .engine
        .full_text_search("default", "leaf", Some(50), 0)
        .unwrap();
    assert_eq!(hits.len(), 6);
}

#[test]
fn test_index_subtree_human() {
    let (services, _source, _temp) = create_cli_test_services();

    let args = IndexArgs {
        workspace: Some("default".to_string()),
        path: "/site/section/child1".to_string(),
        depth: Some(1),
    };
    assert!(execute(args, &services, OutputFormat::Human).is_ok());

    let hits = services
        .engine
        .full_text_search("default", "leaf", Some(50), 0)
        .unwrap();
    assert_eq!(hits.len(), 2);
}

#[test]
fn test_index_invalid_path() {
    let (services, _source, _temp) = create_cli_test_services();

    let args = IndexArgs {
        workspace: Some("default".to_string()),
        path: "relative/path".to_string(),
        depth: None,
    };
    assert!(execute(args, &services, OutputFormat::Human).is_err());
}

#[test]
fn test_index_unknown_workspace() {
    let (services, _source, _temp) = create_cli_test_services();

    let args = IndexArgs {
        workspace: Some("missing".to_string()),
        path: "/".to_string(),
        depth: None,
    };
    let err = execute(args, &services, OutputFormat::Human).unwrap_err();
    assert!(err.to_string().contains("missing"));
}

#[test]
fn test_apply_changes_file() {
    let (services, source, temp) = create_indexed_services();
    source
        .remove_below("default", &Path::parse("/other").unwrap())
        .unwrap();

    let file = temp.path().join("changes.json");
    fs::write(
        &file,
        r#"[{"type": "remove_node", "workspace": "default", "path": "/other"}]"#,
    )
    .unwrap();

    let result = execute_apply(ApplyArgs { changes: file }, &services, OutputFormat::Json);
    assert!(result.is_ok(), "Apply should succeed: {:?}", result.err());
    assert!(services
        .engine
        .full_text_search("default", "unrelated", None, 0)
        .unwrap()
        .is_empty());
}

#[test]
fn test_apply_missing_file() {
    let (services, _source, temp) = create_cli_test_services();

    let args = ApplyArgs {
        changes: temp.path().join("absent.json"),
    };
    let err = execute_apply(args, &services, OutputFormat::Human).unwrap_err();
    assert!(err.to_string().contains("Cannot read changes file"));
}

#[test]
fn test_apply_malformed_changes() {
    let (services, _source, temp) = create_cli_test_services();
    let file = temp.path().join("changes.json");
    fs::write(&file, r#"[{"type": "rename_everything"}]"#).unwrap();

    assert!(execute_apply(ApplyArgs { changes: file }, &services, OutputFormat::Human).is_err());
}
