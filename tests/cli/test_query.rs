//! Tests for the query CLI command

use crate::cli::test_helpers::create_indexed_services;
use nodex::cli::commands::query::{execute, QueryArgs};
use nodex::cli::OutputFormat;

fn args(constraint: Option<&str>) -> QueryArgs {
    QueryArgs {
        workspace: "default".to_string(),
        constraint: constraint.map(str::to_string),
        columns: vec!["title".to_string()],
        score: false,
        limit: None,
        offset: 0,
    }
}

#[test]
fn test_query_children_human() {
    let (services, _source, _temp) = create_indexed_services();
    let result = execute(
        args(Some(r#"{"type":"child_node","parent":"/site/section"}"#)),
        &services,
        OutputFormat::Human,
    );
    assert!(result.is_ok(), "Query should succeed: {:?}", result.err());
}

#[test]
fn test_query_comparison_json() {
    let constraint = r#"{
        "type": "comparison",
        "operand": {"type": "property_value", "property": "title"},
        "operator": "like",
        "value": {"type": "string", "value": "Leaf%"}
    }"#;
    let (services, _source, _temp) = create_indexed_services();
    let mut query = args(Some(constraint));
    query.score = true;
    let result = execute(query, &services, OutputFormat::Json);
    assert!(result.is_ok(), "Query should succeed: {:?}", result.err());
}

#[test]
fn test_query_without_constraint() {
    let (services, _source, _temp) = create_indexed_services();
    let mut query = args(None);
    query.limit = Some(3);
    assert!(execute(query, &services, OutputFormat::Human).is_ok());
}

#[test]
fn test_query_invalid_constraint() {
    let (services, _source, _temp) = create_indexed_services();
    let err = execute(args(Some("not json")), &services, OutputFormat::Human).unwrap_err();
    assert!(err.to_string().contains("Invalid constraint JSON"));
}

#[test]
fn test_query_workspace_not_found() {
    let (services, _source, _temp) = create_indexed_services();
    let mut query = args(None);
    query.workspace = "missing".to_string();
    assert!(execute(query, &services, OutputFormat::Json).is_err());
}
