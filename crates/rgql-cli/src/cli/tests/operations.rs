//! Tests for query / mutate parsing and their argument helpers.

use super::parse;
use crate::cli::commands::{load_document, parse_variables};
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::io::Write;

#[test]
fn cli_parse_query_minimal() {
    match parse(&["rgql", "query", "{ me { id } }"]) {
        CliCommand::Query(args) => {
            assert_eq!(args.document, "{ me { id } }");
            assert!(args.variables.is_none());
            assert!(args.operation_name.is_none());
            assert!(args.endpoint.is_none());
            assert!(args.deadline.is_none());
        }
        _ => panic!("expected Query"),
    }
}

#[test]
fn cli_parse_query_all_flags() {
    match parse(&[
        "rgql",
        "query",
        "@get_user.graphql",
        "--variables",
        r#"{"id":"1"}"#,
        "--operation",
        "GetUser",
        "--endpoint",
        "https://api.example.com/graphql",
        "--token",
        "t",
        "--deadline",
        "20",
    ]) {
        CliCommand::Query(args) => {
            assert_eq!(args.document, "@get_user.graphql");
            assert_eq!(args.variables.as_deref(), Some(r#"{"id":"1"}"#));
            assert_eq!(args.operation_name.as_deref(), Some("GetUser"));
            assert_eq!(args.endpoint.as_deref(), Some("https://api.example.com/graphql"));
            assert_eq!(args.token.as_deref(), Some("t"));
            assert_eq!(args.deadline, Some(20));
        }
        _ => panic!("expected Query"),
    }
}

#[test]
fn cli_parse_mutate() {
    match parse(&["rgql", "mutate", "mutation { ping }", "--operation", "Ping"]) {
        CliCommand::Mutate(args) => assert_eq!(args.operation_name.as_deref(), Some("Ping")),
        _ => panic!("expected Mutate"),
    }
}

#[test]
fn cli_parse_global_config_flag() {
    let cli = Cli::try_parse_from(["rgql", "query", "{ a }", "--config", "/tmp/rgql.toml"]).unwrap();
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/rgql.toml")));
}

#[test]
fn cli_parse_query_requires_document() {
    assert!(Cli::try_parse_from(["rgql", "query"]).is_err());
}

#[test]
fn document_inline_and_from_file() {
    assert_eq!(load_document("{ a }").unwrap(), "{ a }");
    assert!(load_document("   ").is_err());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "query Q {{ a }}").unwrap();
    let arg = format!("@{}", file.path().display());
    assert_eq!(load_document(&arg).unwrap(), "query Q { a }");
    assert!(load_document("@/definitely/not/here.graphql").is_err());
}

#[test]
fn variables_must_be_an_object() {
    assert!(parse_variables(None).unwrap().is_none());
    assert!(parse_variables(Some("null")).unwrap().is_none());
    let vars = parse_variables(Some(r#"{"id": 3}"#)).unwrap().unwrap();
    assert_eq!(vars["id"], 3);
    assert!(parse_variables(Some("[1,2]")).is_err());
    assert!(parse_variables(Some("{oops")).is_err());
}
