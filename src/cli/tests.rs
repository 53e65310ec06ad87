//! Tests for CLI parsing and stream selection

use super::*;
use clap::Parser;
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("tap-onfleet").chain(args.iter().copied())).unwrap()
}

fn names(resources: &[&crate::resources::Resource]) -> Vec<&'static str> {
    resources.iter().map(|r| r.name).collect()
}

#[test]
fn test_parse_read_with_global_flags() {
    let cli = parse(&[
        "read",
        "--config",
        "config.json",
        "--state",
        "state.json",
        "--streams",
        "tasks,workers",
        "--state-per-page",
        "-v",
    ]);

    assert_eq!(cli.config, Some(PathBuf::from("config.json")));
    assert_eq!(cli.state, Some(PathBuf::from("state.json")));
    assert!(cli.verbose);
    assert_eq!(
        cli.command,
        Commands::Read {
            streams: vec!["tasks".to_string(), "workers".to_string()],
            catalog: None,
            state_per_page: true,
            fail_fast: false,
        }
    );
}

#[test]
fn test_parse_check_and_discover() {
    assert_eq!(parse(&["-c", "c.json", "check"]).command, Commands::Check);
    assert_eq!(parse(&["discover", "--config", "c.json"]).command, Commands::Discover);
}

#[test]
fn test_state_and_state_json_conflict() {
    let result = Cli::try_parse_from([
        "tap-onfleet",
        "read",
        "--state",
        "s.json",
        "--state-json",
        "{}",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_select_streams_explicit() {
    let runner = Runner::new(parse(&["read"]));
    let selected = runner
        .select_streams(&["workers".to_string(), " hubs ".to_string()], None)
        .unwrap();
    assert_eq!(names(&selected), vec!["hubs", "workers"]);

    assert!(runner
        .select_streams(&["unknown".to_string()], None)
        .is_err());
}

#[test]
fn test_select_streams_defaults_to_all() {
    let runner = Runner::new(parse(&["read"]));
    let selected = runner.select_streams(&[], None).unwrap();
    assert_eq!(selected.len(), 6);
}

#[test]
fn test_select_streams_from_catalog() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"streams": [
            {{"tap_stream_id": "teams", "stream": "teams",
              "metadata": [{{"breadcrumb": [], "metadata": {{"selected": true}}}}]}},
            {{"tap_stream_id": "tasks", "stream": "tasks",
              "metadata": [{{"breadcrumb": [], "metadata": {{"selected": true}}}}]}}
        ]}}"#
    )
    .unwrap();

    let runner = Runner::new(parse(&["read"]));
    let selected = runner.select_streams(&[], Some(file.path())).unwrap();
    assert_eq!(names(&selected), vec!["tasks", "teams"]);
}

#[tokio::test]
async fn test_missing_config_is_config_error() {
    let runner = Runner::new(parse(&["discover"]));
    let mut out = Vec::new();
    let err = runner.run_to(&mut out).await.unwrap_err();
    assert!(err.is_config());
    assert!(out.is_empty());
}
