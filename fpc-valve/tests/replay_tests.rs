//! Script replay tests
//!
//! Runs scripts from files the way `fpc-replay` does and checks the JSON-lines
//! output.

use std::fs;
use std::io::BufReader;

use fpc_common::ValveMode;
use fpc_valve::replay::{Replay, ReplaySummary};
use fpc_valve::Error;
use serde_json::Value;
use tempfile::TempDir;

fn run_script(mode: ValveMode, script: &str) -> (ReplaySummary, Vec<Value>) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.fpc");
    fs::write(&path, script).unwrap();

    let mut replay = Replay::new(mode);
    let mut out = Vec::new();
    let file = fs::File::open(&path).unwrap();
    let summary = replay.run(BufReader::new(file), &mut out).unwrap();

    let records = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    (summary, records)
}

#[test]
fn test_full_session_script() {
    let script = "\
# both windows answer
primary car
secondary truck

# user swaps the windows
swap

# secondary window leaves the group
disable
primary airplane
secondary pizza

# and comes back
enable
secondary bus
";
    let (summary, records) = run_script(ValveMode::Merged, script);

    assert_eq!(summary.commands, 8);
    assert_eq!(summary.records, 5);

    let routes: Vec<&str> = records.iter().map(|r| r["route"].as_str().unwrap()).collect();
    assert_eq!(routes, vec!["merge", "merge", "primary", "secondary", "merge"]);

    assert_eq!(records[1]["primary"], "truck");
    assert_eq!(records[1]["secondary"], "car");
    assert_eq!(records[2]["model"], "airplane");
    assert_eq!(records[4]["primary"], "airplane");
    assert_eq!(records[4]["secondary"], "bus");
}

#[test]
fn test_passthrough_start_and_shift() {
    let script = "primary old\nsecondary new\nshift\nsecondary unrouted\n";
    let (summary, records) = run_script(ValveMode::Passthrough, script);

    assert_eq!(summary.commands, 4);
    // old -> primary, new -> secondary, shift redelivers "new" to both routes
    let models: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r["route"].as_str().unwrap(), r["model"].as_str().unwrap()))
        .collect();
    assert_eq!(
        models,
        vec![
            ("primary", "old"),
            ("secondary", "new"),
            ("primary", "new"),
            ("secondary", "new"),
        ]
    );
}

#[test]
fn test_bad_line_reports_line_number() {
    let mut replay = Replay::new(ValveMode::Merged);
    let mut out = Vec::new();

    let err = replay
        .run("primary car\n\nteleport now\n".as_bytes(), &mut out)
        .unwrap_err();

    match err {
        Error::Script { line, message } => {
            assert_eq!(line, 3);
            assert!(message.contains("teleport"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_failed_requests_in_script() {
    let script = "primary car\nfail secondary truck timed out\nsecondary pizza\nswap\n";
    let (_, records) = run_script(ValveMode::Merged, script);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["route"], "error");
    assert!(records[0]["message"].as_str().unwrap().contains("timed out"));
    // Swap resubscribes, so pairing resumes with the exchanged values
    assert_eq!(records[1]["primary"], "pizza");
    assert_eq!(records[1]["secondary"], "car");
}
