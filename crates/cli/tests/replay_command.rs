// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests for `busline replay`
//!
//! Each test writes criteria and message files, replays them through an
//! in-memory bus and checks the dispatch lines printed on stdout.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

mod common;

use common::{busline, Workdir};
use predicates::prelude::*;
use serde_json::json;

fn signal(path: &str, member: &str) -> serde_json::Value {
    json!({
        "kind": "signal",
        "path": path,
        "interface": "org.example.Iface",
        "member": member
    })
}

#[test]
fn test_replay_prints_each_dispatch() {
    let work = Workdir::new();
    let criteria = work.write(
        "criteria.json",
        &json!([
            {"msgType": "signal", "member": "Ping"},
            {"path": "/org/example", "treatPathAsNamespace": true}
        ])
        .to_string(),
    );
    let messages = work.write_lines(
        "messages.jsonl",
        &[
            signal("/org/example/a", "Ping"),
            signal("/elsewhere", "Pong"),
            signal("/org/example", "Pong"),
        ],
    );

    busline()
        .arg("replay")
        .arg("--criteria")
        .arg(&criteria)
        .arg("--messages")
        .arg(&messages)
        .assert()
        .success()
        .stdout("0 Ping /org/example/a\n1 Ping /org/example/a\n1 Pong /org/example\n");
}

#[test]
fn test_replay_matches_string_args() {
    let work = Workdir::new();
    let criteria = work.write(
        "criteria.json",
        &json!([{
            "filterArgs": [{"type": "string", "index": 1, "value": "ready"}]
        }])
        .to_string(),
    );
    let ready = json!({
        "kind": "signal",
        "member": "State",
        "args": [
            {"type": "string", "value": "unit"},
            {"type": "string", "value": "ready"}
        ]
    });
    let busy = json!({
        "kind": "signal",
        "member": "State",
        "args": [
            {"type": "string", "value": "unit"},
            {"type": "string", "value": "busy"}
        ]
    });
    let messages = work.write_lines("messages.jsonl", &[ready, busy]);

    busline()
        .arg("replay")
        .arg("--criteria")
        .arg(&criteria)
        .arg("--messages")
        .arg(&messages)
        .assert()
        .success()
        .stdout("0 State -\n");
}

#[test]
fn test_replay_directed_messages_use_configured_name() {
    let work = Workdir::new();
    let config = work.write("busline.toml", "unique_name = \":1.7\"\n");
    let criteria = work.write(
        "criteria.json",
        &json!([{}, {"eavesdrop": true}]).to_string(),
    );
    let to_us = json!({"kind": "method_call", "destination": ":1.7", "member": "Mine"});
    let to_other = json!({"kind": "method_call", "destination": ":1.9", "member": "Theirs"});
    let messages = work.write_lines("messages.jsonl", &[to_us, to_other]);

    busline()
        .arg("--config")
        .arg(&config)
        .arg("replay")
        .arg("--criteria")
        .arg(&criteria)
        .arg("--messages")
        .arg(&messages)
        .assert()
        .success()
        .stdout("0 Mine -\n1 Mine -\n1 Theirs -\n");
}

#[test]
fn test_replay_aborts_on_invalid_criteria() {
    let work = Workdir::new();
    let criteria = work.write(
        "criteria.json",
        &json!([
            {"member": "Ping"},
            {"filterArgs": [{"type": "string", "index": 3}]}
        ])
        .to_string(),
    );
    let messages = work.write_lines("messages.jsonl", &[signal("/", "Ping")]);

    busline()
        .arg("replay")
        .arg("--criteria")
        .arg(&criteria)
        .arg("--messages")
        .arg(&messages)
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains(
            "error: criteria 1: arg filter missing a value",
        ));
}

#[test]
fn test_replay_rejects_overlong_rules() {
    let work = Workdir::new();
    let config = work.write("busline.toml", "max_rule_len = 16\n");
    let criteria = work.write(
        "criteria.json",
        &json!([{"interface": "org.example.AVeryLongInterface"}]).to_string(),
    );
    let messages = work.write("messages.jsonl", "");

    busline()
        .arg("--config")
        .arg(&config)
        .arg("replay")
        .arg("--criteria")
        .arg(&criteria)
        .arg("--messages")
        .arg(&messages)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to register match handler"))
        .stderr(predicate::str::contains("match rule too long"));
}

#[test]
fn test_replay_reports_bad_message_line() {
    let work = Workdir::new();
    let criteria = work.write("criteria.json", "[{}]");
    let messages = work.write("messages.jsonl", "{\"kind\": \"signal\"}\nnot json\n");

    busline()
        .arg("replay")
        .arg("--criteria")
        .arg(&criteria)
        .arg("--messages")
        .arg(&messages)
        .assert()
        .failure()
        .stderr(predicate::str::contains("messages.jsonl:2: invalid message"));
}

#[test]
fn test_replay_requires_criteria_array() {
    let work = Workdir::new();
    let criteria = work.write("criteria.json", "{}");
    let messages = work.write("messages.jsonl", "");

    busline()
        .arg("replay")
        .arg("--criteria")
        .arg(&criteria)
        .arg("--messages")
        .arg(&messages)
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected a JSON array of criteria"));
}
