// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::message::{Arg, MessageKind};
use crate::rule::build;
use serde_json::json;
use yare::parameterized;

fn rule(criteria: serde_json::Value) -> MatchRule {
    build(&criteria).unwrap()
}

fn status_changed() -> Message {
    Message::signal("/com/example/Status", "com.example.Status", "Changed")
}

#[test]
fn signal_interface_member_rule() {
    let rule = rule(json!({
        "msgType": "signal",
        "interface": "com.example.Status",
        "member": "Changed",
    }));

    assert!(rule.matches(&status_changed(), None));
    assert!(!rule.matches(
        &Message::signal("/com/example/Status", "com.example.Status", "Other"),
        None
    ));
}

#[test]
fn wildcard_rule_matches_broadcasts() {
    let rule = rule(json!({}));
    assert!(rule.matches(&status_changed(), None));
    assert!(rule.matches(&Message::new(MessageKind::Error), None));
}

#[test]
fn message_class_must_agree() {
    let rule = rule(json!({ "msgType": 1, "member": "Changed" }));
    assert!(!rule.matches(&status_changed(), None));
}

#[test]
fn missing_message_field_fails_exact_match() {
    let rule = rule(json!({ "sender": ":1.5" }));
    assert!(!rule.matches(&status_changed(), None));
    assert!(rule.matches(&status_changed().with_sender(":1.5"), None));
}

#[parameterized(
    exact_path = { "/com/example", false, "/com/example", true },
    exact_rejects_child = { "/com/example", false, "/com/example/Status", false },
    namespace_self = { "/com/example", true, "/com/example", true },
    namespace_child = { "/com/example", true, "/com/example/Status", true },
    namespace_sibling_prefix = { "/com/example", true, "/com/examples", false },
    root_namespace = { "/", true, "/anything/at/all", true },
)]
fn path_matching(rule_path: &str, namespace: bool, message_path: &str, expected: bool) {
    let rule = rule(json!({ "path": rule_path, "treatPathAsNamespace": namespace }));
    let message = Message::new(MessageKind::Signal).with_path(message_path);
    assert_eq!(rule.matches(&message, None), expected);
}

#[parameterized(
    equal = { "org.freedesktop", true },
    inside = { "org.freedesktop.Notifications", true },
    prefix_only = { "org.freedesktopx", false },
    outside = { "com.example", false },
)]
fn arg0_namespace_matching(arg0: &str, expected: bool) {
    let rule = rule(json!({ "arg0Namespace": "org.freedesktop" }));
    let message = Message::new(MessageKind::Signal).with_arg(Arg::String(arg0.to_string()));
    assert_eq!(rule.matches(&message, None), expected);
}

#[test]
fn arg0_namespace_requires_string_arg() {
    let rule = rule(json!({ "arg0Namespace": "org.freedesktop" }));
    let message = Message::new(MessageKind::Signal)
        .with_arg(Arg::ObjectPath("org.freedesktop".to_string()));
    assert!(!rule.matches(&message, None));
    assert!(!rule.matches(&Message::new(MessageKind::Signal), None));
}

#[test]
fn string_filter_compares_position() {
    let rule = rule(json!({ "filterArgs": [{ "index": 1, "value": "on" }] }));
    let on = Message::new(MessageKind::Signal)
        .with_arg(Arg::Int(3))
        .with_arg(Arg::String("on".to_string()));
    let off = Message::new(MessageKind::Signal)
        .with_arg(Arg::Int(3))
        .with_arg(Arg::String("off".to_string()));
    let short = Message::new(MessageKind::Signal).with_arg(Arg::String("on".to_string()));

    assert!(rule.matches(&on, None));
    assert!(!rule.matches(&off, None));
    assert!(!rule.matches(&short, None));
}

#[test]
fn string_filter_ignores_object_paths() {
    let rule = rule(json!({ "filterArgs": [{ "index": 0, "value": "/a" }] }));
    let message = Message::new(MessageKind::Signal).with_arg(Arg::ObjectPath("/a".to_string()));
    assert!(!rule.matches(&message, None));
}

#[parameterized(
    equal = { "/aa/bb/", "/aa/bb/", true },
    rule_prefix = { "/aa/", "/aa/bb/cc", true },
    arg_prefix = { "/aa/bb/cc", "/aa/", true },
    no_slash = { "/aa/b", "/aa/bb", false },
    unrelated = { "/aa/", "/bb/cc", false },
)]
fn path_filter_matching(filter: &str, arg: &str, expected: bool) {
    let rule = rule(json!({ "filterArgs": [{ "index": 0, "type": "path", "value": filter }] }));
    let as_path = Message::new(MessageKind::Signal).with_arg(Arg::ObjectPath(arg.to_string()));
    let as_string = Message::new(MessageKind::Signal).with_arg(Arg::String(arg.to_string()));
    assert_eq!(rule.matches(&as_path, None), expected);
    assert_eq!(rule.matches(&as_string, None), expected);
}

#[test]
fn directed_messages_need_eavesdrop_unless_addressed_to_us() {
    let quiet = rule(json!({ "member": "Ping" }));
    let nosy = rule(json!({ "member": "Ping", "eavesdrop": true }));
    let call = Message::method_call(":1.9", "/", "com.example.Peer", "Ping");

    assert!(!quiet.matches(&call, Some(":1.2")));
    assert!(quiet.matches(&call, Some(":1.9")));
    assert!(!quiet.matches(&call, None));
    assert!(nosy.matches(&call, Some(":1.2")));
}
