// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use busline_core::{handler, Arg, HandlerError, MatchCriteria, SubscribeError};
use serde_json::{json, Value};

fn recording(conn: &Connection, criteria: Value) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    conn.subscribe(
        &criteria,
        handler(move |_, msg, _| -> Result<(), HandlerError> {
            sink.lock()
                .unwrap()
                .push(msg.member.clone().unwrap_or_default());
            Ok(())
        }),
        Value::Null,
    )
    .unwrap();
    seen
}

#[test]
fn registration_stores_wire_rule() {
    let bus = MemoryBus::new();
    let conn = Connection::new(bus.clone());
    let criteria = MatchCriteria::signal().interface("org.example.Iface");

    conn.subscribe(&criteria.to_value(), handler(|_, _, _| Ok(())), Value::Null)
        .unwrap();

    assert_eq!(bus.registration_count(), 1);
    assert_eq!(
        bus.rules(),
        vec!["type='signal',interface='org.example.Iface'".to_string()]
    );
}

#[test]
fn overlong_rule_is_rejected_without_leaking() {
    let config = BusConfig {
        max_rule_len: 32,
        ..BusConfig::default()
    };
    let bus = MemoryBus::from_config(&config);
    let conn = Connection::with_config(bus.clone(), config);
    let criteria = json!({"interface": "org.example.SomeVeryLongInterfaceName"});

    let err = conn
        .subscribe(&criteria, handler(|_, _, _| Ok(())), Value::Null)
        .unwrap_err();

    assert!(matches!(
        err,
        SubscribeError::Registration(BusError::RuleTooLong { max: 32, .. })
    ));
    assert_eq!(bus.registration_count(), 0);
    assert_eq!(conn.subscription_count(), 0);
    assert_eq!(conn.retained_count(), 0);
}

#[test]
fn unregister_unknown_handle_is_not_found() {
    let bus = MemoryBus::new();
    assert_eq!(
        bus.unregister_match(NativeHandle(7)),
        Err(BusError::NotFound(NativeHandle(7)))
    );
}

#[test]
fn dispatch_routes_by_rule() {
    let bus = MemoryBus::new();
    let conn = Connection::new(bus.clone());
    let pings = recording(&conn, json!({"member": "Ping"}));
    let all = recording(&conn, json!({}));

    assert_eq!(conn.process(&Message::signal("/a", "org.example.I", "Ping")), 2);
    assert_eq!(conn.process(&Message::signal("/a", "org.example.I", "Pong")), 1);

    assert_eq!(*pings.lock().unwrap(), vec!["Ping"]);
    assert_eq!(*all.lock().unwrap(), vec!["Ping", "Pong"]);
}

#[test]
fn dispatch_respects_path_namespace_and_args() {
    let bus = MemoryBus::new();
    let conn = Connection::new(bus.clone());
    let criteria = MatchCriteria::signal()
        .path_namespace("/org/example")
        .arg(1, busline_core::ArgKind::String, "ready");
    let seen = recording(&conn, criteria.to_value());

    let inside = Message::signal("/org/example/child", "org.example.I", "State")
        .with_arg(Arg::String("unit".into()))
        .with_arg(Arg::String("ready".into()));
    let outside = Message::signal("/org/examples", "org.example.I", "State")
        .with_arg(Arg::String("unit".into()))
        .with_arg(Arg::String("ready".into()));
    let wrong_arg = Message::signal("/org/example", "org.example.I", "State")
        .with_arg(Arg::String("unit".into()))
        .with_arg(Arg::String("busy".into()));

    conn.process(&inside);
    conn.process(&outside);
    conn.process(&wrong_arg);

    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn directed_messages_need_our_name_or_eavesdrop() {
    let config = BusConfig {
        unique_name: Some(":1.5".to_string()),
        ..BusConfig::default()
    };
    let bus = MemoryBus::from_config(&config);
    let conn = Connection::with_config(bus.clone(), config);
    let normal = recording(&conn, json!({}));
    let snooping = recording(&conn, json!({"eavesdrop": true}));

    let to_us = Message::method_call(":1.5", "/", "org.example.I", "Mine");
    let to_other = Message::method_call(":1.9", "/", "org.example.I", "Theirs");
    conn.process(&to_us);
    conn.process(&to_other);

    assert_eq!(*normal.lock().unwrap(), vec!["Mine"]);
    assert_eq!(*snooping.lock().unwrap(), vec!["Mine", "Theirs"]);
}

#[test]
fn dispatch_ignores_other_connections_registrations() {
    let bus = MemoryBus::new();
    let first = Connection::new(bus.clone());
    let second = Connection::new(bus.clone());
    let seen_first = recording(&first, json!({}));
    let seen_second = recording(&second, json!({}));

    assert_eq!(second.process(&Message::signal("/", "org.example.I", "Ping")), 1);

    assert!(seen_first.lock().unwrap().is_empty());
    assert_eq!(seen_second.lock().unwrap().len(), 1);
}

#[test]
fn pump_drains_queued_messages() {
    let bus = MemoryBus::new();
    let conn = Connection::new(bus.clone());
    let seen = recording(&conn, json!({}));
    let sender = bus.sender();

    let producer = std::thread::spawn(move || {
        for member in ["One", "Two", "Three"] {
            sender
                .send(Message::signal("/", "org.example.I", member))
                .unwrap();
        }
    });
    producer.join().unwrap();

    assert_eq!(bus.pump(&conn), 3);
    assert_eq!(bus.pump(&conn), 0);
    assert_eq!(*seen.lock().unwrap(), vec!["One", "Two", "Three"]);
}

#[test]
fn handler_may_queue_messages_while_pumping() {
    let bus = MemoryBus::new();
    let conn = Connection::new(bus.clone());
    let sender = bus.sender();
    let seen = recording(&conn, json!({"member": "Pong"}));
    conn.subscribe(
        &json!({"member": "Ping"}),
        handler(move |_, _, _| {
            sender.send(Message::signal("/", "org.example.I", "Pong"))?;
            Ok(())
        }),
        Value::Null,
    )
    .unwrap();

    bus.sender()
        .send(Message::signal("/", "org.example.I", "Ping"))
        .unwrap();

    assert_eq!(bus.pump(&conn), 2);
    assert_eq!(*seen.lock().unwrap(), vec!["Pong"]);
    conn.close();
}

#[test]
fn close_unregisters_everything() {
    let bus = MemoryBus::new();
    let conn = Connection::new(bus.clone());
    recording(&conn, json!({}));
    recording(&conn, json!({"member": "Ping"}));

    assert_eq!(conn.close(), 2);
    assert_eq!(bus.registration_count(), 0);
}
