// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message matching against a rule

use super::{ArgFilter, ArgKind, MatchRule};
use crate::message::Message;

impl MatchRule {
    /// Check whether `message` satisfies every field of the rule.
    ///
    /// `own_name` is the receiving connection's unique bus name. Messages
    /// addressed to any other destination only match eavesdropping rules.
    pub fn matches(&self, message: &Message, own_name: Option<&str>) -> bool {
        if !self.message_class.accepts(message.kind) {
            return false;
        }

        if let Some(destination) = message.destination.as_deref() {
            if !self.eavesdrop && own_name != Some(destination) {
                return false;
            }
        }

        if !exact(&self.sender, &message.sender)
            || !exact(&self.interface, &message.interface)
            || !exact(&self.member, &message.member)
        {
            return false;
        }

        if let Some(path) = self.path.as_deref() {
            let Some(actual) = message.path.as_deref() else {
                return false;
            };
            let ok = if self.path_is_namespace {
                path_in_namespace(actual, path)
            } else {
                actual == path
            };
            if !ok {
                return false;
            }
        }

        if let Some(namespace) = self.arg0_namespace.as_deref() {
            let arg0 = message.args.first().and_then(|a| a.as_str());
            if !arg0.is_some_and(|name| name_in_namespace(name, namespace)) {
                return false;
            }
        }

        self.filters()
            .iter()
            .all(|filter| filter_matches(filter, message))
    }
}

fn exact(expected: &Option<String>, actual: &Option<String>) -> bool {
    match expected {
        None => true,
        Some(expected) => actual.as_deref() == Some(expected.as_str()),
    }
}

/// `/a/b` is inside `/a` and `/a/b`, but not inside `/a/bc`
fn path_in_namespace(path: &str, namespace: &str) -> bool {
    if namespace == "/" {
        return true;
    }
    match path.strip_prefix(namespace) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// `com.example.Foo` is inside `com.example`, `com.examples` is not
fn name_in_namespace(name: &str, namespace: &str) -> bool {
    match name.strip_prefix(namespace) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

fn filter_matches(filter: &ArgFilter, message: &Message) -> bool {
    let Some(arg) = message.args.get(filter.index as usize) else {
        return false;
    };
    match filter.kind {
        ArgKind::String => arg.as_str() == Some(filter.value.as_str()),
        ArgKind::Path => arg
            .as_path_like()
            .is_some_and(|actual| path_prefix_match(actual, &filter.value)),
    }
}

/// Equal, or one side ends in `/` and prefixes the other
fn path_prefix_match(actual: &str, expected: &str) -> bool {
    actual == expected
        || (expected.ends_with('/') && actual.starts_with(expected))
        || (actual.ends_with('/') && expected.starts_with(actual))
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
