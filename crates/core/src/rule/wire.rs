// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Textual match-rule syntax understood by the bus

use super::{ArgKind, MatchRule};
use std::fmt;

impl MatchRule {
    /// Render the rule as comma-separated `key='value'` pairs.
    ///
    /// A wildcard rule renders as the empty string.
    pub fn to_wire(&self) -> String {
        let mut out = String::new();

        if let Some(kind) = self.message_class.kind() {
            push_pair(&mut out, "type", kind.as_str());
        }
        if let Some(sender) = &self.sender {
            push_pair(&mut out, "sender", sender);
        }
        if let Some(interface) = &self.interface {
            push_pair(&mut out, "interface", interface);
        }
        if let Some(member) = &self.member {
            push_pair(&mut out, "member", member);
        }
        if let Some(path) = &self.path {
            let key = if self.path_is_namespace {
                "path_namespace"
            } else {
                "path"
            };
            push_pair(&mut out, key, path);
        }
        if let Some(namespace) = &self.arg0_namespace {
            push_pair(&mut out, "arg0namespace", namespace);
        }
        for filter in self.filters() {
            let key = match filter.kind {
                ArgKind::String => format!("arg{}", filter.index),
                ArgKind::Path => format!("arg{}path", filter.index),
            };
            push_pair(&mut out, &key, &filter.value);
        }
        if self.eavesdrop {
            push_pair(&mut out, "eavesdrop", "true");
        }

        out
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

fn push_pair(out: &mut String, key: &str, value: &str) {
    if !out.is_empty() {
        out.push(',');
    }
    out.push_str(key);
    out.push_str("='");
    // Quotes cannot be escaped inside a quoted value: close, escape, reopen
    for c in value.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
