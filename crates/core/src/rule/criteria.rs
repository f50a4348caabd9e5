// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed match criteria for Rust callers

use super::{build, ArgKind, MatchRule, MessageClass, RuleError};
use serde_json::{json, Map, Value};

/// Builder for criteria values
///
/// Produces the same loosely-typed value a runtime caller would hand over,
/// so both paths go through the same validation.
#[derive(Debug, Clone, Default)]
pub struct MatchCriteria {
    message_class: MessageClass,
    member: Option<String>,
    interface: Option<String>,
    sender: Option<String>,
    path: Option<String>,
    path_is_namespace: bool,
    arg0_namespace: Option<String>,
    eavesdrop: bool,
    args: Vec<(i64, ArgKind, String)>,
}

impl MatchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal() -> Self {
        Self::new().message_class(MessageClass::Signal)
    }

    pub fn message_class(mut self, class: MessageClass) -> Self {
        self.message_class = class;
        self
    }

    pub fn member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }

    pub fn interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self.path_is_namespace = false;
        self
    }

    pub fn path_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.path = Some(namespace.into());
        self.path_is_namespace = true;
        self
    }

    pub fn arg0_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.arg0_namespace = Some(namespace.into());
        self
    }

    pub fn eavesdrop(mut self, eavesdrop: bool) -> Self {
        self.eavesdrop = eavesdrop;
        self
    }

    /// Add an argument filter. The index is checked when the rule is built.
    pub fn arg(mut self, index: i64, kind: ArgKind, value: impl Into<String>) -> Self {
        self.args.push((index, kind, value.into()));
        self
    }

    pub fn to_value(&self) -> Value {
        let mut table = Map::new();
        if let Some(kind) = self.message_class.kind() {
            table.insert("msgType".to_string(), json!(kind.as_str()));
        }
        let strings = [
            ("member", &self.member),
            ("interface", &self.interface),
            ("sender", &self.sender),
            ("path", &self.path),
            ("arg0Namespace", &self.arg0_namespace),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                table.insert(key.to_string(), json!(value));
            }
        }
        if self.path_is_namespace {
            table.insert("treatPathAsNamespace".to_string(), json!(true));
        }
        if self.eavesdrop {
            table.insert("eavesdrop".to_string(), json!(true));
        }
        if !self.args.is_empty() {
            let filters = self
                .args
                .iter()
                .map(|(index, kind, value)| {
                    json!({ "index": index, "type": kind.as_str(), "value": value })
                })
                .collect();
            table.insert("filterArgs".to_string(), Value::Array(filters));
        }
        Value::Object(table)
    }

    pub fn build(&self) -> Result<MatchRule, RuleError> {
        build(&self.to_value())
    }
}

impl From<MatchCriteria> for Value {
    fn from(criteria: MatchCriteria) -> Self {
        criteria.to_value()
    }
}
