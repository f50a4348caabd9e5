// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Match rules
//!
//! This module provides:
//! - `build` - Validate a loosely-typed criteria value into a `MatchRule`
//! - `MatchRule::to_wire` - Render the bus's textual match-rule syntax
//! - `MatchRule::matches` - Decide whether a message satisfies a rule
//! - `MatchCriteria` - Typed criteria for Rust callers

mod builder;
mod criteria;
mod matcher;
mod wire;

pub use builder::build;
pub use criteria::MatchCriteria;

use crate::message::MessageKind;
use serde_json::Value;
use thiserror::Error;

/// Highest argument index a filter may name
pub const MAX_ARG_INDEX: u8 = 63;
/// Most argument filters a rule may carry; extra entries are ignored
pub const MAX_ARG_FILTERS: usize = MAX_ARG_INDEX as usize + 1;

/// Errors from building a match rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("match rule table expected")]
    TableExpected,
    #[error("argN filter list expected")]
    FilterListExpected,
    #[error("argN table expected")]
    FilterTableExpected,
    #[error("unknown argument type specified (!= 'path' or 'string')")]
    UnknownArgKind,
    #[error("arg filter index not specified")]
    MissingIndex,
    #[error("arg filter index out of range")]
    IndexOutOfRange,
    #[error("arg filter missing a value")]
    MissingValue,
    #[error("duplicate arg filter index {0}")]
    DuplicateIndex(u8),
    #[error("failed to allocate memory for argN filter elements")]
    OutOfMemory,
}

impl RuleError {
    /// True for allocation failures, false for malformed criteria
    pub fn is_resource(&self) -> bool {
        matches!(self, RuleError::OutOfMemory)
    }
}

/// Message class a rule selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageClass {
    #[default]
    Any,
    MethodCall,
    MethodReturn,
    Error,
    Signal,
}

impl MessageClass {
    /// Map a criteria value onto a class.
    ///
    /// Accepts the bus's numeric type codes (1-4) and the snake_case kind
    /// names. Anything else selects every class.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => match n.as_i64() {
                Some(1) => MessageClass::MethodCall,
                Some(2) => MessageClass::MethodReturn,
                Some(3) => MessageClass::Error,
                Some(4) => MessageClass::Signal,
                _ => MessageClass::Any,
            },
            Some(Value::String(s)) => match s.as_str() {
                "method_call" => MessageClass::MethodCall,
                "method_return" => MessageClass::MethodReturn,
                "error" => MessageClass::Error,
                "signal" => MessageClass::Signal,
                _ => MessageClass::Any,
            },
            _ => MessageClass::Any,
        }
    }

    /// The single kind this class selects, if it is not `Any`
    pub fn kind(&self) -> Option<MessageKind> {
        match self {
            MessageClass::Any => None,
            MessageClass::MethodCall => Some(MessageKind::MethodCall),
            MessageClass::MethodReturn => Some(MessageKind::MethodReturn),
            MessageClass::Error => Some(MessageKind::Error),
            MessageClass::Signal => Some(MessageKind::Signal),
        }
    }

    pub fn accepts(&self, kind: MessageKind) -> bool {
        self.kind().map_or(true, |k| k == kind)
    }
}

impl From<MessageKind> for MessageClass {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::MethodCall => MessageClass::MethodCall,
            MessageKind::MethodReturn => MessageClass::MethodReturn,
            MessageKind::Error => MessageClass::Error,
            MessageKind::Signal => MessageClass::Signal,
        }
    }
}

/// How an argument filter interprets its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArgKind {
    #[default]
    String,
    Path,
}

impl ArgKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgKind::String => "string",
            ArgKind::Path => "path",
        }
    }
}

/// Filter on the N'th message argument
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArgFilter {
    pub index: u8,
    pub kind: ArgKind,
    pub value: String,
}

/// A validated match rule
///
/// Every optional field is either unset (wildcard) or non-empty. The rule
/// owns all of its strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchRule {
    pub message_class: MessageClass,
    pub member: Option<String>,
    pub interface: Option<String>,
    pub sender: Option<String>,
    pub path: Option<String>,
    /// Interpret `path` as a namespace prefix instead of an exact path
    pub path_is_namespace: bool,
    pub arg0_namespace: Option<String>,
    pub eavesdrop: bool,
    filters: Vec<ArgFilter>,
}

impl MatchRule {
    /// Argument filters in the order they were given
    pub fn filters(&self) -> &[ArgFilter] {
        &self.filters
    }

    /// True when the rule selects every message
    pub fn is_wildcard(&self) -> bool {
        self.message_class == MessageClass::Any
            && self.member.is_none()
            && self.interface.is_none()
            && self.sender.is_none()
            && self.path.is_none()
            && self.arg0_namespace.is_none()
            && self.filters.is_empty()
            && !self.eavesdrop
    }
}
