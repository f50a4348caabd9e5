// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Criteria validation

use super::{
    ArgFilter, ArgKind, MatchRule, MessageClass, RuleError, MAX_ARG_FILTERS, MAX_ARG_INDEX,
};
use serde_json::{Map, Value};

/// Build a match rule from a criteria value.
///
/// Absent or mistyped scalar fields are wildcards; malformed argument
/// filters fail the whole build. Nothing is returned on failure.
pub fn build(criteria: &Value) -> Result<MatchRule, RuleError> {
    let table = criteria.as_object().ok_or(RuleError::TableExpected)?;

    let filters = build_filters(table.get("filterArgs"))?;

    Ok(MatchRule {
        message_class: MessageClass::from_value(table.get("msgType")),
        member: string_field(table, "member"),
        interface: string_field(table, "interface"),
        sender: string_field(table, "sender"),
        path: string_field(table, "path"),
        path_is_namespace: bool_field(table, "treatPathAsNamespace"),
        arg0_namespace: string_field(table, "arg0Namespace"),
        eavesdrop: bool_field(table, "eavesdrop"),
        filters,
    })
}

fn string_field(table: &Map<String, Value>, key: &str) -> Option<String> {
    table
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn bool_field(table: &Map<String, Value>, key: &str) -> bool {
    table.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn build_filters(value: Option<&Value>) -> Result<Vec<ArgFilter>, RuleError> {
    let entries = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(RuleError::FilterListExpected),
    };

    let count = entries.len().min(MAX_ARG_FILTERS);
    let mut filters = Vec::new();
    filters
        .try_reserve_exact(count)
        .map_err(|_| RuleError::OutOfMemory)?;

    // One bit per argument index already claimed
    let mut claimed: u64 = 0;
    for entry in entries.iter().take(count) {
        let filter = build_filter(entry)?;
        let bit = 1u64 << filter.index;
        if claimed & bit != 0 {
            return Err(RuleError::DuplicateIndex(filter.index));
        }
        claimed |= bit;
        filters.push(filter);
    }

    Ok(filters)
}

fn build_filter(entry: &Value) -> Result<ArgFilter, RuleError> {
    let item = entry.as_object().ok_or(RuleError::FilterTableExpected)?;

    let kind = match item.get("type") {
        None | Some(Value::Null) => ArgKind::String,
        Some(Value::String(s)) if s == "string" => ArgKind::String,
        Some(Value::String(s)) if s == "path" => ArgKind::Path,
        Some(_) => return Err(RuleError::UnknownArgKind),
    };

    let index = item
        .get("index")
        .and_then(integer)
        .ok_or(RuleError::MissingIndex)?;
    let index = u8::try_from(index)
        .ok()
        .filter(|i| *i <= MAX_ARG_INDEX)
        .ok_or(RuleError::IndexOutOfRange)?;

    let value = item
        .get("value")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(RuleError::MissingValue)?;

    Ok(ArgFilter {
        index,
        kind,
        value: value.to_string(),
    })
}

/// Integral value of a number; whole floats count, fractional ones do not
fn integer(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    if n.is_u64() {
        // Too large for i64, certainly out of range
        return Some(i64::MAX);
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && f.is_finite())
        .map(|f| f as i64)
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
