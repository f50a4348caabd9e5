// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus client interface
//!
//! The bus client owns the authoritative match registrations and decides
//! which traffic matches. It reaches back into the engine only through the
//! trampoline it was handed at registration time.

use crate::connection::Connection;
use crate::message::Message;
use crate::rule::MatchRule;
use crate::subscription::SubscriptionId;
use std::fmt;
use thiserror::Error;

/// Handle the bus client returns for a registered match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(pub u64);

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "match-{}", self.0)
    }
}

/// Callback the bus client invokes for each message matching a registration
pub type Trampoline = fn(&Connection, NativeHandle, &Message, SubscriptionId);

/// Errors reported by the bus client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("match not registered: {0}")]
    NotFound(NativeHandle),
    #[error("match rule too long ({len} > {max} bytes)")]
    RuleTooLong { len: usize, max: usize },
    #[error("match rule rejected: {0}")]
    Rejected(String),
    #[error("bus connection closed")]
    Closed,
}

/// Native side of the bus
pub trait BusClient: Send + Sync {
    /// Register a rule; the client keeps its own copy
    fn register_match(
        &self,
        rule: &MatchRule,
        trampoline: Trampoline,
        context: SubscriptionId,
    ) -> Result<NativeHandle, BusError>;

    fn unregister_match(&self, handle: NativeHandle) -> Result<(), BusError>;

    /// Route one inbound message, invoking the trampoline of every matching
    /// registration. Returns how many registrations it was routed to.
    fn dispatch(&self, connection: &Connection, message: &Message) -> usize;
}
