// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription handles and lifecycle types

use crate::arena::{ArenaError, Token};
use crate::bus::{BusError, NativeHandle};
use crate::rule::RuleError;
use std::fmt;
use thiserror::Error;

/// Process-unique identity of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Caller-visible handle for a subscription
///
/// Also the context the bus client carries back to the trampoline. A handle
/// from another connection, or one already unsubscribed, resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId {
    connection: ConnectionId,
    token: Token,
}

impl SubscriptionId {
    pub(crate) fn new(connection: ConnectionId, token: Token) -> Self {
        Self { connection, token }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub(crate) fn token(&self) -> Token {
        self.token
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/sub-{}", self.connection, self.token)
    }
}

/// Arena tokens for the handler and its user data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CallbackContext {
    pub handler: Token,
    pub user_data: Token,
}

/// Per-subscription state kept by the connection
#[derive(Debug)]
pub(crate) struct MatchSubscription {
    pub native: NativeHandle,
    /// Keeps the owning connection alive
    pub anchor: Token,
    pub callback: CallbackContext,
}

impl MatchSubscription {
    /// Arena tokens to release, in release order
    pub fn references(&self) -> [Token; 3] {
        [
            self.anchor,
            self.callback.handler,
            self.callback.user_data,
        ]
    }
}

/// Outcome of an unsubscribe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsubscribed {
    /// Unregistered natively and torn down locally
    Removed,
    /// The bus client reported a failure; local state was torn down anyway
    NativeFailed(BusError),
    /// Unknown, foreign or already-disposed handle
    NotFound,
}

impl Unsubscribed {
    /// True when a live subscription was torn down
    pub fn was_removed(&self) -> bool {
        !matches!(self, Unsubscribed::NotFound)
    }
}

/// Errors from subscribing
#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error("connection closed")]
    Closed,
    #[error("subscription limit reached ({0})")]
    LimitReached(usize),
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error("failed to allocate memory for match object")]
    Resource(#[from] ArenaError),
    #[error("failed to register match handler")]
    Registration(#[source] BusError),
}
