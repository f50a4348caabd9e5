// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime-side values kept alive by a connection

use crate::connection::Connection;
use crate::message::Message;
use crate::subscription::SubscriptionId;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Error a handler may return; logged and discarded at dispatch
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Receives messages for a subscription
pub trait MatchHandler: Send + Sync {
    fn handle(
        &self,
        subscription: SubscriptionId,
        message: &Message,
        user_data: &Value,
    ) -> Result<(), HandlerError>;
}

impl<F> MatchHandler for F
where
    F: Fn(SubscriptionId, &Message, &Value) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(
        &self,
        subscription: SubscriptionId,
        message: &Message,
        user_data: &Value,
    ) -> Result<(), HandlerError> {
        self(subscription, message, user_data)
    }
}

/// Pin a closure to the handler signature so its argument types are inferred
pub fn handler<F>(f: F) -> F
where
    F: Fn(SubscriptionId, &Message, &Value) -> Result<(), HandlerError> + Send + Sync,
{
    f
}

/// A value held in a connection's handle arena
#[derive(Clone)]
pub enum RuntimeValue {
    Handler(Arc<dyn MatchHandler>),
    Data(Arc<Value>),
    /// Anchors the owning connection while subscriptions exist
    Connection(Connection),
}

impl fmt::Debug for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::Handler(_) => f.write_str("Handler(..)"),
            RuntimeValue::Data(value) => f.debug_tuple("Data").field(value).finish(),
            RuntimeValue::Connection(conn) => {
                f.debug_tuple("Connection").field(&conn.id()).finish()
            }
        }
    }
}
