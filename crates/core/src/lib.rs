// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! busline-core: match-rule subscriptions over a message bus
//!
//! This crate provides:
//! - `rule` - Match rule building, wire rendering and message matching
//! - `Connection` - Subscription registration, dispatch and teardown
//! - `HandleArena` - Generational storage for values kept alive on behalf of
//!   native callbacks
//! - `BusClient` - The seam to the native bus implementation

pub mod arena;
pub mod bus;
pub mod config;
pub mod connection;
mod dispatch;
pub mod message;
pub mod rule;
pub mod runtime;
pub mod subscription;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
#[cfg(test)]
mod testing;

pub use arena::{ArenaError, Cursor, HandleArena, Token, VacantSlot};
pub use bus::{BusClient, BusError, NativeHandle, Trampoline};
pub use config::{BusConfig, ConfigError, LoggingConfig, DEFAULT_MAX_RULE_LEN};
pub use connection::Connection;
pub use message::{Arg, Message, MessageKind};
pub use rule::{ArgFilter, ArgKind, MatchCriteria, MatchRule, MessageClass, RuleError};
pub use runtime::{handler, HandlerError, MatchHandler, RuntimeValue};
pub use subscription::{ConnectionId, SubscribeError, SubscriptionId, Unsubscribed};
