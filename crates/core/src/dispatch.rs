// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Callback trampoline invoked by bus clients

use crate::bus::NativeHandle;
use crate::connection::Connection;
use crate::message::Message;
use crate::subscription::SubscriptionId;
use std::cell::Cell;
use tracing::{debug, debug_span, error, warn};

thread_local! {
    /// Set while a handler runs on this thread, whichever connection owns it
    static DISPATCHING: Cell<bool> = const { Cell::new(false) };
}

/// Held for the duration of one handler call
struct DispatchGuard(());

impl DispatchGuard {
    fn enter() -> Option<Self> {
        DISPATCHING.with(|flag| (!flag.replace(true)).then_some(DispatchGuard(())))
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DISPATCHING.with(|flag| flag.set(false));
    }
}

/// Deliver one matched message to a subscription's handler.
///
/// Handler errors are logged and discarded. A context that no longer resolves
/// (unsubscribed, foreign, or paired with the wrong native handle) is ignored,
/// as is a dispatch attempted from inside any running handler, on this
/// connection or another.
pub(crate) fn dispatch_match(
    connection: &Connection,
    native: NativeHandle,
    message: &Message,
    subscription: SubscriptionId,
) {
    let span = debug_span!(
        "match.dispatch",
        subscription = %subscription,
        native = %native,
        member = message.member.as_deref().unwrap_or("-"),
    );
    let _enter = span.enter();

    let Some(_guard) = DispatchGuard::enter() else {
        warn!("re-entrant dispatch refused");
        return;
    };

    // Resolved under the connection lock, invoked without it
    let Some((handler, user_data)) = connection.resolve_callback(subscription, native) else {
        debug!("stale match context, ignoring");
        return;
    };

    if let Err(e) = handler.handle(subscription, message, &user_data) {
        error!(error = %e, "match callback error");
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
