// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced bus client wrapper for consistent observability

use busline_core::{
    BusClient, BusError, Connection, MatchRule, Message, NativeHandle, SubscriptionId, Trampoline,
};

/// Wrapper that adds tracing to any BusClient
#[derive(Clone)]
pub struct TracedBusClient<B> {
    inner: B,
}

impl<B> TracedBusClient<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: BusClient> BusClient for TracedBusClient<B> {
    fn register_match(
        &self,
        rule: &MatchRule,
        trampoline: Trampoline,
        context: SubscriptionId,
    ) -> Result<NativeHandle, BusError> {
        let span = tracing::info_span!("bus.register", subscription = %context);
        let _guard = span.enter();

        tracing::info!(rule = %rule, filters = rule.filters().len(), "registering");

        let start = std::time::Instant::now();
        let result = self.inner.register_match(rule, trampoline, context);
        let elapsed = start.elapsed();

        match &result {
            Ok(handle) => tracing::info!(
                native = %handle,
                elapsed_ms = elapsed.as_millis() as u64,
                "match registered"
            ),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "register failed"
            ),
        }

        result
    }

    fn unregister_match(&self, handle: NativeHandle) -> Result<(), BusError> {
        let span = tracing::info_span!("bus.unregister", native = %handle);
        let _guard = span.enter();

        let result = self.inner.unregister_match(handle);
        // Teardown continues either way, so failure is only a warning
        match &result {
            Ok(()) => tracing::info!("match unregistered"),
            Err(e) => tracing::warn!(error = %e, "unregister failed"),
        }

        result
    }

    fn dispatch(&self, connection: &Connection, message: &Message) -> usize {
        let span = tracing::debug_span!(
            "bus.dispatch",
            connection = %connection.id(),
            kind = %message.kind,
            member = message.member.as_deref().unwrap_or("-"),
        );
        let _guard = span.enter();

        let start = std::time::Instant::now();
        let delivered = self.inner.dispatch(connection, message);
        tracing::trace!(
            delivered,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "dispatched"
        );
        delivered
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
