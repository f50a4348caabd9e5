// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake bus client for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use busline_core::{
    BusClient, BusError, Connection, MatchRule, Message, NativeHandle, SubscriptionId, Trampoline,
};
use std::sync::{Arc, Mutex, MutexGuard};

/// Recorded bus client call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusCall {
    Register {
        handle: NativeHandle,
        rule: String,
        context: SubscriptionId,
    },
    Unregister {
        handle: NativeHandle,
    },
    Dispatch {
        member: Option<String>,
        delivered: usize,
    },
}

#[derive(Clone)]
struct FakeRegistration {
    handle: NativeHandle,
    trampoline: Trampoline,
    context: SubscriptionId,
    live: bool,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<BusCall>,
    next_handle: u64,
    registrations: Vec<FakeRegistration>,
    register_error: Option<BusError>,
    unregister_error: Option<BusError>,
}

/// Fake bus client that records calls and delivers every message to every
/// live registration, ignoring rules
#[derive(Clone, Default)]
pub struct FakeBusClient {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBusClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<BusCall> {
        self.lock().calls.clone()
    }

    /// Fail the next `register_match` with `error`
    pub fn fail_next_register(&self, error: BusError) {
        self.lock().register_error = Some(error);
    }

    /// Fail the next `unregister_match` with `error`; the registration is
    /// still dropped
    pub fn fail_next_unregister(&self, error: BusError) {
        self.lock().unregister_error = Some(error);
    }

    /// Handles of live registrations with their contexts
    pub fn registrations(&self) -> Vec<(NativeHandle, SubscriptionId)> {
        self.lock()
            .registrations
            .iter()
            .filter(|r| r.live)
            .map(|r| (r.handle, r.context))
            .collect()
    }

    /// Invoke the trampoline recorded for `handle`, even after it was
    /// unregistered. Returns false for a handle never registered.
    pub fn deliver_to(
        &self,
        connection: &Connection,
        handle: NativeHandle,
        message: &Message,
    ) -> bool {
        let registration = self
            .lock()
            .registrations
            .iter()
            .find(|r| r.handle == handle)
            .cloned();
        match registration {
            Some(r) => {
                (r.trampoline)(connection, r.handle, message, r.context);
                true
            }
            None => false,
        }
    }
}

impl BusClient for FakeBusClient {
    fn register_match(
        &self,
        rule: &MatchRule,
        trampoline: Trampoline,
        context: SubscriptionId,
    ) -> Result<NativeHandle, BusError> {
        let mut state = self.lock();
        if let Some(error) = state.register_error.take() {
            return Err(error);
        }
        state.next_handle += 1;
        let handle = NativeHandle(state.next_handle);
        state.calls.push(BusCall::Register {
            handle,
            rule: rule.to_wire(),
            context,
        });
        state.registrations.push(FakeRegistration {
            handle,
            trampoline,
            context,
            live: true,
        });
        Ok(handle)
    }

    fn unregister_match(&self, handle: NativeHandle) -> Result<(), BusError> {
        let mut state = self.lock();
        state.calls.push(BusCall::Unregister { handle });
        let found = state
            .registrations
            .iter_mut()
            .find(|r| r.handle == handle && r.live)
            .map(|r| r.live = false)
            .is_some();
        if let Some(error) = state.unregister_error.take() {
            return Err(error);
        }
        if found {
            Ok(())
        } else {
            Err(BusError::NotFound(handle))
        }
    }

    fn dispatch(&self, connection: &Connection, message: &Message) -> usize {
        let live: Vec<FakeRegistration> = self
            .lock()
            .registrations
            .iter()
            .filter(|r| r.live)
            .cloned()
            .collect();
        for r in &live {
            (r.trampoline)(connection, r.handle, message, r.context);
        }
        self.lock().calls.push(BusCall::Dispatch {
            member: message.member.clone(),
            delivered: live.len(),
        });
        live.len()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
