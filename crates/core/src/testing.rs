// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for unit tests

use crate::bus::{BusClient, BusError, NativeHandle, Trampoline};
use crate::connection::Connection;
use crate::message::Message;
use crate::rule::MatchRule;
use crate::subscription::SubscriptionId;

pub use crate::test_support::with_tracing;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct Registration {
    pub handle: NativeHandle,
    pub rule: MatchRule,
    pub trampoline: Trampoline,
    pub context: SubscriptionId,
}

#[derive(Default)]
struct LoopbackState {
    next_handle: u64,
    registrations: Vec<Registration>,
    unregistered: Vec<NativeHandle>,
    fail_register: bool,
    fail_unregister: bool,
}

/// Minimal bus client that routes by `MatchRule::matches`
#[derive(Clone, Default)]
pub struct LoopbackBus {
    state: Arc<Mutex<LoopbackState>>,
}

impl LoopbackBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registrations(&self) -> Vec<Registration> {
        self.state.lock().unwrap().registrations.clone()
    }

    pub fn unregistered(&self) -> Vec<NativeHandle> {
        self.state.lock().unwrap().unregistered.clone()
    }

    pub fn fail_register(&self) {
        self.state.lock().unwrap().fail_register = true;
    }

    pub fn fail_unregister(&self) {
        self.state.lock().unwrap().fail_unregister = true;
    }

    /// Invoke a trampoline directly, bypassing rule matching
    pub fn deliver(&self, connection: &Connection, registration: &Registration, message: &Message) {
        (registration.trampoline)(connection, registration.handle, message, registration.context);
    }
}

impl BusClient for LoopbackBus {
    fn register_match(
        &self,
        rule: &MatchRule,
        trampoline: Trampoline,
        context: SubscriptionId,
    ) -> Result<NativeHandle, BusError> {
        let mut state = self.state.lock().unwrap();
        if std::mem::take(&mut state.fail_register) {
            return Err(BusError::Rejected("refused by test".to_string()));
        }
        state.next_handle += 1;
        let handle = NativeHandle(state.next_handle);
        state.registrations.push(Registration {
            handle,
            rule: rule.clone(),
            trampoline,
            context,
        });
        Ok(handle)
    }

    fn unregister_match(&self, handle: NativeHandle) -> Result<(), BusError> {
        let mut state = self.state.lock().unwrap();
        state.unregistered.push(handle);
        let before = state.registrations.len();
        state.registrations.retain(|r| r.handle != handle);
        if std::mem::take(&mut state.fail_unregister) {
            return Err(BusError::Closed);
        }
        if state.registrations.len() == before {
            return Err(BusError::NotFound(handle));
        }
        Ok(())
    }

    fn dispatch(&self, connection: &Connection, message: &Message) -> usize {
        let matched: Vec<Registration> = {
            let state = self.state.lock().unwrap();
            state
                .registrations
                .iter()
                .filter(|r| r.rule.matches(message, None))
                .cloned()
                .collect()
        };
        for registration in &matched {
            self.deliver(connection, registration, message);
        }
        matched.len()
    }
}
