// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process bus client
//!
//! Holds match registrations in memory and routes messages with
//! `MatchRule::matches`. Other threads hand messages to the loop through
//! [`MemoryBus::sender`]; the loop thread drains them with
//! [`MemoryBus::pump`].

use busline_core::{
    BusClient, BusConfig, BusError, Connection, MatchRule, Message, NativeHandle,
    SubscriptionId, Trampoline, DEFAULT_MAX_RULE_LEN,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Sending half of a bus's inbound queue
pub type MessageSender = UnboundedSender<Message>;

#[derive(Clone)]
struct Registration {
    handle: NativeHandle,
    rule: MatchRule,
    trampoline: Trampoline,
    context: SubscriptionId,
}

#[derive(Default)]
struct Registrations {
    next_handle: u64,
    entries: Vec<Registration>,
}

struct MemoryInner {
    unique_name: Option<String>,
    max_rule_len: usize,
    registrations: Mutex<Registrations>,
    inbound_tx: MessageSender,
    inbound_rx: Mutex<UnboundedReceiver<Message>>,
}

/// Bus client backed by process memory
#[derive(Clone)]
pub struct MemoryBus {
    inner: Arc<MemoryInner>,
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::build(None, DEFAULT_MAX_RULE_LEN)
    }

    pub fn from_config(config: &BusConfig) -> Self {
        Self::build(config.unique_name.clone(), config.max_rule_len)
    }

    fn build(unique_name: Option<String>, max_rule_len: usize) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(MemoryInner {
                unique_name,
                max_rule_len,
                registrations: Mutex::new(Registrations::default()),
                inbound_tx,
                inbound_rx: Mutex::new(inbound_rx),
            }),
        }
    }

    pub fn unique_name(&self) -> Option<&str> {
        self.inner.unique_name.as_deref()
    }

    /// Queue for messages produced off the loop thread
    pub fn sender(&self) -> MessageSender {
        self.inner.inbound_tx.clone()
    }

    /// Drain the inbound queue through `connection`, returning how many
    /// messages were processed
    pub fn pump(&self, connection: &Connection) -> usize {
        let mut processed = 0;
        loop {
            // The receiver lock is released before dispatch so handlers may
            // queue further messages
            let next = self
                .inner
                .inbound_rx
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .try_recv();
            match next {
                Ok(message) => {
                    let delivered = connection.process(&message);
                    tracing::trace!(delivered, "pumped message");
                    processed += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        processed
    }

    pub fn registration_count(&self) -> usize {
        self.lock().entries.len()
    }

    /// Wire text of every live registration, oldest first
    pub fn rules(&self) -> Vec<String> {
        self.lock().entries.iter().map(|r| r.rule.to_wire()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Registrations> {
        self.inner
            .registrations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}

impl BusClient for MemoryBus {
    fn register_match(
        &self,
        rule: &MatchRule,
        trampoline: Trampoline,
        context: SubscriptionId,
    ) -> Result<NativeHandle, BusError> {
        let len = rule.to_wire().len();
        if len > self.inner.max_rule_len {
            return Err(BusError::RuleTooLong {
                len,
                max: self.inner.max_rule_len,
            });
        }

        let mut registrations = self.lock();
        registrations.next_handle += 1;
        let handle = NativeHandle(registrations.next_handle);
        registrations.entries.push(Registration {
            handle,
            rule: rule.clone(),
            trampoline,
            context,
        });
        Ok(handle)
    }

    fn unregister_match(&self, handle: NativeHandle) -> Result<(), BusError> {
        let mut registrations = self.lock();
        let position = registrations
            .entries
            .iter()
            .position(|r| r.handle == handle)
            .ok_or(BusError::NotFound(handle))?;
        registrations.entries.remove(position);
        Ok(())
    }

    fn dispatch(&self, connection: &Connection, message: &Message) -> usize {
        let own_name = self.unique_name();
        let matched: Vec<Registration> = self
            .lock()
            .entries
            .iter()
            .filter(|r| r.context.connection() == connection.id())
            .filter(|r| r.rule.matches(message, own_name))
            .cloned()
            .collect();

        // Trampolines run without the registration lock held
        for registration in &matched {
            (registration.trampoline)(
                connection,
                registration.handle,
                message,
                registration.context,
            );
        }
        matched.len()
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
