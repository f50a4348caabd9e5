// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Match registration on a bus connection
//!
//! A `Connection` owns two arenas: the subscription table (whose tokens are
//! the contexts handed to the bus client) and the handle arena of runtime
//! values each subscription keeps alive. Native unregistration always
//! happens before a subscription's references are released.

use crate::arena::{HandleArena, Token};
use crate::bus::{BusClient, NativeHandle};
use crate::config::BusConfig;
use crate::dispatch::dispatch_match;
use crate::message::Message;
use crate::rule;
use crate::runtime::{MatchHandler, RuntimeValue};
use crate::subscription::{
    CallbackContext, ConnectionId, MatchSubscription, SubscribeError, SubscriptionId,
    Unsubscribed,
};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Arena entries taken per subscription: connection anchor, handler, user data
const REFS_PER_SUBSCRIPTION: usize = 3;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A bus connection with its match subscriptions
///
/// Cloning shares the connection.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    id: ConnectionId,
    bus: Arc<dyn BusClient>,
    config: BusConfig,
    state: Mutex<ConnectionState>,
}

#[derive(Default)]
struct ConnectionState {
    matches: HandleArena<MatchSubscription>,
    refs: HandleArena<RuntimeValue>,
    closed: bool,
}

impl ConnectionState {
    /// Remove a subscription shell and its references
    fn release_subscription(&mut self, token: Token) -> Vec<RuntimeValue> {
        match self.matches.release(token) {
            Some(shell) => self.release_references(&shell),
            None => Vec::new(),
        }
    }

    fn release_references(&mut self, shell: &MatchSubscription) -> Vec<RuntimeValue> {
        shell
            .references()
            .into_iter()
            .filter_map(|token| self.refs.release(token))
            .collect()
    }
}

impl Connection {
    pub fn new(bus: impl BusClient + 'static) -> Self {
        Self::with_config(bus, BusConfig::default())
    }

    pub fn with_config(bus: impl BusClient + 'static, config: BusConfig) -> Self {
        let id = ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        debug!(connection = %id, "connection opened");
        Self {
            inner: Arc::new(ConnectionInner {
                id,
                bus: Arc::new(bus),
                config,
                state: Mutex::new(ConnectionState::default()),
            }),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    fn lock(&self) -> MutexGuard<'_, ConnectionState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Subscribe `handler` to messages matching `criteria`.
    ///
    /// On any failure nothing stays registered or retained.
    pub fn subscribe<H>(
        &self,
        criteria: &Value,
        handler: H,
        user_data: Value,
    ) -> Result<SubscriptionId, SubscribeError>
    where
        H: MatchHandler + 'static,
    {
        self.subscribe_shared(criteria, Arc::new(handler), user_data)
    }

    /// Like [`Connection::subscribe`] for a handler shared between subscriptions
    pub fn subscribe_shared(
        &self,
        criteria: &Value,
        handler: Arc<dyn MatchHandler>,
        user_data: Value,
    ) -> Result<SubscriptionId, SubscribeError> {
        let mut state = self.lock();
        if state.closed {
            return Err(SubscribeError::Closed);
        }
        if let Some(max) = self.inner.config.max_subscriptions {
            if state.matches.len() >= max {
                return Err(SubscribeError::LimitReached(max));
            }
        }

        let rule = rule::build(criteria).inspect_err(|e| {
            debug!(
                connection = %self.inner.id,
                error = %e,
                resource = e.is_resource(),
                "invalid match criteria"
            );
        })?;

        let ConnectionState { matches, refs, .. } = &mut *state;
        refs.try_reserve(REFS_PER_SUBSCRIPTION)?;
        let shell = matches.try_vacant()?;
        let id = SubscriptionId::new(self.inner.id, shell.token());

        let native = self
            .inner
            .bus
            .register_match(&rule, dispatch_match, id)
            .map_err(|e| {
                debug!(subscription = %id, rule = %rule, error = %e, "native registration failed");
                SubscribeError::Registration(e)
            })?;

        // Capacity was reserved above, so none of these allocate
        let anchor = refs.retain(RuntimeValue::Connection(self.clone()));
        let handler = refs.retain(RuntimeValue::Handler(handler));
        let user_data = refs.retain(RuntimeValue::Data(Arc::new(user_data)));
        shell.insert(MatchSubscription {
            native,
            anchor,
            callback: CallbackContext { handler, user_data },
        });

        debug!(subscription = %id, native = %native, rule = %rule, "subscribed");
        Ok(id)
    }

    /// Unregister a subscription and release what it holds.
    ///
    /// Never fails: a native failure is logged and the local state is torn
    /// down regardless.
    pub fn unsubscribe(&self, id: SubscriptionId) -> Unsubscribed {
        if id.connection() != self.inner.id {
            debug!(
                subscription = %id,
                connection = %self.inner.id,
                "handle from another connection"
            );
            return Unsubscribed::NotFound;
        }

        let (outcome, released) = {
            let mut state = self.lock();
            let Some(native) = state.matches.get(id.token()).map(|shell| shell.native) else {
                return Unsubscribed::NotFound;
            };

            let outcome = match self.inner.bus.unregister_match(native) {
                Ok(()) => Unsubscribed::Removed,
                Err(e) => {
                    warn!(
                        subscription = %id,
                        native = %native,
                        error = %e,
                        "failed to unregister match"
                    );
                    Unsubscribed::NativeFailed(e)
                }
            };
            (outcome, state.release_subscription(id.token()))
        };

        // Dropped outside the lock; handlers may own connection handles
        drop(released);
        debug!(subscription = %id, "unsubscribed");
        outcome
    }

    /// Unsubscribe every subscription using `handler`, returning how many
    /// were removed
    pub fn unsubscribe_handler(&self, handler: &Arc<dyn MatchHandler>) -> usize {
        let mut released = Vec::new();
        let mut removed = 0;
        {
            let mut state = self.lock();
            let ConnectionState { matches, refs, .. } = &mut *state;
            let mut cursor = matches.cursor();
            while let Some(token) = cursor.advance(matches) {
                let Some(shell) = matches.get(token) else {
                    continue;
                };
                let same = matches!(
                    refs.get(shell.callback.handler),
                    Some(RuntimeValue::Handler(h)) if Arc::ptr_eq(h, handler)
                );
                if !same {
                    continue;
                }
                if let Err(e) = self.inner.bus.unregister_match(shell.native) {
                    warn!(native = %shell.native, error = %e, "failed to unregister match");
                }
                if let Some(shell) = cursor.erase(matches) {
                    released.extend(
                        shell
                            .references()
                            .into_iter()
                            .filter_map(|t| refs.release(t)),
                    );
                    removed += 1;
                }
            }
        }
        drop(released);
        debug!(connection = %self.inner.id, removed, "unsubscribed handler");
        removed
    }

    /// Route an inbound message through the bus client
    pub fn process(&self, message: &Message) -> usize {
        self.inner.bus.dispatch(self, message)
    }

    /// Dispose every outstanding subscription and refuse new ones.
    ///
    /// Returns the number of subscriptions disposed; closing twice is a no-op.
    pub fn close(&self) -> usize {
        let (disposed, released) = {
            let mut state = self.lock();
            if state.closed {
                return 0;
            }
            state.closed = true;
            self.inner.teardown(&mut state)
        };
        drop(released);
        debug!(connection = %self.inner.id, disposed, "connection closed");
        disposed
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn subscription_count(&self) -> usize {
        self.lock().matches.len()
    }

    /// Number of runtime values currently retained
    pub fn retained_count(&self) -> usize {
        self.lock().refs.len()
    }

    pub fn subscriptions(&self) -> Vec<SubscriptionId> {
        let state = self.lock();
        state
            .matches
            .tokens()
            .into_iter()
            .map(|token| SubscriptionId::new(self.inner.id, token))
            .collect()
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        id.connection() == self.inner.id && self.lock().matches.contains(id.token())
    }

    /// Find the subscription the bus client knows as `native`
    pub fn find_subscription(&self, native: NativeHandle) -> Option<SubscriptionId> {
        let state = self.lock();
        state
            .matches
            .find(|shell| shell.native == native)
            .map(|token| SubscriptionId::new(self.inner.id, token))
    }

    /// Resolve the handler and user data for a dispatch.
    ///
    /// `None` for stale or foreign contexts and for a native handle that does
    /// not belong to the subscription.
    pub(crate) fn resolve_callback(
        &self,
        id: SubscriptionId,
        native: NativeHandle,
    ) -> Option<(Arc<dyn MatchHandler>, Arc<Value>)> {
        if id.connection() != self.inner.id {
            return None;
        }
        let state = self.lock();
        let shell = state.matches.get(id.token())?;
        if shell.native != native {
            return None;
        }
        let handler = match state.refs.get(shell.callback.handler)? {
            RuntimeValue::Handler(handler) => Arc::clone(handler),
            _ => return None,
        };
        let user_data = match state.refs.get(shell.callback.user_data)? {
            RuntimeValue::Data(data) => Arc::clone(data),
            _ => return None,
        };
        Some((handler, user_data))
    }
}

impl ConnectionInner {
    /// Unregister and release every subscription, then anything else retained
    fn teardown(&self, state: &mut ConnectionState) -> (usize, Vec<RuntimeValue>) {
        let ConnectionState { matches, refs, .. } = state;
        let mut released = Vec::new();
        let mut disposed = 0;

        matches.clear(|token, shell| {
            if let Err(e) = self.bus.unregister_match(shell.native) {
                warn!(
                    connection = %self.id,
                    subscription = %token,
                    error = %e,
                    "failed to unregister match"
                );
            }
            released.extend(
                shell
                    .references()
                    .into_iter()
                    .filter_map(|t| refs.release(t)),
            );
            disposed += 1;
        });
        refs.clear(|_, value| released.push(value));

        (disposed, released)
    }
}

impl Drop for ConnectionInner {
    fn drop(&mut self) {
        // Subscriptions anchor the connection, so there is normally nothing
        // left here; closing still clears whatever remains.
        let mut state = std::mem::take(self.state.get_mut().unwrap_or_else(|e| e.into_inner()));
        if !state.closed {
            let (disposed, released) = self.teardown(&mut state);
            drop(released);
            debug!(connection = %self.id, disposed, "connection dropped");
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
