// SPDX-FileCopyrightText: Copyright (c) 2026 Crossbar Contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! The typed event channel.
//!
//! [`EventChannel`] is the consumer-facing port: it owns the arbitration
//! state, the set of attached peer connectors, and the installed receipt
//! hooks. Writer threads reach the same state through [`ChannelLink`]s
//! handed out at attach time.
//!
//! Locking discipline: the connector set has its own lock, distinct from the
//! arbitration lock in [`SyncState`], and neither is ever held while calling
//! into a connector, a scheduler, or a user-supplied hook. Read paths
//! snapshot the connector set first and take the state lock only for the
//! decision points; deliveries triggered by `read_buff` therefore run the
//! full admit/store/complete handshake without any re-entrancy.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use crate::binding::EventBinding;
use crate::buffer::{EventBuffer, RingBuffer};
use crate::config::{ChannelMode, PortConfig};
use crate::connector::{ChannelLink, ConnectorId, PeerConnector};
use crate::error::{DeliveryStatus, ReadError, WriteOutcome};
use crate::scheduler::Scheduler;
use crate::sync::SyncState;

/// Shared interior of an [`EventChannel`], reachable from writer-side
/// [`ChannelLink`]s through a weak reference.
pub(crate) struct ChannelCore<T: 'static> {
    name: String,
    sync: SyncState<T>,
    scheduler: Mutex<Option<Weak<dyn Scheduler>>>,
    bindings: Mutex<Vec<Arc<EventBinding<T>>>>,
}

impl<T: 'static> ChannelCore<T> {
    /// Writer-side admission: scheduler override first, then the gate.
    pub(crate) fn try_admit(&self, connector: ConnectorId) -> bool {
        let scheduler = self.scheduler.lock().as_ref().and_then(Weak::upgrade);
        if let Some(scheduler) = scheduler {
            if scheduler.readiness_override(&self.name) {
                trace!(channel = %self.name, %connector, "scheduler override granted admission");
                self.sync.mark_writer(connector);
                return true;
            }
        }
        self.sync.admit(connector)
    }

    /// Receipt path: fire matching bindings, then store the payload.
    pub(crate) fn store(
        &self,
        connector: ConnectorId,
        tag: Option<&str>,
        value: T,
    ) -> DeliveryStatus {
        trace!(channel = %self.name, %connector, ?tag, "payload receipt");
        if let Some(tag) = tag {
            // Snapshot the matching hooks so none run under the bindings lock.
            let hooks: Vec<Arc<EventBinding<T>>> = {
                let bindings = self.bindings.lock();
                bindings.iter().filter(|b| b.matches(tag)).cloned().collect()
            };
            for hook in hooks {
                hook.fire(&value);
            }
        }
        let outcome = self.sync.store(value);
        if outcome == WriteOutcome::Full {
            error!(channel = %self.name, %connector, "buffer full after admission grant");
        }
        outcome.into()
    }

    /// Completion signal for one delivery.
    pub(crate) fn complete(&self) -> DeliveryStatus {
        self.sync.complete()
    }
}

struct AttachedPeer<T: 'static> {
    id: ConnectorId,
    peer: Arc<dyn PeerConnector<T>>,
}

/// A typed CSP-style event port.
///
/// A channel carries values of one payload type from any number of attached
/// [`PeerConnector`]s to a single logical consumer. The configured capacity
/// selects the discipline: a positive capacity gives a bounded FIFO
/// ([`ChannelMode::Buffered`]), zero gives a synchronous handoff
/// ([`ChannelMode::Rendezvous`]) where a delivery is only admitted while the
/// consumer is blocked in [`read`](EventChannel::read).
///
/// All consumer-side calls block the calling thread; there is no async
/// surface. Every wait is bounded by the configured timeout, so no call
/// outlives `timeout` by more than scheduling noise. The channel assumes one
/// logical consumer; concurrent readers are not detected, they just contend.
///
/// A rendezvous handoff whose reader gives up at the exact moment a granted
/// writer stores its value leaves that value in the handoff slot; the next
/// read returns it. Staleness is bounded by the timeout.
pub struct EventChannel<T: 'static> {
    core: Arc<ChannelCore<T>>,
    connectors: Mutex<Vec<AttachedPeer<T>>>,
    on_read: Mutex<Option<Arc<dyn Fn() + Send + Sync>>>,
    next_connector: AtomicU64,
}

impl<T: Send + 'static> EventChannel<T> {
    /// Create a channel with the stock [`RingBuffer`] sized by `config`.
    ///
    /// Rendezvous mode still gets a single-slot buffer: the slot is the
    /// handoff surface, not a queue.
    pub fn new(name: impl Into<String>, config: PortConfig) -> Self {
        let capacity = match config.mode() {
            ChannelMode::Rendezvous => 1,
            ChannelMode::Buffered => config.capacity,
        };
        Self::with_buffer(name, config, RingBuffer::with_capacity(capacity))
    }

    /// Create a channel around caller-provided payload storage.
    pub fn with_buffer(
        name: impl Into<String>,
        config: PortConfig,
        buffer: impl EventBuffer<T> + 'static,
    ) -> Self {
        Self {
            core: Arc::new(ChannelCore {
                name: name.into(),
                sync: SyncState::new(config.mode(), config.timeout, Box::new(buffer)),
                scheduler: Mutex::new(None),
                bindings: Mutex::new(Vec::new()),
            }),
            connectors: Mutex::new(Vec::new()),
            on_read: Mutex::new(None),
            next_connector: AtomicU64::new(1),
        }
    }

    /// Channel name, used in logs and passed to the scheduler override.
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Buffering discipline selected at construction.
    pub fn mode(&self) -> ChannelMode {
        self.core.sync.mode()
    }

    /// Bound applied to every blocking wait.
    pub fn timeout(&self) -> Duration {
        self.core.sync.timeout()
    }

    /// Number of currently attached connectors.
    pub fn connector_count(&self) -> usize {
        self.connectors.lock().len()
    }

    /// Bind an external scheduler consulted before the admission gate.
    ///
    /// The channel holds the scheduler weakly and never manages its
    /// lifetime; dropping the last strong reference elsewhere silently
    /// restores plain gate behavior.
    pub fn bind_scheduler<S: Scheduler + 'static>(&self, scheduler: &Arc<S>) {
        // Downgrade at the concrete type; the `dyn` unsize is a second step.
        let weak = Arc::downgrade(scheduler);
        let weak: Weak<dyn Scheduler> = weak;
        *self.core.scheduler.lock() = Some(weak);
    }

    /// Install the pre-read hook, replacing any previous one.
    ///
    /// The hook runs at the top of [`read`](EventChannel::read) and
    /// [`read_data`](EventChannel::read_data), outside all channel locks.
    /// External read-triggered side effects (prompting a device, kicking a
    /// poller) belong here.
    pub fn set_on_read(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_read.lock() = Some(Arc::new(hook));
    }

    /// Register a payload-ignoring receipt hook for `event`-tagged arrivals.
    pub fn bind_event0(
        &self,
        event: impl Into<String>,
        handler: impl Fn() + Send + Sync + 'static,
    ) {
        self.install_binding(EventBinding::nullary(event, handler));
    }

    /// Register a payload-borrowing receipt hook for `event`-tagged arrivals.
    pub fn bind_event1(
        &self,
        event: impl Into<String>,
        handler: impl Fn(&T) + Send + Sync + 'static,
    ) {
        self.install_binding(EventBinding::unary(event, handler));
    }

    /// Install an already-constructed binding. Bindings are additive only.
    pub fn install_binding(&self, binding: EventBinding<T>) {
        debug!(
            channel = %self.core.name,
            event = binding.event_name(),
            "event binding installed"
        );
        self.core.bindings.lock().push(Arc::new(binding));
    }

    /// Attach a peer connector and hand it its delivery surface.
    ///
    /// `on_attach` runs before the connector becomes visible to the read
    /// paths, so a peer always holds its [`ChannelLink`] by the time the
    /// channel first polls it.
    pub fn attach(&self, peer: Arc<dyn PeerConnector<T>>) -> ConnectorId {
        let id = ConnectorId::new(self.next_connector.fetch_add(1, Ordering::Relaxed));
        peer.on_attach(ChannelLink::new(id, Arc::downgrade(&self.core)));
        self.connectors.lock().push(AttachedPeer { id, peer });
        debug!(channel = %self.core.name, connector = %id, "connector attached");
        id
    }

    /// Detach a connector. Returns false when the id is unknown.
    ///
    /// A reader already blocked on the detached connector's data is not
    /// woken; it times out normally.
    pub fn detach(&self, id: ConnectorId) -> bool {
        let removed = {
            let mut connectors = self.connectors.lock();
            connectors
                .iter()
                .position(|attached| attached.id == id)
                .map(|index| connectors.remove(index))
        };
        match removed {
            Some(attached) => {
                attached.peer.on_detach();
                debug!(channel = %self.core.name, connector = %id, "connector detached");
                true
            }
            None => false,
        }
    }

    /// Proactively drain readable peers while the buffer has room.
    ///
    /// At most one payload is pulled per peer per call. Intended for
    /// buffered mode, where the read paths call it whenever draining a value
    /// frees capacity; in rendezvous mode a triggered delivery without a
    /// waiting reader is simply denied. Side effect only.
    pub fn notify(&self) {
        for (id, peer) in self.snapshot() {
            let has_room = {
                let mut state = self.core.sync.lock();
                if state.writing {
                    let _ = self.core.sync.wait_for(&mut state);
                }
                !state.buffer.full()
            };
            if has_room && peer.is_readable() {
                let status = peer.read_buff();
                if !status.is_ok() {
                    error!(channel = %self.core.name, connector = %id, %status, "read error");
                }
            }
        }
    }

    /// Non-blocking-ish readiness probe: attempt a pull and park the result.
    ///
    /// On success the pulled value is captured for a following
    /// [`read_data`](EventChannel::read_data) and `true` is returned. A miss
    /// or a delivery failure that leaves nothing behind returns `false`.
    /// "Non-blocking-ish" because a pull that finds a write in flight still
    /// waits it out, bounded by the timeout.
    pub fn select(&self) -> bool {
        trace!(channel = %self.core.name, "select()");
        let pulled = match self.core.sync.mode() {
            ChannelMode::Buffered => self.pull_buffered(),
            ChannelMode::Rendezvous => self.pull_rendezvous(),
        };
        match pulled {
            Ok(Some(value)) => {
                self.core.sync.lock().cached = Some(value);
                true
            }
            Ok(None) => false,
            // Already logged at the failure site.
            Err(_) => false,
        }
    }

    /// Blocking typed read.
    ///
    /// Runs the pre-read hook, fails fast with [`ReadError::NoPeers`] when
    /// nothing is attached, then drains by mode: buffered mode pulls from
    /// the buffer and the peers, parking up to the timeout for an in-flight
    /// write or a fresh arrival; rendezvous mode triggers a readable peer or
    /// parks as the waiting reader of a handoff.
    pub fn read(&self) -> Result<T, ReadError> {
        trace!(channel = %self.core.name, "read()");
        self.run_on_read();
        if self.connectors.lock().is_empty() {
            debug!(channel = %self.core.name, "no connectors");
            return Err(ReadError::NoPeers);
        }
        match self.core.sync.mode() {
            ChannelMode::Buffered => self.read_buffered(),
            ChannelMode::Rendezvous => self.read_rendezvous(),
        }
    }

    fn run_on_read(&self) {
        let hook = self.on_read.lock().clone();
        if let Some(hook) = hook {
            trace!(channel = %self.core.name, "on_read hook called");
            hook();
        }
    }

    fn snapshot(&self) -> Vec<(ConnectorId, Arc<dyn PeerConnector<T>>)> {
        self.connectors
            .lock()
            .iter()
            .map(|attached| (attached.id, Arc::clone(&attached.peer)))
            .collect()
    }

    /// One buffered-mode pull attempt.
    ///
    /// `Ok(Some(_))` is a drained value, `Ok(None)` a miss the caller may
    /// park on, `Err(_)` a hard failure (timed-out writer wait, or a peer
    /// delivery fault that left nothing behind).
    fn pull_buffered(&self) -> Result<Option<T>, ReadError> {
        let peers = self.snapshot();
        if peers.is_empty() {
            debug!(channel = %self.core.name, "no connectors");
            return Err(ReadError::NoPeers);
        }

        // Fast path: the buffer already holds data.
        {
            let mut state = self.core.sync.lock();
            if let Some(value) = state.buffer.read() {
                drop(state);
                self.notify();
                return Ok(Some(value));
            }
        }

        for (id, peer) in peers {
            let mut state = self.core.sync.lock();
            // A writer may have landed between lock acquisitions.
            if let Some(value) = state.buffer.read() {
                drop(state);
                self.notify();
                return Ok(Some(value));
            }
            if state.writing {
                let _ = self.core.sync.wait_for(&mut state);
                return match state.buffer.read() {
                    Some(value) => {
                        drop(state);
                        self.notify();
                        Ok(Some(value))
                    }
                    None => {
                        drop(state);
                        error!(channel = %self.core.name, "read timeout");
                        Err(ReadError::Timeout(self.core.sync.timeout()))
                    }
                };
            }
            drop(state);

            if !peer.is_readable() {
                continue;
            }
            // Trigger one delivery; the peer runs the full handshake
            // synchronously, so a grant lands in the buffer before this
            // returns.
            let status = peer.read_buff();
            let value = self.core.sync.lock().buffer.read();
            return match (status.is_ok(), value) {
                (true, Some(value)) => Ok(Some(value)),
                // The drain outranks the status: anything in the buffer got
                // there through a granted store, and that delivery may
                // already be acknowledged to its writer.
                (false, Some(value)) => {
                    warn!(
                        channel = %self.core.name,
                        connector = %id,
                        %status,
                        "trigger failed; draining granted payload"
                    );
                    Ok(Some(value))
                }
                (true, None) => {
                    error!(
                        channel = %self.core.name,
                        connector = %id,
                        "delivery reported ok but buffer stayed empty"
                    );
                    Err(ReadError::Transport(DeliveryStatus::Error))
                }
                (false, None) => {
                    error!(channel = %self.core.name, connector = %id, %status, "read error");
                    Err(ReadError::Transport(status))
                }
            };
        }

        Ok(None)
    }

    /// One rendezvous-mode pull attempt: trigger the first readable peer.
    fn pull_rendezvous(&self) -> Result<Option<T>, ReadError> {
        for (id, peer) in self.snapshot() {
            if !peer.is_readable() {
                continue;
            }
            // Publish reader presence for the duration of the triggered
            // delivery so the gate's waiting precondition holds on the pull
            // path too.
            self.core.sync.lock().waiting = true;
            let status = peer.read_buff();
            let value = {
                let mut state = self.core.sync.lock();
                state.waiting = false;
                // Drain the slot regardless of the status; a rendezvous
                // channel never leaves a value at rest.
                state.buffer.read()
            };
            return match (status.is_ok(), value) {
                (true, Some(value)) => Ok(Some(value)),
                // Same rule as the buffered pull: a granted handoff that
                // landed during the trigger outranks the status.
                (false, Some(value)) => {
                    warn!(
                        channel = %self.core.name,
                        connector = %id,
                        %status,
                        "trigger failed; draining granted payload"
                    );
                    Ok(Some(value))
                }
                (true, None) => {
                    error!(
                        channel = %self.core.name,
                        connector = %id,
                        "delivery reported ok but handoff slot stayed empty"
                    );
                    Err(ReadError::Transport(DeliveryStatus::Error))
                }
                (false, None) => {
                    error!(channel = %self.core.name, connector = %id, %status, "read error");
                    Err(ReadError::Transport(status))
                }
            };
        }
        Ok(None)
    }

    fn read_buffered(&self) -> Result<T, ReadError> {
        match self.pull_buffered()? {
            Some(value) => Ok(value),
            None => {
                let mut state = self.core.sync.lock();
                if state.writing || state.buffer.empty() {
                    let _ = self.core.sync.wait_for(&mut state);
                }
                match state.buffer.read() {
                    Some(value) => Ok(value),
                    None => {
                        drop(state);
                        error!(channel = %self.core.name, "read timeout");
                        Err(ReadError::Timeout(self.core.sync.timeout()))
                    }
                }
            }
        }
    }

    fn read_rendezvous(&self) -> Result<T, ReadError> {
        match self.pull_rendezvous()? {
            Some(value) => Ok(value),
            None => {
                let mut state = self.core.sync.lock();
                state.waiting = true;
                let _ = self.core.sync.wait_for(&mut state);
                state.waiting = false;
                match state.buffer.read() {
                    Some(value) => Ok(value),
                    None => {
                        drop(state);
                        error!(channel = %self.core.name, "read timeout");
                        Err(ReadError::Timeout(self.core.sync.timeout()))
                    }
                }
            }
        }
    }
}

impl<T: Clone + Send + 'static> EventChannel<T> {
    /// Return the value captured by the last successful
    /// [`select`](EventChannel::select).
    ///
    /// If a delivery was granted since the last `read_data` call, any value
    /// it left in the buffer is drained preferentially over the cache; a
    /// write still in flight is waited out first, bounded by the timeout.
    /// The cache is only meaningful immediately after a successful `select`;
    /// reading it later is a caller error the channel does not detect.
    pub fn read_data(&self) -> Option<T> {
        trace!(channel = %self.core.name, "read_data()");
        self.run_on_read();
        let mut state = self.core.sync.lock();
        if state.writing {
            let _ = self.core.sync.wait_for(&mut state);
        }
        if state.writing_connector.take().is_some() {
            if let Some(value) = state.buffer.read() {
                return Some(value);
            }
        }
        state.cached.clone()
    }
}

impl<T: 'static> Drop for EventChannel<T> {
    fn drop(&mut self) {
        let drained: Vec<AttachedPeer<T>> = self.connectors.lock().drain(..).collect();
        for attached in &drained {
            attached.peer.on_detach();
        }
    }
}

#[cfg(test)]
impl<T: Send + 'static> EventChannel<T> {
    /// Link bypassing `attach`, for exercising the writer surface directly.
    pub(crate) fn test_link(&self) -> ChannelLink<T> {
        ChannelLink::new(ConnectorId::new(0), Arc::downgrade(&self.core))
    }
}
