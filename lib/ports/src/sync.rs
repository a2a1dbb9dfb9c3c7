// SPDX-FileCopyrightText: Copyright (c) 2026 Crossbar Contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! The single arbitration point of a channel.
//!
//! One `parking_lot` mutex guards all mutable channel state: the handshake
//! flags, the payload buffer, and the cached read value. One condition
//! variable carries every wakeup. Readers and writers rendezvous here and
//! nowhere else, which is what makes the handshake auditable: any state an
//! operation observes was protected by this lock.
//!
//! Waits are bounded by the channel timeout and never looped. On the writer
//! side a timeout expiry is a soft signal, not an error: the gate proceeds
//! to its admission check with whatever state then holds, giving the
//! previous writer a chance and then trying anyway. Reader-side waits treat
//! expiry with an empty buffer as a hard read timeout; that asymmetry is
//! load-bearing and both halves live in this file so it stays visible.

use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::warn;

use crate::buffer::EventBuffer;
use crate::config::ChannelMode;
use crate::connector::ConnectorId;
use crate::error::{DeliveryStatus, WriteOutcome};

/// Mutable channel state guarded by [`SyncState`]'s lock.
pub(crate) struct ChannelState<T: 'static> {
    /// A writer holds an admission grant and has not yet completed.
    pub(crate) writing: bool,
    /// A reader is parked waiting for a handoff (rendezvous mode only).
    pub(crate) waiting: bool,
    /// Most recent connector to receive an admission grant. Survives
    /// completion; cleared only by `read_data`.
    pub(crate) writing_connector: Option<ConnectorId>,
    /// Payload storage.
    pub(crate) buffer: Box<dyn EventBuffer<T>>,
    /// Value captured by the last successful `select`.
    pub(crate) cached: Option<T>,
}

/// Lock, condition variable, and the per-channel wait policy.
pub(crate) struct SyncState<T: 'static> {
    state: Mutex<ChannelState<T>>,
    cond: Condvar,
    mode: ChannelMode,
    timeout: Duration,
}

impl<T> SyncState<T> {
    pub(crate) fn new(
        mode: ChannelMode,
        timeout: Duration,
        buffer: Box<dyn EventBuffer<T>>,
    ) -> Self {
        Self {
            state: Mutex::new(ChannelState {
                writing: false,
                waiting: false,
                writing_connector: None,
                buffer,
                cached: None,
            }),
            cond: Condvar::new(),
            mode,
            timeout,
        }
    }

    pub(crate) fn mode(&self) -> ChannelMode {
        self.mode
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ChannelState<T>> {
        self.state.lock()
    }

    /// Park the caller on the channel condition for at most the configured
    /// timeout. Returns true if woken by a notification before the deadline.
    pub(crate) fn wait_for(&self, guard: &mut MutexGuard<'_, ChannelState<T>>) -> bool {
        !self.cond.wait_for(guard, self.timeout).timed_out()
    }

    /// Admission gate: decide whether one delivery may proceed.
    ///
    /// Buffered mode waits out an in-flight writer (bounded), then grants
    /// while the buffer has room. Rendezvous mode waits only when another
    /// writer is mid-handoff to a waiting reader, then grants only while a
    /// reader is actually parked. On a grant the gate sets `writing` and
    /// records the connector; on a denial it clears `writing` and the writer
    /// is expected to retry later.
    pub(crate) fn admit(&self, connector: ConnectorId) -> bool {
        let mut state = self.state.lock();
        let mut waited = false;
        match self.mode {
            ChannelMode::Buffered => {
                if state.writing {
                    // Expiry is not an error: re-check with whatever holds.
                    let _ = self.wait_for(&mut state);
                    waited = true;
                }
                if !state.buffer.full() {
                    state.writing = true;
                    state.writing_connector = Some(connector);
                    true
                } else {
                    state.writing = false;
                    if waited {
                        warn!(%connector, "admission denied after wait: buffer still full");
                    }
                    false
                }
            }
            ChannelMode::Rendezvous => {
                if state.waiting && state.writing {
                    let _ = self.wait_for(&mut state);
                    waited = true;
                }
                if state.waiting {
                    state.writing = true;
                    state.writing_connector = Some(connector);
                    true
                } else {
                    state.writing = false;
                    if waited {
                        warn!(%connector, "admission denied after wait: reader left");
                    }
                    false
                }
            }
        }
    }

    /// Record `connector` as the active writer without running the gate.
    /// Used when a scheduler override pre-empts admission.
    pub(crate) fn mark_writer(&self, connector: ConnectorId) {
        self.state.lock().writing_connector = Some(connector);
    }

    /// Receipt path: store one delivered payload.
    pub(crate) fn store(&self, value: T) -> WriteOutcome {
        self.state.lock().buffer.write(value)
    }

    /// Completion signal: release the writer hold and wake every waiter,
    /// blocked readers and queued writers alike. Runs on every delivery
    /// regardless of the payload outcome, so the flags never stay stuck.
    pub(crate) fn complete(&self) -> DeliveryStatus {
        let mut state = self.state.lock();
        state.writing = false;
        drop(state);
        self.cond.notify_all();
        DeliveryStatus::Ok
    }
}
