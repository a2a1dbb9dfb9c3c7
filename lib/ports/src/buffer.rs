// SPDX-FileCopyrightText: Copyright (c) 2026 Crossbar Contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Payload storage behind a channel.
//!
//! The core never inspects buffered values and never depends on a concrete
//! storage layout; everything it needs is the four-operation contract in
//! [`EventBuffer`]. [`RingBuffer`] is the stock implementation used by
//! [`EventChannel::new`](crate::EventChannel::new); alternative storage can
//! be injected through
//! [`EventChannel::with_buffer`](crate::EventChannel::with_buffer).

use std::collections::VecDeque;

use crate::error::WriteOutcome;

/// Minimal storage contract the channel core depends on.
///
/// Implementations are always driven under the channel's state lock, so they
/// need no internal synchronization, but the boxed buffer migrates across
/// threads with the channel and must be `Send`.
pub trait EventBuffer<T>: Send {
    /// True when no value is stored.
    fn empty(&self) -> bool;

    /// True when another `write` would be rejected.
    fn full(&self) -> bool;

    /// Store one value at the tail.
    fn write(&mut self, value: T) -> WriteOutcome;

    /// Remove and return the value at the head, oldest first.
    fn read(&mut self) -> Option<T>;
}

/// Bounded FIFO with reject-on-full semantics.
///
/// Writes against a full buffer return [`WriteOutcome::Full`] and leave the
/// stored values untouched; nothing is ever overwritten.
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create a buffer holding at most `capacity` values.
    ///
    /// Requests for zero capacity are clamped to one: rendezvous channels
    /// still need a single slot to hand a value across, and a buffer that
    /// can never hold anything is useless.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of values this buffer holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of values currently stored.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no value is stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Send> EventBuffer<T> for RingBuffer<T> {
    fn empty(&self) -> bool {
        self.items.is_empty()
    }

    fn full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    fn write(&mut self, value: T) -> WriteOutcome {
        if self.items.len() >= self.capacity {
            return WriteOutcome::Full;
        }
        self.items.push_back(value);
        WriteOutcome::Ok
    }

    fn read(&mut self) -> Option<T> {
        self.items.pop_front()
    }
}
