// SPDX-FileCopyrightText: Copyright (c) 2026 Crossbar Contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crossbar_ports::{ChannelLink, DeliveryStatus, PeerConnector};

/// Scripted transport peer driven entirely by the test.
///
/// Values queued with [`push`](QueueConnector::push) are delivered one per
/// `read_buff` request, the way a pull-style transport would; writer threads
/// can instead push through the installed link directly with
/// [`try_deliver`](QueueConnector::try_deliver).
pub struct QueueConnector<T: 'static> {
    tag: Option<String>,
    pending: Mutex<VecDeque<T>>,
    link: Mutex<Option<ChannelLink<T>>>,
    delivered: AtomicUsize,
    detached: AtomicBool,
}

impl<T: Send + 'static> QueueConnector<T> {
    pub fn new() -> Arc<Self> {
        Self::build(None)
    }

    pub fn tagged(tag: &str) -> Arc<Self> {
        Self::build(Some(tag.to_string()))
    }

    fn build(tag: Option<String>) -> Arc<Self> {
        Arc::new(Self {
            tag,
            pending: Mutex::new(VecDeque::new()),
            link: Mutex::new(None),
            delivered: AtomicUsize::new(0),
            detached: AtomicBool::new(false),
        })
    }

    /// Queue a value for delivery on the next `read_buff`.
    pub fn push(&self, value: T) {
        self.pending.lock().push_back(value);
    }

    /// Deliver `value` through the installed link right now, bypassing the
    /// pending queue. Panics when the connector was never attached.
    pub fn try_deliver(&self, value: T) -> DeliveryStatus {
        let status = self.link().deliver(self.tag.as_deref(), value);
        if status.is_ok() {
            self.delivered.fetch_add(1, Ordering::SeqCst);
        }
        status
    }

    /// Clone of the link installed at attach time.
    pub fn link(&self) -> ChannelLink<T> {
        self.link.lock().clone().expect("connector not attached")
    }

    /// Number of successfully delivered payloads.
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }
}

impl<T: Send + 'static> PeerConnector<T> for QueueConnector<T> {
    fn is_readable(&self) -> bool {
        !self.pending.lock().is_empty()
    }

    fn read_buff(&self) -> DeliveryStatus {
        let Some(value) = self.pending.lock().pop_front() else {
            return DeliveryStatus::Error;
        };
        let link = match self.link.lock().clone() {
            Some(link) => link,
            None => return DeliveryStatus::Disconnected,
        };
        let status = link.deliver(self.tag.as_deref(), value);
        if status.is_ok() {
            self.delivered.fetch_add(1, Ordering::SeqCst);
        }
        status
    }

    fn on_attach(&self, link: ChannelLink<T>) {
        *self.link.lock() = Some(link);
    }

    fn on_detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }
}
