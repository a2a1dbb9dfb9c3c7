// SPDX-FileCopyrightText: Copyright (c) 2026 Crossbar Contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! The seam between a channel and its transport peers.
//!
//! A [`PeerConnector`] is the channel's view of one remote producer: it can
//! be asked whether a payload is pending and told to deliver exactly one.
//! At attach time the channel installs a [`ChannelLink`] into the connector;
//! the link bundles the writer-side surface (admission gate, receipt path,
//! completion signal) behind a weak reference, so a connector outliving its
//! channel degrades to [`DeliveryStatus::Disconnected`] instead of keeping
//! the channel alive.

use std::fmt;
use std::sync::Weak;

use crate::channel::ChannelCore;
use crate::error::DeliveryStatus;

/// Identity of an attached peer connector, unique within its channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectorId(u64);

impl ConnectorId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw channel-local sequence number.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A remote-facing endpoint that can deliver payloads into a channel.
///
/// Implementations wrap whatever transport actually carries the data; the
/// channel only drives them through this contract. Both methods below are
/// called from reader-side threads while writer-side threads may be driving
/// the same connector, hence the `Send + Sync` requirement.
pub trait PeerConnector<T>: Send + Sync {
    /// True when the peer has a payload it could deliver on request.
    fn is_readable(&self) -> bool;

    /// Deliver exactly one pending payload through the installed
    /// [`ChannelLink`] and report the outcome.
    ///
    /// The channel never calls this while holding its state lock, so the
    /// implementation is free to go through the full admit/store/complete
    /// handshake synchronously.
    fn read_buff(&self) -> DeliveryStatus;

    /// Called once at attach time with the delivery surface for this
    /// connector. Replaces any link from a previous attachment.
    fn on_attach(&self, link: ChannelLink<T>);

    /// Called when the connector is detached from the channel.
    fn on_detach(&self) {}
}

/// Delivery surface installed into a [`PeerConnector`] at attach time.
///
/// The three primitive steps are exposed individually for transports that
/// interleave them with their own protocol traffic; [`deliver`] composes
/// them for the common case.
///
/// The link holds the channel weakly. Every method on a link whose channel
/// has been dropped reports [`DeliveryStatus::Disconnected`] (admission
/// simply denies).
///
/// [`deliver`]: ChannelLink::deliver
pub struct ChannelLink<T: 'static> {
    connector: ConnectorId,
    core: Weak<ChannelCore<T>>,
}

impl<T> Clone for ChannelLink<T> {
    fn clone(&self) -> Self {
        Self {
            connector: self.connector,
            core: Weak::clone(&self.core),
        }
    }
}

impl<T> ChannelLink<T> {
    pub(crate) fn new(connector: ConnectorId, core: Weak<ChannelCore<T>>) -> Self {
        Self { connector, core }
    }

    /// Identity the channel assigned to this connector at attach time.
    pub fn connector_id(&self) -> ConnectorId {
        self.connector
    }

    /// True while the channel behind this link is still alive.
    pub fn is_connected(&self) -> bool {
        self.core.strong_count() > 0
    }

    /// Ask the admission gate for the right to deliver one payload.
    ///
    /// A grant obliges the caller to follow through: store a payload (or
    /// fail trying) and then signal completion, so the writer hold is
    /// released. A denial carries no obligation.
    pub fn try_admit(&self) -> bool {
        match self.core.upgrade() {
            Some(core) => core.try_admit(self.connector),
            None => false,
        }
    }

    /// Receipt path: fire matching bindings, then store the payload.
    ///
    /// `tag` is the event name the payload arrived under, if any; it is
    /// matched against installed [`EventBinding`](crate::EventBinding)s.
    /// Must only be called under an admission grant.
    pub fn store(&self, tag: Option<&str>, value: T) -> DeliveryStatus {
        match self.core.upgrade() {
            Some(core) => core.store(self.connector, tag, value),
            None => DeliveryStatus::Disconnected,
        }
    }

    /// Completion signal: release the writer hold and wake all waiters.
    pub fn complete(&self) -> DeliveryStatus {
        match self.core.upgrade() {
            Some(core) => core.complete(),
            None => DeliveryStatus::Disconnected,
        }
    }

    /// Composed delivery: admit, store, complete.
    ///
    /// Completion runs even when the store fails, so the handshake flags are
    /// reset on every path. The reported status is the store failure if
    /// there was one, otherwise the completion acknowledgement.
    pub fn deliver(&self, tag: Option<&str>, value: T) -> DeliveryStatus {
        let Some(core) = self.core.upgrade() else {
            return DeliveryStatus::Disconnected;
        };
        if !core.try_admit(self.connector) {
            return DeliveryStatus::Denied;
        }
        let stored = core.store(self.connector, tag, value);
        let completed = core.complete();
        if stored.is_ok() {
            completed
        } else {
            stored
        }
    }
}

impl<T> fmt::Debug for ChannelLink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelLink")
            .field("connector", &self.connector)
            .field("connected", &self.is_connected())
            .finish()
    }
}
