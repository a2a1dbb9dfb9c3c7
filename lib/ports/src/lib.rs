// SPDX-FileCopyrightText: Copyright (c) 2026 Crossbar Contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

#![doc = include_str!("../README.md")]

// Public surface
mod binding;
mod buffer;
mod channel;
mod config;
mod connector;
mod error;
mod scheduler;

// Internal synchronization
mod sync;

// ── Re-exports ──────────────────────────────────────────────────────────────

pub use binding::{BindingArity, EventBinding};
pub use buffer::{EventBuffer, RingBuffer};
pub use channel::EventChannel;
pub use config::{ChannelMode, PortConfig, DEFAULT_CAPACITY, DEFAULT_TIMEOUT};
pub use connector::{ChannelLink, ConnectorId, PeerConnector};
pub use error::{DeliveryStatus, ReadError, WriteOutcome};
pub use scheduler::Scheduler;
