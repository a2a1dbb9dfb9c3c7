// SPDX-FileCopyrightText: Copyright (c) 2026 Crossbar Contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Optional external arbitration bound to a channel.

/// Cooperative scheduling authority a channel may consult before running its
/// admission gate.
///
/// When a scheduler is bound via
/// [`EventChannel::bind_scheduler`](crate::EventChannel::bind_scheduler), the
/// writer side asks it first: a `true` override grants the delivery
/// immediately and skips the condition-variable wait entirely. The channel
/// holds the scheduler weakly and never manages its lifetime; once the last
/// strong reference elsewhere is dropped, admission falls back to the plain
/// gate.
///
/// Schedulers receive fired events through [`EventBinding`](crate::EventBinding)
/// handlers that capture them; the channel itself never pushes into a
/// scheduler.
pub trait Scheduler: Send + Sync {
    /// Readiness override consulted before the admission gate. `channel` is
    /// the name of the channel asking.
    fn readiness_override(&self, channel: &str) -> bool;
}
