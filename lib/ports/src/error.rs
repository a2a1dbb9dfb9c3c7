// SPDX-FileCopyrightText: Copyright (c) 2026 Crossbar Contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Error and status taxonomy for the event port core.
//!
//! Two kinds of outcome cross the port boundary:
//! - [`DeliveryStatus`] is the status code a peer connector sees for a single
//!   delivery attempt. Denials are ordinary outcomes, not errors; a writer is
//!   expected to retry later.
//! - [`ReadError`] is what the local consumer sees from the blocking read API.
//!
//! All failures are local to the specific read/pull/admit call; none leave
//! the channel in an unrecoverable state.

use std::fmt;
use std::time::Duration;

/// Status code returned to a peer connector for a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Payload admitted, stored, and completion signalled.
    Ok,
    /// The admission gate refused the delivery: buffer full (buffered mode)
    /// or no waiting reader (rendezvous mode). Retry later.
    Denied,
    /// The buffer reported full when the payload was stored.
    Full,
    /// The transport gave up waiting before the payload could be handed over.
    Timeout,
    /// The channel behind the link has been dropped.
    Disconnected,
    /// Transport or storage failure outside the gate's control.
    Error,
}

impl DeliveryStatus {
    /// True only for [`DeliveryStatus::Ok`].
    pub fn is_ok(self) -> bool {
        matches!(self, DeliveryStatus::Ok)
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Ok => write!(f, "Ok"),
            DeliveryStatus::Denied => write!(f, "Denied"),
            DeliveryStatus::Full => write!(f, "Full"),
            DeliveryStatus::Timeout => write!(f, "Timeout"),
            DeliveryStatus::Disconnected => write!(f, "Disconnected"),
            DeliveryStatus::Error => write!(f, "Error"),
        }
    }
}

/// Outcome of a single buffer write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Value stored.
    Ok,
    /// Buffer at capacity; value rejected.
    Full,
    /// Storage failure.
    Error,
}

impl From<WriteOutcome> for DeliveryStatus {
    fn from(outcome: WriteOutcome) -> Self {
        match outcome {
            WriteOutcome::Ok => DeliveryStatus::Ok,
            WriteOutcome::Full => DeliveryStatus::Full,
            WriteOutcome::Error => DeliveryStatus::Error,
        }
    }
}

/// Failure surfaced by the blocking read API.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    /// Read attempted with zero attached connectors. Fails immediately.
    #[error("no connectors attached")]
    NoPeers,

    /// No data became available within the channel timeout. The caller may
    /// simply read again.
    #[error("no data became available within {0:?}")]
    Timeout(Duration),

    /// A connector reported a non-OK status while delivering during the pull.
    #[error("connector delivery failed: {0}")]
    Transport(DeliveryStatus),
}
