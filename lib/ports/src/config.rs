// SPDX-FileCopyrightText: Copyright (c) 2026 Crossbar Contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Construction-time configuration for event channels.
//!
//! Two knobs cover the whole core: buffer capacity (which also selects the
//! channel mode) and the bound applied to every blocking wait. Both can be
//! overridden from the environment for deployment-time tuning:
//!
//! - `CROSSBAR_BUFFER_CAPACITY` — buffer capacity; `0` selects rendezvous mode
//! - `CROSSBAR_CHANNEL_TIMEOUT_MS` — wait bound in milliseconds

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default buffer capacity when none is configured.
pub const DEFAULT_CAPACITY: usize = 8;

/// Default bound for every blocking wait performed by a channel.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Buffering discipline of a channel, derived from the configured capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    /// Bounded FIFO decoupling: writers are admitted while the buffer has
    /// room, readers drain in arrival order.
    Buffered,
    /// Synchronous handoff: a delivery is admitted only while a reader is
    /// blocked waiting for it.
    Rendezvous,
}

impl ChannelMode {
    /// Check if this is buffered mode.
    pub fn is_buffered(&self) -> bool {
        matches!(self, ChannelMode::Buffered)
    }

    /// Check if this is rendezvous mode.
    pub fn is_rendezvous(&self) -> bool {
        matches!(self, ChannelMode::Rendezvous)
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelMode::Buffered => write!(f, "buffered"),
            ChannelMode::Rendezvous => write!(f, "rendezvous"),
        }
    }
}

/// Options applied to an [`EventChannel`](crate::EventChannel) at
/// construction time.
///
/// A `capacity` of zero selects [`ChannelMode::Rendezvous`]; any other value
/// selects [`ChannelMode::Buffered`] with that capacity. `timeout` bounds
/// every wait the channel performs: reader waits for data, writer waits on an
/// in-flight delivery, and the admission gate's wait all use the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    /// Buffer capacity; zero selects rendezvous mode.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Bound applied to every blocking wait.
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl PortConfig {
    /// Environment variable overriding the buffer capacity.
    pub const CAPACITY_ENV: &'static str = "CROSSBAR_BUFFER_CAPACITY";

    /// Environment variable overriding the wait bound, in milliseconds.
    pub const TIMEOUT_MS_ENV: &'static str = "CROSSBAR_CHANNEL_TIMEOUT_MS";

    /// Build a config from the environment, falling back to defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_env_or(Self::default())
    }

    /// Build a config from the environment, falling back to `base` for
    /// anything unset or unparsable.
    pub fn from_env_or(base: Self) -> Self {
        let mut config = base;
        if let Some(capacity) = env_parse::<usize>(Self::CAPACITY_ENV) {
            config.capacity = capacity;
        }
        if let Some(ms) = env_parse::<u64>(Self::TIMEOUT_MS_ENV) {
            config.timeout = Duration::from_millis(ms);
        }
        config
    }

    /// Channel mode implied by the configured capacity.
    pub fn mode(&self) -> ChannelMode {
        if self.capacity == 0 {
            ChannelMode::Rendezvous
        } else {
            ChannelMode::Buffered
        }
    }
}

fn env_parse<V: std::str::FromStr>(key: &str) -> Option<V> {
    std::env::var(key).ok().and_then(|raw| raw.parse().ok())
}
