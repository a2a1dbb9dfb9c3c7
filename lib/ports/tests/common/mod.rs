// SPDX-FileCopyrightText: Copyright (c) 2026 Crossbar Contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

mod queue_connector;
mod scheduler;

pub use queue_connector::QueueConnector;
pub use scheduler::OverrideScheduler;

use tracing_subscriber::EnvFilter;

/// Install the test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
