// SPDX-FileCopyrightText: Copyright (c) 2026 Crossbar Contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbar_ports::Scheduler;

/// Scheduler fake with a switchable readiness answer and a consult counter.
pub struct OverrideScheduler {
    ready: AtomicBool,
    consulted: AtomicUsize,
}

impl OverrideScheduler {
    pub fn new(ready: bool) -> Arc<Self> {
        Arc::new(Self {
            ready: AtomicBool::new(ready),
            consulted: AtomicUsize::new(0),
        })
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn consulted(&self) -> usize {
        self.consulted.load(Ordering::SeqCst)
    }
}

impl Scheduler for OverrideScheduler {
    fn readiness_override(&self, _channel: &str) -> bool {
        self.consulted.fetch_add(1, Ordering::SeqCst);
        self.ready.load(Ordering::SeqCst)
    }
}
