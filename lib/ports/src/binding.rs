// SPDX-FileCopyrightText: Copyright (c) 2026 Crossbar Contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Named receipt hooks.
//!
//! A binding ties an event name to a handler. When a delivered payload
//! carries a matching tag, the handler runs synchronously on the receipt
//! path, before the payload lands in the buffer. This is how a channel
//! forwards arrivals into an external state machine as triggered
//! transitions: the handler captures whatever it needs to drive.

use std::fmt;

use tracing::trace;

/// Handler arity of an [`EventBinding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingArity {
    /// Handler takes no payload; only the event name matters.
    Nullary,
    /// Handler borrows the delivered payload.
    Unary,
}

enum Handler<T: 'static> {
    Nullary(Box<dyn Fn() + Send + Sync>),
    Unary(Box<dyn Fn(&T) + Send + Sync>),
}

/// A named hook fired on the receipt path when a payload's tag matches.
///
/// Bindings are installed at configuration time via
/// [`EventChannel::bind_event0`](crate::EventChannel::bind_event0) and
/// [`EventChannel::bind_event1`](crate::EventChannel::bind_event1) and are
/// additive only; there is no unbind.
pub struct EventBinding<T: 'static> {
    event_name: String,
    handler: Handler<T>,
}

impl<T> EventBinding<T> {
    /// Binding whose handler ignores the payload.
    pub fn nullary(
        event_name: impl Into<String>,
        handler: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            event_name: event_name.into(),
            handler: Handler::Nullary(Box::new(handler)),
        }
    }

    /// Binding whose handler borrows the payload.
    pub fn unary(
        event_name: impl Into<String>,
        handler: impl Fn(&T) + Send + Sync + 'static,
    ) -> Self {
        Self {
            event_name: event_name.into(),
            handler: Handler::Unary(Box::new(handler)),
        }
    }

    /// Event name this binding listens for.
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Arity of the installed handler.
    pub fn arity(&self) -> BindingArity {
        match self.handler {
            Handler::Nullary(_) => BindingArity::Nullary,
            Handler::Unary(_) => BindingArity::Unary,
        }
    }

    /// Exact-match test against a delivered payload's tag.
    pub(crate) fn matches(&self, tag: &str) -> bool {
        self.event_name == tag
    }

    /// Run the handler against the delivered payload.
    pub(crate) fn fire(&self, value: &T) {
        trace!(event = %self.event_name, "binding fired");
        match &self.handler {
            Handler::Nullary(handler) => handler(),
            Handler::Unary(handler) => handler(value),
        }
    }
}

impl<T> fmt::Debug for EventBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBinding")
            .field("event_name", &self.event_name)
            .field("arity", &self.arity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_nullary_fires_on_match() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let binding = EventBinding::<u32>::nullary("start", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(binding.matches("start"));
        assert!(!binding.matches("stop"));
        assert!(!binding.matches("star"));

        binding.fire(&42);
        binding.fire(&43);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unary_receives_payload() {
        let seen = Arc::new(AtomicU32::new(0));
        let sink = seen.clone();
        let binding = EventBinding::unary("sample", move |value: &u32| {
            sink.store(*value, Ordering::SeqCst);
        });

        binding.fire(&99);
        assert_eq!(seen.load(Ordering::SeqCst), 99);
    }

    #[test]
    fn test_arity_and_debug() {
        let nullary = EventBinding::<u32>::nullary("a", || {});
        let unary = EventBinding::<u32>::unary("b", |_| {});
        assert_eq!(nullary.arity(), BindingArity::Nullary);
        assert_eq!(unary.arity(), BindingArity::Unary);

        let rendered = format!("{nullary:?}");
        assert!(rendered.contains("EventBinding"));
        assert!(rendered.contains("\"a\""));
        assert!(rendered.contains("Nullary"));
    }
}
