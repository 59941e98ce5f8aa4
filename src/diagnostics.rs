//! Reporting of wiring mistakes.
//!
//! Operations that reference unknown states, duplicate an edge, or otherwise
//! have no effect report a [`Diagnostic`] to the machine's sink before
//! returning the error. The default sink forwards to `tracing`, so the
//! caller's subscriber decides where warnings end up.

use crate::error::HfsmError;
use std::cell::RefCell;
use tracing::warn;

/// A single wiring problem, as seen by a sink.
#[derive(Debug, Clone, Copy)]
pub struct Diagnostic<'a> {
    /// Name of the machine the operation was called on
    pub machine: &'a str,
    pub error: &'a HfsmError,
}

/// Receiver for wiring diagnostics.
///
/// Nested machines share the sink of the machine they are added to.
pub trait DiagnosticSink {
    fn report(&self, diagnostic: &Diagnostic<'_>);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Diagnostic<'_>),
{
    fn report(&self, diagnostic: &Diagnostic<'_>) {
        self(diagnostic)
    }
}

/// Sink that emits a `tracing` warning per diagnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic<'_>) {
        warn!(
            machine = diagnostic.machine,
            error = %diagnostic.error,
            "state machine wiring had no effect"
        );
    }
}

/// Sink that keeps every reported error in memory.
///
/// Useful in tests and for surfacing silent no-ops to a monitoring layer.
#[derive(Debug, Default)]
pub struct CollectingSink {
    reports: RefCell<Vec<(String, HfsmError)>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors reported so far, oldest first.
    pub fn errors(&self) -> Vec<HfsmError> {
        self.reports.borrow().iter().map(|(_, e)| e.clone()).collect()
    }

    /// Reports as `(machine name, error)` pairs.
    pub fn reports(&self) -> Vec<(String, HfsmError)> {
        self.reports.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.reports.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.reports.borrow_mut().clear();
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: &Diagnostic<'_>) {
        self.reports
            .borrow_mut()
            .push((diagnostic.machine.to_string(), diagnostic.error.clone()));
    }
}
