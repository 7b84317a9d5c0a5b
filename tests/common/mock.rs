//! Mock implementations for integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use dynslice::domain::location::ClassHandle;
use dynslice::domain::ports::{ClassResolver, TraceSource};
use dynslice::domain::trace::TraceData;

/// Mock TraceSource returning a fixed trace.
pub struct MockTraceSource {
    pub trace: TraceData,
}

impl MockTraceSource {
    pub fn new(trace: TraceData) -> Self {
        Self { trace }
    }
}

impl TraceSource for MockTraceSource {
    fn load(&self) -> Result<TraceData> {
        Ok(self.trace.clone())
    }
}

/// Mock ClassResolver over a fixed set of names that counts lookups.
#[derive(Default)]
pub struct MockClassResolver {
    names: Vec<String>,
    lookups: Arc<AtomicUsize>,
}

impl MockClassResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, name: &str) -> Self {
        self.names.push(name.to_string());
        self
    }

    /// Shared lookup counter; stays readable after the resolver is boxed.
    pub fn lookup_counter(&self) -> Arc<AtomicUsize> {
        self.lookups.clone()
    }
}

impl ClassResolver for MockClassResolver {
    fn resolve_class(&self, class_name: &str) -> Option<ClassHandle> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.names
            .iter()
            .position(|n| n == class_name)
            .map(|i| ClassHandle(i as u32))
    }
}
