//! Invocation Ledger
//!
//! Append-only log of real calls made through mocks. Every record carries a
//! sequence number drawn from one process-wide counter, so calls on different
//! mocks are totally ordered.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Identity of one mock instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mock#{}", self.0)
    }
}

/// One real invocation of a mocked method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Mock the call was made on
    pub target: TargetId,
    /// Method name
    pub method: String,
    /// Arguments, positional
    pub args: Vec<Value>,
    /// Global order of this call
    pub sequence: u64,
}

impl CallRecord {
    /// Check if this call happened before another
    #[must_use]
    pub const fn is_before(&self, other: &Self) -> bool {
        self.sequence < other.sequence
    }
}

/// Per-mock call log
#[derive(Debug, Default)]
pub struct InvocationLedger {
    calls: HashMap<TargetId, Vec<CallRecord>>,
}

impl InvocationLedger {
    /// Create an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call and return its record
    pub fn record(&mut self, target: TargetId, method: &str, args: Vec<Value>) -> CallRecord {
        let record = CallRecord {
            target,
            method: method.to_string(),
            args,
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::SeqCst),
        };
        self.calls.entry(target).or_default().push(record.clone());
        record
    }

    /// Calls of one method on one mock, in sequence order
    #[must_use]
    pub fn query(&self, target: TargetId, method: &str) -> Vec<&CallRecord> {
        self.calls_for(target)
            .iter()
            .filter(|r| r.method == method)
            .collect()
    }

    /// Every call made on one mock, in sequence order
    #[must_use]
    pub fn calls_for(&self, target: TargetId) -> &[CallRecord] {
        self.calls.get(&target).map_or(&[], Vec::as_slice)
    }

    /// Total number of recorded calls across all mocks
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.values().map(Vec::len).sum()
    }

    /// Check if no calls are recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget the calls of one mock; sequence numbers are not reused
    pub fn reset_calls(&mut self, target: TargetId) {
        self.calls.remove(&target);
    }
}
