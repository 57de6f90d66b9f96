//! Argument captor.
//!
//! Snapshot of the argument lists a method was called with, taken when the
//! captor is created. Later calls are not reflected.

use crate::result::{MockError, MockResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Recorded arguments of one method, oldest call first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgCaptor {
    calls: Vec<Vec<Value>>,
}

impl ArgCaptor {
    /// Wrap argument lists in call order
    #[must_use]
    pub const fn new(calls: Vec<Vec<Value>>) -> Self {
        Self { calls }
    }

    /// Arguments of the first call
    #[must_use]
    pub fn first(&self) -> Option<&[Value]> {
        self.calls.first().map(Vec::as_slice)
    }

    /// Arguments of the most recent call
    #[must_use]
    pub fn last(&self) -> Option<&[Value]> {
        self.calls.last().map(Vec::as_slice)
    }

    /// Arguments of the call at `index` (0 = first)
    #[must_use]
    pub fn by_call_index(&self, index: usize) -> Option<&[Value]> {
        self.calls.get(index).map(Vec::as_slice)
    }

    /// Every argument list
    #[must_use]
    pub fn all(&self) -> &[Vec<Value>] {
        &self.calls
    }

    /// Number of captured calls
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Check if nothing was captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Decode one argument of the most recent call
    ///
    /// A missing call or position decodes from `null`.
    pub fn last_as<T: DeserializeOwned>(&self, position: usize) -> MockResult<T> {
        let value = self
            .last()
            .and_then(|args| args.get(position))
            .cloned()
            .unwrap_or_default();
        serde_json::from_value(value).map_err(MockError::from)
    }
}
