//! Verification Engine
//!
//! Count and order assertions over the invocation ledger. Assertions are
//! evaluated eagerly and return the diagnostic as an error.
//!
//! ## Example
//!
//! ```rust,ignore
//! use probar_mock::prelude::*;
//!
//! foo.convert_number_to_string(5);
//! foo.convert_number_to_string(10);
//!
//! verify(|| foo.convert_number_to_string(5)).once()?;
//! verify(|| foo.convert_number_to_string(5))
//!     .called_before(&verify(|| foo.convert_number_to_string(10)))?;
//! ```

use crate::engine::{try_with_engine, with_engine};
use crate::formatter::CallFormatter;
use crate::ledger::{CallRecord, TargetId};
use crate::matcher::{validate, ArgMatcherList};
use crate::mode::Captured;
use crate::result::{MockError, MockResult};
use std::cell::RefCell;
use tracing::debug;

/// A call pattern to look up in the ledger
#[derive(Debug, Clone)]
pub struct VerificationSpec {
    /// Mock the calls were made on
    pub target: TargetId,
    /// Method name
    pub method: String,
    /// Argument matchers
    pub matchers: ArgMatcherList,
}

impl VerificationSpec {
    /// Create a spec
    #[must_use]
    pub fn new(target: TargetId, method: &str, matchers: ArgMatcherList) -> Self {
        Self {
            target,
            method: method.to_string(),
            matchers,
        }
    }

    /// Diagnostic form, e.g. `getStringById(strictEqual(1))`
    #[must_use]
    pub fn describe(&self) -> String {
        CallFormatter::format_spec(&self.method, &self.matchers)
    }

    /// Sequence numbers of matching calls, ascending
    #[must_use]
    pub fn matching_sequences(&self) -> Vec<u64> {
        let records: Vec<CallRecord> = with_engine(|engine| {
            engine
                .ledger()
                .query(self.target, &self.method)
                .into_iter()
                .cloned()
                .collect()
        });
        records
            .into_iter()
            .filter(|r| validate(&self.matchers, &r.args))
            .map(|r| r.sequence)
            .collect()
    }

    /// Every recorded call of the method, formatted with literal arguments
    #[must_use]
    pub fn actual_calls(&self) -> String {
        with_engine(|engine| {
            CallFormatter::format_calls(engine.ledger().query(self.target, &self.method))
        })
    }
}

/// Handle for assertions about one call pattern
///
/// Created by `verify`, `verify_matching`, `enter_verification` or
/// `MockHandle::verify_call`. When created before its call was captured, the
/// spec is taken from the pending capture on first use.
#[derive(Debug)]
pub struct Verification {
    ticket: Option<u64>,
    spec: RefCell<Option<VerificationSpec>>,
}

impl Verification {
    /// Wrap an already built spec
    #[must_use]
    pub fn from_spec(spec: VerificationSpec) -> Self {
        Self {
            ticket: None,
            spec: RefCell::new(Some(spec)),
        }
    }

    pub(crate) const fn armed(ticket: u64) -> Self {
        Self {
            ticket: Some(ticket),
            spec: RefCell::new(None),
        }
    }

    pub(crate) fn bind(&self) {
        let Some(ticket) = self.ticket else {
            return;
        };
        if self.spec.borrow().is_some() {
            return;
        }
        let captured = with_engine(|engine| engine.mode_mut().take_pending(ticket));
        if let Some(Captured::Verification(spec)) = captured {
            *self.spec.borrow_mut() = Some(spec);
        }
    }

    /// The captured spec
    pub fn spec(&self) -> MockResult<VerificationSpec> {
        self.bind();
        self.spec
            .borrow()
            .clone()
            .ok_or(MockError::NothingCaptured {
                operation: "verification",
            })
    }

    /// At least one matching call
    pub fn called(&self) -> MockResult<()> {
        self.at_least(1)
    }

    /// No matching call
    pub fn never(&self) -> MockResult<()> {
        self.times(0)
    }

    /// Exactly one matching call
    pub fn once(&self) -> MockResult<()> {
        self.times(1)
    }

    /// Exactly two matching calls
    pub fn twice(&self) -> MockResult<()> {
        self.times(2)
    }

    /// Exactly three matching calls
    pub fn thrice(&self) -> MockResult<()> {
        self.times(3)
    }

    /// Exactly `n` matching calls
    pub fn times(&self, n: usize) -> MockResult<()> {
        self.check_count(n, |count| count == n)
    }

    /// At least `n` matching calls
    pub fn at_least(&self, n: usize) -> MockResult<()> {
        self.check_count(n, |count| count >= n)
    }

    /// At most `n` matching calls
    pub fn at_most(&self, n: usize) -> MockResult<()> {
        self.check_count(n, |count| count <= n)
    }

    /// First matching call happened before the first call matching `other`
    pub fn called_before(&self, other: &Self) -> MockResult<()> {
        self.check_order(other, true)
    }

    /// First matching call happened after the first call matching `other`
    pub fn called_after(&self, other: &Self) -> MockResult<()> {
        self.check_order(other, false)
    }

    fn check_count(&self, expected: usize, holds: impl Fn(usize) -> bool) -> MockResult<()> {
        let spec = self.spec()?;
        let actual = spec.matching_sequences().len();
        debug!(
            target_id = spec.target.0,
            method = spec.method.as_str(),
            expected,
            actual,
            "Verifying call count"
        );
        if holds(actual) {
            return Ok(());
        }
        Err(MockError::VerificationCount {
            spec: spec.describe(),
            expected,
            actual,
            actual_calls: spec.actual_calls(),
        })
    }

    fn check_order(&self, other: &Self, before: bool) -> MockResult<()> {
        let own = self.spec()?;
        let other = other.spec()?;
        let own_first = own.matching_sequences().first().copied();
        let other_first = other.matching_sequences().first().copied();

        let own_desc = own.describe();
        let other_desc = other.describe();
        let relation = if before { "before" } else { "after" };
        let beginning = format!("Expected \"{own_desc}\" to be called {relation} \"{other_desc}\"");

        let message = match (own_first, other_first) {
            (Some(a), Some(b)) => {
                let in_order = if before { a < b } else { a > b };
                if in_order {
                    return Ok(());
                }
                let actual = if before { "after" } else { "before" };
                format!("{beginning} but has been called {actual}.")
            }
            (None, Some(_)) => format!("{beginning} but {own_desc} has never been called."),
            (Some(_), None) => format!("{beginning} but {other_desc} has never been called."),
            (None, None) => format!("{beginning} but none of them has been called."),
        };
        Err(MockError::VerificationOrder {
            self_spec: own_desc,
            other_spec: other_desc,
            message,
        })
    }
}

impl Drop for Verification {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket {
            if self.spec.get_mut().is_none() {
                try_with_engine(|engine| engine.mode_mut().disarm(ticket));
            }
        }
    }
}
