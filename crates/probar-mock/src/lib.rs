//! Probar Mock: Stubbing and Call Verification for Rust Tests
//!
//! Mocks are hand-written forwarding types: each mocked method turns its
//! arguments into JSON values and hands them to the engine, which records the
//! call, answers it from the applicable stub and lets tests assert call counts
//! and call order afterwards.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   PROBAR MOCK Architecture                      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Forwarding │    │ Mode       │    │ Ledger /   │            │
//! │   │ Mock       │───►│ Controller │───►│ Stub       │            │
//! │   │ (MockHandle)    │ (dispatch) │    │ Registry   │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │                            │                 │                  │
//! │                            ▼                 ▼                  │
//! │                     ┌────────────┐    ┌────────────┐            │
//! │                     │ when /     │    │ Verifier + │            │
//! │                     │ verify     │    │ Formatter  │            │
//! │                     └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use probar_mock::prelude::*;
//!
//! let foo = MockHandle::new("Foo");
//! when(|| foo.dispatch("getStringById", args![1]))
//!     .then_return("one")?;
//!
//! let value: String = foo.call("getStringById", args![1]);
//! assert_eq!(value, "one");
//!
//! verify(|| foo.dispatch("getStringById", args![1])).once()?;
//! foo.verify_call("getStringById", matchers![any_number()]).called()?;
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Argument snapshots of recorded calls
pub mod captor;
/// Per-mock configuration
pub mod config;
/// Mock handles, dispatch and the `when`/`verify` entry points
#[allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]
pub mod engine;
/// Diagnostic rendering of calls and call specs
pub mod formatter;
/// Append-only call log with global sequence numbers
pub mod ledger;
/// Argument matchers
#[allow(clippy::missing_errors_doc, clippy::cast_precision_loss)]
pub mod matcher;
/// Live / stub-definition / verification routing
pub mod mode;
mod result;
/// Proptest strategies for mock values
#[cfg(any(test, feature = "proptest"))]
pub mod strategies;
/// Stub groups and actions
#[allow(clippy::cast_possible_wrap)]
pub mod stub;
/// Count and order assertions
#[allow(clippy::missing_errors_doc)]
pub mod verification;

pub use captor::ArgCaptor;
pub use config::MockConfig;
pub use engine::{
    captor, dispatch, enter_live, enter_stub_definition, enter_verification, inspect_engine,
    register_mock, reset, reset_calls, verify, verify_matching, when, when_matching, MockEngine, MockHandle,
    StubConfigurator,
};
pub use formatter::CallFormatter;
pub use ledger::{CallRecord, InvocationLedger, TargetId};
pub use matcher::{
    any_number, any_string, anything, between, not_null, object_containing, predicate, regex,
    strict_equal, validate, wrap_args, ArgMatcher, ArgMatcherList, IntoArgMatcher, Matcher,
};
pub use mode::{Mode, ModeController};
pub use result::{MockError, MockResult};
pub use serde_json::{json, Value};
pub use stub::{Action, StubGroup, StubHandle, StubRegistry};
pub use verification::{Verification, VerificationSpec};

/// Build an argument list from Rust expressions
///
/// ```rust,ignore
/// let args: Vec<Value> = args![1, "two", Some(3.5)];
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        ::std::vec![$($crate::json!($arg)),*]
    };
}

/// Build an [`ArgMatcherList`]; raw values are wrapped in `strictEqual`
///
/// ```rust,ignore
/// let matchers = matchers![any_number(), "id", not_null()];
/// ```
#[macro_export]
macro_rules! matchers {
    ($($m:expr),* $(,)?) => {
        ::std::vec![$($crate::IntoArgMatcher::into_arg_matcher($m)),*]
    };
}

/// Prelude for convenient imports
pub mod prelude {
    pub use super::captor::*;
    pub use super::config::*;
    pub use super::engine::*;
    pub use super::formatter::CallFormatter;
    pub use super::ledger::{CallRecord, TargetId};
    pub use super::matcher::*;
    pub use super::result::*;
    pub use super::verification::*;
    pub use super::{args, matchers};
    pub use serde_json::{json, Value};
}
