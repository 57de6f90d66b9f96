//! Mock Engine
//!
//! Entry points used by forwarding code (one forwarding method per mocked
//! method) and by tests. Every call on a mock goes through [`dispatch`], which
//! consults the mode controller and either records and resolves the call or
//! captures it as a stub definition or verification query.
//!
//! Engine state is thread-local: each test thread gets its own ledger, stubs
//! and mode. The call sequence counter is process-wide.
//!
//! ## Example
//!
//! ```rust,ignore
//! use probar_mock::prelude::*;
//!
//! struct FooMock(MockHandle);
//!
//! impl Foo for FooMock {
//!     fn convert_number_to_string(&self, n: i64) -> String {
//!         self.0.call("convertNumberToString", args![n])
//!     }
//! }
//!
//! let foo = FooMock(MockHandle::new("Foo"));
//! when(|| foo.convert_number_to_string(3)).then_return("three")?;
//! assert_eq!(foo.convert_number_to_string(3), "three");
//! verify(|| foo.convert_number_to_string(3)).once()?;
//! ```

use crate::captor::ArgCaptor;
use crate::config::MockConfig;
use crate::ledger::{CallRecord, InvocationLedger, TargetId};
use crate::matcher::{validate, wrap_args, ArgMatcherList};
use crate::mode::{Captured, Mode, ModeController};
use crate::result::{MockError, MockResult};
use crate::stub::{Action, Callback, Outcome, StubHandle, StubRegistry};
use crate::verification::{Verification, VerificationSpec};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use tracing::{debug, trace, warn};

thread_local! {
    static ENGINE: RefCell<MockEngine> = RefCell::new(MockEngine::default());
}

/// Run `f` with the current thread's engine
pub(crate) fn with_engine<R>(f: impl FnOnce(&mut MockEngine) -> R) -> R {
    ENGINE.with(|engine| f(&mut engine.borrow_mut()))
}

/// Like [`with_engine`], but skips `f` during thread teardown or re-entry
pub(crate) fn try_with_engine(f: impl FnOnce(&mut MockEngine)) {
    let _ = ENGINE.try_with(|engine| {
        if let Ok(mut engine) = engine.try_borrow_mut() {
            f(&mut engine);
        }
    });
}

/// Ledger, stubs and mode of one test thread
#[derive(Default)]
pub struct MockEngine {
    ledger: InvocationLedger,
    registry: StubRegistry,
    mode: ModeController,
    mocks: HashMap<TargetId, MockConfig>,
    real_impls: HashMap<(TargetId, String), Callback>,
    next_target: u64,
}

impl fmt::Debug for MockEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockEngine")
            .field("mocks", &self.mocks.len())
            .field("recorded_calls", &self.ledger.len())
            .field("mode", &self.mode.mode())
            .field("real_impls", &self.real_impls.len())
            .finish()
    }
}

/// Result of routing a call while the engine is borrowed
enum Routed {
    Captured,
    Live {
        record: CallRecord,
        candidates: Vec<(u64, ArgMatcherList)>,
    },
}

/// Value produced by a dispatched call
struct Answer {
    value: Value,
    /// No stub produced the value; it is the mock's default
    fallback: bool,
}

impl Answer {
    const fn stubbed(value: Value) -> Self {
        Self {
            value,
            fallback: false,
        }
    }

    const fn fallback(value: Value) -> Self {
        Self {
            value,
            fallback: true,
        }
    }
}

impl MockEngine {
    /// Invocation ledger
    #[must_use]
    pub const fn ledger(&self) -> &InvocationLedger {
        &self.ledger
    }

    /// Stub registry
    #[must_use]
    pub const fn registry(&self) -> &StubRegistry {
        &self.registry
    }

    pub(crate) fn mode_mut(&mut self) -> &mut ModeController {
        &mut self.mode
    }

    fn register(&mut self, config: MockConfig) -> TargetId {
        self.next_target += 1;
        let id = TargetId(self.next_target);
        debug!(target_id = id.0, name = config.name.as_str(), "Mock created");
        self.mocks.insert(id, config);
        id
    }

    fn default_value(&self, target: TargetId, method: &str) -> Value {
        self.mocks
            .get(&target)
            .map(|c| c.default_for(method).clone())
            .unwrap_or_default()
    }

    fn mock_name(&self, target: TargetId) -> String {
        self.mocks
            .get(&target)
            .map_or_else(|| target.to_string(), |c| c.name.clone())
    }

    fn route(&mut self, target: TargetId, method: &str, args: Vec<Value>) -> Routed {
        let mode = self.mode.route(target);
        let capture = match mode {
            Mode::Live => None,
            Mode::DefiningStub | Mode::Verifying => self.mode.begin_capture(),
        };

        match (mode, capture) {
            (Mode::DefiningStub, Some((ticket, matchers))) => {
                let matchers = matchers.unwrap_or_else(|| wrap_args(&args));
                let handle = self.registry.add_group(target, method, matchers);
                debug!(
                    target_id = target.0,
                    method,
                    group_index = handle.group_index,
                    "Stub definition captured"
                );
                self.mode.store(ticket, Captured::Stub(handle));
                Routed::Captured
            }
            (Mode::Verifying, Some((ticket, matchers))) => {
                let matchers = matchers.unwrap_or_else(|| wrap_args(&args));
                debug!(target_id = target.0, method, "Verification captured");
                let spec = VerificationSpec::new(target, method, matchers);
                self.mode.store(ticket, Captured::Verification(spec));
                Routed::Captured
            }
            _ => {
                let record = self.ledger.record(target, method, args);
                trace!(
                    target_id = target.0,
                    method,
                    sequence = record.sequence,
                    "Call recorded"
                );
                Routed::Live {
                    record,
                    candidates: self.registry.candidates(target, method),
                }
            }
        }
    }

    /// Fire the chosen group, if any, and look up the mock's default value
    fn settle(
        &mut self,
        target: TargetId,
        method: &str,
        group_index: Option<u64>,
    ) -> (Outcome, Value) {
        let fired = group_index.and_then(|index| self.registry.fire(target, method, index));
        if fired.is_none() && self.mocks.get(&target).is_some_and(|c| c.warn_unstubbed) {
            let mock = self.mock_name(target);
            warn!(mock = mock.as_str(), method, "No stub applies to call");
        }
        (
            fired.unwrap_or(Outcome::Default),
            self.default_value(target, method),
        )
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Read the current thread's engine, e.g. to inspect the ledger or registry
pub fn inspect_engine<R>(f: impl FnOnce(&MockEngine) -> R) -> R {
    with_engine(|engine| f(engine))
}

/// Register a mock and return its identity
pub fn register_mock(config: MockConfig) -> TargetId {
    with_engine(|engine| engine.register(config))
}

/// Route the next calls as real invocations, abandoning any armed capture
pub fn enter_live() {
    with_engine(|engine| engine.mode.enter_live());
}

/// Capture the next call on `target` (any mock when `None`) as a stub definition
///
/// Explicit `matchers` replace the captured call's own arguments.
pub fn enter_stub_definition(
    target: Option<TargetId>,
    matchers: Option<ArgMatcherList>,
) -> StubConfigurator {
    let ticket = with_engine(|engine| engine.mode.enter(Mode::DefiningStub, target, matchers));
    StubConfigurator::armed(ticket)
}

/// Capture the next call on `target` (any mock when `None`) as a verification
pub fn enter_verification(
    target: Option<TargetId>,
    matchers: Option<ArgMatcherList>,
) -> Verification {
    let ticket = with_engine(|engine| engine.mode.enter(Mode::Verifying, target, matchers));
    Verification::armed(ticket)
}

/// Handle one call on a mock
///
/// Live calls are recorded and answered by the applicable stub, or by the
/// mock's default value when none applies. Captured calls return `null`
/// without being recorded.
pub fn dispatch(target: TargetId, method: &str, args: Vec<Value>) -> MockResult<Value> {
    answer(target, method, args).map(|answer| answer.value)
}

/// Matchers and callbacks run while the engine is released, so they may use
/// mocks themselves.
fn answer(target: TargetId, method: &str, args: Vec<Value>) -> MockResult<Answer> {
    let routed = with_engine(|engine| engine.route(target, method, args));
    let Routed::Live { record, candidates } = routed else {
        return Ok(Answer::fallback(Value::Null));
    };
    let chosen = candidates
        .iter()
        .find(|(_, matchers)| validate(matchers, &record.args))
        .map(|(index, _)| *index);
    let (outcome, fallback) = with_engine(|engine| engine.settle(target, method, chosen));
    let args = record.args;

    match outcome {
        Outcome::Default => Ok(Answer::fallback(fallback)),
        Outcome::Return(value) => Ok(Answer::stubbed(value)),
        Outcome::Throw(message) => Err(MockError::thrown(message)),
        Outcome::Invoke(callback) => callback(&args).map(Answer::stubbed),
        Outcome::CallThrough => {
            let real = with_engine(|engine| {
                engine
                    .real_impls
                    .get(&(target, method.to_string()))
                    .cloned()
            });
            match real {
                Some(real) => real(&args).map(Answer::stubbed),
                None => {
                    warn!(
                        target_id = target.0,
                        method,
                        "No real implementation to call through to"
                    );
                    Ok(Answer::fallback(fallback))
                }
            }
        }
    }
}

/// Define a stub from the mock call made inside `call`
pub fn when<R>(call: impl FnOnce() -> R) -> StubConfigurator {
    let mut configurator = enter_stub_definition(None, None);
    let _ = call();
    configurator.bind();
    configurator
}

/// Define a stub for the method called inside `call`, matching with `matchers`
pub fn when_matching<R>(matchers: ArgMatcherList, call: impl FnOnce() -> R) -> StubConfigurator {
    let mut configurator = enter_stub_definition(None, Some(matchers));
    let _ = call();
    configurator.bind();
    configurator
}

/// Verify the mock call made inside `call`
pub fn verify<R>(call: impl FnOnce() -> R) -> Verification {
    let verification = enter_verification(None, None);
    let _ = call();
    verification.bind();
    verification
}

/// Verify the method called inside `call`, matching with `matchers`
pub fn verify_matching<R>(matchers: ArgMatcherList, call: impl FnOnce() -> R) -> Verification {
    let verification = enter_verification(None, Some(matchers));
    let _ = call();
    verification.bind();
    verification
}

/// Forget the stubs and calls of a mock
pub fn reset(target: TargetId) {
    with_engine(|engine| {
        engine.registry.clear(target);
        engine.ledger.reset_calls(target);
    });
}

/// Forget the calls of a mock, keeping its stubs
pub fn reset_calls(target: TargetId) {
    with_engine(|engine| engine.ledger.reset_calls(target));
}

/// Snapshot the arguments of every recorded call of a method
#[must_use]
pub fn captor(target: TargetId, method: &str) -> ArgCaptor {
    with_engine(|engine| {
        ArgCaptor::new(
            engine
                .ledger
                .query(target, method)
                .into_iter()
                .map(|r| r.args.clone())
                .collect(),
        )
    })
}

fn decode<R: DeserializeOwned + Default>(value: Value) -> MockResult<R> {
    if value.is_null() {
        return Ok(R::default());
    }
    Ok(serde_json::from_value(value)?)
}

fn callback<F, T>(f: F) -> Callback
where
    F: Fn(&[Value]) -> T + 'static,
    T: Serialize,
{
    Rc::new(move |args: &[Value]| -> MockResult<Value> { Ok(serde_json::to_value(f(args))?) })
}

// =============================================================================
// Stub configuration
// =============================================================================

/// Sets the action of a captured stub definition
///
/// Dropping an unused configurator abandons its capture.
#[derive(Debug)]
#[must_use = "a stub does nothing until an action is configured"]
pub struct StubConfigurator {
    ticket: Option<u64>,
    handle: Option<StubHandle>,
}

impl StubConfigurator {
    const fn armed(ticket: u64) -> Self {
        Self {
            ticket: Some(ticket),
            handle: None,
        }
    }

    const fn bound(handle: StubHandle) -> Self {
        Self {
            ticket: None,
            handle: Some(handle),
        }
    }

    fn bind(&mut self) {
        if self.handle.is_some() {
            return;
        }
        if let Some(ticket) = self.ticket {
            let captured = with_engine(|engine| engine.mode.take_pending(ticket));
            if let Some(Captured::Stub(handle)) = captured {
                self.handle = Some(handle);
            }
        }
    }

    fn configure(mut self, action: Action) -> MockResult<()> {
        self.bind();
        let handle = self.handle.take().ok_or(MockError::NothingCaptured {
            operation: "stubbing",
        })?;
        debug!(
            target_id = handle.target.0,
            method = handle.method.as_str(),
            group_index = handle.group_index,
            action = ?action,
            "Stub configured"
        );
        let applied = with_engine(|engine| engine.registry.set_action(&handle, action));
        if applied {
            Ok(())
        } else {
            Err(MockError::NothingCaptured {
                operation: "stubbing",
            })
        }
    }

    /// Return `value` from every matching call
    pub fn then_return<T: Serialize>(self, value: T) -> MockResult<()> {
        let value = serde_json::to_value(value)?;
        self.configure(Action::ReturnValue(value))
    }

    /// Return `values` one per matching call, then keep returning the last one
    pub fn then_return_sequence<I, T>(self, values: I) -> MockResult<()>
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        let values = values
            .into_iter()
            .map(serde_json::to_value)
            .collect::<Result<VecDeque<_>, _>>()?;
        self.configure(Action::ReturnSequence(values))
    }

    /// Fail every matching call with `message`
    pub fn then_throw(self, message: impl Into<String>) -> MockResult<()> {
        self.configure(Action::Throw(message.into()))
    }

    /// Answer every matching call with `f(args)`
    pub fn then_call<F, T>(self, f: F) -> MockResult<()>
    where
        F: Fn(&[Value]) -> T + 'static,
        T: Serialize,
    {
        self.configure(Action::Invoke(callback(f)))
    }

    /// Answer every matching call with the mock's real implementation
    pub fn then_call_through(self) -> MockResult<()> {
        self.configure(Action::CallThrough)
    }
}

impl Drop for StubConfigurator {
    fn drop(&mut self) {
        if let (Some(ticket), None) = (self.ticket, &self.handle) {
            try_with_engine(|engine| engine.mode.disarm(ticket));
        }
    }
}

// =============================================================================
// Mock handle
// =============================================================================

/// One mock instance, held by forwarding code
///
/// Engine state is per thread, so a handle stays on the thread that created
/// it:
///
/// ```compile_fail
/// fn assert_send<T: Send>() {}
/// assert_send::<probar_mock::MockHandle>();
/// ```
#[derive(Debug, Clone)]
pub struct MockHandle {
    id: TargetId,
    name: String,
    _thread_bound: PhantomData<Rc<()>>,
}

impl MockHandle {
    /// Create a mock of the named type with default config
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self::with_config(MockConfig::new(name))
    }

    /// Create a mock from a config
    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        let name = config.name.clone();
        let id = register_mock(config);
        Self {
            id,
            name,
            _thread_bound: PhantomData,
        }
    }

    /// Identity of this mock
    #[must_use]
    pub const fn id(&self) -> TargetId {
        self.id
    }

    /// Name of the mocked type
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Supply the real implementation used by `then_call_through`
    #[must_use]
    pub fn with_real_impl<F, T>(self, method: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> T + 'static,
        T: Serialize,
    {
        with_engine(|engine| {
            engine
                .real_impls
                .insert((self.id, method.to_string()), callback(f));
        });
        self
    }

    /// Route a call through the engine
    pub fn dispatch(&self, method: &str, args: Vec<Value>) -> MockResult<Value> {
        dispatch(self.id, method, args)
    }

    /// Route a call and decode its result; `null` decodes to `R::default()`
    ///
    /// A mock default value that does not fit `R` also yields `R::default()`.
    pub fn try_call<R: DeserializeOwned + Default>(
        &self,
        method: &str,
        args: Vec<Value>,
    ) -> MockResult<R> {
        let answer = answer(self.id, method, args)?;
        if answer.fallback {
            return Ok(decode(answer.value).unwrap_or_default());
        }
        decode(answer.value)
    }

    /// Route a call for a method that cannot fail
    ///
    /// # Panics
    ///
    /// Panics when the call's stub throws or its result does not decode as `R`,
    /// which is how an infallible mocked method surfaces `then_throw`.
    pub fn call<R: DeserializeOwned + Default>(&self, method: &str, args: Vec<Value>) -> R {
        match self.try_call(method, args) {
            Ok(value) => value,
            Err(e) => panic!("{}.{method}: {e}", self.name),
        }
    }

    /// Capture the next call on this mock as a stub definition
    pub fn when(&self) -> StubConfigurator {
        enter_stub_definition(Some(self.id), None)
    }

    /// Capture the next call on this mock as a stub definition with `matchers`
    pub fn when_matching(&self, matchers: ArgMatcherList) -> StubConfigurator {
        enter_stub_definition(Some(self.id), Some(matchers))
    }

    /// Define a stub by method name, without a capture call
    pub fn stub(&self, method: &str, matchers: ArgMatcherList) -> StubConfigurator {
        let handle = with_engine(|engine| engine.registry.add_group(self.id, method, matchers));
        StubConfigurator::bound(handle)
    }

    /// Capture the next call on this mock as a verification
    #[must_use]
    pub fn verify(&self) -> Verification {
        enter_verification(Some(self.id), None)
    }

    /// Verify a method by name, without a capture call
    #[must_use]
    pub fn verify_call(&self, method: &str, matchers: ArgMatcherList) -> Verification {
        Verification::from_spec(VerificationSpec::new(self.id, method, matchers))
    }

    /// Every call recorded on this mock, in order
    #[must_use]
    pub fn calls(&self) -> Vec<CallRecord> {
        with_engine(|engine| engine.ledger.calls_for(self.id).to_vec())
    }

    /// Arguments of every recorded call of `method`
    #[must_use]
    pub fn captor(&self, method: &str) -> ArgCaptor {
        captor(self.id, method)
    }

    /// Forget stubs and calls
    pub fn reset(&self) {
        reset(self.id);
    }

    /// Forget calls, keeping stubs
    pub fn reset_calls(&self) {
        reset_calls(self.id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::matcher::{any_number, anything, strict_equal};
    use serde_json::json;
    use std::cell::Cell;

    mod dispatch_tests {
        use super::*;

        #[test]
        fn test_unstubbed_call_returns_default_and_is_recorded() {
            let foo = MockHandle::new("Foo");
            assert_eq!(foo.dispatch("m", vec![json!(1)]).unwrap(), Value::Null);
            assert_eq!(foo.calls().len(), 1);
        }

        #[test]
        fn test_configured_default_value() {
            let foo = MockHandle::with_config(
                MockConfig::new("Foo")
                    .with_default_value(json!(0))
                    .with_warn_unstubbed(true),
            );
            assert_eq!(foo.dispatch("m", vec![]).unwrap(), json!(0));
        }

        #[test]
        fn test_captured_calls_return_null() {
            let foo = MockHandle::with_config(
                MockConfig::new("Foo").with_default_value(json!("unset")),
            );
            let mut captured = None;
            let _ = when(|| captured = Some(foo.dispatch("m", vec![]).unwrap()));
            assert_eq!(captured, Some(Value::Null));
            let count: i64 = foo.call("m", vec![]);
            assert_eq!(count, 0);
            assert_eq!(foo.dispatch("m", vec![]).unwrap(), json!("unset"));
        }

        #[test]
        fn test_matchers_run_outside_engine_borrow() {
            let foo = MockHandle::new("Foo");
            let seen = Rc::new(Cell::new(0));
            let counter = Rc::clone(&seen);
            let id = foo.id();
            let recorded = crate::matcher::predicate("recorded()", move |_| {
                counter.set(inspect_engine(|engine| engine.ledger().calls_for(id).len()));
                true
            });
            foo.stub("m", vec![recorded]).then_return(1).unwrap();
            assert_eq!(foo.dispatch("m", vec![json!(0)]).unwrap(), json!(1));
            assert_eq!(seen.get(), 1);
        }

        #[test]
        fn test_stubbed_call_is_recorded_too() {
            let foo = MockHandle::new("Foo");
            foo.stub("m", vec![anything()]).then_return(1).unwrap();
            assert_eq!(foo.dispatch("m", vec![json!(9)]).unwrap(), json!(1));
            assert_eq!(foo.calls().len(), 1);
        }

        #[test]
        fn test_captured_calls_are_not_recorded() {
            let foo = MockHandle::new("Foo");
            let _ = when(|| foo.dispatch("m", vec![json!(1)]));
            let _ = verify(|| foo.dispatch("m", vec![json!(1)]));
            assert!(foo.calls().is_empty());
        }
    }

    mod stubbing_tests {
        use super::*;

        #[test]
        fn test_when_then_return() {
            let foo = MockHandle::new("Foo");
            when(|| foo.dispatch("m", vec![json!(3)]))
                .then_return("three")
                .unwrap();
            assert_eq!(foo.dispatch("m", vec![json!(3)]).unwrap(), json!("three"));
            assert_eq!(foo.dispatch("m", vec![json!(4)]).unwrap(), Value::Null);
        }

        #[test]
        fn test_restub_last_registered_wins() {
            let foo = MockHandle::new("Foo");
            when(|| foo.dispatch("m", vec![json!(3)]))
                .then_return(1)
                .unwrap();
            assert_eq!(foo.dispatch("m", vec![json!(3)]).unwrap(), json!(1));
            when(|| foo.dispatch("m", vec![json!(3)]))
                .then_return(2)
                .unwrap();
            assert_eq!(foo.dispatch("m", vec![json!(3)]).unwrap(), json!(2));
        }

        #[test]
        fn test_when_matching() {
            let foo = MockHandle::new("Foo");
            when_matching(vec![any_number()], || foo.dispatch("m", vec![json!(0)]))
                .then_return("num")
                .unwrap();
            assert_eq!(foo.dispatch("m", vec![json!(42)]).unwrap(), json!("num"));
            assert_eq!(foo.dispatch("m", vec![json!("x")]).unwrap(), Value::Null);
        }

        #[test]
        fn test_then_return_sequence() {
            let foo = MockHandle::new("Foo");
            foo.stub("next", vec![])
                .then_return_sequence([1, 2, 3])
                .unwrap();
            let values: Vec<i64> = (0..5).map(|_| foo.call("next", vec![])).collect();
            assert_eq!(values, vec![1, 2, 3, 3, 3]);
        }

        #[test]
        fn test_then_throw() {
            let foo = MockHandle::new("Foo");
            foo.stub("m", vec![]).then_throw("boom").unwrap();
            let err = foo.dispatch("m", vec![]).unwrap_err();
            assert!(matches!(err, MockError::Thrown { ref message } if message == "boom"));
            assert_eq!(foo.calls().len(), 1);
        }

        #[test]
        #[should_panic(expected = "Foo.m: boom")]
        fn test_call_panics_on_throw() {
            let foo = MockHandle::new("Foo");
            foo.stub("m", vec![]).then_throw("boom").unwrap();
            let _: i64 = foo.call("m", vec![]);
        }

        #[test]
        fn test_then_call_receives_args() {
            let foo = MockHandle::new("Foo");
            foo.stub("add", vec![anything(), anything()])
                .then_call(|args| args[0].as_i64().unwrap_or(0) + args[1].as_i64().unwrap_or(0))
                .unwrap();
            let sum: i64 = foo.call("add", vec![json!(2), json!(3)]);
            assert_eq!(sum, 5);
        }

        #[test]
        fn test_callback_may_call_other_mocks() {
            let foo = MockHandle::new("Foo");
            let bar = MockHandle::new("Bar");
            bar.stub("inner", vec![]).then_return(7).unwrap();
            let inner = bar.clone();
            foo.stub("outer", vec![])
                .then_call(move |_| inner.call::<i64>("inner", vec![]) * 2)
                .unwrap();
            assert_eq!(foo.call::<i64>("outer", vec![]), 14);
            assert_eq!(bar.calls().len(), 1);
        }

        #[test]
        fn test_call_through() {
            let hits = Rc::new(Cell::new(0));
            let counter = Rc::clone(&hits);
            let foo = MockHandle::new("Foo").with_real_impl("m", move |args| {
                counter.set(counter.get() + 1);
                format!("real {}", args[0])
            });
            foo.stub("m", vec![anything()]).then_call_through().unwrap();
            let out: String = foo.call("m", vec![json!(1)]);
            assert_eq!(out, "real 1");
            assert_eq!(hits.get(), 1);
        }

        #[test]
        fn test_call_through_without_real_impl_returns_default() {
            let foo = MockHandle::new("Foo");
            foo.stub("m", vec![]).then_call_through().unwrap();
            assert_eq!(foo.dispatch("m", vec![]).unwrap(), Value::Null);
        }

        #[test]
        fn test_unconfigured_capture_behaves_as_default() {
            let foo = MockHandle::new("Foo");
            foo.stub("m", vec![]).then_return(1).unwrap();
            drop(when(|| foo.dispatch("m", vec![])));
            assert_eq!(foo.dispatch("m", vec![]).unwrap(), Value::Null);
        }
    }

    mod mode_tests {
        use super::*;

        #[test]
        fn test_nothing_captured() {
            let err = when(|| 1).then_return(1).unwrap_err();
            assert!(matches!(err, MockError::NothingCaptured { .. }));
        }

        #[test]
        fn test_capture_never_leaks() {
            let foo = MockHandle::new("Foo");
            let _ = when(|| ()).then_return(1);
            foo.dispatch("m", vec![]).unwrap();
            assert_eq!(foo.calls().len(), 1);
        }

        #[test]
        fn test_dropped_configurator_disarms() {
            let foo = MockHandle::new("Foo");
            drop(foo.when());
            foo.dispatch("m", vec![]).unwrap();
            assert_eq!(foo.calls().len(), 1);
        }

        #[test]
        fn test_handle_when_captures_only_its_target() {
            let foo = MockHandle::new("Foo");
            let bar = MockHandle::new("Bar");

            let stub = foo.when();
            bar.dispatch("m", vec![json!(1)]).unwrap();
            foo.dispatch("m", vec![json!(1)]).unwrap();
            stub.then_return("foo").unwrap();

            assert_eq!(bar.calls().len(), 1);
            assert!(foo.calls().is_empty());
            assert_eq!(foo.dispatch("m", vec![json!(1)]).unwrap(), json!("foo"));
            assert_eq!(bar.dispatch("m", vec![json!(1)]).unwrap(), Value::Null);
        }

        #[test]
        fn test_handle_verify_enter_first() {
            let foo = MockHandle::new("Foo");
            foo.dispatch("m", vec![json!(1)]).unwrap();

            let verification = foo.verify();
            foo.dispatch("m", vec![json!(1)]).unwrap();
            verification.once().unwrap();
        }

        #[test]
        fn test_enter_live_abandons_capture() {
            let foo = MockHandle::new("Foo");
            let stub = foo.when();
            enter_live();
            foo.dispatch("m", vec![]).unwrap();
            assert_eq!(foo.calls().len(), 1);
            assert!(stub.then_return(1).is_err());
        }
    }

    mod reset_tests {
        use super::*;

        #[test]
        fn test_reset_calls_keeps_stubs() {
            let foo = MockHandle::new("Foo");
            foo.stub("m", vec![]).then_return(1).unwrap();
            foo.dispatch("m", vec![]).unwrap();
            foo.reset_calls();
            assert!(foo.calls().is_empty());
            assert_eq!(foo.dispatch("m", vec![]).unwrap(), json!(1));
        }

        #[test]
        fn test_reset_clears_stubs() {
            let foo = MockHandle::new("Foo");
            foo.stub("m", vec![]).then_return(1).unwrap();
            foo.dispatch("m", vec![]).unwrap();
            foo.reset();
            assert!(foo.calls().is_empty());
            assert_eq!(foo.dispatch("m", vec![]).unwrap(), Value::Null);
        }

        #[test]
        fn test_reset_is_per_mock() {
            let foo = MockHandle::new("Foo");
            let bar = MockHandle::new("Bar");
            foo.dispatch("m", vec![]).unwrap();
            bar.dispatch("m", vec![]).unwrap();
            foo.reset();
            assert_eq!(bar.calls().len(), 1);
        }
    }

    #[test]
    fn test_captor_snapshots_args() {
        let foo = MockHandle::new("Foo");
        foo.dispatch("m", vec![json!(1)]).unwrap();
        foo.dispatch("m", vec![json!(2)]).unwrap();
        let captor = foo.captor("m");
        assert_eq!(captor.len(), 2);
        assert_eq!(captor.last().unwrap(), &[json!(2)]);
    }

    #[test]
    fn test_inspect_engine() {
        let foo = MockHandle::new("Foo");
        foo.stub("m", vec![strict_equal(1)]).then_return(1).unwrap();
        foo.dispatch("m", vec![json!(1)]).unwrap();

        inspect_engine(|engine| {
            assert_eq!(engine.ledger().calls_for(foo.id()).len(), 1);
            assert_eq!(engine.registry().group_count(foo.id(), "m"), 1);
            assert!(engine.registry().get_last_matching_group_index(foo.id(), "m", &[json!(1)]) >= 0);
        });
    }

    #[test]
    fn test_verify_call_by_name() {
        let foo = MockHandle::new("Foo");
        foo.dispatch("m", vec![json!(1)]).unwrap();
        foo.verify_call("m", vec![strict_equal(1)]).once().unwrap();
        foo.verify_call("m", vec![]).never().unwrap();
    }
}
