//! Argument Matchers
//!
//! Value predicates shared by stubbing and verification. Every argument slot of
//! a stubbed or verified call is described by one [`ArgMatcher`]; raw values are
//! wrapped in [`StrictEqualMatcher`].
//!
//! Matching is exact-arity: a matcher list only validates an argument list of
//! the same length, so omitted trailing arguments never match a longer list.

use crate::result::{MockError, MockResult};
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::rc::Rc;

/// A predicate over a single argument value
pub trait Matcher: fmt::Debug {
    /// Check whether `value` satisfies this matcher
    fn matches(&self, value: &Value) -> bool;

    /// Short human-readable form used in diagnostics
    fn describe(&self) -> String;
}

/// Shared handle to a matcher for one argument slot
#[derive(Clone)]
pub struct ArgMatcher(Rc<dyn Matcher>);

impl ArgMatcher {
    /// Wrap any matcher
    pub fn new<M: Matcher + 'static>(matcher: M) -> Self {
        Self(Rc::new(matcher))
    }

    /// Check whether `value` satisfies this matcher
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        self.0.matches(value)
    }

    /// Diagnostic form of this matcher
    #[must_use]
    pub fn describe(&self) -> String {
        self.0.describe()
    }
}

impl fmt::Debug for ArgMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for ArgMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Positional matchers, one per argument slot
pub type ArgMatcherList = Vec<ArgMatcher>;

/// Conversion into an [`ArgMatcher`]; raw values become `strictEqual`
pub trait IntoArgMatcher {
    /// Perform the conversion
    fn into_arg_matcher(self) -> ArgMatcher;
}

impl IntoArgMatcher for ArgMatcher {
    fn into_arg_matcher(self) -> ArgMatcher {
        self
    }
}

impl IntoArgMatcher for Value {
    fn into_arg_matcher(self) -> ArgMatcher {
        strict_equal(self)
    }
}

impl IntoArgMatcher for &Value {
    fn into_arg_matcher(self) -> ArgMatcher {
        strict_equal(self.clone())
    }
}

macro_rules! raw_into_arg_matcher {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoArgMatcher for $ty {
                fn into_arg_matcher(self) -> ArgMatcher {
                    strict_equal(Value::from(self))
                }
            }
        )*
    };
}

raw_into_arg_matcher!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, &str, String);

/// Wrap raw values as matchers (`strictEqual`) in a single argument list
#[must_use]
pub fn wrap_args(args: &[Value]) -> ArgMatcherList {
    args.iter().map(IntoArgMatcher::into_arg_matcher).collect()
}

/// Check a matcher list against an argument list
///
/// True iff both have the same length and every matcher accepts the argument
/// at its position.
#[must_use]
pub fn validate(matchers: &[ArgMatcher], args: &[Value]) -> bool {
    matchers.len() == args.len() && matchers.iter().zip(args).all(|(m, a)| m.matches(a))
}

/// Structural equality with numbers compared by value
#[allow(clippy::float_cmp)]
fn strictly_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_f64() || y.is_f64() => {
            x.as_f64() == y.as_f64()
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| strictly_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, v)| y.get(key).is_some_and(|w| strictly_equal(v, w)))
        }
        _ => a == b,
    }
}

// =============================================================================
// Built-in matchers
// =============================================================================

/// Equality without coercion
///
/// Numbers compare by value, so `5` equals `5.0`; values of different JSON
/// types never match.
#[derive(Debug, Clone)]
pub struct StrictEqualMatcher {
    expected: Value,
}

impl Matcher for StrictEqualMatcher {
    fn matches(&self, value: &Value) -> bool {
        strictly_equal(value, &self.expected)
    }

    fn describe(&self) -> String {
        format!("strictEqual({})", self.expected)
    }
}

/// Anything except `null`
#[derive(Debug, Clone, Copy)]
pub struct NotNullMatcher;

impl Matcher for NotNullMatcher {
    fn matches(&self, value: &Value) -> bool {
        !value.is_null()
    }

    fn describe(&self) -> String {
        "notNull()".to_string()
    }
}

/// Always matches
#[derive(Debug, Clone, Copy)]
pub struct AnyMatcher;

impl Matcher for AnyMatcher {
    fn matches(&self, _value: &Value) -> bool {
        true
    }

    fn describe(&self) -> String {
        "anything()".to_string()
    }
}

/// Delegates to a caller-supplied function
pub struct PredicateMatcher {
    label: String,
    predicate: Box<dyn Fn(&Value) -> bool>,
}

impl fmt::Debug for PredicateMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateMatcher")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl Matcher for PredicateMatcher {
    fn matches(&self, value: &Value) -> bool {
        (self.predicate)(value)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// Any JSON number
#[derive(Debug, Clone, Copy)]
pub struct AnyNumberMatcher;

impl Matcher for AnyNumberMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.is_number()
    }

    fn describe(&self) -> String {
        "anyNumber()".to_string()
    }
}

/// Any JSON string
#[derive(Debug, Clone, Copy)]
pub struct AnyStringMatcher;

impl Matcher for AnyStringMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.is_string()
    }

    fn describe(&self) -> String {
        "anyString()".to_string()
    }
}

/// Number within an inclusive range
#[derive(Debug, Clone, Copy)]
pub struct BetweenMatcher {
    min: f64,
    max: f64,
}

impl Matcher for BetweenMatcher {
    fn matches(&self, value: &Value) -> bool {
        value
            .as_f64()
            .is_some_and(|v| v >= self.min && v <= self.max)
    }

    fn describe(&self) -> String {
        format!("between({}, {})", self.min, self.max)
    }
}

/// String matching a regular expression
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
}

impl Matcher for RegexMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| self.regex.is_match(s))
    }

    fn describe(&self) -> String {
        format!("match(/{}/)", self.regex.as_str())
    }
}

/// Object containing at least the expected entries
#[derive(Debug, Clone)]
pub struct ObjectContainingMatcher {
    expected: Map<String, Value>,
}

impl Matcher for ObjectContainingMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.as_object().is_some_and(|actual| {
            self.expected
                .iter()
                .all(|(key, expected)| actual.get(key).is_some_and(|v| strictly_equal(v, expected)))
        })
    }

    fn describe(&self) -> String {
        format!("objectContaining({})", Value::Object(self.expected.clone()))
    }
}

/// `strictEqual(expected)`
pub fn strict_equal(expected: impl Into<Value>) -> ArgMatcher {
    ArgMatcher::new(StrictEqualMatcher {
        expected: expected.into(),
    })
}

/// `notNull()`
#[must_use]
pub fn not_null() -> ArgMatcher {
    ArgMatcher::new(NotNullMatcher)
}

/// `anything()`
#[must_use]
pub fn anything() -> ArgMatcher {
    ArgMatcher::new(AnyMatcher)
}

/// Custom predicate, described as `label` in diagnostics
///
/// Predicates run while the engine is released, so they may call mocks.
pub fn predicate<F>(label: &str, predicate: F) -> ArgMatcher
where
    F: Fn(&Value) -> bool + 'static,
{
    ArgMatcher::new(PredicateMatcher {
        label: label.to_string(),
        predicate: Box::new(predicate),
    })
}

/// `anyNumber()`
#[must_use]
pub fn any_number() -> ArgMatcher {
    ArgMatcher::new(AnyNumberMatcher)
}

/// `anyString()`
#[must_use]
pub fn any_string() -> ArgMatcher {
    ArgMatcher::new(AnyStringMatcher)
}

/// `between(min, max)`, inclusive on both ends
#[must_use]
pub fn between(min: f64, max: f64) -> ArgMatcher {
    ArgMatcher::new(BetweenMatcher { min, max })
}

/// `match(/pattern/)`
pub fn regex(pattern: &str) -> MockResult<ArgMatcher> {
    let regex = Regex::new(pattern).map_err(|e| MockError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    Ok(ArgMatcher::new(RegexMatcher { regex }))
}

/// `objectContaining(expected)`; a non-object `expected` is a config error
pub fn object_containing(expected: Value) -> MockResult<ArgMatcher> {
    match expected {
        Value::Object(expected) => Ok(ArgMatcher::new(ObjectContainingMatcher { expected })),
        other => Err(MockError::config(format!(
            "objectContaining expects an object, got {other}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    mod strict_equal_tests {
        use super::*;

        #[test]
        fn test_string_never_matches_number() {
            assert!(!strict_equal("5").matches(&json!(5)));
            assert!(!strict_equal(5).matches(&json!("5")));
        }

        #[test]
        fn test_integer_matches_equal_float() {
            assert!(strict_equal(5).matches(&json!(5.0)));
            assert!(strict_equal(5.0).matches(&json!(5)));
            assert!(!strict_equal(5).matches(&json!(5.5)));
            assert!(strict_equal(json!([1, {"a": 2}])).matches(&json!([1.0, {"a": 2.0}])));
        }

        #[test]
        fn test_false_never_matches_zero() {
            assert!(!strict_equal(false).matches(&json!(0)));
        }

        #[test]
        fn test_true_never_matches_one() {
            assert!(!strict_equal(true).matches(&json!(1)));
        }

        #[test]
        fn test_same_strings_match() {
            assert!(strict_equal("5").matches(&json!("5")));
        }

        #[test]
        fn test_describe() {
            assert_eq!(strict_equal(5).describe(), "strictEqual(5)");
            assert_eq!(strict_equal("a").describe(), "strictEqual(\"a\")");
        }
    }

    mod not_null_tests {
        use super::*;

        #[test]
        fn test_null_does_not_match() {
            assert!(!not_null().matches(&Value::Null));
        }

        #[test]
        fn test_falsy_values_match() {
            let m = not_null();
            assert!(m.matches(&json!(false)));
            assert!(m.matches(&json!(0)));
            assert!(m.matches(&json!({})));
            assert!(m.matches(&json!("sampleString")));
        }

        #[test]
        fn test_describe() {
            assert_eq!(not_null().describe(), "notNull()");
        }
    }

    mod builtin_tests {
        use super::*;

        #[test]
        fn test_anything() {
            assert!(anything().matches(&Value::Null));
            assert!(anything().matches(&json!([1, 2])));
            assert_eq!(anything().describe(), "anything()");
        }

        #[test]
        fn test_predicate() {
            let even = predicate("even()", |v| v.as_i64().is_some_and(|n| n % 2 == 0));
            assert!(even.matches(&json!(4)));
            assert!(!even.matches(&json!(3)));
            assert!(!even.matches(&json!("4")));
            assert_eq!(even.describe(), "even()");
        }

        #[test]
        fn test_any_number_and_string() {
            assert!(any_number().matches(&json!(1.5)));
            assert!(!any_number().matches(&json!("1.5")));
            assert!(any_string().matches(&json!("")));
            assert!(!any_string().matches(&Value::Null));
        }

        #[test]
        fn test_between_inclusive() {
            let m = between(1.0, 5.0);
            assert!(m.matches(&json!(1)));
            assert!(m.matches(&json!(5)));
            assert!(!m.matches(&json!(5.5)));
            assert!(!m.matches(&json!("3")));
            assert_eq!(m.describe(), "between(1, 5)");
        }

        #[test]
        fn test_regex() {
            let m = regex("^id-[0-9]+$").unwrap();
            assert!(m.matches(&json!("id-42")));
            assert!(!m.matches(&json!("id-x")));
            assert!(!m.matches(&json!(42)));
            assert_eq!(m.describe(), "match(/^id-[0-9]+$/)");
        }

        #[test]
        fn test_regex_invalid_pattern() {
            assert!(matches!(
                regex("(unclosed"),
                Err(MockError::InvalidPattern { .. })
            ));
        }

        #[test]
        fn test_object_containing() {
            let m = object_containing(json!({"a": 1})).unwrap();
            assert!(m.matches(&json!({"a": 1, "b": 2})));
            assert!(!m.matches(&json!({"a": 2})));
            assert!(!m.matches(&json!([1])));
            assert_eq!(m.describe(), "objectContaining({\"a\":1})");
            assert!(object_containing(json!(1)).is_err());
        }
    }

    mod validate_tests {
        use super::*;

        #[test]
        fn test_all_positions_must_match() {
            let m = vec![strict_equal(10), strict_equal(20)];
            assert!(validate(&m, &[json!(10), json!(20)]));
            assert!(!validate(&m, &[json!(30), json!(20)]));
            assert!(!validate(&m, &[json!(10), json!(30)]));
            assert!(!validate(&m, &[json!(30), json!(40)]));
        }

        #[test]
        fn test_arity_must_be_equal() {
            let m = vec![strict_equal(5)];
            assert!(!validate(&m, &[json!(5), json!(6)]));
            assert!(!validate(&[strict_equal(5), anything()], &[json!(5)]));
            assert!(validate(&[], &[]));
        }

        #[test]
        fn test_wrap_args() {
            let m = wrap_args(&[json!(3), json!("x")]);
            assert_eq!(m.len(), 2);
            assert_eq!(m[0].describe(), "strictEqual(3)");
            assert_eq!(m[1].describe(), "strictEqual(\"x\")");
        }

        #[test]
        fn test_raw_values_wrap_as_strict_equal() {
            assert_eq!(7_i32.into_arg_matcher().describe(), "strictEqual(7)");
            assert_eq!("q".into_arg_matcher().describe(), "strictEqual(\"q\")");
            assert_eq!(not_null().into_arg_matcher().describe(), "notNull()");
        }
    }
}
