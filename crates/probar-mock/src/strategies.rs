//! Proptest Strategies for Mock Values
//!
//! Strategies that generate argument values and call scripts for
//! property-based tests of stubbing and verification.
//!
//! ```rust,ignore
//! proptest! {
//!     #[test]
//!     fn prop_strict_equal_reflexive(a in any_scalar()) {
//!         prop_assert!(strict_equal(a.clone()).matches(&a));
//!     }
//! }
//! ```

use proptest::prelude::*;
use serde_json::{json, Value};

/// Generate a scalar argument value (null, bool, integer, float or string)
pub fn any_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        (-1.0e6f64..1.0e6).prop_map(|f| json!(f)),
        "[a-z0-9]{0,8}".prop_map(Value::String),
    ]
}

/// Generate a scalar or a small array/object of scalars
pub fn any_value() -> impl Strategy<Value = Value> {
    any_scalar().prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Generate an argument list of up to `max_len` values
pub fn any_args(max_len: usize) -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(any_scalar(), 0..=max_len)
}

/// Generate a call script: (mock index below `mocks`, method name) pairs
pub fn call_script(mocks: usize) -> impl Strategy<Value = Vec<(usize, String)>> {
    prop::collection::vec((0..mocks, "[a-c]"), 0..24)
}
