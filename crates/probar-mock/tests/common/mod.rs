//! Hand-written forwarding mocks shared by the integration tests

#![allow(dead_code)]

use probar_mock::prelude::*;

/// Install a test-writer subscriber once per test binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub trait Foo {
    fn convert_number_to_string(&self, value: i64) -> String;
    fn get_string_by_id(&self, id: i64) -> String;
    fn sample_method_with_two_optional_arguments(&self, a: Option<i64>, b: Option<i64>) -> i64;
}

pub trait Bar {
    fn different_convert_number_to_string(&self, value: i64) -> String;
}

#[derive(Debug, Clone)]
pub struct FooMock {
    pub handle: MockHandle,
}

impl FooMock {
    pub fn new() -> Self {
        Self {
            handle: MockHandle::new("Foo"),
        }
    }

    pub fn with_config(config: MockConfig) -> Self {
        Self {
            handle: MockHandle::with_config(config),
        }
    }
}

impl Foo for FooMock {
    fn convert_number_to_string(&self, value: i64) -> String {
        self.handle.call("convertNumberToString", args![value])
    }

    fn get_string_by_id(&self, id: i64) -> String {
        self.handle.call("getStringById", args![id])
    }

    // Omitted trailing arguments are not forwarded
    fn sample_method_with_two_optional_arguments(&self, a: Option<i64>, b: Option<i64>) -> i64 {
        let mut forwarded: Vec<Value> = Vec::new();
        if let Some(a) = a {
            forwarded.push(json!(a));
            if let Some(b) = b {
                forwarded.push(json!(b));
            }
        }
        self.handle
            .call("sampleMethodWithTwoOptionalArguments", forwarded)
    }
}

#[derive(Debug, Clone)]
pub struct BarMock {
    pub handle: MockHandle,
}

impl BarMock {
    pub fn new() -> Self {
        Self {
            handle: MockHandle::new("Bar"),
        }
    }
}

impl Bar for BarMock {
    fn different_convert_number_to_string(&self, value: i64) -> String {
        self.handle.call("differentConvertNumberToString", args![value])
    }
}
