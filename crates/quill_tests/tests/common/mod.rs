//! Shared helpers for the integration suite.

#![allow(dead_code)]

use quill_compile::{interpret_source, RuntimeValue};

/// Runs a program and returns its result value, panicking with the
/// rendered diagnostics on failure.
pub fn run(source: &str) -> RuntimeValue {
    interpret_source(source)
        .unwrap_or_else(|e| panic!("program failed: {}\nsource:\n{}", e, source))
        .0
}

/// Runs a program and returns what `print` emitted.
pub fn output(source: &str) -> Vec<String> {
    interpret_source(source)
        .unwrap_or_else(|e| panic!("program failed: {}\nsource:\n{}", e, source))
        .1
}

pub fn expect_int(source: &str, expected: i64) {
    match run(source) {
        RuntimeValue::Int(v) => assert_eq!(v, expected, "source:\n{}", source),
        other => panic!("expected int {}, got {:?}", expected, other),
    }
}

pub fn expect_float(source: &str, expected: f64) {
    match run(source) {
        RuntimeValue::Float(v) => {
            assert!(
                (v - expected).abs() < 1e-6,
                "expected float ≈ {}, got {}",
                expected,
                v
            );
        }
        other => panic!("expected float {}, got {:?}", expected, other),
    }
}

pub fn expect_bool(source: &str, expected: bool) {
    match run(source) {
        RuntimeValue::Bool(v) => assert_eq!(v, expected, "source:\n{}", source),
        other => panic!("expected bool {}, got {:?}", expected, other),
    }
}
