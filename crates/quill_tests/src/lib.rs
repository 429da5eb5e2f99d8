//! Integration test suite for the quill compiler.
//!
//! This crate exists only to run the tests in `tests/`. Coverage is
//! organized by area:
//!
//! | File | Topic |
//! |------|-------|
//! | `e2e_arithmetic` | literal/operator evaluation, increments |
//! | `e2e_control_flow` | if/while/for, arrays, scopes |
//! | `e2e_functions` | calls, recursion, overloads, `print` |
//! | `e2e_composites` | user types, member access, defaults |
//! | `e2e_modules` | dependency waves, interface files |
//! | `properties` | round-trip, idempotence, folding laws |
//!
//! Run with `cargo test -p quill-tests`.
