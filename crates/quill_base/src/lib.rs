//! # quill-base
//!
//! Structural atoms shared by every stage of the quill compiler:
//!
//! - [`Interner`]/[`Symbol`] — string interning for O(1) name equality
//! - [`Span`] — byte-offset source location tracking
//! - [`SpannedError`] — errors annotated with a source location
//! - [`Style`] — ANSI styling for rendered diagnostics
//!
//! This crate knows nothing about the quill language itself. It provides
//! only generic infrastructure that the syntax and compile crates build on.

pub mod error;
pub mod intern;
pub mod span;
pub mod style;

pub use error::{Result, SpannedError};
pub use intern::{Interner, Symbol};
pub use span::Span;
pub use style::Style;
