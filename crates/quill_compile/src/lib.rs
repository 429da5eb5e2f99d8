//! # quill-compile
//!
//! The back half of the quill pipeline: everything after the typed AST.
//!
//! ```text
//!                 ┌───────────────┐
//! typed AST ────▶ │   optimizer   │ ──▶ folded AST ──┬──▶ Interpreter
//!                 └───────────────┘                  └──▶ Backend (external)
//!
//! imports ──▶ DependencyTree ──▶ waves ──▶ Compiler ──▶ ModuleInterface files
//! ```
//!
//! - [`compile::Compiler`] — per-job pipeline (lex → parse → fold),
//!   single-file and whole-project entry points
//! - [`optimize`] — constant folding and wrapper collapsing
//! - [`interpreter::Interpreter`] — tree-walking evaluation
//! - [`module`] — dependency waves and persisted interfaces
//! - [`backend::Backend`] — the seam external emitters plug into
//! - [`diagnostic`] — uniform error rendering for the CLI

pub mod backend;
pub mod compile;
pub mod diagnostic;
pub mod interpreter;
pub mod module;
pub mod optimize;

pub use backend::{emit_for_backend, Backend};
pub use compile::{CompileError, CompileOptions, CompileOutput, Compiler};
pub use interpreter::{interpret_source, Interpreter, RuntimeError, RuntimeErrorKind, RuntimeValue};
pub use module::{DependencyTree, FunctionSig, ModuleError, ModuleInterface};
pub use optimize::optimize;
