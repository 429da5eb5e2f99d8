//! The seam between the front-end and external code generators.
//!
//! Emitters (LLVM-style IR, WebAssembly text) live outside this
//! workspace; they are pure consumers of the final typed AST. A backend
//! receives the tree together with the registry and interner it was
//! built against, and produces whatever artifact it likes.

use quill_base::Interner;
use quill_syntax::ast::Ast;
use quill_syntax::types::TypeRegistry;

pub trait Backend {
    type Output;

    fn emit(&mut self, ast: &Ast, registry: &TypeRegistry, interner: &Interner) -> Self::Output;
}

/// Hands a finished unit to an emitter.
pub fn emit_for_backend<B: Backend>(
    backend: &mut B,
    ast: &Ast,
    registry: &TypeRegistry,
    interner: &Interner,
) -> B::Output {
    backend.emit(ast, registry, interner)
}
