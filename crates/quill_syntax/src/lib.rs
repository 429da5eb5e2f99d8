//! # quill-syntax
//!
//! The front half of the quill compiler: source text in, typed AST out.
//!
//! ```text
//! source ──▶ Lexer ──▶ [Token] ──▶ Parser ──▶ Ast (typed)
//!                                    │
//!                       ScopeStack ──┤── TypeRegistry
//! ```
//!
//! - [`lexer::Lexer`] — streaming tokenizer with exact-span lexemes
//! - [`types::TypeRegistry`] — primitives, interned derived types, user
//!   composites
//! - [`scope::ScopeStack`] — variable/overload-set/type-name resolution
//! - [`ast::Ast`] — arena-backed unified node tree
//! - [`parser::Parser`] — recursive descent with precedence climbing and
//!   bottom-up type inference
//! - [`dump`] — token and tree dumps for the CLI's `--tokens`/`--ast`
//!
//! Everything is an explicit value; no global state. A compilation job
//! owns one `Interner` and one `TypeRegistry` and threads them through.

pub mod ast;
pub mod dump;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod token;
pub mod types;

pub use ast::{Ast, FunctionFlags, Node, NodeId, NodeKind, UnaryFixity, Value};
pub use error::{SyntaxError, SyntaxErrorKind};
pub use lexer::Lexer;
pub use parser::{ParseResult, Parser};
pub use scope::{FunctionEntry, ScopeStack, VariableEntry};
pub use token::{Token, TokenKind};
pub use types::{Member, Primitive, TypeId, TypeKind, TypeRecord, TypeRegistry};
