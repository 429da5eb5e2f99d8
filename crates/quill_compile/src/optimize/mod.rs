//! AST optimization passes.

mod fold;

pub use fold::optimize;
