//! Uniform rendering of compile-time and runtime diagnostics.
//!
//! Wraps the per-error caret renderers with a `file:line:column` header
//! so the CLI prints every failure the same way.

use crate::compile::CompileError;
use crate::interpreter::RuntimeError;
use quill_base::{error, Style};
use std::path::Path;

pub fn report_compile_error(error: &CompileError) -> String {
    match error {
        CompileError::Module(module_error) => {
            format!("{}: {}", Style::bold_red("error"), module_error)
        }
        CompileError::Syntax {
            path,
            source,
            errors,
        } => errors
            .iter()
            .map(|e| {
                format!(
                    "{}\n{}",
                    location_header(path, source, e.span),
                    e.display_with_source(source)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

pub fn report_runtime_error(path: &Path, source: &str, error: &RuntimeError) -> String {
    format!(
        "{}\n{}",
        location_header(path, source, error.span),
        error.display_with_source(source)
    )
}

fn location_header(path: &Path, source: &str, span: quill_base::Span) -> String {
    let (line, column) = error::line_column(source, span);
    Style::blue(&format!("--> {}:{}:{}", path.display(), line, column))
}
