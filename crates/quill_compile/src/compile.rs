//! The compilation pipeline.
//!
//! One [`Compiler`] is one job: it owns the interner and the type
//! registry shared by every translation unit it compiles, and threads
//! them through lexing, parsing, and interface handling.
//!
//! Single units go through [`Compiler::compile_file`] (which imports the
//! cached interfaces of everything the unit mentions). Whole programs go
//! through [`Compiler::compile_project`]: dependency discovery, wave
//! scheduling, then per-file compilation in wave order, saving each
//! unit's interface for the units behind it.

use crate::module::{DependencyTree, ModuleError, ModuleInterface};
use crate::optimize;
use quill_base::Interner;
use quill_syntax::ast::Ast;
use quill_syntax::error::SyntaxError;
use quill_syntax::lexer::Lexer;
use quill_syntax::parser::Parser;
use quill_syntax::types::TypeRegistry;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Second lookup directory for `import` resolution.
    pub stdlib_dir: Option<PathBuf>,
    /// Skip the constant-folding pass (AST dumps of the raw parse).
    pub keep_raw_ast: bool,
}

#[derive(Debug)]
pub struct CompileOutput {
    pub path: PathBuf,
    pub source: String,
    pub ast: Ast,
    pub interface: ModuleInterface,
}

#[derive(Debug)]
pub enum CompileError {
    Module(ModuleError),
    Syntax {
        path: PathBuf,
        source: String,
        errors: Vec<SyntaxError>,
    },
}

impl From<ModuleError> for CompileError {
    fn from(error: ModuleError) -> Self {
        CompileError::Module(error)
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Module(error) => write!(f, "{}", error),
            CompileError::Syntax { path, errors, .. } => {
                write!(f, "{}: {} error(s)", path.display(), errors.len())
            }
        }
    }
}

impl std::error::Error for CompileError {}

pub struct Compiler {
    pub interner: Interner,
    pub registry: TypeRegistry,
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Compiler {
            interner: Interner::new(),
            registry: TypeRegistry::new(),
            options,
        }
    }

    /// Compiles in-memory source. `imports` supplies the interfaces of
    /// the modules the source depends on.
    pub fn compile_source(
        &mut self,
        source: &str,
        path: &Path,
        imports: &[ModuleInterface],
    ) -> Result<CompileOutput, CompileError> {
        let syntax_error = |source: &str, errors: Vec<SyntaxError>| CompileError::Syntax {
            path: path.to_path_buf(),
            source: source.to_string(),
            errors,
        };

        let tokens = Lexer::tokenize(source, &mut self.interner)
            .map_err(|e| syntax_error(source, vec![e]))?;

        let mut parser = Parser::new(source, &tokens, &mut self.interner, &mut self.registry);
        for interface in imports {
            for (name, id) in &interface.imported_types {
                parser.declare_imported_type(name, *id);
            }
            for sig in &interface.imported_functions {
                parser.declare_imported_function(&sig.name, sig.return_type, sig.parameters.clone());
            }
        }

        let mut result = parser.parse().map_err(|errors| syntax_error(source, errors))?;
        if !self.options.keep_raw_ast {
            optimize::optimize(&mut result.ast);
        }

        let working_directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let interface = ModuleInterface::from_parse(&result, &self.interner, working_directory);

        Ok(CompileOutput {
            path: path.to_path_buf(),
            source: source.to_string(),
            ast: result.ast,
            interface,
        })
    }

    /// Compiles one file, importing the cached interface of every module
    /// it names.
    pub fn compile_file(&mut self, path: &Path) -> Result<CompileOutput, CompileError> {
        let source = fs::read_to_string(path).map_err(|_| ModuleError::FileNotFound {
            path: path.to_path_buf(),
        })?;

        // Pre-pass for the unit's own imports.
        let tokens = Lexer::tokenize(&source, &mut self.interner)
            .map_err(|e| CompileError::Syntax {
                path: path.to_path_buf(),
                source: source.clone(),
                errors: vec![e],
            })?;
        let dependencies = Parser::parse_dependencies(&tokens, &self.interner);

        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut imports = Vec::new();
        for dependency in &dependencies {
            let dep_source = crate::module::resolve_dependency(
                &directory,
                dependency,
                self.options.stdlib_dir.as_deref(),
            );
            let cache = ModuleInterface::cache_path(&dep_source);
            let mut interface = ModuleInterface::new(directory.clone());
            interface.import(&cache, &mut self.registry, &mut self.interner)?;
            imports.push(interface);
        }

        self.compile_source(&source, path, &imports)
    }

    /// Compiles a whole program: every transitive import in dependency
    /// order, interfaces saved as each wave completes. The root's output
    /// is last.
    pub fn compile_project(&mut self, root: &Path) -> Result<Vec<CompileOutput>, CompileError> {
        let tree = DependencyTree::construct(
            root,
            self.options.stdlib_dir.as_deref(),
            &mut self.interner,
        )?;
        let stages = tree.processing_stages()?;
        let canonical_root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());

        let mut outputs = Vec::new();
        for wave in stages {
            for path in wave {
                let output = self.compile_file(&path)?;
                let cache = ModuleInterface::cache_path(&path);
                output
                    .interface
                    .save(&cache, &self.registry, &self.interner)?;
                outputs.push(output);
            }
        }

        // Present the root unit last; dependents follow dependencies
        // already, this just pins the entry point for callers.
        if let Some(index) = outputs.iter().position(|o| o.path == canonical_root) {
            let root_output = outputs.remove(index);
            outputs.push(root_output);
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::{Interpreter, RuntimeValue};

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn compile_source_produces_ast_and_interface() {
        let mut compiler = Compiler::new(CompileOptions::default());
        let output = compiler
            .compile_source(
                "export function five() : int { return 5; } five();",
                Path::new("unit.ql"),
                &[],
            )
            .unwrap();
        assert_eq!(output.interface.exported_functions.len(), 1);
        assert_eq!(output.interface.exported_functions[0].name, "five");
    }

    #[test]
    fn syntax_errors_carry_path_and_source() {
        let mut compiler = Compiler::new(CompileOptions::default());
        let error = compiler
            .compile_source("int x = ;", Path::new("broken.ql"), &[])
            .unwrap_err();
        match error {
            CompileError::Syntax { path, errors, .. } => {
                assert_eq!(path, Path::new("broken.ql"));
                assert!(!errors.is_empty());
            }
            other => panic!("expected syntax error, got {}", other),
        }
    }

    #[test]
    fn project_compiles_dependencies_first_and_links_calls() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "math.ql",
            "export function double_it(int x) : int { return x * 2; }",
        );
        let main = write(
            dir.path(),
            "main.ql",
            "import math;\nreturn double_it(21);",
        );

        let mut compiler = Compiler::new(CompileOptions::default());
        let outputs = compiler.compile_project(&main).unwrap();
        assert_eq!(outputs.len(), 2);
        // Root is last, dependency first.
        assert!(outputs[0].path.ends_with("math.ql"));
        assert!(outputs[1].path.ends_with("main.ql"));

        // The call in main resolved against the imported signature.
        let root = &outputs[1];
        assert!(root.interface.dependencies.contains(&"math".to_string()));
    }

    #[test]
    fn interpreting_a_compiled_unit_runs() {
        let mut compiler = Compiler::new(CompileOptions::default());
        let output = compiler
            .compile_source("int a = 20; return a + 2;", Path::new("unit.ql"), &[])
            .unwrap();
        let mut interpreter =
            Interpreter::new(&output.ast, &compiler.interner, &compiler.registry);
        assert_eq!(interpreter.run().unwrap(), RuntimeValue::Int(22));
    }

    #[test]
    fn missing_dependency_interface_fails_single_file_compile() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "dep.ql", "export function f() : int { return 1; }");
        let main = write(dir.path(), "main.ql", "import dep; return f();");

        // compile_file without a prior wave: dep.ql's interface was never
        // saved.
        let mut compiler = Compiler::new(CompileOptions::default());
        assert!(matches!(
            compiler.compile_file(&main),
            Err(CompileError::Module(ModuleError::InterfaceNotFound { .. }))
        ));
    }
}
