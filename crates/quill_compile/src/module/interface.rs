//! Persisted module interfaces.
//!
//! A module interface summarizes one translation unit's exports for its
//! dependents. The on-disk format is ASCII and line-oriented, three
//! sections separated by blank lines:
//!
//! ```text
//! math                             ── dependency names, one per line
//!
//! type vec2 { let x: float; let y: float; }
//!
//! length float vec2                ── name, return type, argument types
//! scale  vec2  vec2 float
//! ```
//!
//! Type lines are re-parsed with the real parser on import, which
//! registers the composite into the job's type registry; function lines
//! become signatures flagged as imported, introduced into the consumer's
//! root scope. The synthetic declarations built this way belong to the
//! interface, never to the consumer's AST.
//!
//! The cached filename for a source file is `<stem>_<hex>` where the hex
//! is an `FxHasher` digest of the canonical absolute path. `FxHasher` is
//! keyed by nothing, so the name is stable across runs on the same
//! filesystem.

use super::deps::resolve_dependency;
use super::ModuleError;
use quill_base::Interner;
use quill_syntax::ast::{Ast, NodeId, NodeKind, Value};
use quill_syntax::lexer::Lexer;
use quill_syntax::parser::{ParseResult, Parser};
use quill_syntax::types::{TypeId, TypeRegistry};
use rustc_hash::FxHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::{Path, PathBuf};

/// A function's shape as seen across module boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSig {
    pub name: String,
    pub return_type: TypeId,
    pub parameters: Vec<TypeId>,
}

#[derive(Debug, Default)]
pub struct ModuleInterface {
    pub working_directory: PathBuf,
    pub dependencies: Vec<String>,
    pub exported_functions: Vec<FunctionSig>,
    /// Registered ids of exported composite types.
    pub exported_types: Vec<TypeId>,
    pub imported_functions: Vec<FunctionSig>,
    pub imported_types: Vec<(String, TypeId)>,
    /// Synthetic declaration trees built from imported type lines; owned
    /// here, outside any translation unit's AST, and read-only once
    /// constructed.
    pub synthetic_declarations: Vec<Ast>,
}

impl ModuleInterface {
    pub fn new(working_directory: PathBuf) -> Self {
        ModuleInterface {
            working_directory,
            ..Default::default()
        }
    }

    /// Collects a freshly parsed unit's exports. Signatures carry type
    /// ids; designations resolve against the registry on save.
    pub fn from_parse(
        result: &ParseResult,
        interner: &Interner,
        working_directory: PathBuf,
    ) -> Self {
        let mut interface = ModuleInterface::new(working_directory);
        interface.dependencies = result.dependencies.clone();

        for &node in &result.exported_functions {
            interface
                .exported_functions
                .push(function_sig(&result.ast, node, interner));
        }
        for &node in &result.exported_types {
            interface.exported_types.push(result.ast.node(node).type_id);
        }
        interface
    }

    /// Writes the three-section interface file.
    pub fn save(
        &self,
        path: &Path,
        registry: &TypeRegistry,
        interner: &Interner,
    ) -> Result<(), ModuleError> {
        let mut out = Vec::new();
        let fail = |_| ModuleError::MalformedInterface {
            path: path.to_path_buf(),
            detail: "could not write".to_string(),
        };

        for dependency in &self.dependencies {
            writeln!(out, "{}", dependency).map_err(fail)?;
        }
        writeln!(out).map_err(fail)?;

        for &type_id in &self.exported_types {
            let record = registry.get(type_id);
            write!(out, "type {} {{ ", record.designation).map_err(fail)?;
            if let Some(members) = registry.members_of(type_id) {
                for member in members {
                    write!(
                        out,
                        "let {}: {}",
                        interner.resolve(member.name),
                        registry.designation(member.type_id)
                    )
                    .map_err(fail)?;
                    match &member.default {
                        Some(Value::Integer(v)) => write!(out, " = {}", v).map_err(fail)?,
                        Some(Value::Float(v)) => write!(out, " = {:?}", v).map_err(fail)?,
                        Some(Value::Boolean(v)) => write!(out, " = {}", v).map_err(fail)?,
                        _ => {}
                    }
                    write!(out, "; ").map_err(fail)?;
                }
            }
            writeln!(out, "}}").map_err(fail)?;
        }
        writeln!(out).map_err(fail)?;

        for sig in &self.exported_functions {
            write!(out, "{} {}", sig.name, registry.designation(sig.return_type))
                .map_err(fail)?;
            for &parameter in &sig.parameters {
                write!(out, " {}", registry.designation(parameter)).map_err(fail)?;
            }
            writeln!(out).map_err(fail)?;
        }

        fs::write(path, out).map_err(|_| ModuleError::MalformedInterface {
            path: path.to_path_buf(),
            detail: "could not write interface file".to_string(),
        })
    }

    /// Reads an interface file back, registering imported types into the
    /// registry and collecting imported signatures.
    pub fn import(
        &mut self,
        path: &Path,
        registry: &mut TypeRegistry,
        interner: &mut Interner,
    ) -> Result<(), ModuleError> {
        let text = fs::read_to_string(path).map_err(|_| ModuleError::InterfaceNotFound {
            path: path.to_path_buf(),
        })?;
        let malformed = |detail: String| ModuleError::MalformedInterface {
            path: path.to_path_buf(),
            detail,
        };

        let mut lines = text.lines();

        // Section 1: dependency names.
        for line in lines.by_ref() {
            if line.trim().is_empty() {
                break;
            }
            self.dependencies.push(line.trim().to_string());
        }

        // Section 2: exported type declarations, re-parsed.
        for line in lines.by_ref() {
            if line.trim().is_empty() {
                break;
            }
            let tokens = Lexer::tokenize(line, interner)
                .map_err(|e| malformed(format!("type line: {}", e)))?;
            let result = Parser::new(line, &tokens, interner, registry)
                .parse()
                .map_err(|errors| {
                    malformed(format!(
                        "type line: {}",
                        errors
                            .first()
                            .map(|e| e.to_string())
                            .unwrap_or_default()
                    ))
                })?;
            let declaration = find_type_declaration(&result.ast)
                .ok_or_else(|| malformed("expected a type declaration".to_string()))?;
            let node = result.ast.node(declaration);
            let name = interner.resolve(node.token.lexeme).to_string();
            self.imported_types.push((name, node.type_id));
            self.synthetic_declarations.push(result.ast);
        }

        // Section 3: exported function signatures.
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let name = fields
                .next()
                .ok_or_else(|| malformed("empty signature line".to_string()))?
                .to_string();
            let return_type = fields
                .next()
                .map(|t| registry.get_or_register(t))
                .ok_or_else(|| malformed(format!("signature '{}' lacks a return type", name)))?;
            let parameters = fields.map(|t| registry.get_or_register(t)).collect();
            self.imported_functions.push(FunctionSig {
                name,
                return_type,
                parameters,
            });
        }
        Ok(())
    }

    /// Resolves one of this module's dependency names to a source path.
    pub fn resolve_dependency(&self, name: &str, stdlib_dir: Option<&Path>) -> PathBuf {
        resolve_dependency(&self.working_directory, name, stdlib_dir)
    }

    /// Stable cached-interface filename for a source path:
    /// `<stem>_<hex(hash(absolute_path))>`.
    pub fn cache_filename(path: &Path) -> String {
        let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let mut hasher = FxHasher::default();
        absolute.hash(&mut hasher);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "module".to_string());
        format!("{}_{:x}", stem, hasher.finish())
    }

    /// Path of the cached interface next to its source file.
    pub fn cache_path(source: &Path) -> PathBuf {
        let name = Self::cache_filename(source);
        source
            .parent()
            .map(|dir| dir.join(&name))
            .unwrap_or_else(|| PathBuf::from(name))
    }
}

fn function_sig(ast: &Ast, node: NodeId, interner: &Interner) -> FunctionSig {
    let declaration = ast.node(node);
    let children = &declaration.children;
    let parameters = children
        .iter()
        .take(children.len().saturating_sub(1))
        .map(|&param| ast.node(param).type_id)
        .collect();
    FunctionSig {
        name: interner.resolve(declaration.token.lexeme).to_string(),
        return_type: declaration.type_id,
        parameters,
    }
}

fn find_type_declaration(ast: &Ast) -> Option<NodeId> {
    ast.node(ast.root())
        .children
        .iter()
        .copied()
        .find(|&child| matches!(ast.node(child).kind, NodeKind::TypeDeclaration))
}
