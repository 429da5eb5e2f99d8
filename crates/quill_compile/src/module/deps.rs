//! Dependency tree construction and wave scheduling.
//!
//! `construct` walks `import` directives transitively: each file is
//! tokenized and scanned with the parser's fast dependency pre-pass (no
//! AST is built), its imports resolved against the importing file's
//! directory and then the standard-library directory, and the resolved
//! files visited in turn. Paths are canonicalized so the same file
//! reached through different routes is one node.
//!
//! `processing_stages` peels the tree into waves: every file with no
//! unresolved dependencies joins the current wave and is removed before
//! the next wave is computed. Files in one wave only depend on earlier
//! waves, so an embedder may process a wave in parallel. A stalled peel
//! (no ready file while files remain) is a cycle.

use super::ModuleError;
use quill_base::Interner;
use quill_syntax::lexer::Lexer;
use quill_syntax::parser::Parser;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Source file extension of quill modules.
pub const SOURCE_EXTENSION: &str = "ql";

#[derive(Debug, Clone, Default)]
struct FileNode {
    depends_on: BTreeSet<PathBuf>,
    necessary_for: BTreeSet<PathBuf>,
    scanned: bool,
}

#[derive(Debug, Default)]
pub struct DependencyTree {
    files: BTreeMap<PathBuf, FileNode>,
    roots: BTreeSet<PathBuf>,
}

impl DependencyTree {
    /// Builds the tree rooted at `root`, reading and scanning every
    /// transitively imported file.
    pub fn construct(
        root: &Path,
        stdlib_dir: Option<&Path>,
        interner: &mut Interner,
    ) -> Result<Self, ModuleError> {
        let mut tree = DependencyTree::default();
        let abs = canonical(root)?;
        tree.roots.insert(abs.clone());
        tree.visit(abs, None, stdlib_dir, interner)?;
        Ok(tree)
    }

    fn visit(
        &mut self,
        path: PathBuf,
        from: Option<&Path>,
        stdlib_dir: Option<&Path>,
        interner: &mut Interner,
    ) -> Result<(), ModuleError> {
        let node = self.files.entry(path.clone()).or_default();
        if let Some(from) = from {
            node.necessary_for.insert(from.to_path_buf());
        }
        if node.scanned {
            return Ok(());
        }
        node.scanned = true;

        let source = fs::read_to_string(&path).map_err(|_| ModuleError::FileNotFound {
            path: path.clone(),
        })?;
        // The pre-pass is permissive: a file that fails to tokenize
        // reports nothing here and fails properly when compiled.
        let tokens = Lexer::tokenize(&source, interner).unwrap_or_default();
        let dependencies = Parser::parse_dependencies(&tokens, interner);

        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        for dependency in dependencies {
            let resolved = resolve_dependency(&parent, &dependency, stdlib_dir);
            self.files
                .get_mut(&path)
                .expect("node was just inserted")
                .depends_on
                .insert(resolved.clone());
            self.visit(resolved, Some(&path), stdlib_dir, interner)?;
        }
        Ok(())
    }

    /// All files in the tree, deterministic order.
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.keys()
    }

    pub fn roots(&self) -> impl Iterator<Item = &PathBuf> {
        self.roots.iter()
    }

    /// Splits the files into topologically ordered waves. For every
    /// dependency edge A → B, B's wave precedes A's.
    pub fn processing_stages(&self) -> Result<Vec<Vec<PathBuf>>, ModuleError> {
        let mut remaining = self.files.clone();
        let mut stages = Vec::new();

        while !remaining.is_empty() {
            let ready: Vec<PathBuf> = remaining
                .iter()
                .filter(|(_, node)| node.depends_on.is_empty())
                .map(|(path, _)| path.clone())
                .collect();

            if ready.is_empty() {
                return Err(ModuleError::CyclicDependency {
                    involved: remaining.keys().cloned().collect(),
                });
            }

            for path in &ready {
                let node = remaining.remove(path).expect("ready file is present");
                for dependent in node.necessary_for {
                    if let Some(dependent_node) = remaining.get_mut(&dependent) {
                        dependent_node.depends_on.remove(path);
                    }
                }
            }
            stages.push(ready);
        }
        Ok(stages)
    }
}

/// Resolves an import name to a file path: the importing file's
/// directory first, then the standard-library directory. The local
/// candidate is returned (and will fail with `FileNotFound`) when
/// neither exists.
pub fn resolve_dependency(dir: &Path, name: &str, stdlib_dir: Option<&Path>) -> PathBuf {
    let local = dir.join(format!("{}.{}", name, SOURCE_EXTENSION));
    if local.exists() {
        return canonical(&local).unwrap_or(local);
    }
    if let Some(stdlib) = stdlib_dir {
        let candidate = stdlib.join(format!("{}.{}", name, SOURCE_EXTENSION));
        if candidate.exists() {
            return canonical(&candidate).unwrap_or(candidate);
        }
    }
    local
}

fn canonical(path: &Path) -> Result<PathBuf, ModuleError> {
    fs::canonicalize(path).map_err(|_| ModuleError::FileNotFound {
        path: path.to_path_buf(),
    })
}
