//! Multi-file compilation: dependency discovery, wave scheduling, and
//! persisted module interfaces.

mod deps;
mod interface;

pub use deps::{resolve_dependency, DependencyTree, SOURCE_EXTENSION};
pub use interface::{FunctionSig, ModuleInterface};

use std::path::PathBuf;

#[derive(Debug)]
pub enum ModuleError {
    FileNotFound { path: PathBuf },
    InterfaceNotFound { path: PathBuf },
    CyclicDependency { involved: Vec<PathBuf> },
    MalformedInterface { path: PathBuf, detail: String },
}

impl std::fmt::Display for ModuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleError::FileNotFound { path } => {
                write!(f, "could not open source file '{}'", path.display())
            }
            ModuleError::InterfaceNotFound { path } => {
                write!(f, "could not find interface file '{}'", path.display())
            }
            ModuleError::CyclicDependency { involved } => {
                let names: Vec<String> =
                    involved.iter().map(|p| p.display().to_string()).collect();
                write!(f, "cyclic dependency involving: {}", names.join(", "))
            }
            ModuleError::MalformedInterface { path, detail } => {
                write!(
                    f,
                    "malformed interface file '{}': {}",
                    path.display(),
                    detail
                )
            }
        }
    }
}

impl std::error::Error for ModuleError {}
