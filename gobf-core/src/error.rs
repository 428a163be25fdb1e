//! Error types for the obfuscation pipeline.

use std::path::PathBuf;

use crate::patch::PatchError;

/// Everything that can abort an obfuscation run.
///
/// No variant is retried; the run stops at the first error so a partially
/// rewritten tree is never handed to the compiler.
#[derive(Debug, thiserror::Error)]
pub enum ObfError {
    #[error("module file not found: {0}")]
    MissingModuleFile(PathBuf),

    #[error("malformed module file {path}: {reason}")]
    MalformedModuleFile { path: PathBuf, reason: String },

    #[error("go.sum not found at {0} but go.mod declares requirements")]
    MissingSumFile(PathBuf),

    #[error("failed to load package {pattern}: {reason}")]
    Unresolved { pattern: String, reason: String },

    #[error("{file}:{line}: syntax error in project source")]
    Syntax { file: PathBuf, line: usize },

    #[error("{file}:{line}: {reason}")]
    DirectiveMisuse {
        file: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to rewrite {file}: {source}")]
    Patch {
        file: PathBuf,
        #[source]
        source: PatchError,
    },

    #[error("failed to initialise Go parser: {0}")]
    Parser(String),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ObfError>;
