//! gobf Core Library
//!
//! This crate provides the core functionality for gobf:
//! - Package loading through `go list` and Go parsing with tree-sitter
//! - Dependency resolution and identifier collection
//! - Identifier remapping and string literal protection
//! - Output tree assembly and the downstream `go build`

pub mod assembler;
pub mod builtins;
pub mod collect;
pub mod compiler;
pub mod config;
pub mod error;
pub mod ident_gen;
pub mod loader;
pub mod module_file;
pub mod obfuscator;
pub mod patch;
pub mod path_utils;
pub mod registry;
pub mod remap;
pub mod resolver;
pub mod string_protect;
pub mod syntax;
pub mod types;

// Re-export commonly used types
pub use assembler::{Assembler, AssemblyReport};
pub use compiler::GoBuild;
pub use config::{ObfuscatorConfig, UnresolvedPolicy, CONFIG_FILE_NAME};
pub use error::{ObfError, Result};
pub use ident_gen::IdentGen;
pub use loader::{GoListLoader, InMemoryLoader, LoadedFile, LoadedPackage, PackageLoader};
pub use module_file::ModuleFile;
pub use obfuscator::{ObfuscationResult, Obfuscator};
pub use patch::{PatchError, Span, TextPatcher};
pub use registry::IdentRegistry;
pub use remap::Remapper;
pub use resolver::{Build, ResolvedPackage, Resolution};
pub use string_protect::{ProtectedString, StringProtector};
pub use types::{CompilationUnit, Replacement, SourceFile};
pub use path_utils::{is_module_descendant, last_path_element, normalize_path, path_to_string};
