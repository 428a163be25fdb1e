//! Go project obfuscator
//!
//! Whole-program renaming for a Go module: every package reachable from the
//! root pattern that belongs to the module is rewritten into a fresh tree,
//! with identifiers, package names, import paths, and file names replaced by
//! short generated ones. Names owned by external packages or the language
//! are left alone, and directives can protect struct fields or hide string
//! literals behind decoder functions.
//!
//! Stages:
//! - Resolve: load packages through a [`PackageLoader`], classify them, and
//!   collect per-file edits and exclusions
//! - Remap: assign replacement spellings once every exclusion is known
//! - Assemble: apply edits and write the output tree, `go.mod`, and `go.sum`

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::assembler::Assembler;
use crate::config::ObfuscatorConfig;
use crate::error::{ObfError, Result};
use crate::loader::{GoListLoader, PackageLoader};
use crate::module_file::{copy_sum_file, ModuleFile};
use crate::remap::Remapper;
use crate::resolver::Build;

/// Result of obfuscating a project
#[derive(Debug, Clone)]
pub struct ObfuscationResult {
    /// Root of the written tree
    pub out_dir: PathBuf,
    /// Module path the tree was read as
    pub base_module: String,
    /// Number of project packages written
    pub packages: usize,
    /// Number of Go files written
    pub files: usize,
    /// Number of embedded resources copied
    pub embeds: usize,
    /// Number of distinct identifiers renamed
    pub identifiers_renamed: usize,
    /// Number of string literals replaced by decoder calls
    pub strings_protected: usize,
}

impl ObfuscationResult {
    pub fn total_transforms(&self) -> usize {
        self.identifiers_renamed + self.strings_protected
    }
}

/// Obfuscator instance bound to a project directory
pub struct Obfuscator {
    config: ObfuscatorConfig,
    project_dir: PathBuf,
}

impl Obfuscator {
    pub fn new(config: ObfuscatorConfig, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            project_dir: project_dir.into(),
        }
    }

    pub fn with_defaults(project_dir: impl Into<PathBuf>) -> Self {
        Self::new(ObfuscatorConfig::default(), project_dir)
    }

    pub fn config(&self) -> &ObfuscatorConfig {
        &self.config
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Obfuscate the package named by `pattern`, loading packages with `go list`.
    pub fn obfuscate(&self, pattern: &str, out_dir: &Path) -> Result<ObfuscationResult> {
        let loader = GoListLoader::new(self.config.build.go.clone(), self.project_dir.clone());
        self.obfuscate_with(loader, pattern, out_dir)
    }

    /// Obfuscate with a caller-supplied loader.
    pub fn obfuscate_with<L: PackageLoader>(
        &self,
        loader: L,
        pattern: &str,
        out_dir: &Path,
    ) -> Result<ObfuscationResult> {
        let module_file = ModuleFile::load(&self.project_dir)?;
        let base_module = module_file.module_path().to_string();
        info!("Obfuscating {} from module {}", pattern, base_module);

        let pattern = local_pattern(&self.project_dir, pattern);
        let mut build = Build::new(self.config.clone(), loader, base_module.clone())?;
        build.resolve_root(&pattern)?;
        let resolution = build.finish();

        fs::create_dir_all(out_dir).map_err(|source| ObfError::Write {
            path: out_dir.to_path_buf(),
            source,
        })?;
        copy_sum_file(&self.project_dir, out_dir, module_file.has_requirements())?;
        module_file.write_rewritten(out_dir, &self.config.output.module, &self.project_dir)?;

        let mut remapper = Remapper::new(resolution.registry);
        let report = Assembler::new(out_dir, &self.config.output.module, &mut remapper)
            .assemble(&resolution.units)?;

        let result = ObfuscationResult {
            out_dir: out_dir.to_path_buf(),
            base_module,
            packages: resolution.units.len(),
            files: report.files.len(),
            embeds: report.embeds,
            identifiers_renamed: remapper.renamed(),
            strings_protected: resolution.protected_strings,
        };
        info!(
            "Obfuscated {} packages ({} files, {} identifiers, {} strings) into {}",
            result.packages,
            result.files,
            result.identifiers_renamed,
            result.strings_protected,
            out_dir.display()
        );
        Ok(result)
    }
}

/// Make a bare relative directory like `cmd/app` explicit (`./cmd/app`) so the
/// toolchain does not read it as a standard-library import path.
fn local_pattern(project_dir: &Path, pattern: &str) -> String {
    let is_explicit = pattern == "."
        || pattern == ".."
        || pattern.starts_with("./")
        || pattern.starts_with("../")
        || Path::new(pattern).is_absolute();
    if !is_explicit && project_dir.join(pattern).is_dir() {
        format!("./{}", pattern)
    } else {
        pattern.to_string()
    }
}
