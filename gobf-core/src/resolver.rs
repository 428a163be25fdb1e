//! Package dependency resolution.
//!
//! [`Build`] is the single run object: it owns the loader, the exclusion
//! registry, the string protector, the memoization caches, and every project
//! unit recorded so far. Resolving a unit resolves its imports first, so by
//! the time a project file's identifiers are classified every external name
//! they could collide with is already excluded.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::collect::{harvest_exported, DirectiveIndex, FileCollector};
use crate::config::{ObfuscatorConfig, UnresolvedPolicy};
use crate::error::{ObfError, Result};
use crate::loader::{LoadedFile, LoadedPackage, PackageLoader};
use crate::path_utils::{is_module_descendant, package_binding};
use crate::registry::IdentRegistry;
use crate::string_protect::StringProtector;
use crate::syntax::{first_error, import_specs, line, GoParser};
use crate::types::{CompilationUnit, SourceFile};

/// Pseudo-package introduced by cgo; it has no source to load.
const CGO_PSEUDO_PACKAGE: &str = "C";

/// Outcome of resolving one import pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    /// Canonical import path.
    pub id: String,
    /// Declared package name, the default binding of an import.
    pub name: String,
    pub in_project: bool,
}

/// Everything the resolution pass produced.
#[derive(Debug)]
pub struct Resolution {
    pub units: Vec<CompilationUnit>,
    pub registry: IdentRegistry,
    pub protected_strings: usize,
}

pub struct Build<L: PackageLoader> {
    config: ObfuscatorConfig,
    loader: L,
    parser: GoParser,
    base_module: String,
    registry: IdentRegistry,
    protector: StringProtector,
    units: Vec<CompilationUnit>,
    by_pattern: HashMap<String, ResolvedPackage>,
    by_id: HashMap<String, ResolvedPackage>,
    protected_strings: usize,
}

impl<L: PackageLoader> Build<L> {
    pub fn new(config: ObfuscatorConfig, loader: L, base_module: impl Into<String>) -> Result<Self> {
        let mut registry = IdentRegistry::new();
        registry.extend(config.names.exclude.iter().cloned());
        let protector = StringProtector::new(&config.protect.salt);

        Ok(Self {
            config,
            loader,
            parser: GoParser::new()?,
            base_module: base_module.into(),
            registry,
            protector,
            units: Vec::new(),
            by_pattern: HashMap::new(),
            by_id: HashMap::new(),
            protected_strings: 0,
        })
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Resolve the program's entry package and everything reachable from it.
    pub fn resolve_root(&mut self, pattern: &str) -> Result<ResolvedPackage> {
        let root = self.resolve(pattern)?;
        if !root.in_project {
            return Err(ObfError::Unresolved {
                pattern: pattern.to_string(),
                reason: format!(
                    "{} is not part of module {}",
                    root.id, self.base_module
                ),
            });
        }
        for unit in &mut self.units {
            unit.is_entry = unit.id == root.id;
        }
        Ok(root)
    }

    /// Resolve one import pattern, loading and collecting it on first sight.
    pub fn resolve(&mut self, pattern: &str) -> Result<ResolvedPackage> {
        if pattern == CGO_PSEUDO_PACKAGE {
            return Ok(ResolvedPackage {
                id: CGO_PSEUDO_PACKAGE.to_string(),
                name: CGO_PSEUDO_PACKAGE.to_string(),
                in_project: false,
            });
        }

        if let Some(hit) = self.by_pattern.get(pattern) {
            debug!("Fast skipped processing {}", pattern);
            return Ok(hit.clone());
        }

        let package = match self.loader.load(pattern) {
            Ok(package) => package,
            Err(err @ ObfError::Unresolved { .. })
                if self.config.resolve.on_unresolved == UnresolvedPolicy::Skip =>
            {
                warn!("Skipping unresolved import: {}", err);
                let skipped = ResolvedPackage {
                    id: pattern.to_string(),
                    name: package_binding(pattern).to_string(),
                    in_project: false,
                };
                self.by_pattern.insert(pattern.to_string(), skipped.clone());
                return Ok(skipped);
            }
            Err(err) => return Err(err),
        };

        if let Some(hit) = self.by_id.get(&package.id).cloned() {
            debug!("Skipped processing {}", package.id);
            self.by_pattern.insert(pattern.to_string(), hit.clone());
            return Ok(hit);
        }

        let resolved = ResolvedPackage {
            id: package.id.clone(),
            name: package.name.clone(),
            in_project: is_module_descendant(&self.base_module, &package.id),
        };
        // Recorded before recursing so a second route to this unit is a cache hit.
        self.by_id.insert(resolved.id.clone(), resolved.clone());
        self.by_pattern.insert(pattern.to_string(), resolved.clone());

        if resolved.in_project {
            info!("Processing {}", resolved.id);
            self.collect_project_unit(package)?;
            info!("Finished processing {}", resolved.id);
        } else {
            debug!("Processing external {}", resolved.id);
            self.collect_external_unit(&package)?;
        }

        Ok(resolved)
    }

    fn collect_project_unit(&mut self, package: LoadedPackage) -> Result<()> {
        let mut files = Vec::with_capacity(package.files.len());
        for file in &package.files {
            files.push(self.collect_project_file(&package, file)?);
        }
        debug!(
            "Recorded {} files and {} embedded resources for {}",
            files.len(),
            package.embeds.len(),
            package.id
        );

        self.units.push(CompilationUnit {
            name: package.name,
            id: package.id,
            is_entry: false,
            files,
            embeds: package.embeds,
        });
        Ok(())
    }

    fn collect_project_file(&mut self, package: &LoadedPackage, file: &LoadedFile) -> Result<SourceFile> {
        let tree = self.parser.parse(&file.text).ok_or_else(|| ObfError::Syntax {
            file: file.path.clone(),
            line: 1,
        })?;
        let root = tree.root_node();
        if let Some(error) = first_error(root) {
            return Err(ObfError::Syntax {
                file: file.path.clone(),
                line: line(error),
            });
        }

        let mut imports = HashMap::new();
        for spec in import_specs(root) {
            let Some(path) = spec.path_value(&file.text) else {
                return Err(ObfError::Syntax {
                    file: file.path.clone(),
                    line: line(spec.path),
                });
            };
            let resolved = self.resolve(package.resolve_import(&path))?;
            imports.insert(spec.node.start_byte(), resolved);
        }

        let directives = DirectiveIndex::scan(root, &file.text, &self.config.directives);
        let edits = FileCollector::new(
            &file.path,
            &file.text,
            directives,
            imports,
            &mut self.registry,
            &mut self.protector,
        )
        .collect(root)?;
        self.protected_strings += edits.protected_strings;

        let mut source = SourceFile::new(file.path.clone(), file.text.clone());
        source.replacements = edits.replacements;
        source.append_content = edits.append_content;
        Ok(source)
    }

    fn collect_external_unit(&mut self, package: &LoadedPackage) -> Result<()> {
        for file in &package.files {
            let Some(tree) = self.parser.parse(&file.text) else {
                warn!("Could not parse {}, skipping", file.path.display());
                continue;
            };
            let root = tree.root_node();
            if root.has_error() {
                debug!("Parse errors in {}, harvesting best effort", file.path.display());
            }

            for spec in import_specs(root) {
                if let Some(path) = spec.path_value(&file.text) {
                    self.resolve(package.resolve_import(&path))?;
                }
            }
            harvest_exported(root, &file.text, &mut self.registry);
        }
        Ok(())
    }

    /// Finish the resolution pass, handing over everything collected.
    pub fn finish(self) -> Resolution {
        Resolution {
            units: self.units,
            registry: self.registry,
            protected_strings: self.protected_strings,
        }
    }
}
