//! Output tree assembly.
//!
//! Lays out every project unit under the output directory, applies the
//! collected edits through the remapper, and writes files under generated
//! names. The entry unit lands at the root; every other unit gets its own
//! generated directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{ObfError, Result};
use crate::ident_gen::IdentGen;
use crate::patch::TextPatcher;
use crate::path_utils::module_import_path;
use crate::remap::Remapper;
use crate::types::{CompilationUnit, Replacement, SourceFile};

/// What was written, per unit and in total.
#[derive(Debug, Clone, Default)]
pub struct AssemblyReport {
    /// Canonical identity to directory relative to the output root
    /// (empty for the entry unit).
    pub directories: HashMap<String, String>,
    /// Original file path to written file path.
    pub files: Vec<(PathBuf, PathBuf)>,
    pub embeds: usize,
}

impl AssemblyReport {
    pub fn directory_of(&self, id: &str) -> Option<&str> {
        self.directories.get(id).map(String::as_str)
    }
}

pub struct Assembler<'a> {
    out_dir: &'a Path,
    module: &'a str,
    remapper: &'a mut Remapper,
}

impl<'a> Assembler<'a> {
    pub fn new(out_dir: &'a Path, module: &'a str, remapper: &'a mut Remapper) -> Self {
        Self {
            out_dir,
            module,
            remapper,
        }
    }

    pub fn assemble(&mut self, units: &[CompilationUnit]) -> Result<AssemblyReport> {
        let mut report = AssemblyReport {
            directories: plan_directories(units),
            ..Default::default()
        };

        for unit in units {
            let dir_name = report.directory_of(&unit.id).unwrap_or_default().to_string();
            let dir = self.out_dir.join(&dir_name);
            create_dir(&dir)?;

            let package_name = if unit.is_entry {
                unit.name.clone()
            } else {
                self.remapper.replacement(&unit.name)
            };
            debug!("Writing {} as package {} in {:?}", unit.id, package_name, dir_name);

            let mut file_names = IdentGen::lowercase();
            for file in &unit.files {
                let content = self.rewrite_file(file, &package_name, &report.directories)?;
                let target = dir.join(format!("{}.go", file_names.next_name()));
                fs::write(&target, content).map_err(|source| ObfError::Write {
                    path: target.clone(),
                    source,
                })?;
                report.files.push((file.path.clone(), target));
            }

            for (name, data) in &unit.embeds {
                let target = dir.join(name);
                if let Some(parent) = target.parent() {
                    create_dir(parent)?;
                }
                fs::write(&target, data).map_err(|source| ObfError::Write {
                    path: target.clone(),
                    source,
                })?;
                report.embeds += 1;
            }

            info!("Wrote {} ({} files)", unit.id, unit.files.len());
        }

        Ok(report)
    }

    fn rewrite_file(
        &mut self,
        file: &SourceFile,
        package_name: &str,
        directories: &HashMap<String, String>,
    ) -> Result<String> {
        let mut patcher = TextPatcher::new(&file.content);

        for replacement in &file.replacements {
            let text = match replacement {
                Replacement::Rename { name, .. } => self.remapper.replacement(name),
                Replacement::Literal { text, .. } => text.clone(),
                Replacement::PackageName { .. } => package_name.to_string(),
                Replacement::ImportPath { target, .. } => match directories.get(target) {
                    Some(dir) if dir.is_empty() => format!("\"{}\"", self.module),
                    Some(dir) => format!("\"{}\"", module_import_path(self.module, dir)),
                    None => {
                        warn!("No output directory for {}, import left as is", target);
                        continue;
                    }
                },
            };
            patcher
                .replace(replacement.span(), &text)
                .map_err(|source| ObfError::Patch {
                    file: file.path.clone(),
                    source,
                })?;
        }

        patcher.append(&file.append_content);
        Ok(patcher.into_string())
    }
}

/// Directory of every unit: the entry at the root, the rest under generated
/// lower-case names in recording order.
pub fn plan_directories(units: &[CompilationUnit]) -> HashMap<String, String> {
    let mut names = IdentGen::lowercase();
    units
        .iter()
        .map(|unit| {
            let dir = if unit.is_entry {
                String::new()
            } else {
                names.next_name()
            };
            (unit.id.clone(), dir)
        })
        .collect()
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| ObfError::Write {
        path: dir.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::Span;
    use crate::registry::IdentRegistry;
    use tempfile::TempDir;

    fn unit(id: &str, name: &str, is_entry: bool, files: Vec<SourceFile>) -> CompilationUnit {
        CompilationUnit {
            name: name.to_string(),
            id: id.to_string(),
            is_entry,
            files,
            embeds: Vec::new(),
        }
    }

    #[test]
    fn test_plan_directories() {
        let units = vec![
            unit("example.com/app/a", "a", false, vec![]),
            unit("example.com/app", "main", true, vec![]),
            unit("example.com/app/b", "b", false, vec![]),
        ];
        let dirs = plan_directories(&units);
        assert_eq!(dirs["example.com/app"], "");
        assert_eq!(dirs["example.com/app/a"], "a");
        assert_eq!(dirs["example.com/app/b"], "b");
    }

    #[test]
    fn test_assemble_rewrites_and_lays_out() {
        let util_src = "package util\n\nfunc Run() {}\n";
        let mut util_file = SourceFile::new(PathBuf::from("util/util.go"), util_src.to_string());
        util_file.replacements = vec![
            Replacement::PackageName { span: Span::new(8, 12) },
            Replacement::Rename {
                span: Span::new(19, 22),
                name: "Run".to_string(),
            },
        ];

        let main_src = "package main\n\nimport \"example.com/app/util\"\n\nfunc main() { util.Run() }\n";
        let import_start = main_src.find('"').unwrap();
        let util_start = main_src.find("util.Run").unwrap();
        let mut main_file = SourceFile::new(PathBuf::from("main.go"), main_src.to_string());
        main_file.replacements = vec![
            Replacement::PackageName { span: Span::new(8, 12) },
            Replacement::ImportPath {
                span: Span::new(import_start, import_start + 22),
                target: "example.com/app/util".to_string(),
            },
            Replacement::Rename {
                span: Span::new(util_start, util_start + 4),
                name: "util".to_string(),
            },
            Replacement::Rename {
                span: Span::new(util_start + 5, util_start + 8),
                name: "Run".to_string(),
            },
        ];
        main_file.append_content = "\nfunc extra() {}\n".to_string();

        let mut app = unit("example.com/app", "main", true, vec![main_file]);
        app.embeds.push(("static/index.html".to_string(), b"<html></html>".to_vec()));
        let units = vec![unit("example.com/app/util", "util", false, vec![util_file]), app];

        let out = TempDir::new().unwrap();
        let mut remapper = Remapper::new(IdentRegistry::new());
        let report = Assembler::new(out.path(), "I", &mut remapper)
            .assemble(&units)
            .unwrap();

        let package = remapper.assigned("util").unwrap().to_string();
        let run = remapper.assigned("Run").unwrap().to_string();

        let util_out = fs::read_to_string(out.path().join("a").join("a.go")).unwrap();
        assert_eq!(util_out, format!("package {package}\n\nfunc {run}() {{}}\n"));

        let main_out = fs::read_to_string(out.path().join("a.go")).unwrap();
        assert_eq!(
            main_out,
            format!("package main\n\nimport \"I/a\"\n\nfunc main() {{ {package}.{run}() }}\n\nfunc extra() {{}}\n")
        );

        assert_eq!(
            fs::read(out.path().join("static").join("index.html")).unwrap(),
            b"<html></html>"
        );
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.embeds, 1);
    }

    #[test]
    fn test_patch_failure_names_file() {
        let mut file = SourceFile::new(PathBuf::from("bad.go"), "package x\n".to_string());
        file.replacements = vec![Replacement::Literal {
            span: Span::new(8, 40),
            text: String::new(),
        }];
        let out = TempDir::new().unwrap();
        let mut remapper = Remapper::new(IdentRegistry::new());
        let err = Assembler::new(out.path(), "I", &mut remapper)
            .assemble(&[unit("example.com/app", "main", true, vec![file])])
            .unwrap_err();
        assert!(matches!(err, ObfError::Patch { .. }));
        assert!(err.to_string().contains("bad.go"));
    }
}
