//! Package loading.
//!
//! The loader turns an import pattern into the package's identity, files, and
//! embedded resources. [`GoListLoader`] asks the Go toolchain (`go list`);
//! [`InMemoryLoader`] serves packages registered up front.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ObfError, Result};

/// A Go source file as delivered by the loader.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub text: String,
}

/// A resolved package.
#[derive(Debug, Clone, Default)]
pub struct LoadedPackage {
    /// Canonical import path; equal for every spelling that reaches the package.
    pub id: String,
    /// Name declared in the package clause.
    pub name: String,
    pub files: Vec<LoadedFile>,
    /// Embedded resources by path relative to the package directory.
    pub embeds: Vec<(String, Vec<u8>)>,
    /// Import path as written in source to the path it resolves to (vendoring).
    pub import_map: HashMap<String, String>,
}

impl LoadedPackage {
    /// Path an import written inside this package actually refers to.
    pub fn resolve_import<'a>(&'a self, path: &'a str) -> &'a str {
        self.import_map.get(path).map(String::as_str).unwrap_or(path)
    }
}

pub trait PackageLoader {
    fn load(&mut self, pattern: &str) -> Result<LoadedPackage>;
}

impl<L: PackageLoader + ?Sized> PackageLoader for &mut L {
    fn load(&mut self, pattern: &str) -> Result<LoadedPackage> {
        (**self).load(pattern)
    }
}

/// Loads packages with `go list -e -json`, run from the project directory.
#[derive(Debug, Clone)]
pub struct GoListLoader {
    go: String,
    project_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListPackage {
    #[serde(default)]
    import_path: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    dir: PathBuf,
    #[serde(default)]
    go_files: Vec<String>,
    #[serde(default)]
    cgo_files: Vec<String>,
    #[serde(default)]
    embed_files: Vec<String>,
    #[serde(default)]
    import_map: HashMap<String, String>,
    #[serde(default)]
    error: Option<GoListError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListError {
    err: String,
}

impl GoListLoader {
    pub fn new(go: impl Into<String>, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            go: go.into(),
            project_dir: project_dir.into(),
        }
    }

    fn list(&self, pattern: &str) -> Result<GoListPackage> {
        let output = Command::new(&self.go)
            .args(["list", "-e", "-json", pattern])
            .current_dir(&self.project_dir)
            .output()
            .map_err(|source| ObfError::Spawn {
                program: self.go.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ObfError::Unresolved {
                pattern: pattern.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_go_list(pattern, &output.stdout)
    }
}

/// Pick the first package out of `go list -json` output.
fn parse_go_list(pattern: &str, stdout: &[u8]) -> Result<GoListPackage> {
    let mut stream = serde_json::Deserializer::from_slice(stdout).into_iter::<GoListPackage>();
    let package = match stream.next() {
        Some(Ok(package)) => package,
        Some(Err(e)) => {
            return Err(ObfError::Unresolved {
                pattern: pattern.to_string(),
                reason: format!("unreadable go list output: {e}"),
            })
        }
        None => {
            return Err(ObfError::Unresolved {
                pattern: pattern.to_string(),
                reason: "no package matched".to_string(),
            })
        }
    };
    if stream.next().is_some() {
        debug!("Pattern {} matched several packages, using {}", pattern, package.import_path);
    }
    if let Some(error) = &package.error {
        return Err(ObfError::Unresolved {
            pattern: pattern.to_string(),
            reason: error.err.clone(),
        });
    }
    if package.name.is_empty() {
        return Err(ObfError::Unresolved {
            pattern: pattern.to_string(),
            reason: "package has no Go files".to_string(),
        });
    }
    Ok(package)
}

impl PackageLoader for GoListLoader {
    fn load(&mut self, pattern: &str) -> Result<LoadedPackage> {
        let listed = self.list(pattern)?;

        let files = listed
            .go_files
            .iter()
            .chain(&listed.cgo_files)
            .map(|name| {
                let path = listed.dir.join(name);
                let text = read_text(&path)?;
                Ok(LoadedFile { path, text })
            })
            .collect::<Result<Vec<_>>>()?;

        let embeds = listed
            .embed_files
            .iter()
            .map(|name| {
                let path = listed.dir.join(name);
                let data = fs::read(&path).map_err(|source| ObfError::Read { path, source })?;
                Ok((name.clone(), data))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(LoadedPackage {
            id: listed.import_path,
            name: listed.name,
            files,
            embeds,
            import_map: listed.import_map,
        })
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ObfError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Serves packages registered ahead of time.
///
/// Patterns map to canonical identities through aliases, so the same package
/// can be requested under several spellings (e.g. `.` and its import path).
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    packages: HashMap<String, LoadedPackage>,
    aliases: HashMap<String, String>,
    loads: usize,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package from `(file name, source)` pairs.
    pub fn add_package(&mut self, id: &str, name: &str, files: &[(&str, &str)]) -> &mut Self {
        let dir = PathBuf::from(id);
        let files = files
            .iter()
            .map(|(file, text)| LoadedFile {
                path: dir.join(file),
                text: text.to_string(),
            })
            .collect();
        self.packages.insert(
            id.to_string(),
            LoadedPackage {
                id: id.to_string(),
                name: name.to_string(),
                files,
                ..Default::default()
            },
        );
        self
    }

    pub fn add_embed(&mut self, id: &str, name: &str, data: &[u8]) -> &mut Self {
        if let Some(package) = self.packages.get_mut(id) {
            package.embeds.push((name.to_string(), data.to_vec()));
        }
        self
    }

    /// Make `pattern` resolve to the package registered as `id`.
    pub fn alias(&mut self, pattern: &str, id: &str) -> &mut Self {
        self.aliases.insert(pattern.to_string(), id.to_string());
        self
    }

    /// Number of successful loads, to observe memoization.
    pub fn loads(&self) -> usize {
        self.loads
    }
}

impl PackageLoader for InMemoryLoader {
    fn load(&mut self, pattern: &str) -> Result<LoadedPackage> {
        let id = self.aliases.get(pattern).map(String::as_str).unwrap_or(pattern);
        let package = self
            .packages
            .get(id)
            .cloned()
            .ok_or_else(|| ObfError::Unresolved {
                pattern: pattern.to_string(),
                reason: "package not registered".to_string(),
            })?;
        self.loads += 1;
        Ok(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_go_list_output() {
        let stdout = br#"{
	"Dir": "/home/dev/app/util",
	"ImportPath": "example.com/app/util",
	"Name": "util",
	"GoFiles": ["util.go", "strings.go"],
	"EmbedFiles": ["static/index.html"],
	"ImportMap": {"golang.org/x/net/http2": "vendor/golang.org/x/net/http2"}
}"#;
        let package = parse_go_list("./util", stdout).unwrap();
        assert_eq!(package.import_path, "example.com/app/util");
        assert_eq!(package.name, "util");
        assert_eq!(package.go_files, vec!["util.go", "strings.go"]);
        assert_eq!(package.embed_files, vec!["static/index.html"]);
        assert_eq!(package.import_map.len(), 1);
    }

    #[test]
    fn test_parse_go_list_error() {
        let stdout = br#"{
	"ImportPath": "example.com/missing",
	"Error": {"Err": "cannot find module providing package example.com/missing"}
}"#;
        let err = parse_go_list("example.com/missing", stdout).unwrap_err();
        assert!(matches!(err, ObfError::Unresolved { .. }));
        assert!(err.to_string().contains("cannot find module"));
    }

    #[test]
    fn test_parse_go_list_empty() {
        assert!(matches!(
            parse_go_list("./...", b""),
            Err(ObfError::Unresolved { .. })
        ));
    }

    #[test]
    fn test_in_memory_aliases() {
        let mut loader = InMemoryLoader::new();
        loader
            .add_package("example.com/app", "main", &[("main.go", "package main\n")])
            .alias(".", "example.com/app");
        let by_alias = loader.load(".").unwrap();
        let by_id = loader.load("example.com/app").unwrap();
        assert_eq!(by_alias.id, by_id.id);
        assert_eq!(by_alias.files[0].path, PathBuf::from("example.com/app/main.go"));
        assert_eq!(loader.loads(), 2);
        assert!(loader.load("example.com/other").is_err());
    }

    #[test]
    fn test_resolve_import_through_map() {
        let mut package = LoadedPackage::default();
        package
            .import_map
            .insert("golang.org/x/text".to_string(), "vendor/golang.org/x/text".to_string());
        assert_eq!(package.resolve_import("golang.org/x/text"), "vendor/golang.org/x/text");
        assert_eq!(package.resolve_import("fmt"), "fmt");
    }
}
