//! Run configuration loaded from `gobf.toml`.
//!
//! Every section is optional; missing keys fall back to the defaults below.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::string_protect::DEFAULT_SALT;

/// File name looked up in the project directory when no path is given.
pub const CONFIG_FILE_NAME: &str = "gobf.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObfuscatorConfig {
    #[serde(default)]
    pub resolve: ResolveConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub directives: DirectiveConfig,
    #[serde(default)]
    pub protect: ProtectConfig,
    #[serde(default)]
    pub names: NamesConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

impl ObfuscatorConfig {
    /// Load configuration from a TOML file
    pub fn from_config_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Use `explicit` if given, else `gobf.toml` in `project_dir` if present,
    /// else defaults.
    pub fn discover(project_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_config_file(path);
        }
        let default_path = project_dir.join(CONFIG_FILE_NAME);
        if default_path.exists() {
            Self::from_config_file(&default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// What to do with an import the loader cannot resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Stop the run.
    #[default]
    Abort,
    /// Log it and treat the import as an external package with no members.
    Skip,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolveConfig {
    #[serde(default)]
    pub on_unresolved: UnresolvedPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Module path written into the rebuilt go.mod
    #[serde(default = "default_module")]
    pub module: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            module: default_module(),
        }
    }
}

fn default_module() -> String {
    "I".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectiveConfig {
    #[serde(default = "default_preserve_fields")]
    pub preserve_fields: String,
    #[serde(default = "default_protect")]
    pub protect: String,
}

impl Default for DirectiveConfig {
    fn default() -> Self {
        Self {
            preserve_fields: default_preserve_fields(),
            protect: default_protect(),
        }
    }
}

fn default_preserve_fields() -> String {
    "//obf:preserve-fields".to_string()
}

fn default_protect() -> String {
    "//obf:protect".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProtectConfig {
    #[serde(default = "default_salt")]
    pub salt: String,
}

impl Default for ProtectConfig {
    fn default() -> Self {
        Self {
            salt: default_salt(),
        }
    }
}

fn default_salt() -> String {
    DEFAULT_SALT.to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamesConfig {
    /// Extra identifiers that must keep their spelling
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Go toolchain binary
    #[serde(default = "default_go")]
    pub go: String,
    /// Value for GOFLAGS when compiling the obfuscated tree
    #[serde(default)]
    pub flags: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            go: default_go(),
            flags: String::new(),
        }
    }
}

fn default_go() -> String {
    "go".to_string()
}
