//! Module descriptor (`go.mod`) and lock file (`go.sum`) handling.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::{ObfError, Result};
use crate::path_utils::{absolutize, is_local_replacement, path_to_string};

pub const MODULE_FILE_NAME: &str = "go.mod";
pub const SUM_FILE_NAME: &str = "go.sum";

fn module_directive() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*module\s+("[^"]+"|`[^`]+`|\S+)\s*(//.*)?$"#).expect("static regex")
    })
}

fn require_directive() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*require\b").expect("static regex"))
}

fn replace_target() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"=>\s*(\S+)").expect("static regex"))
}

/// A parsed `go.mod`.
#[derive(Debug, Clone)]
pub struct ModuleFile {
    path: PathBuf,
    text: String,
    module_path: String,
    /// Line holding the `module` directive.
    module_line: usize,
}

impl ModuleFile {
    /// Read `go.mod` from the project directory.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(MODULE_FILE_NAME);
        if !path.exists() {
            return Err(ObfError::MissingModuleFile(path));
        }
        let text = fs::read_to_string(&path).map_err(|source| ObfError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(path, text)
    }

    pub fn parse(path: PathBuf, text: String) -> Result<Self> {
        let found = text.lines().enumerate().find_map(|(index, line)| {
            module_directive()
                .captures(line)
                .map(|caps| (index, caps[1].trim_matches(|c| c == '"' || c == '`').to_string()))
        });

        match found {
            Some((module_line, module_path)) if !module_path.is_empty() => Ok(Self {
                path,
                text,
                module_path,
                module_line,
            }),
            _ => Err(ObfError::MalformedModuleFile {
                path,
                reason: "no module directive".to_string(),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The project's module path, e.g. `example.com/app`.
    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    /// True when the module declares any dependency.
    pub fn has_requirements(&self) -> bool {
        self.text.lines().any(|line| require_directive().is_match(line))
    }

    /// Descriptor text for the output tree.
    ///
    /// The module directive names `module`, and filesystem replacement targets
    /// are made absolute against `project_dir` since the tree is written
    /// elsewhere.
    pub fn rewrite(&self, module: &str, project_dir: &Path) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut in_replace_block = false;

        for (index, line) in self.text.lines().enumerate() {
            if index == self.module_line {
                out.push_str("module ");
                out.push_str(module);
                out.push('\n');
                continue;
            }

            let trimmed = line.trim_start();
            let is_replace = if in_replace_block {
                if trimmed.starts_with(')') {
                    in_replace_block = false;
                    false
                } else {
                    true
                }
            } else if let Some(rest) = trimmed.strip_prefix("replace") {
                if rest.trim_start().starts_with('(') {
                    in_replace_block = true;
                    false
                } else {
                    rest.starts_with(char::is_whitespace)
                }
            } else {
                false
            };

            if is_replace {
                out.push_str(&absolutize_replacement(line, project_dir));
            } else {
                out.push_str(line);
            }
            out.push('\n');
        }
        out
    }

    /// Write the rewritten descriptor into `out_dir`.
    pub fn write_rewritten(&self, out_dir: &Path, module: &str, project_dir: &Path) -> Result<()> {
        let target = out_dir.join(MODULE_FILE_NAME);
        fs::write(&target, self.rewrite(module, project_dir)).map_err(|source| ObfError::Write {
            path: target,
            source,
        })
    }
}

fn absolutize_replacement(line: &str, project_dir: &Path) -> String {
    let Some(caps) = replace_target().captures(line) else {
        return line.to_string();
    };
    let Some(target) = caps.get(1) else {
        return line.to_string();
    };
    if !is_local_replacement(target.as_str()) {
        return line.to_string();
    }

    let absolute = path_to_string(&absolutize(project_dir, target.as_str()));
    debug!("Replacement {} now points at {}", target.as_str(), absolute);
    format!("{}{}{}", &line[..target.start()], absolute, &line[target.end()..])
}

/// Copy `go.sum` into `out_dir`.
///
/// A missing lock file is only an error when the module has requirements.
pub fn copy_sum_file(project_dir: &Path, out_dir: &Path, required: bool) -> Result<bool> {
    let source = project_dir.join(SUM_FILE_NAME);
    if !source.exists() {
        if required {
            return Err(ObfError::MissingSumFile(source));
        }
        debug!("No {} to copy", SUM_FILE_NAME);
        return Ok(false);
    }

    let data = fs::read(&source).map_err(|err| ObfError::Read {
        path: source.clone(),
        source: err,
    })?;
    let target = out_dir.join(SUM_FILE_NAME);
    fs::write(&target, data).map_err(|source| ObfError::Write {
        path: target,
        source,
    })?;
    Ok(true)
}
