//! Downstream `go build` invocation on an obfuscated tree.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use tracing::{info, warn};

use crate::error::{ObfError, Result};

/// Linker flags that drop symbol tables, DWARF, and the build id.
pub const STRIP_LDFLAGS: &str = "-w -s -buildid=";

/// A `go build` of the tree rooted at `tree_dir`.
#[derive(Debug, Clone)]
pub struct GoBuild {
    go: String,
    tree_dir: PathBuf,
    output: PathBuf,
    go_flags: String,
}

impl GoBuild {
    pub fn new(go: impl Into<String>, tree_dir: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            go: go.into(),
            tree_dir: tree_dir.into(),
            output: output.into(),
            go_flags: String::new(),
        }
    }

    /// Value passed through the `GOFLAGS` environment variable.
    pub fn go_flags(mut self, flags: impl Into<String>) -> Self {
        self.go_flags = flags.into();
        self
    }

    /// Arguments after the program name.
    pub fn args(&self) -> Vec<OsString> {
        vec![
            "build".into(),
            "-trimpath".into(),
            "-ldflags".into(),
            STRIP_LDFLAGS.into(),
            "-buildvcs=false".into(),
            "-o".into(),
            self.output.clone().into_os_string(),
            ".".into(),
        ]
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.go);
        command
            .args(self.args())
            .current_dir(&self.tree_dir)
            .env("GOFLAGS", &self.go_flags);
        command
    }

    /// Run the build with inherited stdout and stderr.
    ///
    /// A failing compiler is reported through the returned status; only a
    /// failure to start it is an error.
    pub fn run(&self) -> Result<ExitStatus> {
        info!("Building {} from {}", self.output.display(), self.tree_dir.display());
        let status = self.command().status().map_err(|source| ObfError::Spawn {
            program: self.go.clone(),
            source,
        })?;
        if !status.success() {
            warn!("{} build exited with {}", self.go, status);
        }
        Ok(status)
    }
}
