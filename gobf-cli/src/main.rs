//! gobf CLI
//!
//! Command-line interface for obfuscating Go projects and building the
//! obfuscated binaries.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use gobf_core::{GoBuild, ObfuscationResult, Obfuscator, ObfuscatorConfig};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gobf")]
#[command(about = "Whole-project Go source obfuscator")]
#[command(version)]
struct Cli {
    /// Log debug detail (cache hits, per-file progress)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ProjectArgs {
    /// Package to obfuscate, relative to the project directory
    #[arg(default_value = ".")]
    package: String,

    /// Directory holding go.mod (default: current directory)
    #[arg(long)]
    project_dir: Option<PathBuf>,

    /// Configuration file (default: gobf.toml in the project directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the obfuscated source tree without building it
    Obfuscate {
        #[command(flatten)]
        project: ProjectArgs,

        /// Output directory for the obfuscated tree
        #[arg(long)]
        out_dir: PathBuf,
    },

    /// Obfuscate into a build directory and compile it with `go build`
    Build {
        #[command(flatten)]
        project: ProjectArgs,

        /// Path of the output binary
        #[arg(short, long)]
        output: PathBuf,

        /// GOFLAGS for the downstream build (default: [build] flags from config)
        #[arg(long)]
        go_flags: Option<String>,

        /// Build directory (default: a fresh temporary directory)
        #[arg(long, env = "OBF_BUILD_DIR")]
        build_dir: Option<PathBuf>,

        /// Keep the temporary build directory after building
        #[arg(long)]
        keep_build_dir: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("gobf={level}").parse()?)
                .add_directive(format!("gobf_core={level}").parse()?),
        )
        .init();

    match cli.command {
        Commands::Obfuscate { project, out_dir } => {
            cmd_obfuscate(project, out_dir)?;
        }
        Commands::Build {
            project,
            output,
            go_flags,
            build_dir,
            keep_build_dir,
        } => {
            cmd_build(project, output, go_flags, build_dir, keep_build_dir)?;
        }
    }

    Ok(())
}

fn load_obfuscator(project: &ProjectArgs) -> Result<Obfuscator> {
    let project_dir = match &project.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let config = ObfuscatorConfig::discover(&project_dir, project.config.as_deref())?;
    Ok(Obfuscator::new(config, project_dir))
}

fn print_summary(result: &ObfuscationResult) {
    println!(
        "Obfuscated {} packages ({} files, {} embedded resources)",
        result.packages, result.files, result.embeds
    );
    println!(
        "  {} identifiers renamed, {} strings protected",
        result.identifiers_renamed, result.strings_protected
    );
}

/// Write the obfuscated tree only
fn cmd_obfuscate(project: ProjectArgs, out_dir: PathBuf) -> Result<()> {
    let obfuscator = load_obfuscator(&project)?;
    let result = obfuscator
        .obfuscate(&project.package, &out_dir)
        .with_context(|| format!("Failed to obfuscate {}", project.package))?;

    print_summary(&result);
    println!("Obfuscated in {}", result.out_dir.display());
    Ok(())
}

/// Obfuscate, then compile the obfuscated tree
fn cmd_build(
    project: ProjectArgs,
    output: PathBuf,
    go_flags: Option<String>,
    build_dir: Option<PathBuf>,
    keep_build_dir: bool,
) -> Result<()> {
    let obfuscator = load_obfuscator(&project)?;

    // A user-supplied build directory is never removed; a temporary one is
    // removed on drop unless kept.
    let (tree_dir, temp): (PathBuf, Option<TempDir>) = match build_dir {
        Some(dir) => (dir, None),
        None => {
            let temp = tempfile::Builder::new()
                .prefix("go-obf-build")
                .tempdir()
                .context("Failed to create build directory")?;
            (temp.path().to_path_buf(), Some(temp))
        }
    };

    let result = obfuscator
        .obfuscate(&project.package, &tree_dir)
        .with_context(|| format!("Failed to obfuscate {}", project.package))?;
    print_summary(&result);
    println!("Obfuscated in {}", tree_dir.display());
    println!("Building...");

    let output = absolute(&output)?;
    let flags = go_flags.unwrap_or_else(|| obfuscator.config().build.flags.clone());
    let status = GoBuild::new(obfuscator.config().build.go.clone(), &tree_dir, &output)
        .go_flags(flags)
        .run()
        .context("Failed to run go build")?;

    if keep_build_dir {
        if let Some(temp) = temp {
            let kept = temp.keep();
            println!("Build directory kept at {}", kept.display());
        }
    }

    if !status.success() {
        bail!("go build failed ({})", status);
    }
    println!("Built {}", output.display());
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("Failed to get current directory")?
            .join(path))
    }
}
