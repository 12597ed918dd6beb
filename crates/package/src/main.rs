//! Packages the batch-print driver as one standalone executable.
//!
//! Cleans `build/` and `dist/`, builds the release binary into `build/`,
//! stages it in `dist/`, copies it to the workspace root and cleans up again.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

const PACKAGE: &str = "batch-print";

/// Build batch-print into a single executable at the workspace root
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Workspace root
    #[arg(long, default_value = ".")]
    workspace: PathBuf,

    /// Keep build/ and dist/ after packaging
    #[arg(long)]
    keep: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    batch_print_core::init_logging_with(if args.verbose { "debug" } else { "info" });

    let root = args
        .workspace
        .canonicalize()
        .with_context(|| format!("Workspace {:?} not found", args.workspace))?;
    if !root.join("Cargo.toml").is_file() {
        bail!("{:?} has no Cargo.toml", root);
    }

    let build = root.join("build");
    let dist = root.join("dist");

    clean(&[&build, &dist])?;
    let built = cargo_build(&root, &build)?;

    fs::create_dir_all(&dist)?;
    let staged = dist.join(executable_name());
    fs::copy(&built, &staged).with_context(|| format!("Failed to stage {:?}", built))?;

    let target = root.join(executable_name());
    fs::copy(&staged, &target).with_context(|| format!("Failed to copy to {:?}", target))?;

    if !args.keep {
        clean(&[&build, &dist])?;
    }

    println!("Packaged {}", target.display());
    Ok(())
}

fn executable_name() -> String {
    format!("{}{}", PACKAGE, std::env::consts::EXE_SUFFIX)
}

/// Remove transient directories, ignoring ones that don't exist.
fn clean(dirs: &[&Path]) -> Result<()> {
    for dir in dirs {
        if dir.exists() {
            debug!("Removing {:?}", dir);
            fs::remove_dir_all(dir).with_context(|| format!("Failed to remove {:?}", dir))?;
        }
    }
    Ok(())
}

/// Build the release binary and return its path.
fn cargo_build(root: &Path, target_dir: &Path) -> Result<PathBuf> {
    let cargo = which::which("cargo").context("cargo not found in PATH")?;
    info!("Building {} with {:?}", PACKAGE, cargo);

    let status = Command::new(&cargo)
        .current_dir(root)
        .args(["build", "--release", "-p", PACKAGE, "--target-dir"])
        .arg(target_dir)
        .status()
        .context("Failed to run cargo")?;
    if !status.success() {
        bail!("cargo build failed with {}", status);
    }

    let built = target_dir.join("release").join(executable_name());
    if !built.is_file() {
        bail!("Expected build output at {:?}", built);
    }
    Ok(built)
}
