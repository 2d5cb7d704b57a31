//! Dev-command detection for `playground-detector`.
//!
//! `detect_dev_command(path)` inspects manifest files in a playground root and
//! returns the command that installs dependencies and starts a dev server.
//! Checks are ordered: the JavaScript manifest wins over Rust, Rust over Go.

use std::path::{Path, PathBuf};

use thiserror::Error;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A command derived from a manifest file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCommand {
    /// Manifest that triggered the match (e.g. `"package.json"`).
    pub manifest: &'static str,
    /// Shell command line to run from the playground root.
    pub command: String,
}

/// JavaScript package manager, chosen from the lockfile present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

impl PackageManager {
    pub fn as_str(self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Yarn => "yarn",
            PackageManager::Bun => "bun",
        }
    }
}

/// Errors from dev-command detection.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("'{path}' is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("no known manifest (package.json, Cargo.toml, go.mod) in '{path}'")]
    NoManifest { path: PathBuf },
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Detect the dev command for the playground rooted at `path`.
pub fn detect_dev_command(path: &Path) -> Result<DetectedCommand, DetectError> {
    if !path.is_dir() {
        return Err(DetectError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    if let Some(c) = detect_javascript(path) { return Ok(c); }
    if let Some(c) = detect_rust_crate(path) { return Ok(c); }
    if let Some(c) = detect_go(path) { return Ok(c); }

    Err(DetectError::NoManifest {
        path: path.to_path_buf(),
    })
}

/// Package manager implied by the lockfiles in `path`; npm when none match.
pub fn package_manager(path: &Path) -> PackageManager {
    if path.join("pnpm-lock.yaml").is_file() {
        PackageManager::Pnpm
    } else if path.join("yarn.lock").is_file() {
        PackageManager::Yarn
    } else if path.join("bun.lockb").is_file() || path.join("bun.lock").is_file() {
        PackageManager::Bun
    } else {
        PackageManager::Npm
    }
}

// ---------------------------------------------------------------------------
// Manifest detectors
// ---------------------------------------------------------------------------

fn detect_javascript(path: &Path) -> Option<DetectedCommand> {
    if !path.join("package.json").is_file() { return None; }
    let pm = package_manager(path).as_str();
    Some(DetectedCommand {
        manifest: "package.json",
        command: format!("{pm} install && {pm} run dev"),
    })
}

fn detect_rust_crate(path: &Path) -> Option<DetectedCommand> {
    if !path.join("Cargo.toml").is_file() { return None; }
    Some(DetectedCommand {
        manifest: "Cargo.toml",
        command: "cargo run".to_string(),
    })
}

fn detect_go(path: &Path) -> Option<DetectedCommand> {
    if !path.join("go.mod").is_file() { return None; }
    Some(DetectedCommand {
        manifest: "go.mod",
        command: "go mod download && go run .".to_string(),
    })
}
