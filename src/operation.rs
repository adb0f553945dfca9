//! Filesystem side effects planned by the generator and the cleanup pass.
//! Every mutation goes through [`FileOperation::apply`], which in dry-run mode
//! reports the action instead of performing it.

use crate::error::Result;
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A single filesystem action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOperation {
    /// Create a directory and its parents
    CreateDir { target: PathBuf },
    /// Write rendered content, creating parent directories
    Write { target: PathBuf, content: String },
    /// Copy a single file, creating parent directories
    Copy { source: PathBuf, target: PathBuf },
    /// Copy a directory tree, replacing any existing target directory
    CopyDir { source: PathBuf, target: PathBuf },
    /// Remove a file; a file that is already gone is skipped
    Remove { target: PathBuf },
    /// Remove an empty directory; a directory that is already gone is skipped
    RemoveDir { target: PathBuf },
}

impl FileOperation {
    /// The path this operation creates or removes.
    pub fn target(&self) -> &Path {
        match self {
            FileOperation::CreateDir { target }
            | FileOperation::Write { target, .. }
            | FileOperation::Copy { target, .. }
            | FileOperation::CopyDir { target, .. }
            | FileOperation::Remove { target }
            | FileOperation::RemoveDir { target } => target,
        }
    }

    /// Performs the operation, or prints what it would do when `dry_run` is set.
    pub fn apply(&self, dry_run: bool) -> Result<()> {
        if dry_run {
            self.report();
            return Ok(());
        }
        match self {
            FileOperation::CreateDir { target } => {
                fs::create_dir_all(target)?;
                println!("Created directory: {}", target.display());
            }
            FileOperation::Write { target, content } => {
                create_parent(target)?;
                fs::write(target, content)?;
                println!("Generated: {}", target.display());
            }
            FileOperation::Copy { source, target } => {
                create_parent(target)?;
                fs::copy(source, target)?;
                println!("Copied: {}", target.display());
            }
            FileOperation::CopyDir { source, target } => {
                if target.exists() {
                    fs::remove_dir_all(target)?;
                }
                copy_dir(source, target)?;
                println!("Copied directory: {}", target.display());
            }
            FileOperation::Remove { target } => match fs::remove_file(target) {
                Ok(()) => println!("Removed: {}", target.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("Already removed: {}", target.display())
                }
                Err(e) => return Err(e.into()),
            },
            FileOperation::RemoveDir { target } => match fs::remove_dir(target) {
                Ok(()) => println!("Removed directory: {}", target.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("Already removed: {}", target.display())
                }
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }

    fn report(&self) {
        match self {
            FileOperation::CreateDir { target } => {
                println!("Would create directory: {}", target.display())
            }
            FileOperation::Write { target, content } => {
                println!("Would write: {}", target.display());
                println!("{}", "-".repeat(40));
                println!("{content}");
            }
            FileOperation::Copy { source, target } => {
                println!("Would copy file: {} -> {}", source.display(), target.display())
            }
            FileOperation::CopyDir { source, target } => {
                println!("Would copy directory: {} -> {}", source.display(), target.display())
            }
            FileOperation::Remove { target } => println!("Would remove: {}", target.display()),
            FileOperation::RemoveDir { target } => {
                println!("Would remove directory: {}", target.display())
            }
        }
    }
}

fn create_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn copy_dir(source: &Path, target: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let destination = target.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)?;
        } else {
            create_parent(&destination)?;
            fs::copy(entry.path(), &destination)?;
        }
    }
    Ok(())
}
