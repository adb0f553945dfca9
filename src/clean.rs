//! Removal of generated output.
//! Files are deleted deepest first, then directories left empty are pruned.
//! Package root directories and directories still holding other content are
//! never removed. Generated directories are resolved to the files stencil put
//! there, never to everything below them.

use crate::config::Config;
use crate::constants::SCRIPTS_DIR;
use crate::context::{build_context, Context};
use crate::error::{Error, Result};
use crate::operation::FileOperation;
use crate::planner::package_outputs;
use crate::resources::Resources;
use globset::GlobBuilder;
use log::{debug, warn};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Which packages to clean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanTarget {
    All,
    Package(String),
}

/// Outcome of a cleanup pass; in dry-run mode it lists what would happen.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub removed_files: Vec<PathBuf>,
    pub removed_dirs: Vec<PathBuf>,
    pub kept_dirs: Vec<PathBuf>,
}

/// Generated paths resolved against the filesystem.
#[derive(Default)]
struct Resolved {
    files: BTreeSet<PathBuf>,
    dirs: BTreeSet<PathBuf>,
}

/// Removes the generated output of `target` below `output_root`.
///
/// `resources` tells which files a copied directory brought in.
///
/// # Errors
/// * `Error::UnknownPackage` or another validation error when cleaning a single
///   package that is not valid
/// * `Error::ConfigError` if the manifest has no `packages` section
/// * `Error::GlobError` / `Error::IoError` if resolving or removing fails
pub fn clean<P: AsRef<Path>>(
    config: &Config,
    resources: &Resources,
    target: &CleanTarget,
    output_root: P,
    dry_run: bool,
) -> Result<CleanReport> {
    let output_root = output_root.as_ref();
    let contexts = match target {
        CleanTarget::Package(package_id) => vec![build_context(package_id, config)?],
        CleanTarget::All => {
            let mut contexts = Vec::new();
            for package_id in config.packages()?.keys() {
                match build_context(package_id, config) {
                    Ok(context) => contexts.push(context),
                    Err(e) => warn!("Skipping package {}: {}", package_id, e),
                }
            }
            contexts
        }
    };

    let mut resolved = Resolved::default();
    for context in &contexts {
        resolve_package(config, resources, context, output_root, &mut resolved)?;
    }

    let mut report = CleanReport::default();
    let mut removed: HashSet<PathBuf> = HashSet::new();

    for file in sorted_deepest_first(resolved.files) {
        FileOperation::Remove { target: file.clone() }.apply(dry_run)?;
        removed.insert(file.clone());
        report.removed_files.push(file);
    }

    for dir in sorted_deepest_first(resolved.dirs) {
        if !dir.is_dir() {
            continue;
        }
        if is_effectively_empty(&dir, &removed)? {
            FileOperation::RemoveDir { target: dir.clone() }.apply(dry_run)?;
            removed.insert(dir.clone());
            report.removed_dirs.push(dir);
        } else {
            println!("Skipping non-empty directory: {}", dir.display());
            report.kept_dirs.push(dir);
        }
    }

    Ok(report)
}

fn resolve_package(
    config: &Config,
    resources: &Resources,
    context: &Context,
    output_root: &Path,
    resolved: &mut Resolved,
) -> Result<()> {
    let package = &context.package;
    if !is_contained(&package.package_dir) {
        warn!(
            "Skipping package {}: directory {} leaves the output root",
            package.package_id, package.package_dir
        );
        return Ok(());
    }
    let package_root = output_root.join(&package.package_dir);
    let scripts_marker = format!("{SCRIPTS_DIR}/");

    for entry in package_outputs(&config.templates, context) {
        if !is_contained(&entry) {
            warn!(
                "Skipping {} in package {}: outside the package directory",
                entry, package.package_id
            );
            continue;
        }

        if entry == scripts_marker {
            let scripts_root = package_root.join(SCRIPTS_DIR);
            resolved.dirs.insert(scripts_root.clone());
            for script in package.deps_script.values().flatten() {
                if is_contained(script) {
                    add_path(&scripts_root.join(script), &package_root, resolved);
                } else {
                    warn!(
                        "Skipping script {} in package {}: outside the scripts directory",
                        script, package.package_id
                    );
                }
            }
            continue;
        }

        if let Some(copy) = package.copy_files.iter().find(|copy| copy.dest == entry) {
            let source = resources.files().join(&copy.src);
            resolve_copy(&source, &package_root.join(&entry), &package_root, resolved)?;
            continue;
        }

        if is_glob(&entry) {
            for path in expand_glob(&package_root, &entry)? {
                add_path(&path, &package_root, resolved);
            }
        } else {
            add_path(&package_root.join(&entry), &package_root, resolved);
        }
    }
    Ok(())
}

/// Records one existing generated path. Directories only become pruning
/// candidates; their content is not claimed.
fn add_path(path: &Path, package_root: &Path, resolved: &mut Resolved) {
    match path.symlink_metadata() {
        Ok(metadata) if metadata.is_dir() => {
            add_ancestors(path, package_root, &mut resolved.dirs);
            if path != package_root {
                resolved.dirs.insert(path.to_path_buf());
            }
        }
        Ok(_) => {
            add_ancestors(path, package_root, &mut resolved.dirs);
            resolved.files.insert(path.to_path_buf());
        }
        Err(_) => debug!("Not present: {}", path.display()),
    }
}

/// Maps the bundled copy source onto its destination. Only paths that exist
/// in the source tree are claimed, so files added under `target` survive.
fn resolve_copy(
    source: &Path,
    target: &Path,
    package_root: &Path,
    resolved: &mut Resolved,
) -> Result<()> {
    add_path(target, package_root, resolved);
    if !source.is_dir() {
        return Ok(());
    }
    for entry in WalkDir::new(source).min_depth(1) {
        let Some(entry) = tolerate_vanished(entry)? else {
            continue;
        };
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        add_path(&target.join(relative), package_root, resolved);
    }
    Ok(())
}

/// Records the ancestors of `path` strictly below `package_root`.
fn add_ancestors(path: &Path, package_root: &Path, dirs: &mut BTreeSet<PathBuf>) {
    for ancestor in path.ancestors().skip(1) {
        if ancestor == package_root || !ancestor.starts_with(package_root) {
            break;
        }
        dirs.insert(ancestor.to_path_buf());
    }
}

/// True for relative paths that stay below the directory they are joined to.
fn is_contained(relative: &str) -> bool {
    Path::new(relative)
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

fn is_glob(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}

/// Expands a glob relative to `package_root` against the filesystem.
fn expand_glob(package_root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| Error::GlobError { pattern: pattern.to_string(), source })?
        .compile_matcher();

    // Walk only below the literal directory prefix, and no deeper than the
    // pattern reaches unless it contains `**`.
    let segments: Vec<&str> = pattern.split('/').collect();
    let literal: PathBuf = segments.iter().take_while(|segment| !is_glob(segment)).collect();
    let walk_root = package_root.join(&literal);
    if !walk_root.is_dir() {
        return Ok(Vec::new());
    }

    let mut walker = WalkDir::new(&walk_root).min_depth(1);
    if !pattern.contains("**") {
        walker = walker.max_depth(segments.len() - literal.components().count());
    }

    let mut matches = Vec::new();
    for entry in walker {
        let Some(entry) = tolerate_vanished(entry)? else {
            continue;
        };
        let Ok(relative) = entry.path().strip_prefix(package_root) else {
            continue;
        };
        if matcher.is_match(to_slash(relative)) {
            matches.push(entry.path().to_path_buf());
        }
    }
    Ok(matches)
}

/// Skips entries removed between listing and inspection.
fn tolerate_vanished(
    entry: walkdir::Result<walkdir::DirEntry>,
) -> Result<Option<walkdir::DirEntry>> {
    match entry {
        Ok(entry) => Ok(Some(entry)),
        Err(e) if e.io_error().is_some_and(|io| io.kind() == io::ErrorKind::NotFound) => {
            debug!("Vanished during cleanup: {}", e);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn sorted_deepest_first(paths: BTreeSet<PathBuf>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = paths.into_iter().collect();
    paths.sort_by(|a, b| {
        b.components().count().cmp(&a.components().count()).then_with(|| a.cmp(b))
    });
    paths
}

/// True if every entry of `dir` has been (or, in dry-run, would have been) removed.
fn is_effectively_empty(dir: &Path, removed: &HashSet<PathBuf>) -> Result<bool> {
    for entry in fs::read_dir(dir)? {
        if !removed.contains(&entry?.path()) {
            return Ok(false);
        }
    }
    Ok(true)
}
