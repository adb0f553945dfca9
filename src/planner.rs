//! Output path planning.
//! Decides which templates apply to a package and computes every path the
//! generator can produce, independent of whether a generation pass has run.

use crate::config::{strip_template_suffix, Config, TemplateDef};
use crate::constants::{DOCUMENT_OUTPUT_EXT, DOCUMENT_TEMPLATES, SCRIPTS_DIR};
use crate::context::{build_context, Context};
use log::warn;
use std::collections::BTreeSet;

/// A template selected for rendering, with its output path relative to the
/// package directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTemplate {
    pub source: String,
    pub destination: String,
}

impl From<&TemplateDef> for PlannedTemplate {
    fn from(def: &TemplateDef) -> Self {
        Self { source: def.src.clone(), destination: def.destination() }
    }
}

/// Returns true if every `when` flag of `def` is truthy in `context`.
pub fn is_applicable(def: &TemplateDef, context: &Context) -> bool {
    def.when.iter().all(|flag| context.flag(flag))
}

/// Selects the templates to render for one package, preserving manifest order.
///
/// Packages with documents always get the document companion templates first.
pub fn applicable_templates(defs: &[TemplateDef], context: &Context) -> Vec<PlannedTemplate> {
    let mut planned = Vec::new();
    if context.package.has_pdfs {
        planned.extend(DOCUMENT_TEMPLATES.iter().map(|src| PlannedTemplate {
            source: src.to_string(),
            destination: strip_template_suffix(src).to_string(),
        }));
    }
    for def in defs {
        if context.package.has_pdfs && DOCUMENT_TEMPLATES.contains(&def.src.as_str()) {
            continue;
        }
        if is_applicable(def, context) {
            planned.push(PlannedTemplate::from(def));
        }
    }
    planned
}

/// Glob matching the artifacts built from one document, e.g. `guide*.pdf`.
pub fn document_output_pattern(document: &str) -> String {
    let stem = match document.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains('/') => stem,
        _ => document,
    };
    format!("{stem}*.{DOCUMENT_OUTPUT_EXT}")
}

/// Every path one package can produce, relative to its package directory.
pub fn package_outputs(defs: &[TemplateDef], context: &Context) -> BTreeSet<String> {
    let package = &context.package;
    let mut paths: BTreeSet<String> =
        applicable_templates(defs, context).into_iter().map(|t| t.destination).collect();

    paths.extend(package.copy_files.iter().map(|copy| copy.dest.clone()));
    if package.deps_script.values().any(|scripts| !scripts.is_empty()) {
        paths.insert(format!("{SCRIPTS_DIR}/"));
    }
    paths.extend(package.pdfs.iter().map(|doc| document_output_pattern(doc)));
    if let Some(archive) = &package.package_name {
        paths.insert(archive.clone());
    }
    paths
}

/// Prefixes a package-relative path with the package directory.
pub fn prefixed(package_dir: &str, path: &str) -> String {
    format!("{}/{}", package_dir.trim_end_matches('/'), path)
}

/// The sorted, deduplicated set of paths every package in the manifest can
/// produce, each prefixed by its package directory.
///
/// Packages that fail validation are skipped with a warning; a manifest
/// without packages yields an empty set.
pub fn all_generated_paths(config: &Config) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();
    for package_id in config.packages.iter().flat_map(|packages| packages.keys()) {
        let context = match build_context(package_id, config) {
            Ok(context) => context,
            Err(e) => {
                warn!("Skipping package {}: {}", package_id, e);
                continue;
            }
        };
        let dir = &context.package.package_dir;
        paths.extend(
            package_outputs(&config.templates, &context)
                .iter()
                .map(|path| prefixed(dir, path)),
        );
    }
    paths
}
