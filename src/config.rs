//! Manifest handling for stencil.
//! This module loads the YAML manifest into a package registry and a global
//! template list. Fields accepting either a single item or a list are resolved
//! into list form while deserializing, so nothing downstream branches on shape.

use crate::constants::TEMPLATE_SUFFIX;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// A manifest value written either as a bare item or as a list of items.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let value: Option<OneOrMany<T>> = Option::deserialize(deserializer)?;
    Ok(value.map(Vec::from).unwrap_or_default())
}

fn script_lists<'de, D>(
    deserializer: D,
) -> std::result::Result<IndexMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<IndexMap<String, OneOrMany<String>>> = Option::deserialize(deserializer)?;
    Ok(value
        .unwrap_or_default()
        .into_iter()
        .map(|(os, scripts)| (os, scripts.into()))
        .collect())
}

/// One static file or directory copied from the resources `files/` tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCopyFile")]
pub struct CopyFile {
    pub src: String,
    pub dest: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCopyFile {
    Name(String),
    Mapping {
        #[serde(alias = "source")]
        src: String,
        #[serde(default, alias = "destination")]
        dest: Option<String>,
    },
}

impl From<RawCopyFile> for CopyFile {
    fn from(raw: RawCopyFile) -> Self {
        match raw {
            RawCopyFile::Name(name) => CopyFile { dest: name.clone(), src: name },
            RawCopyFile::Mapping { src, dest } => {
                CopyFile { dest: dest.unwrap_or_else(|| src.clone()), src }
            }
        }
    }
}

/// One entry of the global `templates` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateDef {
    #[serde(alias = "source")]
    pub src: String,
    #[serde(default, alias = "destination")]
    pub dest: Option<String>,
    /// Context flags that must all be truthy for the template to apply
    #[serde(default, deserialize_with = "one_or_many")]
    pub when: Vec<String>,
}

impl TemplateDef {
    /// Creates an unconditional template definition with the default destination.
    pub fn new<S: Into<String>>(src: S) -> Self {
        Self { src: src.into(), dest: None, when: Vec::new() }
    }

    /// Output path relative to the package directory.
    pub fn destination(&self) -> String {
        match &self.dest {
            Some(dest) => dest.clone(),
            None => strip_template_suffix(&self.src).to_string(),
        }
    }
}

/// Removes the template suffix from a template source name, if present.
pub fn strip_template_suffix(src: &str) -> &str {
    src.strip_suffix(TEMPLATE_SUFFIX).unwrap_or(src)
}

/// A package definition as written in the manifest.
///
/// Validation of `package_type` and `package_name` is deferred to context
/// construction so that one broken package does not prevent loading the rest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Package {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "output_subdirectory")]
    pub dir: Option<String>,
    #[serde(default, alias = "type")]
    pub package_type: Option<serde_json::Value>,
    #[serde(default, alias = "archive_name")]
    pub package_name: Option<String>,
    #[serde(default)]
    pub package_folder: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub services: Vec<String>,
    #[serde(default, alias = "documents", deserialize_with = "one_or_many")]
    pub pdfs: Vec<String>,
    #[serde(default, alias = "database_import", deserialize_with = "one_or_many")]
    pub sql_import: Vec<serde_json::Value>,
    #[serde(default, alias = "auxiliary_scripts", deserialize_with = "script_lists")]
    pub deps_script: IndexMap<String, Vec<String>>,
    #[serde(default, alias = "static_copies", deserialize_with = "one_or_many")]
    pub copy_files: Vec<CopyFile>,
    #[serde(default, alias = "vars")]
    pub template_variables: IndexMap<String, serde_json::Value>,
}

/// The parsed manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub templates_dir: Vec<PathBuf>,
    #[serde(default)]
    pub templates: Vec<TemplateDef>,
    #[serde(default)]
    pub packages: Option<IndexMap<String, Package>>,
    /// Directory containing the manifest; relative `templates_dir` entries resolve against it
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Config {
    /// Loads the manifest at `path`.
    ///
    /// # Errors
    /// * `Error::ConfigError` if the file cannot be read or is empty
    /// * `Error::ConfigParseError` if the content is not a valid manifest
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(&content, base_dir).map_err(|e| match e {
            Error::ConfigParseError { source, .. } => {
                Error::ConfigParseError { path: path.display().to_string(), source }
            }
            other => other,
        })
    }

    /// Parses manifest content, resolving relative paths against `base_dir`.
    pub fn parse<P: Into<PathBuf>>(content: &str, base_dir: P) -> Result<Self> {
        if content.trim().is_empty() {
            return Err(Error::ConfigError("configuration file is empty".to_string()));
        }
        let mut config: Config = serde_yaml::from_str(content).map_err(|source| {
            Error::ConfigParseError { path: "<manifest>".to_string(), source }
        })?;
        config.base_dir = base_dir.into();
        Ok(config)
    }

    /// Returns the package registry.
    ///
    /// # Errors
    /// * `Error::ConfigError` if the manifest has no `packages` section
    pub fn packages(&self) -> Result<&IndexMap<String, Package>> {
        self.packages
            .as_ref()
            .ok_or_else(|| Error::ConfigError("'packages' is required in config".to_string()))
    }

    /// Returns the package registry, treating a missing section as empty.
    pub fn packages_or_empty(&self) -> IndexMap<String, Package> {
        self.packages.clone().unwrap_or_default()
    }

    /// Template search roots: configured `templates_dir` entries first, then
    /// the bundled templates root unless it is already listed.
    pub fn template_search_path<P: AsRef<Path>>(&self, bundled: P) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> =
            self.templates_dir.iter().map(|dir| self.base_dir.join(dir)).collect();
        let bundled = bundled.as_ref().to_path_buf();
        if !roots.iter().any(|root| same_path(root, &bundled)) {
            roots.push(bundled);
        }
        roots
    }

    /// Directory under which package directories are created.
    ///
    /// Relative `output_dir` values resolve against the current working directory.
    pub fn output_root(&self) -> Result<PathBuf> {
        let cwd = std::env::current_dir()?;
        Ok(match &self.output_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => cwd.join(dir),
            None => cwd,
        })
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
