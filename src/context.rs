//! Render context construction.
//! Validates one package definition and derives the variables visible to its
//! templates, including the boolean flags used by `when` conditions.

use crate::config::{Config, CopyFile};
use crate::constants::DEFAULT_PACKAGE_FOLDER;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::warn;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Kind of artifact a package produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    /// Documents rendered to PDF
    Pdf,
    /// A single archive named by `package_name`
    Zip,
    None,
}

impl PackageType {
    /// Parses a manifest type name, accepting the long-form aliases.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pdf" | "document" => Some(Self::Pdf),
            "zip" | "archive" => Some(Self::Zip),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackageType::Pdf => "pdf",
            PackageType::Zip => "zip",
            PackageType::None => "none",
        };
        f.write_str(name)
    }
}

/// Built-in context fields derived from a package definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageContext {
    pub package_id: String,
    pub name: String,
    pub package_name: Option<String>,
    pub package_dir: String,
    pub package_type: PackageType,
    pub package_folder: String,
    pub pdfs: Vec<String>,
    pub has_pdfs: bool,
    pub services: Vec<String>,
    pub has_web: bool,
    pub has_mysql: bool,
    pub has_services: bool,
    pub sql_import: Vec<Value>,
    pub deps_script: IndexMap<String, Vec<String>>,
    pub copy_files: Vec<CopyFile>,
    pub template_variables: IndexMap<String, Value>,
}

/// Everything a package's templates can see.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    pub package: PackageContext,
    values: Map<String, Value>,
}

impl Context {
    /// Looks up a context variable by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Evaluates a `when` flag. Unknown names are false.
    pub fn flag(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(is_truthy)
    }

    /// The merged mapping handed to the template renderer.
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

/// Jinja truthiness for JSON values.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Builds the render context for `package_id`.
///
/// # Errors
/// * `Error::UnknownPackage` if the manifest does not declare the package
/// * `Error::MissingField` / `Error::InvalidField` if `package_type` is absent
///   or unsupported, or a `zip` package lacks `package_name`
/// * `Error::ConfigError` if the manifest has no `packages` section
pub fn build_context(package_id: &str, config: &Config) -> Result<Context> {
    let package = config
        .packages()?
        .get(package_id)
        .ok_or_else(|| Error::UnknownPackage(package_id.to_string()))?;

    let package_type = match &package.package_type {
        None | Some(Value::Null) => {
            return Err(Error::MissingField {
                package: package_id.to_string(),
                field: "package_type",
            })
        }
        Some(value) => value.as_str().and_then(PackageType::parse).ok_or_else(|| {
            Error::InvalidField {
                package: package_id.to_string(),
                field: "package_type",
                value: value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string()),
            }
        })?,
    };

    let package_name = package.package_name.clone().filter(|name| !name.is_empty());
    if package_type == PackageType::Zip && package_name.is_none() {
        return Err(Error::MissingField {
            package: package_id.to_string(),
            field: "package_name",
        });
    }

    let services = package.services.clone();
    let fields = PackageContext {
        package_id: package_id.to_string(),
        name: package.name.clone().unwrap_or_else(|| package_id.to_string()),
        package_name,
        package_dir: package.dir.clone().unwrap_or_else(|| package_id.to_string()),
        package_type,
        package_folder: package
            .package_folder
            .clone()
            .unwrap_or_else(|| DEFAULT_PACKAGE_FOLDER.to_string()),
        pdfs: package.pdfs.clone(),
        has_pdfs: !package.pdfs.is_empty(),
        has_web: services.iter().any(|s| s == "web"),
        has_mysql: services.iter().any(|s| s == "mysql"),
        has_services: !services.is_empty(),
        services,
        sql_import: package.sql_import.clone(),
        deps_script: package.deps_script.clone(),
        copy_files: package.copy_files.clone(),
        template_variables: package.template_variables.clone(),
    };

    let mut values = match serde_json::to_value(&fields)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in &fields.template_variables {
        if values.contains_key(key) {
            warn!(
                "Package {}: template variable '{}' shadows a built-in value and is ignored",
                package_id, key
            );
            continue;
        }
        values.insert(key.clone(), value.clone());
    }

    Ok(Context { package: fields, values })
}
