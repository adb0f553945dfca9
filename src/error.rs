//! Error handling for the stencil application.
//! Defines custom error types and results used throughout the application.

use std::io;
use thiserror::Error;

/// Custom error types for stencil operations.
///
/// This enum represents all possible errors that can occur within the stencil application.
/// It implements the standard Error trait through thiserror's derive macro.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// Represents a missing or malformed section of the manifest
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The manifest could not be parsed as YAML
    #[error("Failed to parse '{path}': {source}")]
    ConfigParseError {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The requested package is not declared in the manifest
    #[error("Unknown package: {0}")]
    UnknownPackage(String),

    /// A required package field is absent
    #[error("Package {package} is missing required '{field}'")]
    MissingField { package: String, field: &'static str },

    /// A package field holds an unsupported value
    #[error("Package {package} has invalid {field}: {value}")]
    InvalidField { package: String, field: &'static str, value: String },

    /// Rendering one template failed
    #[error("Error rendering {template}: {source}")]
    RenderError {
        template: String,
        #[source]
        source: minijinja::Error,
    },

    /// A generated path contains an invalid glob pattern
    #[error("Invalid glob pattern '{pattern}': {source}")]
    GlobError {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// The ignore-file block pattern failed to compile
    #[error("Pattern error: {0}")]
    PatternError(#[from] regex::Error),

    /// Represents errors that occur while walking a directory tree
    #[error("Failed to walk directory: {0}")]
    WalkDirError(#[from] walkdir::Error),

    /// The render context could not be serialized
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// One or more packages failed during `gen --all`
    #[error("{failed} package(s) failed to generate")]
    PackagesFailed { failed: usize },
}

impl Error {
    /// Returns true for errors that describe an invalid or unknown package.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::UnknownPackage(_) | Error::MissingField { .. } | Error::InvalidField { .. }
        )
    }
}

/// Convenience type alias for Results with stencil's Error as the error type.
///
/// # Type Parameters
/// * `T` - The type of the success value
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) -> ! {
    eprintln!("Error: {err}");
    std::process::exit(1);
}
