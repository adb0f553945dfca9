//! stencil is a configuration-driven scaffolding generator.
//! It renders per-package templates described by a YAML manifest, copies
//! auxiliary scripts and static files, and can clean up or gitignore
//! everything it generates.

/// Cleanup of generated output
pub mod clean;

/// Command-line interface module for the stencil application
pub mod cli;

/// Command dispatch used by the binary
pub mod commands;

/// Manifest loading and the package/template data model
pub mod config;

/// Common constants
pub mod constants;

/// Render context construction and package validation
pub mod context;

/// Error types and handling for the stencil application
pub mod error;

/// Package generation
pub mod generate;

/// Marker-delimited block management in `.gitignore`
pub mod ignore;

/// Logger initialization
pub mod logger;

/// Filesystem operations with dry-run support
pub mod operation;

/// Template selection and generated path computation
pub mod planner;

/// Template rendering
pub mod renderer;

/// Bundled resource tree location
pub mod resources;
