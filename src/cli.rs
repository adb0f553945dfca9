//! Command-line interface implementation for stencil.
//! Provides argument parsing and help text formatting using clap.

use crate::constants::{DEFAULT_CONFIG_FILE, DEFAULT_IGNORE_FILE};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments structure for stencil.
#[derive(Parser, Debug)]
#[command(author, version, about = "stencil: generate package scaffolding from templates", long_about = None)]
pub struct Args {
    /// Path to the manifest file
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Show what would happen without touching the filesystem
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding bundled templates/, scripts/ and files/.
    /// Defaults to the directory containing the manifest.
    #[arg(long, global = true, value_name = "DIR", env = "STENCIL_RESOURCES")]
    pub resources: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Generate files for a package
    Gen {
        /// Generate every package in the manifest
        #[arg(long)]
        all: bool,

        /// Package ID; without it (and without --all) the help is shown
        #[arg(value_name = "PACKAGE", conflicts_with = "all")]
        package: Option<String>,
    },

    /// Remove generated files for a package
    Clean {
        /// Clean every package in the manifest
        #[arg(long)]
        all: bool,

        /// Package ID
        #[arg(value_name = "PACKAGE", required_unless_present = "all", conflicts_with = "all")]
        package: Option<String>,
    },

    /// Install or update the generated-path block in the ignore file
    Install {
        /// Ignore file to update
        #[arg(long, value_name = "PATH", default_value = DEFAULT_IGNORE_FILE)]
        ignore_file: PathBuf,
    },

    /// List available packages
    List,
}

/// Parses command line arguments and returns the Args structure.
///
/// # Returns
/// * `Args` - Parsed command line arguments
///
/// # Exits
/// * With status code 1 and the help text if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if matches!(
                e.kind(),
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::MissingSubcommand
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) {
                eprintln!("{e}");
                let _ = Args::command().print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
