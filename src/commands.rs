//! Command dispatch for the stencil binary.

use crate::clean::{clean, CleanTarget};
use crate::cli::{Args, Command};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::generate::Generator;
use crate::ignore::install;
use crate::renderer::MiniJinjaRenderer;
use crate::resources::Resources;
use clap::CommandFactory;

/// Runs the command selected on the command line.
///
/// # Flow
/// 1. Loads the manifest
/// 2. Requires a `packages` section for every command except `install`
/// 3. Dispatches to generation, cleanup, ignore-file registration or listing;
///    `gen` without a package prints the help and succeeds
pub fn run(args: Args) -> Result<()> {
    let config = Config::load(&args.config)?;

    match &args.command {
        Command::Install { ignore_file } => {
            install(&config, ignore_file, args.dry_run)?;
        }
        Command::List => {
            config.packages()?;
            print_packages(&config);
        }
        Command::Gen { all: false, package: None } => {
            config.packages()?;
            Args::command().print_help()?;
        }
        Command::Gen { all, package } => {
            config.packages()?;
            let package_id = package.as_deref().filter(|_| !*all);
            run_gen(&args, &config, package_id)?;
        }
        Command::Clean { all, package } => {
            config.packages()?;
            let target = match package {
                Some(package_id) if !*all => CleanTarget::Package(package_id.clone()),
                _ => CleanTarget::All,
            };
            run_clean(&args, &config, &target)?;
        }
    }
    Ok(())
}

/// Generates one package, or every package when `package_id` is `None`.
fn run_gen(args: &Args, config: &Config, package_id: Option<&str>) -> Result<()> {
    let resources = resources_for(args, config);
    let renderer = MiniJinjaRenderer::new(config.template_search_path(resources.templates()));
    let generator =
        Generator::new(config, &renderer, &resources, config.output_root()?, args.dry_run);

    let Some(package_id) = package_id else {
        generator.generate_all()?;
        return Ok(());
    };

    let output_dir = generator.generate(package_id).map_err(|e| with_listing(e, config))?;
    if !args.dry_run {
        println!("\nSuccessfully generated files for {} in {}", package_id, output_dir.display());
    }
    Ok(())
}

fn run_clean(args: &Args, config: &Config, target: &CleanTarget) -> Result<()> {
    let resources = resources_for(args, config);
    let report = clean(config, &resources, target, config.output_root()?, args.dry_run)
        .map_err(|e| with_listing(e, config))?;
    if !args.dry_run {
        println!(
            "\nRemoved {} file(s) and {} directory(ies)",
            report.removed_files.len(),
            report.removed_dirs.len()
        );
    }
    Ok(())
}

/// Prints the package list after a validation failure so the user can pick a valid one.
fn with_listing(err: Error, config: &Config) -> Error {
    if err.is_validation() {
        print_packages(config);
    }
    err
}

/// The resources root: `--resources` if given, else the manifest's directory.
fn resources_for(args: &Args, config: &Config) -> Resources {
    match &args.resources {
        Some(root) => Resources::new(root),
        None => Resources::new(&config.base_dir),
    }
}

/// Formats one line per package: id, display name and output directory.
pub fn package_listing(config: &Config) -> Vec<String> {
    config
        .packages_or_empty()
        .iter()
        .map(|(id, package)| {
            let name = package.name.as_deref().unwrap_or("");
            let dir = package.dir.as_deref().unwrap_or(id);
            format!("  {id:8} - {name:20} ({dir})")
        })
        .collect()
}

/// Prints all available packages.
pub fn print_packages(config: &Config) {
    println!("Available packages:");
    for line in package_listing(config) {
        println!("{line}");
    }
}
