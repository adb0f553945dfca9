//! Package generation.
//! Renders a package's applicable templates and copies its auxiliary scripts
//! and static files into the package output directory.

use crate::config::Config;
use crate::constants::SCRIPTS_DIR;
use crate::context::{build_context, Context};
use crate::error::{Error, Result};
use crate::operation::FileOperation;
use crate::planner::applicable_templates;
use crate::renderer::TemplateRenderer;
use crate::resources::Resources;
use log::{debug, error, warn};
use std::path::{Path, PathBuf};

/// Generates package output for one manifest.
pub struct Generator<'a> {
    config: &'a Config,
    renderer: &'a dyn TemplateRenderer,
    resources: &'a Resources,
    output_root: PathBuf,
    dry_run: bool,
}

impl<'a> Generator<'a> {
    pub fn new<P: Into<PathBuf>>(
        config: &'a Config,
        renderer: &'a dyn TemplateRenderer,
        resources: &'a Resources,
        output_root: P,
        dry_run: bool,
    ) -> Self {
        Self { config, renderer, resources, output_root: output_root.into(), dry_run }
    }

    /// Output directory of a package.
    pub fn package_dir(&self, context: &Context) -> PathBuf {
        self.output_root.join(&context.package.package_dir)
    }

    /// Computes every operation needed to generate the package of `context`.
    ///
    /// All templates are rendered here, so a rendering failure is reported
    /// before anything touches the filesystem.
    ///
    /// # Errors
    /// * `Error::ConfigError` if the manifest defines no templates
    /// * `Error::RenderError` naming the first template that failed
    pub fn plan(&self, context: &Context) -> Result<Vec<FileOperation>> {
        if self.config.templates.is_empty() {
            return Err(Error::ConfigError("no templates defined in config".to_string()));
        }

        let output_dir = self.package_dir(context);
        let mut operations = Vec::new();

        if !output_dir.exists() {
            operations.push(FileOperation::CreateDir { target: output_dir.clone() });
        }

        let values = context.to_value();
        for template in applicable_templates(&self.config.templates, context) {
            debug!("Rendering {} -> {}", template.source, template.destination);
            let content = self.renderer.render(&template.source, &values)?;
            operations.push(FileOperation::Write {
                target: output_dir.join(&template.destination),
                content,
            });
        }

        operations.extend(self.plan_scripts(context, &output_dir));
        operations.extend(self.plan_copies(context, &output_dir));
        Ok(operations)
    }

    fn plan_scripts(&self, context: &Context, output_dir: &Path) -> Vec<FileOperation> {
        let scripts_src = self.resources.scripts();
        let scripts_dst = output_dir.join(SCRIPTS_DIR);

        let mut operations = Vec::new();
        for (os, scripts) in &context.package.deps_script {
            for script in scripts {
                let source = scripts_src.join(script);
                if !source.is_file() {
                    warn!("Script not found for {}: {}", os, source.display());
                    continue;
                }
                operations.push(FileOperation::Copy { source, target: scripts_dst.join(script) });
            }
        }
        operations
    }

    fn plan_copies(&self, context: &Context, output_dir: &Path) -> Vec<FileOperation> {
        let files_src = self.resources.files();

        let mut operations = Vec::new();
        for copy in &context.package.copy_files {
            let source = files_src.join(&copy.src);
            let target = output_dir.join(&copy.dest);
            if source.is_dir() {
                operations.push(FileOperation::CopyDir { source, target });
            } else if source.is_file() {
                operations.push(FileOperation::Copy { source, target });
            } else {
                warn!("File/directory not found: {}", source.display());
            }
        }
        operations
    }

    /// Generates one package and returns its output directory.
    ///
    /// # Errors
    /// * Validation errors from context construction
    /// * `Error::RenderError` if any template fails; nothing is written then
    /// * `Error::IoError` if applying an operation fails
    pub fn generate(&self, package_id: &str) -> Result<PathBuf> {
        let context = build_context(package_id, self.config)?;
        let operations = self.plan(&context)?;
        for operation in &operations {
            operation.apply(self.dry_run)?;
        }
        Ok(self.package_dir(&context))
    }

    /// Generates every package in the manifest.
    ///
    /// Each package is attempted independently. Invalid packages are skipped
    /// with a warning; render and IO failures are logged and counted.
    ///
    /// # Errors
    /// * `Error::ConfigError` if the manifest has no `packages` section
    /// * `Error::PackagesFailed` if at least one valid package failed to generate
    pub fn generate_all(&self) -> Result<Vec<PathBuf>> {
        let mut generated = Vec::new();
        let mut failed = 0;
        for package_id in self.config.packages()?.keys() {
            match self.generate(package_id) {
                Ok(dir) => generated.push(dir),
                Err(e) if e.is_validation() => warn!("Skipping package {}: {}", package_id, e),
                Err(e) => {
                    error!("Skipping package {}: {}", package_id, e);
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            return Err(Error::PackagesFailed { failed });
        }
        Ok(generated)
    }
}
