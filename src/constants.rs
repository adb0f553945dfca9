//! Common constants used throughout the stencil application.

/// Manifest file used when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = ".config.yaml";

/// Ignore file updated by the `install` command
pub const DEFAULT_IGNORE_FILE: &str = ".gitignore";

/// Markers delimiting the stencil-managed block inside the ignore file
pub const IGNORE_START_MARKER: &str = "# >>> stencil >>>";
pub const IGNORE_END_MARKER: &str = "# <<< stencil <<<";

/// Suffix stripped from a template source to derive its destination
pub const TEMPLATE_SUFFIX: &str = ".j2";

/// Subdirectories of the resources root
pub const TEMPLATES_DIR: &str = "templates";
pub const SCRIPTS_DIR: &str = "scripts";
pub const FILES_DIR: &str = "files";

/// Extension of the artifacts produced from package documents
pub const DOCUMENT_OUTPUT_EXT: &str = "pdf";

/// Default value of the `package_folder` context variable
pub const DEFAULT_PACKAGE_FOLDER: &str = "htdocs";

/// Templates injected ahead of the manifest templates for packages with documents
pub const DOCUMENT_TEMPLATES: [&str; 3] =
    ["pdf/layout.html.j2", "pdf/filters/pagebreak.lua.j2", "pdf/filters/links.lua.j2"];
