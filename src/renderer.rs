//! Template renderer and rendering functionality for stencil.
//! Templates are looked up by name in the configured search roots, then in
//! the templates compiled into the binary.
use crate::error::{Error, Result};
use minijinja::{Environment, ErrorKind};
use std::io;
use std::path::PathBuf;

/// Templates shipped with stencil, used when no search root provides them.
pub const BUILTIN_TEMPLATES: [(&str, &str); 3] = [
    ("pdf/layout.html.j2", include_str!("../resources/templates/pdf/layout.html.j2")),
    (
        "pdf/filters/pagebreak.lua.j2",
        include_str!("../resources/templates/pdf/filters/pagebreak.lua.j2"),
    ),
    (
        "pdf/filters/links.lua.j2",
        include_str!("../resources/templates/pdf/filters/links.lua.j2"),
    ),
];

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders the named template with the given context.
    ///
    /// # Arguments
    /// * `name` - Template name, relative to the search roots
    /// * `context` - Context variables for rendering
    ///
    /// # Returns
    /// * `Result<String>` - Rendered template text
    fn render(&self, name: &str, context: &serde_json::Value) -> Result<String>;
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a renderer searching `roots` in order.
    ///
    /// Block tags do not leave blank lines behind and trailing newlines are
    /// kept, so rendered files match their templates line for line.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_loader(move |name| load_template(&roots, name));
        Self { env }
    }
}

fn load_template(
    roots: &[PathBuf],
    name: &str,
) -> std::result::Result<Option<String>, minijinja::Error> {
    if name.split(['/', '\\']).any(|segment| segment == "..") {
        return Ok(None);
    }
    for root in roots {
        let path = root.join(name);
        match std::fs::read_to_string(&path) {
            Ok(source) => return Ok(Some(source)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(minijinja::Error::new(
                    ErrorKind::InvalidOperation,
                    format!("could not read template '{}'", path.display()),
                )
                .with_source(e))
            }
        }
    }
    Ok(BUILTIN_TEMPLATES
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, source)| source.to_string()))
}

impl TemplateRenderer for MiniJinjaRenderer {
    /// Renders a template loaded from the search roots.
    ///
    /// # Errors
    /// * `Error::RenderError` if the template cannot be found, parsed or rendered
    fn render(&self, name: &str, context: &serde_json::Value) -> Result<String> {
        let render_error = |source| Error::RenderError { template: name.to_string(), source };
        let tmpl = self.env.get_template(name).map_err(render_error)?;
        tmpl.render(context).map_err(render_error)
    }
}
