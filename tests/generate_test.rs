use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use stencil::config::Config;
use stencil::error::{Error, Result};
use stencil::generate::Generator;
use stencil::renderer::{MiniJinjaRenderer, TemplateRenderer};
use stencil::resources::Resources;
use tempfile::TempDir;

/// A project tree with templates, resources and an output directory.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self { dir: TempDir::new().unwrap() };
        fixture.write("resources/templates/readme.md.j2", "# {{ name }}\n\nweb: {{ has_web }}\n");
        fixture.write(
            "resources/templates/compose.yml.j2",
            "services:\n{% for s in services %}\n  {{ s }}: {}\n{% endfor %}\n",
        );
        fixture.write("resources/templates/conf/app.ini.j2", "port = {{ port }}\n");
        fixture.write("resources/scripts/install-deps.sh", "#!/bin/sh\n");
        fixture.write("resources/files/robots.txt", "User-agent: *\n");
        fixture.write("resources/files/assets/css/site.css", "body {}\n");
        fixture
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn out(&self) -> PathBuf {
        self.root().join("out")
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn resources(&self) -> Resources {
        Resources::new(self.root().join("resources"))
    }

    fn renderer(&self) -> MiniJinjaRenderer {
        MiniJinjaRenderer::new(vec![self.resources().templates()])
    }
}

fn config(yaml: &str) -> Config {
    Config::parse(yaml, ".").unwrap()
}

const P1: &str = r#"
templates:
  - src: readme.md.j2
packages:
  p1:
    type: zip
    package_name: p1.zip
    services: [web]
"#;

#[test]
fn test_generate_scenario_matches_expected_tree() {
    let fixture = Fixture::new();
    let config = config(P1);
    let resources = fixture.resources();
    let renderer = fixture.renderer();
    let generator = Generator::new(&config, &renderer, &resources, fixture.out(), false);

    let output_dir = generator.generate("p1").unwrap();

    assert_eq!(output_dir, fixture.out().join("p1"));
    fixture.write("expected/p1/readme.md", "# p1\n\nweb: true\n");
    assert!(!dir_diff::is_different(fixture.out(), fixture.root().join("expected")).unwrap());
}

#[test]
fn test_generate_into_existing_directory() {
    let fixture = Fixture::new();
    let config = config(P1);
    let resources = fixture.resources();
    let renderer = fixture.renderer();
    fixture.write("out/p1/notes.txt", "keep me\n");
    let generator = Generator::new(&config, &renderer, &resources, fixture.out(), false);

    generator.generate("p1").unwrap();
    generator.generate("p1").unwrap();

    assert_eq!(fs::read_to_string(fixture.out().join("p1/notes.txt")).unwrap(), "keep me\n");
    assert!(fixture.out().join("p1/readme.md").is_file());
}

#[test]
fn test_dry_run_writes_nothing() {
    let fixture = Fixture::new();
    let config = config(
        r#"
templates:
  - src: readme.md.j2
packages:
  full:
    package_type: none
    deps_script: {linux: install-deps.sh}
    copy_files: [robots.txt, assets]
"#,
    );
    let resources = fixture.resources();
    let renderer = fixture.renderer();
    let generator = Generator::new(&config, &renderer, &resources, fixture.out(), true);

    let output_dir = generator.generate("full").unwrap();

    assert_eq!(output_dir, fixture.out().join("full"));
    assert!(!fixture.out().exists());
}

#[test]
fn test_plan_in_dry_run_matches_real_run() {
    let fixture = Fixture::new();
    let config = config(P1);
    let resources = fixture.resources();
    let renderer = fixture.renderer();
    let context = stencil::context::build_context("p1", &config).unwrap();

    let dry = Generator::new(&config, &renderer, &resources, fixture.out(), true);
    let real = Generator::new(&config, &renderer, &resources, fixture.out(), false);

    assert_eq!(dry.plan(&context).unwrap(), real.plan(&context).unwrap());
}

#[test]
fn test_subdirectory_destinations_and_variables() {
    let fixture = Fixture::new();
    let config = config(
        r#"
templates:
  - src: compose.yml.j2
    dest: docker/compose.yml
    when: has_services
  - src: conf/app.ini.j2
packages:
  svc:
    package_type: none
    services: [web, mysql]
    template_variables: {port: 8080}
"#,
    );
    let resources = fixture.resources();
    let renderer = fixture.renderer();
    let generator = Generator::new(&config, &renderer, &resources, fixture.out(), false);

    generator.generate("svc").unwrap();

    let out = fixture.out().join("svc");
    assert_eq!(
        fs::read_to_string(out.join("docker/compose.yml")).unwrap(),
        "services:\n  web: {}\n  mysql: {}\n"
    );
    assert_eq!(fs::read_to_string(out.join("conf/app.ini")).unwrap(), "port = 8080\n");
}

#[test_log::test]
fn test_scripts_and_static_copies() {
    let fixture = Fixture::new();
    let config = config(
        r#"
templates:
  - src: readme.md.j2
packages:
  full:
    package_type: none
    deps_script:
      linux: [install-deps.sh, missing.sh]
    copy_files:
      - robots.txt
      - {src: assets, dest: public/assets}
      - not-there.txt
"#,
    );
    let resources = fixture.resources();
    let renderer = fixture.renderer();
    fixture.write("out/full/public/assets/stale.css", "old\n");
    let generator = Generator::new(&config, &renderer, &resources, fixture.out(), false);

    generator.generate("full").unwrap();

    let out = fixture.out().join("full");
    assert!(out.join("scripts/install-deps.sh").is_file());
    assert!(!out.join("scripts/missing.sh").exists());
    assert_eq!(fs::read_to_string(out.join("robots.txt")).unwrap(), "User-agent: *\n");
    assert!(out.join("public/assets/css/site.css").is_file());
    assert!(!out.join("public/assets/stale.css").exists());
    assert!(!out.join("not-there.txt").exists());
}

#[test]
fn test_document_package_gets_companion_templates() {
    let fixture = Fixture::new();
    let config = config(
        r#"
templates:
  - src: readme.md.j2
packages:
  docs:
    package_type: pdf
    name: Handbook
    pdfs: [guide.md]
"#,
    );
    let resources = fixture.resources();
    let renderer = fixture.renderer();
    let generator = Generator::new(&config, &renderer, &resources, fixture.out(), false);

    generator.generate("docs").unwrap();

    let out = fixture.out().join("docs");
    assert!(fs::read_to_string(out.join("pdf/layout.html")).unwrap().contains("Handbook"));
    assert!(out.join("pdf/filters/pagebreak.lua").is_file());
    assert!(out.join("pdf/filters/links.lua").is_file());
    assert!(out.join("readme.md").is_file());
}

/// Fails for one template name, delegates to minijinja otherwise.
struct FailingRenderer {
    inner: MiniJinjaRenderer,
    fail_on: &'static str,
}

impl TemplateRenderer for FailingRenderer {
    fn render(&self, name: &str, context: &Value) -> Result<String> {
        if name == self.fail_on {
            return Err(Error::ConfigError(format!("cannot render {name}")));
        }
        self.inner.render(name, context)
    }
}

#[test]
fn test_render_failure_writes_nothing() {
    let fixture = Fixture::new();
    let config = config(
        r#"
templates:
  - src: readme.md.j2
  - src: broken.j2
packages:
  p: {package_type: none}
"#,
    );
    let resources = fixture.resources();
    let renderer = fixture.renderer();
    let generator = Generator::new(&config, &renderer, &resources, fixture.out(), false);

    match generator.generate("p") {
        Err(Error::RenderError { template, .. }) => assert_eq!(template, "broken.j2"),
        other => panic!("Expected RenderError, got {other:?}"),
    }
    assert!(!fixture.out().join("p").exists());

    let failing = FailingRenderer { inner: fixture.renderer(), fail_on: "readme.md.j2" };
    let generator = Generator::new(&config, &failing, &resources, fixture.out(), false);
    assert!(generator.generate("p").is_err());
    assert!(!fixture.out().join("p").exists());
}

#[test]
fn test_generate_all_continues_past_failures() {
    let fixture = Fixture::new();
    let config = config(
        r#"
templates:
  - src: readme.md.j2
  - src: missing.j2
    when: has_web
packages:
  a: {package_type: none}
  web: {package_type: none, services: [web]}
  c: {package_type: none}
"#,
    );
    let resources = fixture.resources();
    let renderer = fixture.renderer();
    let generator = Generator::new(&config, &renderer, &resources, fixture.out(), false);

    match generator.generate_all() {
        Err(Error::PackagesFailed { failed }) => assert_eq!(failed, 1),
        other => panic!("Expected PackagesFailed, got {other:?}"),
    }
    assert!(fixture.out().join("a/readme.md").is_file());
    assert!(fixture.out().join("c/readme.md").is_file());
    assert!(!fixture.out().join("web").exists());
}

#[test]
fn test_generate_all_skips_invalid_packages() {
    let fixture = Fixture::new();
    let config = config(
        r#"
templates:
  - src: readme.md.j2
packages:
  a: {package_type: none}
  broken: {package_type: zip}
  untyped: {name: Untyped}
  c: {package_type: none}
"#,
    );
    let resources = fixture.resources();
    let renderer = fixture.renderer();
    let generator = Generator::new(&config, &renderer, &resources, fixture.out(), false);

    let generated = generator.generate_all().unwrap();

    assert_eq!(generated, vec![fixture.out().join("a"), fixture.out().join("c")]);
    assert!(!fixture.out().join("broken").exists());
    assert!(!fixture.out().join("untyped").exists());
}

#[test]
fn test_validation_errors() {
    let fixture = Fixture::new();
    let config = config(P1);
    let resources = fixture.resources();
    let renderer = fixture.renderer();
    let generator = Generator::new(&config, &renderer, &resources, fixture.out(), false);

    let err = generator.generate("nope").unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_no_templates_is_a_config_error() {
    let fixture = Fixture::new();
    let config = config("packages:\n  p: {package_type: none}\n");
    let resources = fixture.resources();
    let renderer = fixture.renderer();
    let generator = Generator::new(&config, &renderer, &resources, fixture.out(), false);

    assert!(matches!(generator.generate("p"), Err(Error::ConfigError(_))));
}
