//! Bundled resource tree shared by all packages.
//!
//! The root holds `templates/` (fallback template search root), `scripts/`
//! (auxiliary scripts) and `files/` (static copies). It is passed explicitly to
//! the generator so callers and tests choose where it lives.

use crate::constants::{FILES_DIR, SCRIPTS_DIR, TEMPLATES_DIR};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resources {
    root: PathBuf,
}

impl Resources {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn templates(&self) -> PathBuf {
        self.root.join(TEMPLATES_DIR)
    }

    pub fn scripts(&self) -> PathBuf {
        self.root.join(SCRIPTS_DIR)
    }

    pub fn files(&self) -> PathBuf {
        self.root.join(FILES_DIR)
    }
}
