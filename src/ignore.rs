//! Registration of generated paths in a `.gitignore`-style file.
//! stencil owns a block delimited by two marker lines; everything outside the
//! block is left untouched, and rewriting an unchanged block is a no-op.

use crate::config::Config;
use crate::constants::{IGNORE_END_MARKER, IGNORE_START_MARKER};
use crate::error::Result;
use crate::planner::all_generated_paths;
use regex::{NoExpand, Regex};
use std::fmt;
use std::fs;
use std::path::Path;

/// What `install` did (or would do) to the ignore file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreAction {
    Created,
    Updated,
    Appended,
}

impl fmt::Display for IgnoreAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            IgnoreAction::Created => "Created",
            IgnoreAction::Updated => "Updated",
            IgnoreAction::Appended => "Added stencil section to",
        };
        f.write_str(action)
    }
}

/// Builds the marker-delimited block listing `paths`, one per line.
pub fn render_block<I, S>(paths: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut block = format!("{IGNORE_START_MARKER}\n");
    for path in paths {
        block.push_str(path.as_ref());
        block.push('\n');
    }
    block.push_str(IGNORE_END_MARKER);
    block.push('\n');
    block
}

fn block_pattern() -> Result<Regex> {
    let pattern = format!(
        r"(?ms)^{}\r?$.*?^{}\r?$\n?",
        regex::escape(IGNORE_START_MARKER),
        regex::escape(IGNORE_END_MARKER)
    );
    Ok(Regex::new(&pattern)?)
}

/// Inserts `block` into the ignore file content.
///
/// An existing block is replaced in place; otherwise the block is appended
/// after a blank separator line. `None` means the file does not exist yet.
/// Files using CRLF line endings keep them.
pub fn update_content(existing: Option<&str>, block: &str) -> Result<(String, IgnoreAction)> {
    let Some(content) = existing else {
        return Ok((block.to_string(), IgnoreAction::Created));
    };

    let eol = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let block = block.replace('\n', eol);

    let pattern = block_pattern()?;
    if pattern.is_match(content) {
        let updated = pattern.replace_all(content, NoExpand(&block)).into_owned();
        return Ok((updated, IgnoreAction::Updated));
    }

    let mut updated = content.to_string();
    if !updated.is_empty() && !updated.ends_with(&eol.repeat(2)) {
        if !updated.ends_with('\n') {
            updated.push_str(eol);
        }
        updated.push_str(eol);
    }
    updated.push_str(&block);
    Ok((updated, IgnoreAction::Appended))
}

/// Writes the generated paths of every package into the ignore file at `path`.
///
/// In dry-run mode the resulting content is printed instead.
pub fn install<P: AsRef<Path>>(config: &Config, path: P, dry_run: bool) -> Result<IgnoreAction> {
    let path = path.as_ref();
    let entries = all_generated_paths(config);
    let block = render_block(&entries);

    let existing = if path.exists() { Some(fs::read_to_string(path)?) } else { None };
    let (content, action) = update_content(existing.as_deref(), &block)?;

    if dry_run {
        println!("Would write to {}:", path.display());
        println!("{}", "-".repeat(40));
        println!("{content}");
    } else {
        fs::write(path, &content)?;
        println!("{} {}", action, path.display());
        for entry in &entries {
            println!("  {entry}");
        }
    }
    Ok(action)
}
