//! Style and script text that lives outside the document.

use crate::error::Result;
use crate::storage::read_or_empty;
use std::path::{Path, PathBuf};

/// One named piece of style or script text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub text: String,
}

impl Source {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Linked stylesheets and script files, loaded as text.
///
/// Inline `<style>`/`<script>` blocks are not stored here; they are read from
/// the document at collection time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resources {
    styles: Vec<Source>,
    scripts: Vec<Source>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every file. Missing files contribute empty text.
    pub fn load(style_paths: &[PathBuf], script_paths: &[PathBuf]) -> Result<Self> {
        let mut resources = Self::new();
        for path in style_paths {
            resources.styles.push(load_source(path)?);
        }
        for path in script_paths {
            resources.scripts.push(load_source(path)?);
        }
        log::debug!(
            target: "engine.resources",
            "loaded {} stylesheets, {} scripts",
            resources.styles.len(),
            resources.scripts.len()
        );
        Ok(resources)
    }

    pub fn with_style(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.styles.push(Source::new(name, text));
        self
    }

    pub fn with_script(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.scripts.push(Source::new(name, text));
        self
    }

    pub fn styles(&self) -> &[Source] {
        &self.styles
    }

    pub fn scripts(&self) -> &[Source] {
        &self.scripts
    }
}

fn load_source(path: &Path) -> Result<Source> {
    Ok(Source::new(path.display().to_string(), read_or_empty(path)?))
}
