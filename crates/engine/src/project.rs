//! Project layout: an `index.html` plus the local files it links.

use crate::error::Result;
use crate::resources::Resources;
use crate::storage::read_text;
use html::collect::{collect_script_srcs, collect_stylesheet_hrefs};
use html::parse_document;
use std::path::{Component, Path, PathBuf};
use url::Url;

pub const ENTRY_DOCUMENT: &str = "index.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub root: PathBuf,
    pub document: PathBuf,
    pub styles: Vec<PathBuf>,
    pub scripts: Vec<PathBuf>,
}

impl Project {
    /// A single document with no linked files.
    pub fn from_document(document: impl Into<PathBuf>) -> Self {
        let document = document.into();
        let root = document
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            root,
            document,
            styles: Vec::new(),
            scripts: Vec::new(),
        }
    }

    /// Reads `root/index.html` and resolves its local stylesheet and script links.
    ///
    /// Absolute and protocol-relative URLs are skipped. Linked files are not
    /// required to exist.
    pub fn discover(root: &Path) -> Result<Self> {
        let document = root.join(ENTRY_DOCUMENT);
        let doc = parse_document(&read_text(&document)?);
        let styles = local_paths(root, collect_stylesheet_hrefs(&doc));
        let scripts = local_paths(root, collect_script_srcs(&doc));
        log::info!(
            target: "engine.project",
            "{}: {} stylesheets, {} scripts",
            document.display(),
            styles.len(),
            scripts.len()
        );
        Ok(Self {
            root: root.to_path_buf(),
            document,
            styles,
            scripts,
        })
    }

    pub fn resources(&self) -> Result<Resources> {
        Resources::load(&self.styles, &self.scripts)
    }
}

fn local_paths(root: &Path, refs: Vec<String>) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();
    for reference in refs {
        if is_remote(&reference) {
            log::debug!(target: "engine.project", "skipping remote {reference}");
            continue;
        }
        let path = resolve_local(root, &reference);
        if !out.contains(&path) {
            out.push(path);
        }
    }
    out
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("//") || Url::parse(reference).is_ok()
}

// input: root="/site", reference="./css/../css/main.css?v=2"
// output: "/site/css/main.css"
fn resolve_local(root: &Path, reference: &str) -> PathBuf {
    let end = reference.find(['?', '#']).unwrap_or(reference.len());
    let relative = reference[..end].trim_start_matches('/');
    let mut path = root.to_path_buf();
    let mut depth = 0usize;
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => {
                path.push(part);
                depth += 1;
            }
            Component::ParentDir if depth > 0 => {
                path.pop();
                depth -= 1;
            }
            _ => {}
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use std::fs;

    #[test]
    fn resolves_relative_references_inside_the_root() {
        let root = Path::new("/site");
        assert_eq!(
            resolve_local(root, "./css/../css/main.css?v=2"),
            Path::new("/site/css/main.css")
        );
        assert_eq!(resolve_local(root, "/js/app.js#x"), Path::new("/site/js/app.js"));
        assert_eq!(resolve_local(root, "../../up.css"), Path::new("/site/up.css"));
    }

    #[test]
    fn remote_references_are_detected() {
        assert!(is_remote("https://cdn.example.com/a.css"));
        assert!(is_remote("http://example.com/a.js"));
        assert!(is_remote("//cdn.example.com/a.css"));
        assert!(!is_remote("css/main.css"));
        assert!(!is_remote("/css/main.css"));
    }

    #[test]
    fn discovers_linked_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(ENTRY_DOCUMENT),
            r#"<html><head>
<link rel="stylesheet" href="css/main.css">
<link rel="stylesheet" href="https://cdn.example.com/reset.css">
<link rel="icon" href="favicon.ico">
</head><body>
<script src="js/app.js"></script>
<script src="//cdn.example.com/lib.js"></script>
<script>inline()</script>
</body></html>"#,
        )
        .unwrap();
        let project = Project::discover(dir.path()).unwrap();
        assert_eq!(project.document, dir.path().join("index.html"));
        assert_eq!(project.styles, [dir.path().join("css/main.css")]);
        assert_eq!(project.scripts, [dir.path().join("js/app.js")]);
    }

    #[test]
    fn missing_entry_document() {
        let dir = tempfile::tempdir().unwrap();
        let err = Project::discover(dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::ResourceMissing { ref path } if path.ends_with("index.html")));
    }
}
