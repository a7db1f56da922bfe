use crate::config::EngineConfig;
use crate::context::{ContextBundle, collect_context};
use crate::descriptor::Fragment;
use crate::error::Result;
use crate::locator::{Locator, Match, Strategy};
use crate::patch::{PatchReport, PatchRequest, PatchTargets};
use crate::project::Project;
use crate::resources::Resources;
use crate::storage::read_text;
use html::{Document, NodeId, outer_html, parse_document};
use std::fmt;
use std::path::{Path, PathBuf};

/// A located fragment and its context, ready to hand to whoever writes the patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub document: PathBuf,
    pub node: NodeId,
    pub strategy: Strategy,
    pub found_element: String,
    pub context: ContextBundle,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections = [
            ("Found element", self.found_element.as_str()),
            ("Parent structure", self.context.ancestor_markup.as_str()),
            ("CSS (if found)", self.context.related_style_text.as_str()),
            ("JS (if found)", self.context.related_script_text.as_str()),
        ];
        for (title, body) in sections {
            let body = body.trim();
            writeln!(f, "=== {title} ===")?;
            writeln!(f, "{}\n", if body.is_empty() { "—" } else { body })?;
        }
        writeln!(f, "=== Additional ===")?;
        writeln!(f, "Matched by: {}", self.strategy)?;
        write!(f, "Found in file: {}", self.document.display())
    }
}

/// Stateless driver for resolve and patch cycles.
///
/// Every call reloads the document from storage.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
    locator: Locator,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let locator = Locator::from_config(&config.locator);
        Self { config, locator }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn locate(&self, doc: &Document, fragment: &Fragment) -> Result<Match> {
        self.locator.locate(doc, fragment)
    }

    /// Extract, locate and collect against the current contents of `document`.
    pub fn resolve(
        &self,
        document: &Path,
        fragment_text: &str,
        resources: &Resources,
    ) -> Result<Resolution> {
        let fragment = Fragment::parse(fragment_text)?;
        let doc = parse_document(&read_text(document)?);
        let found = self.locate(&doc, &fragment)?;
        let context = collect_context(&doc, found.node, resources, &self.config.context);
        log::info!(
            target: "engine.session",
            "{}: <{}> resolved to {} by {}",
            document.display(),
            fragment.tag(),
            found.node,
            found.strategy
        );
        Ok(Resolution {
            document: document.to_path_buf(),
            node: found.node,
            strategy: found.strategy,
            found_element: outer_html(&doc, found.node),
            context,
        })
    }

    pub fn resolve_in(&self, project: &Project, fragment_text: &str) -> Result<Resolution> {
        let resources = project.resources()?;
        self.resolve(&project.document, fragment_text, &resources)
    }

    /// Resolves each fragment independently; one failure does not stop the rest.
    pub fn resolve_batch<'f, I>(
        &self,
        document: &Path,
        fragments: I,
        resources: &Resources,
    ) -> Vec<Result<Resolution>>
    where
        I: IntoIterator<Item = &'f str>,
    {
        fragments
            .into_iter()
            .map(|fragment| {
                let result = self.resolve(document, fragment, resources);
                if let Err(err) = &result {
                    log::warn!(target: "engine.session", "fragment skipped: {err}");
                }
                result
            })
            .collect()
    }

    pub fn apply(&self, request: &PatchRequest, targets: &PatchTargets) -> PatchReport {
        crate::patch::apply(request, targets, &self.config)
    }
}
