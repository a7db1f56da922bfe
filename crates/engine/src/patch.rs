//! Writing a replacement bundle back into the document and its resources.
//!
//! The three sub-operations are independent: each one reads its resource in
//! full, transforms it in memory and writes it back in full. A failure in one
//! does not stop the others.

use crate::config::{EngineConfig, ReplaceStrategy};
use crate::descriptor::Fragment;
use crate::error::{EngineError, Result};
use crate::locator::Locator;
use crate::project::Project;
use crate::storage::{read_or_empty, read_text, write_text};
use css::{scan_rules, selector_of, split_rules};
use html::collect::{block_text, inline_script_blocks, set_block_text, style_blocks};
use html::traverse::elements_named;
use html::{Document, NodeId, parse_document, to_html};
use std::convert::Infallible;
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchRequest {
    /// The fragment text as it was originally observed.
    pub original: String,
    pub markup: String,
    /// Zero or more `selector { body }` rules.
    pub style: String,
    pub script: Option<String>,
}

/// Where style or script changes are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceTarget {
    /// Blocks inside the document itself.
    Inline,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTargets {
    pub document: PathBuf,
    /// Linked stylesheets in link order. The document's inline `<style>`
    /// blocks are always searched after them.
    pub stylesheets: Vec<PathBuf>,
    pub script: ResourceTarget,
}

impl PatchTargets {
    pub fn inline(document: impl Into<PathBuf>) -> Self {
        Self {
            document: document.into(),
            stylesheets: Vec::new(),
            script: ResourceTarget::Inline,
        }
    }

    /// Every linked stylesheet, and the first linked script file (inline blocks otherwise).
    pub fn for_project(project: &Project) -> Self {
        Self {
            document: project.document.clone(),
            stylesheets: project.styles.clone(),
            script: project
                .scripts
                .first()
                .cloned()
                .map_or(ResourceTarget::Inline, ResourceTarget::File),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleChange {
    /// An existing rule with this selector was replaced.
    Updated(String),
    /// No rule had this selector; the rule was appended.
    Inserted(String),
    /// A chunk without a selector was appended as-is.
    Verbatim,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleOutcome {
    pub changes: Vec<RuleChange>,
}

impl StyleOutcome {
    pub fn updated(&self) -> usize {
        self.count(|c| matches!(c, RuleChange::Updated(_)))
    }

    pub fn inserted(&self) -> usize {
        self.count(|c| matches!(c, RuleChange::Inserted(_)))
    }

    fn count(&self, pred: impl Fn(&RuleChange) -> bool) -> usize {
        self.changes.iter().filter(|c| pred(c)).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptOutcome {
    Appended,
    /// Empty text or the "no script" placeholder.
    Skipped,
}

/// One result per sub-operation.
#[derive(Debug)]
pub struct PatchReport {
    pub markup: Result<()>,
    pub style: Result<StyleOutcome>,
    pub script: Result<ScriptOutcome>,
}

impl PatchReport {
    pub fn is_success(&self) -> bool {
        self.markup.is_ok() && self.style.is_ok() && self.script.is_ok()
    }
}

impl fmt::Display for PatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.markup {
            Ok(()) => writeln!(f, "markup: replaced")?,
            Err(err) => writeln!(f, "markup: {err}")?,
        }
        match &self.style {
            Ok(outcome) if outcome.changes.is_empty() => writeln!(f, "style: unchanged")?,
            Ok(outcome) => writeln!(
                f,
                "style: {} updated, {} inserted, {} appended verbatim",
                outcome.updated(),
                outcome.inserted(),
                outcome.changes.len() - outcome.updated() - outcome.inserted()
            )?,
            Err(err) => writeln!(f, "style: {err}")?,
        }
        match &self.script {
            Ok(ScriptOutcome::Appended) => write!(f, "script: appended"),
            Ok(ScriptOutcome::Skipped) => write!(f, "script: skipped"),
            Err(err) => write!(f, "script: {err}"),
        }
    }
}

/// Runs all three sub-operations against `targets`.
pub fn apply(request: &PatchRequest, targets: &PatchTargets, config: &EngineConfig) -> PatchReport {
    let locator = Locator::from_config(&config.locator);
    let markup = replace_markup(
        &targets.document,
        &request.original,
        &request.markup,
        config.patch.replace,
        &locator,
    );
    let style = upsert_style(&targets.document, &targets.stylesheets, &request.style);
    let script = match &request.script {
        Some(script) => append_script(
            &targets.document,
            &targets.script,
            script,
            &config.patch.script_placeholder,
        ),
        None => Ok(ScriptOutcome::Skipped),
    };
    let report = PatchReport {
        markup,
        style,
        script,
    };
    if report.is_success() {
        log::info!(target: "engine.patch", "{}: patch applied", targets.document.display());
    } else {
        log::warn!(target: "engine.patch", "{}: patch incomplete\n{report}", targets.document.display());
    }
    report
}

/// Replaces the original fragment in the document file with `replacement`.
///
/// The document is left untouched on failure.
pub fn replace_markup(
    document: &Path,
    original: &str,
    replacement: &str,
    strategy: ReplaceStrategy,
    locator: &Locator,
) -> Result<()> {
    let text = read_text(document)?;
    let patched = replace_in_text(&text, original, replacement, strategy, locator)?;
    write_text(document, &patched)
}

/// In-memory form of [`replace_markup`].
pub fn replace_in_text(
    document: &str,
    original: &str,
    replacement: &str,
    strategy: ReplaceStrategy,
    locator: &Locator,
) -> Result<String> {
    if replacement.trim().is_empty() {
        return Err(EngineError::patch_failed("replacement markup is empty"));
    }
    match strategy {
        ReplaceStrategy::ExactText => {
            if original.is_empty() || !document.contains(original) {
                return Err(EngineError::patch_failed(
                    "original fragment text does not occur in the document",
                ));
            }
            Ok(document.replacen(original, replacement, 1))
        }
        ReplaceStrategy::Relocate => {
            let fragment = Fragment::parse(original).map_err(|err| {
                EngineError::patch_failed(format!("original fragment is unusable: {err}"))
            })?;
            let mut doc = parse_document(document);
            let found = locator.locate(&doc, &fragment).map_err(|err| {
                EngineError::patch_failed(format!("original fragment not found: {err}"))
            })?;
            let inserted = doc.replace_with_fragment(found.node, &parse_document(replacement))?;
            log::debug!(
                target: "engine.patch",
                "replaced {} with {} node(s)",
                found.node,
                inserted.len()
            );
            Ok(to_html(&doc))
        }
    }
}

/// Upserts every rule of `style` into the project's style sources.
///
/// Each selector is searched in every linked stylesheet, in link order, then
/// in every inline `<style>` block of the document. The first source holding
/// the rule gets it replaced in place. A rule no source holds is appended to
/// the last linked stylesheet, or to the last inline block when nothing is
/// linked. Only sources that changed are written back.
pub fn upsert_style(document: &Path, stylesheets: &[PathBuf], style: &str) -> Result<StyleOutcome> {
    if style.trim().is_empty() {
        return Ok(StyleOutcome::default());
    }
    let files = stylesheets
        .iter()
        .map(|path| {
            Ok(SheetFile {
                path,
                text: read_or_empty(path)?,
                dirty: false,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let mut doc = parse_document(&read_text(document)?);
    let mut sources = StyleSources {
        files,
        doc: &mut doc,
        doc_dirty: false,
    };
    let outcome = upsert_chunks(&mut sources, style)?;

    let doc_dirty = sources.doc_dirty;
    for file in sources.files.iter().filter(|f| f.dirty) {
        write_text(file.path, &file.text)?;
    }
    if doc_dirty {
        write_text(document, &to_html(&doc))?;
    }
    Ok(outcome)
}

/// Upserts each rule of `style` into `sheet`.
///
/// A rule whose selector text equals an existing rule's selector replaces that
/// rule in place; any other rule is appended.
pub fn upsert_rules(sheet: &str, style: &str) -> (String, StyleOutcome) {
    let mut sheet = sheet.to_string();
    let Ok(outcome) = upsert_chunks(&mut sheet, style);
    (sheet, outcome)
}

/// Somewhere style rules can be replaced by selector or appended.
trait RuleStore {
    type Error;

    /// Replaces the rule whose selector is `selector`; `false` when there is none.
    fn replace_existing(&mut self, selector: &str, rule: &str) -> std::result::Result<bool, Self::Error>;

    fn append_rule(&mut self, rule: &str) -> std::result::Result<(), Self::Error>;
}

impl RuleStore for String {
    type Error = Infallible;

    fn replace_existing(&mut self, selector: &str, rule: &str) -> std::result::Result<bool, Infallible> {
        Ok(replace_rule(self, selector, rule))
    }

    fn append_rule(&mut self, rule: &str) -> std::result::Result<(), Infallible> {
        *self = append_with_gap(self, rule);
        Ok(())
    }
}

struct SheetFile<'a> {
    path: &'a Path,
    text: String,
    dirty: bool,
}

/// Linked stylesheets followed by the document's inline `<style>` blocks.
struct StyleSources<'a> {
    files: Vec<SheetFile<'a>>,
    doc: &'a mut Document,
    doc_dirty: bool,
}

impl RuleStore for StyleSources<'_> {
    type Error = EngineError;

    fn replace_existing(&mut self, selector: &str, rule: &str) -> Result<bool> {
        for file in &mut self.files {
            if replace_rule(&mut file.text, selector, rule) {
                log::debug!(target: "engine.patch", "{selector}: replaced in {}", file.path.display());
                file.dirty = true;
                return Ok(true);
            }
        }
        for block in style_blocks(self.doc) {
            let mut text = block_text(self.doc, block);
            if replace_rule(&mut text, selector, rule) {
                set_block_text(self.doc, block, &text)?;
                self.doc_dirty = true;
                log::debug!(target: "engine.patch", "{selector}: replaced in inline block {block}");
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn append_rule(&mut self, rule: &str) -> Result<()> {
        match self.files.last_mut() {
            Some(file) => {
                file.text = append_with_gap(&file.text, rule);
                file.dirty = true;
            }
            None => {
                append_to_last_style(self.doc, rule)?;
                self.doc_dirty = true;
            }
        }
        Ok(())
    }
}

fn upsert_chunks<S: RuleStore>(store: &mut S, style: &str) -> std::result::Result<StyleOutcome, S::Error> {
    let mut outcome = StyleOutcome::default();
    for chunk in split_rules(style) {
        let Some(selector) = selector_of(chunk) else {
            log::warn!(target: "engine.patch", "style chunk has no selector, appending as-is: {chunk:?}");
            store.append_rule(chunk)?;
            outcome.changes.push(RuleChange::Verbatim);
            continue;
        };
        if store.replace_existing(selector, chunk)? {
            outcome.changes.push(RuleChange::Updated(selector.to_string()));
        } else {
            store.append_rule(chunk)?;
            outcome.changes.push(RuleChange::Inserted(selector.to_string()));
        }
    }
    Ok(outcome)
}

#[cfg(test)]
fn upsert_inline(doc: &mut Document, style: &str) -> Result<StyleOutcome> {
    upsert_chunks(
        &mut StyleSources {
            files: Vec::new(),
            doc,
            doc_dirty: false,
        },
        style,
    )
}

/// Replaces the rule keyed by `selector` in `sheet` with `rule`.
fn replace_rule(sheet: &mut String, selector: &str, rule: &str) -> bool {
    match find_rule(sheet, selector) {
        Some(span) => {
            sheet.replace_range(span, rule);
            true
        }
        None => false,
    }
}

fn find_rule(sheet: &str, selector: &str) -> Option<Range<usize>> {
    scan_rules(sheet)
        .into_iter()
        .find(|rule| rule.selector == selector)
        .map(|rule| rule.span)
}

fn append_to_last_style(doc: &mut Document, chunk: &str) -> Result<()> {
    match style_blocks(doc).last().copied() {
        Some(block) => {
            let text = append_with_gap(&block_text(doc, block), chunk);
            set_block_text(doc, block, &text)?;
        }
        None => {
            let parent = first_named(doc, &["head", "html"]);
            let block = doc.append_element(parent, "style", Vec::new())?;
            doc.append_text(block, &append_with_gap("", chunk))?;
            log::debug!(target: "engine.patch", "created <style> under {parent}");
        }
    }
    Ok(())
}

/// Appends `script` to the script file or the last inline `<script>` block.
///
/// Nothing is searched or deduplicated, so appending the same text twice leaves
/// two copies.
pub fn append_script(
    document: &Path,
    target: &ResourceTarget,
    script: &str,
    placeholder: &str,
) -> Result<ScriptOutcome> {
    let trimmed = script.trim();
    if trimmed.is_empty() || (!placeholder.is_empty() && trimmed.starts_with(placeholder)) {
        log::debug!(target: "engine.patch", "no script to append");
        return Ok(ScriptOutcome::Skipped);
    }
    match target {
        ResourceTarget::File(path) => {
            let existing = read_or_empty(path)?;
            write_text(path, &append_with_gap(&existing, script))?;
        }
        ResourceTarget::Inline => {
            let mut doc = parse_document(&read_text(document)?);
            match inline_script_blocks(&doc).last().copied() {
                Some(block) => {
                    let text = append_with_gap(&block_text(&doc, block), script);
                    set_block_text(&mut doc, block, &text)?;
                }
                None => {
                    let parent = first_named(&doc, &["body", "html"]);
                    let block = doc.append_element(parent, "script", Vec::new())?;
                    doc.append_text(block, &append_with_gap("", script))?;
                }
            }
            write_text(document, &to_html(&doc))?;
        }
    }
    Ok(ScriptOutcome::Appended)
}

/// First element named like one of `names`, tried in order; the root otherwise.
fn first_named(doc: &Document, names: &[&str]) -> NodeId {
    names
        .iter()
        .find_map(|name| elements_named(doc, name).next())
        .unwrap_or(doc.root())
}

// input: existing="a { b: c; }\n\n\n", addition=".x { y: z; }"
// output: "a { b: c; }\n\n.x { y: z; }\n"
fn append_with_gap(existing: &str, addition: &str) -> String {
    let head = existing.trim_end();
    let mut out = if head.is_empty() {
        addition.to_string()
    } else {
        format!("{head}\n\n{addition}")
    };
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Fallback, LocatorConfig};

    const PAGE: &str = r#"<html><head><title>t</title></head><body><h2 id="t1" class="title">Old</h2></body></html>"#;

    #[test]
    fn relocate_replaces_the_located_subtree() {
        let patched = replace_in_text(
            PAGE,
            r#"<h2 id="t1" class="title">Old</h2>"#,
            r#"<h2 id="t1" class="title" style="color:green">New</h2>"#,
            ReplaceStrategy::Relocate,
            &Locator::default(),
        )
        .unwrap();
        assert_eq!(
            patched,
            r#"<html><head><title>t</title></head><body><h2 id="t1" class="title" style="color:green">New</h2></body></html>"#
        );
    }

    #[test]
    fn relocate_keeps_character_references_elsewhere_intact() {
        let patched = replace_in_text(
            "<p id=\"a\">x</p><p>a&nbsp;b &copy; c &mdash; d</p>",
            "<p id=\"a\">x</p>",
            "<p id=\"a\">y</p>",
            ReplaceStrategy::Relocate,
            &Locator::default(),
        )
        .unwrap();
        assert_eq!(patched, "<p id=\"a\">y</p><p>a&nbsp;b \u{A9} c \u{2014} d</p>");
    }

    #[test]
    fn relocate_can_insert_several_nodes() {
        let patched = replace_in_text(
            PAGE,
            r#"<h2 id="t1">x</h2>"#,
            "<h2 id=\"t1\">A</h2>\n<p>B</p>",
            ReplaceStrategy::Relocate,
            &Locator::default(),
        )
        .unwrap();
        assert!(patched.contains("<body><h2 id=\"t1\">A</h2>\n<p>B</p></body>"), "{patched}");
    }

    #[test]
    fn relocate_reports_missing_targets() {
        let locator = Locator::from_config(&LocatorConfig {
            fallback: Fallback::None,
        });
        let err = replace_in_text(PAGE, "<h3>x</h3>", "<h3>y</h3>", ReplaceStrategy::Relocate, &locator)
            .unwrap_err();
        assert!(matches!(err, EngineError::PatchFailed { .. }));
        let err = replace_in_text(PAGE, "no markup", "<h3>y</h3>", ReplaceStrategy::Relocate, &locator)
            .unwrap_err();
        assert!(matches!(err, EngineError::PatchFailed { .. }));
    }

    #[test]
    fn exact_text_replaces_the_first_occurrence_only() {
        let doc = "<p>a</p><p>a</p>";
        let patched =
            replace_in_text(doc, "<p>a</p>", "<p>b</p>", ReplaceStrategy::ExactText, &Locator::default())
                .unwrap();
        assert_eq!(patched, "<p>b</p><p>a</p>");
    }

    #[test]
    fn exact_text_is_not_idempotent() {
        let original = r#"<h2 id="t1" class="title">Old</h2>"#;
        let replacement = r#"<h2 id="t1" class="title" style="color:green">Old</h2>"#;
        let locator = Locator::default();
        let once = replace_in_text(PAGE, original, replacement, ReplaceStrategy::ExactText, &locator).unwrap();
        let err = replace_in_text(&once, original, replacement, ReplaceStrategy::ExactText, &locator)
            .unwrap_err();
        assert!(matches!(err, EngineError::PatchFailed { .. }));
    }

    #[test]
    fn empty_replacement_is_rejected() {
        let err = replace_in_text(PAGE, "<h2 id=\"t1\"></h2>", "  ", ReplaceStrategy::Relocate, &Locator::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::PatchFailed { .. }));
    }

    #[test]
    fn upsert_replaces_in_place_and_appends_new_rules() {
        let sheet = "body { margin: 0; }\n.title { color: black; }\nfooter { x: y; }\n";
        let (sheet, outcome) = upsert_rules(sheet, ".title { color: green; }\n#t1 { padding: 0; }");
        assert_eq!(
            sheet,
            "body { margin: 0; }\n.title { color: green; }\nfooter { x: y; }\n\n#t1 { padding: 0; }\n"
        );
        assert_eq!(
            outcome.changes,
            [
                RuleChange::Updated(".title".into()),
                RuleChange::Inserted("#t1".into())
            ]
        );
    }

    #[test]
    fn upsert_is_deterministic_across_rounds() {
        let (sheet, _) = upsert_rules("", ".title { color: black; }");
        let (sheet, _) = upsert_rules(&sheet, ".title { color: green; }");
        let (sheet, outcome) = upsert_rules(&sheet, ".title { color: red; }");
        assert_eq!(sheet, ".title { color: red; }\n");
        assert_eq!(outcome.updated(), 1);
    }

    #[test]
    fn upsert_keys_on_exact_selector_text() {
        let (sheet, outcome) = upsert_rules("h2.title { a: b; }", ".title { a: c; }");
        assert_eq!(sheet, "h2.title { a: b; }\n\n.title { a: c; }\n");
        assert_eq!(outcome.inserted(), 1);
    }

    #[test]
    fn selectorless_chunk_is_appended_verbatim() {
        let (sheet, outcome) = upsert_rules(".a { b: c; }", "color: red;");
        assert_eq!(sheet, ".a { b: c; }\n\ncolor: red;\n");
        assert_eq!(outcome.changes, [RuleChange::Verbatim]);
    }

    #[test]
    fn inline_upsert_creates_a_style_block_in_head() {
        let mut doc = parse_document(PAGE);
        let outcome = upsert_inline(&mut doc, ".title { color: green; }").unwrap();
        assert_eq!(outcome.inserted(), 1);
        assert_eq!(
            to_html(&doc),
            "<html><head><title>t</title><style>.title { color: green; }\n</style></head><body><h2 id=\"t1\" class=\"title\">Old</h2></body></html>"
        );
        upsert_inline(&mut doc, ".title { color: red; }").unwrap();
        let html = to_html(&doc);
        assert!(html.contains("<style>.title { color: red; }\n</style>"), "{html}");
        assert_eq!(html.matches(".title {").count(), 1);
    }

    #[test]
    fn inline_upsert_searches_every_block() {
        let mut doc = parse_document(
            "<style>.a { x: 1; }</style><p>x</p><style>.b { y: 2; }</style>",
        );
        upsert_inline(&mut doc, ".a { x: 9; }\n.c { z: 3; }").unwrap();
        assert_eq!(
            to_html(&doc),
            "<style>.a { x: 9; }</style><p>x</p><style>.b { y: 2; }\n\n.c { z: 3; }\n</style>"
        );
    }

    #[test]
    fn append_with_gap_trims_trailing_blank_lines() {
        assert_eq!(append_with_gap("a { b: c; }\n\n\n", ".x { y: z; }"), "a { b: c; }\n\n.x { y: z; }\n");
        assert_eq!(append_with_gap("  \n", "x();"), "x();\n");
    }

    #[test]
    fn targets_follow_project_links() {
        let project = Project {
            root: PathBuf::from("/p"),
            document: PathBuf::from("/p/index.html"),
            styles: vec![PathBuf::from("/p/a.css"), PathBuf::from("/p/b.css")],
            scripts: Vec::new(),
        };
        let targets = PatchTargets::for_project(&project);
        assert_eq!(
            targets.stylesheets,
            [PathBuf::from("/p/a.css"), PathBuf::from("/p/b.css")]
        );
        assert_eq!(targets.script, ResourceTarget::Inline);
    }

    #[test]
    fn style_sources_prefer_replacing_over_appending() {
        let mut doc = parse_document("<head><style>#t1 { x: y; }</style></head>");
        let files = vec![
            SheetFile {
                path: Path::new("a.css"),
                text: "body { margin: 0; }\n".to_string(),
                dirty: false,
            },
            SheetFile {
                path: Path::new("b.css"),
                text: ".title { color: black; }\n".to_string(),
                dirty: false,
            },
        ];
        let mut sources = StyleSources {
            files,
            doc: &mut doc,
            doc_dirty: false,
        };
        let outcome = upsert_chunks(
            &mut sources,
            ".title { color: green; }\n#t1 { x: z; }\nfooter { a: b; }",
        )
        .unwrap();
        assert_eq!(
            outcome.changes,
            [
                RuleChange::Updated(".title".into()),
                RuleChange::Updated("#t1".into()),
                RuleChange::Inserted("footer".into())
            ]
        );
        let [a, b] = &sources.files[..] else {
            panic!("two sheets expected");
        };
        assert!(sources.doc_dirty);
        assert_eq!(a.text, "body { margin: 0; }\n");
        assert!(!a.dirty);
        assert_eq!(b.text, ".title { color: green; }\n\nfooter { a: b; }\n");
        assert!(b.dirty);
        assert_eq!(to_html(&doc), "<head><style>#t1 { x: z; }</style></head>");
    }

    #[test]
    fn appended_text_keeps_its_own_layout() {
        assert_eq!(append_with_gap("a();", "  b();\n"), "a();\n\n  b();\n");
        assert_eq!(append_with_gap("", "  b();"), "  b();\n");
    }
}
