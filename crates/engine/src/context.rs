//! Context around a located node: enclosing containers, related style rules and
//! related script lines.
//!
//! Collection never fails. An empty string in any field means nothing related
//! was found.

use crate::config::{AncestorPolicy, ContextConfig, StyleGranularity};
use crate::descriptor::FragmentDescriptor;
use crate::resources::{Resources, Source};
use css::scan_rules;
use html::collect::{block_text, inline_script_blocks, style_blocks};
use html::traverse::ancestors;
use html::{Document, NodeId, outer_html};
use regex::Regex;

pub const PARENT_SEPARATOR: &str = "\n<!-- Parent Container -->\n";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextBundle {
    /// Enclosing containers, outermost first.
    pub ancestor_markup: String,
    pub related_style_text: String,
    pub related_script_text: String,
}

impl ContextBundle {
    pub fn is_empty(&self) -> bool {
        self.ancestor_markup.is_empty()
            && self.related_style_text.is_empty()
            && self.related_script_text.is_empty()
    }
}

pub fn collect_context(
    doc: &Document,
    node: NodeId,
    resources: &Resources,
    config: &ContextConfig,
) -> ContextBundle {
    let evidence = FragmentDescriptor::from_element(doc, node);
    let bundle = ContextBundle {
        ancestor_markup: collect_ancestors(doc, node, config),
        related_style_text: related_style(
            &evidence,
            &style_sources(doc, resources),
            config.style_granularity,
        ),
        related_script_text: related_script(&evidence, &script_sources(doc, resources)),
    };
    log::debug!(
        target: "engine.context",
        "{node}: ancestors {}B, style {}B, script {}B",
        bundle.ancestor_markup.len(),
        bundle.related_style_text.len(),
        bundle.related_script_text.len()
    );
    bundle
}

/// Serialized enclosing containers of `node`.
///
/// The walk stops below `<html>` and the document root.
pub fn collect_ancestors(doc: &Document, node: NodeId, config: &ContextConfig) -> String {
    let fits = |markup: &str| config.max_ancestor_bytes.is_none_or(|max| markup.len() <= max);
    let containers = ancestors(doc, node)
        .take_while(|id| *id != doc.root() && !doc.is_element_named(*id, "html"));

    match config.ancestors {
        AncestorPolicy::Chain => {
            let mut chain = Vec::new();
            for (level, id) in containers.enumerate() {
                if !config.ancestor_depth.allows(level) {
                    break;
                }
                let markup = outer_html(doc, id);
                if !fits(&markup) {
                    log::debug!(target: "engine.context", "{id} exceeds the ancestor budget");
                    break;
                }
                chain.push(markup);
            }
            chain.reverse();
            chain.join(PARENT_SEPARATOR)
        }
        AncestorPolicy::Nearest => containers
            .map(|id| outer_html(doc, id))
            .find(|markup| fits(markup))
            .unwrap_or_else(|| outer_html(doc, node)),
    }
}

/// Inline `<style>` blocks of `doc` followed by the linked stylesheets.
pub fn style_sources(doc: &Document, resources: &Resources) -> Vec<Source> {
    let mut sources: Vec<Source> = style_blocks(doc)
        .into_iter()
        .enumerate()
        .map(|(i, id)| Source::new(format!("<style> #{}", i + 1), block_text(doc, id)))
        .collect();
    sources.extend(resources.styles().iter().cloned());
    sources
}

/// Inline `<script>` blocks without `src`, followed by the linked script files.
pub fn script_sources(doc: &Document, resources: &Resources) -> Vec<Source> {
    let mut sources: Vec<Source> = inline_script_blocks(doc)
        .into_iter()
        .enumerate()
        .map(|(i, id)| Source::new(format!("<script> #{}", i + 1), block_text(doc, id)))
        .collect();
    sources.extend(resources.scripts().iter().cloned());
    sources
}

/// Style rules whose selector mentions `#id` or `.class` of the node.
pub fn related_style(
    evidence: &FragmentDescriptor,
    sources: &[Source],
    granularity: StyleGranularity,
) -> String {
    let Some(pattern) = selector_pattern(evidence) else {
        return String::new();
    };
    match granularity {
        StyleGranularity::PerRule => {
            let mut rules = Vec::new();
            for source in sources {
                for rule in scan_rules(&source.text) {
                    if pattern.is_match(rule.selector) {
                        rules.push(rule.text(&source.text).trim());
                    }
                }
            }
            rules.join("\n")
        }
        StyleGranularity::WholeSheet => sources
            .iter()
            .filter(|source| {
                scan_rules(&source.text)
                    .iter()
                    .any(|rule| pattern.is_match(rule.selector))
            })
            .map(|source| source.text.trim())
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

/// `#id` or `.class` followed by something that cannot continue the name.
fn selector_pattern(evidence: &FragmentDescriptor) -> Option<Regex> {
    let mut alternatives = Vec::new();
    if let Some(id) = &evidence.id {
        alternatives.push(format!("#{}", regex::escape(id)));
    }
    for class in &evidence.classes {
        alternatives.push(format!(r"\.{}", regex::escape(class)));
    }
    if alternatives.is_empty() {
        return None;
    }
    let source = format!(r"(?:{})(?:[^\w-]|$)", alternatives.join("|"));
    match Regex::new(&source) {
        Ok(pattern) => Some(pattern),
        Err(err) => {
            log::warn!(target: "engine.context", "selector pattern rejected: {err}");
            None
        }
    }
}

/// Script lines containing the node's id or one of its classes as a substring.
///
/// Lines keep their original text and order. A line is reported once per name
/// it contains (id first, then classes in sorted order).
pub fn related_script(evidence: &FragmentDescriptor, sources: &[Source]) -> String {
    let needles: Vec<&str> = evidence
        .id
        .iter()
        .chain(evidence.classes.iter())
        .map(String::as_str)
        .collect();
    if needles.is_empty() {
        return String::new();
    }
    let mut lines = Vec::new();
    for source in sources {
        for line in source.text.lines() {
            for _ in needles.iter().filter(|needle| line.contains(*needle)) {
                lines.push(line);
            }
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AncestorDepth;
    use html::parse_document;
    use html::traverse::elements_named;

    const PAGE: &str = r#"<html><head><style>.title { color: black; }
.subtitle { color: gray; }
#t1:hover { color: blue; }</style></head><body><main><section class="hero"><div class="inner"><h2 id="t1" class="title">Old</h2></div></section></main>
<script>const t = document.getElementById("t1");
t.classList.add("title");
console.log("unrelated");</script></body></html>"#;

    fn h2(doc: &Document) -> NodeId {
        elements_named(doc, "h2").next().unwrap()
    }

    fn evidence(markup: &str) -> FragmentDescriptor {
        let doc = parse_document(markup);
        FragmentDescriptor::from_element(&doc, html::traverse::first_element(&doc).unwrap())
    }

    #[test]
    fn chain_is_outermost_first_and_stops_below_html() {
        let doc = parse_document(PAGE);
        let config = ContextConfig {
            ancestor_depth: AncestorDepth::Unbounded,
            ..ContextConfig::default()
        };
        let markup = collect_ancestors(&doc, h2(&doc), &config);
        let parts: Vec<_> = markup.split(PARENT_SEPARATOR).collect();
        assert_eq!(parts.len(), 4);
        assert!(parts[0].starts_with("<body>"));
        assert!(parts[1].starts_with("<main>"));
        assert!(parts[3].starts_with(r#"<div class="inner">"#));
    }

    #[test]
    fn chain_respects_depth() {
        let doc = parse_document(PAGE);
        let config = ContextConfig {
            ancestor_depth: AncestorDepth::Limited(2),
            ..ContextConfig::default()
        };
        let markup = collect_ancestors(&doc, h2(&doc), &config);
        let parts: Vec<_> = markup.split(PARENT_SEPARATOR).collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].starts_with(r#"<section class="hero">"#));
    }

    #[test]
    fn byte_budget_cuts_the_chain() {
        let doc = parse_document(PAGE);
        let inner = r#"<div class="inner"><h2 id="t1" class="title">Old</h2></div>"#;
        let config = ContextConfig {
            ancestor_depth: AncestorDepth::Unbounded,
            max_ancestor_bytes: Some(inner.len()),
            ..ContextConfig::default()
        };
        assert_eq!(collect_ancestors(&doc, h2(&doc), &config), inner);
    }

    #[test]
    fn nearest_falls_back_to_the_node() {
        let doc = parse_document(PAGE);
        let mut config = ContextConfig {
            ancestors: AncestorPolicy::Nearest,
            ..ContextConfig::default()
        };
        assert!(collect_ancestors(&doc, h2(&doc), &config).starts_with(r#"<div class="inner">"#));
        config.max_ancestor_bytes = Some(10);
        assert_eq!(
            collect_ancestors(&doc, h2(&doc), &config),
            r#"<h2 id="t1" class="title">Old</h2>"#
        );
    }

    #[test]
    fn top_level_node_has_no_ancestors() {
        let doc = parse_document("<p id=x>alone</p>");
        let p = elements_named(&doc, "p").next().unwrap();
        assert_eq!(collect_ancestors(&doc, p, &ContextConfig::default()), "");
    }

    #[test]
    fn per_rule_style_respects_token_boundaries() {
        let doc = parse_document(PAGE);
        let sources = style_sources(&doc, &Resources::new().with_style("main.css", "#t10 { x: y; }\n.title-big { a: b; }\nh2.title, p { margin: 0; }"));
        let style = related_style(&evidence(r#"<h2 id="t1" class="title"></h2>"#), &sources, StyleGranularity::PerRule);
        assert_eq!(
            style,
            ".title { color: black; }\n#t1:hover { color: blue; }\nh2.title, p { margin: 0; }"
        );
    }

    #[test]
    fn whole_sheet_returns_matching_sources() {
        let sources = [
            Source::new("a.css", "  .other { x: y; }  "),
            Source::new("b.css", ".title { color: red; }\n.other { x: y; }\n"),
        ];
        let style = related_style(&evidence(r#"<p class="title"></p>"#), &sources, StyleGranularity::WholeSheet);
        assert_eq!(style, ".title { color: red; }\n.other { x: y; }");
    }

    #[test]
    fn script_lines_match_by_substring() {
        let doc = parse_document(PAGE);
        let sources = script_sources(&doc, &Resources::new().with_script("app.js", "// t1 and title\nfoo();"));
        let script = related_script(&evidence(r#"<h2 id="t1" class="title"></h2>"#), &sources);
        assert_eq!(
            script,
            "const t = document.getElementById(\"t1\");\nt.classList.add(\"title\");\n// t1 and title\n// t1 and title"
        );
    }

    #[test]
    fn script_lines_keep_duplicates() {
        let sources = [Source::new(
            "app.js",
            "el('t1').classList.add('title');\nlog('t1');\nlog('t1');\nother();",
        )];
        let script = related_script(&evidence(r#"<h2 id="t1" class="title"></h2>"#), &sources);
        assert_eq!(
            script,
            "el('t1').classList.add('title');\nel('t1').classList.add('title');\nlog('t1');\nlog('t1');"
        );
    }

    #[test]
    fn empty_evidence_yields_empty_text() {
        let doc = parse_document(PAGE);
        let bare = evidence("<span>plain</span>");
        let resources = Resources::new();
        assert_eq!(related_style(&bare, &style_sources(&doc, &resources), StyleGranularity::PerRule), "");
        assert_eq!(related_style(&bare, &style_sources(&doc, &resources), StyleGranularity::WholeSheet), "");
        assert_eq!(related_script(&bare, &script_sources(&doc, &resources)), "");
    }

    #[test]
    fn bundle_for_located_node() {
        let doc = parse_document(PAGE);
        let bundle = collect_context(&doc, h2(&doc), &Resources::new(), &ContextConfig::default());
        assert!(!bundle.is_empty());
        assert!(bundle.related_style_text.contains(".title { color: black; }"));
        assert!(!bundle.related_style_text.contains("subtitle"));
        assert!(!bundle.related_script_text.contains("unrelated"));
    }
}
