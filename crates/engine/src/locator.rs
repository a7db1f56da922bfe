//! Element location: an ordered list of strategies, first hit wins.
//!
//! Every strategy scans elements in document order, so when several nodes satisfy
//! the same strategy the earliest one is returned. Strategies are never merged or
//! ranked against each other.

use crate::config::{Fallback, LocatorConfig};
use crate::descriptor::{Fragment, attribute_map, class_set};
use crate::error::{EngineError, Result};
use html::traverse::{elements, elements_named, normalized_text};
use html::{Document, NodeId, outer_html};
use std::fmt;
use tools::normalize_lines;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Same tag, same `id`.
    Id,
    /// Same tag, candidate carries every `data-*` pair of the fragment.
    DataAttributes,
    /// Same tag, exactly the same class set.
    ClassSet,
    /// Normalized serialized markup equals the normalized fragment text.
    Serialization,
    /// Same tag, same attribute map, same collapsed inner text.
    AttributesAndText,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Id => "id",
            Strategy::DataAttributes => "data-attributes",
            Strategy::ClassSet => "class-set",
            Strategy::Serialization => "serialization",
            Strategy::AttributesAndText => "attributes-and-text",
        }
    }

    /// Runs this strategy alone. `None` when it has no evidence to use or no
    /// element satisfies it.
    pub fn attempt(self, doc: &Document, fragment: &Fragment) -> Option<NodeId> {
        let d = fragment.descriptor();
        let mut same_tag = elements_named(doc, &d.tag);
        match self {
            Strategy::Id => {
                let id = d.id.as_deref()?;
                same_tag.find(|n| doc.attr(*n, "id").map(str::trim) == Some(id))
            }
            Strategy::DataAttributes => {
                if d.data_attrs.is_empty() {
                    return None;
                }
                same_tag.find(|n| {
                    d.data_attrs
                        .iter()
                        .all(|(k, v)| doc.attr(*n, k) == Some(v.as_str()))
                })
            }
            Strategy::ClassSet => {
                if d.classes.is_empty() {
                    return None;
                }
                same_tag.find(|n| doc.attr(*n, "class").map(class_set).as_ref() == Some(&d.classes))
            }
            Strategy::Serialization => {
                let wanted = normalize_lines(fragment.text());
                if wanted.is_empty() {
                    return None;
                }
                elements(doc).find(|n| normalize_lines(&outer_html(doc, *n)) == wanted)
            }
            Strategy::AttributesAndText => same_tag.find(|n| {
                attribute_map(doc, *n) == *fragment.attributes()
                    && normalized_text(doc, *n) == fragment.inner_text()
            }),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub node: NodeId,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    strategies: Vec<Strategy>,
}

impl Default for Locator {
    fn default() -> Self {
        Self::from_config(&LocatorConfig::default())
    }
}

impl Locator {
    pub fn from_config(config: &LocatorConfig) -> Self {
        let mut strategies = vec![Strategy::Id, Strategy::DataAttributes, Strategy::ClassSet];
        match config.fallback {
            Fallback::Serialization => strategies.push(Strategy::Serialization),
            Fallback::AttributesAndText => strategies.push(Strategy::AttributesAndText),
            Fallback::None => {}
        }
        Self { strategies }
    }

    /// A locator running exactly `strategies`, in order.
    pub fn with_strategies(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    pub fn locate(&self, doc: &Document, fragment: &Fragment) -> Result<Match> {
        for &strategy in &self.strategies {
            if let Some(node) = strategy.attempt(doc, fragment) {
                log::debug!(target: "engine.locator", "<{}> found {node} by {strategy}", fragment.tag());
                return Ok(Match { node, strategy });
            }
            log::trace!(target: "engine.locator", "<{}>: {strategy} missed", fragment.tag());
        }
        log::info!(target: "engine.locator", "<{}> not found", fragment.tag());
        Err(EngineError::NotFound {
            tag: fragment.tag().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use html::parse_document;

    fn locate_with(locator: &Locator, page: &str, fragment: &str) -> Result<(String, Strategy)> {
        let doc = parse_document(page);
        let fragment = Fragment::parse(fragment)?;
        let found = locator.locate(&doc, &fragment)?;
        Ok((outer_html(&doc, found.node), found.strategy))
    }

    fn locate(page: &str, fragment: &str) -> Result<(String, Strategy)> {
        locate_with(&Locator::default(), page, fragment)
    }

    #[test]
    fn id_beats_class_set() {
        let page = r#"<div><p class="note" id="a">first</p><p class="note" id="b">second</p></div>"#;
        let (found, strategy) = locate(page, r#"<p class="note" id="b">stale text</p>"#).unwrap();
        assert_eq!(found, r#"<p class="note" id="b">second</p>"#);
        assert_eq!(strategy, Strategy::Id);
    }

    #[test]
    fn id_requires_the_same_tag() {
        let page = r#"<div id="x">div</div><section class="c">s</section>"#;
        let err = locate_with(
            &Locator::from_config(&LocatorConfig {
                fallback: Fallback::None,
            }),
            page,
            r#"<span id="x">span</span>"#,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { ref tag } if tag == "span"));
    }

    #[test]
    fn data_attributes_allow_extra_attributes() {
        let page = r#"<li data-k="1">one</li><li data-k="2" data-extra="y" class="z">two</li>"#;
        let (found, strategy) = locate(page, r#"<li data-k="2">changed</li>"#).unwrap();
        assert!(found.contains("two"));
        assert_eq!(strategy, Strategy::DataAttributes);
    }

    #[test]
    fn class_set_is_exact_equality() {
        let page = r#"<p class="a b c">superset</p><p class="b a">exact</p>"#;
        let (found, strategy) = locate(page, r#"<p class="a  b">x</p>"#).unwrap();
        assert!(found.contains("exact"));
        assert_eq!(strategy, Strategy::ClassSet);
    }

    #[test]
    fn ties_go_to_document_order() {
        let page = r#"<p class="twin">one</p><p class="twin">two</p>"#;
        let (found, _) = locate(page, r#"<p class="twin">two</p>"#).unwrap();
        assert!(found.contains("one"));
    }

    #[test]
    fn serialization_fallback_ignores_indentation() {
        let page = "<ul>\n  <li>\n    plain\n  </li>\n</ul>";
        let (found, strategy) = locate(page, "<li>\nplain\n</li>").unwrap();
        assert_eq!(strategy, Strategy::Serialization);
        assert!(found.starts_with("<li>"));
    }

    #[test]
    fn serialization_fallback_matches_no_break_spaces() {
        let (found, strategy) = locate("<ul><li>120&nbsp;mm</li></ul>", "<li>120&nbsp;mm</li>").unwrap();
        assert_eq!(strategy, Strategy::Serialization);
        assert_eq!(found, "<li>120&nbsp;mm</li>");
    }

    #[test]
    fn attributes_and_text_fallback() {
        let locator = Locator::from_config(&LocatorConfig {
            fallback: Fallback::AttributesAndText,
        });
        let page = r#"<a href='/x' title="t">Go   home</a><a href="/x" title="t">Go</a>"#;
        let (found, strategy) = locate_with(&locator, page, r#"<a title=t href=/x>Go</a>"#).unwrap();
        assert_eq!(strategy, Strategy::AttributesAndText);
        assert_eq!(found, r#"<a href="/x" title="t">Go</a>"#);
    }

    #[test]
    fn no_strategy_matches() {
        let err = locate("<p>a</p>", "<p>b</p>").unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[test]
    fn fallback_none_drops_the_last_tier() {
        let locator = Locator::from_config(&LocatorConfig {
            fallback: Fallback::None,
        });
        assert_eq!(
            locator.strategies(),
            [Strategy::Id, Strategy::DataAttributes, Strategy::ClassSet]
        );
        assert!(locate_with(&locator, "<p>a</p>", "<p>a</p>").is_err());
    }

    #[test]
    fn custom_strategy_order() {
        let locator = Locator::with_strategies(vec![Strategy::ClassSet, Strategy::Id]);
        let page = r#"<p class="n" id="a">first</p><p class="n" id="b">second</p>"#;
        let (found, strategy) = locate_with(&locator, page, r#"<p class="n" id="b">x</p>"#).unwrap();
        assert!(found.contains("first"));
        assert_eq!(strategy, Strategy::ClassSet);
    }
}
