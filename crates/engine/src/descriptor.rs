//! Identifying evidence extracted from a fragment or a document element.

use crate::error::{EngineError, Result};
use html::traverse::{first_element, normalized_text};
use html::{Document, NodeId, parse_document};
use std::collections::{BTreeMap, BTreeSet};

const DATA_PREFIX: &str = "data-";

/// Tag, id, classes and `data-*` attributes of one element.
///
/// Empty `id` and empty `class` values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentDescriptor {
    pub tag: String,
    pub id: Option<String>,
    pub classes: BTreeSet<String>,
    pub data_attrs: BTreeMap<String, String>,
}

impl FragmentDescriptor {
    pub fn from_element(doc: &Document, node: NodeId) -> Self {
        let tag = doc.element_name(node).unwrap_or_default().to_string();
        let id = doc
            .attr(node, "id")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        let classes = doc.attr(node, "class").map(class_set).unwrap_or_default();
        let data_attrs = doc
            .attributes(node)
            .iter()
            .filter(|(name, _)| name.starts_with(DATA_PREFIX))
            .map(|(name, value)| (name.clone(), value.clone().unwrap_or_default()))
            .collect();
        Self {
            tag,
            id,
            classes,
            data_attrs,
        }
    }

    /// Whether there is anything besides the tag to match on.
    pub fn has_attribute_evidence(&self) -> bool {
        self.id.is_some() || !self.classes.is_empty() || !self.data_attrs.is_empty()
    }
}

/// A parsed fragment: the original text plus what identifies its subject element.
///
/// The subject is the first element of the fragment in document order.
#[derive(Debug, Clone)]
pub struct Fragment {
    text: String,
    descriptor: FragmentDescriptor,
    attributes: BTreeMap<String, String>,
    inner_text: String,
}

impl Fragment {
    pub fn parse(text: &str) -> Result<Self> {
        let doc = parse_document(text);
        let subject = first_element(&doc).ok_or(EngineError::InvalidFragment)?;
        let fragment = Self {
            text: text.to_string(),
            descriptor: FragmentDescriptor::from_element(&doc, subject),
            attributes: attribute_map(&doc, subject),
            inner_text: normalized_text(&doc, subject),
        };
        log::debug!(target: "engine.fragment", "descriptor: {:?}", fragment.descriptor);
        Ok(fragment)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn descriptor(&self) -> &FragmentDescriptor {
        &self.descriptor
    }

    pub fn tag(&self) -> &str {
        &self.descriptor.tag
    }

    pub(crate) fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub(crate) fn inner_text(&self) -> &str {
        &self.inner_text
    }
}

/// Whitespace-separated class tokens as a set.
pub fn class_set(value: &str) -> BTreeSet<String> {
    value.split_ascii_whitespace().map(str::to_string).collect()
}

/// Attribute map used for whole-attribute comparison.
///
/// `class` is reduced to its sorted token set so ordering and spacing differences
/// do not matter; valueless attributes map to `""`.
pub(crate) fn attribute_map(doc: &Document, node: NodeId) -> BTreeMap<String, String> {
    doc.attributes(node)
        .iter()
        .map(|(name, value)| {
            let value = value.as_deref().unwrap_or_default();
            let value = if name == "class" {
                class_set(value).into_iter().collect::<Vec<_>>().join(" ")
            } else {
                value.to_string()
            };
            (name.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_first_element() {
        let fragment = Fragment::parse(
            "  <!-- note -->\n<h2 id=\"t1\" class=\"title  big\" data-x=\"1\" data-flag>Hi</h2><p>x</p>",
        )
        .unwrap();
        let d = fragment.descriptor();
        assert_eq!(d.tag, "h2");
        assert_eq!(d.id.as_deref(), Some("t1"));
        assert_eq!(d.classes, class_set("big title"));
        assert_eq!(d.data_attrs.get("data-x").map(String::as_str), Some("1"));
        assert_eq!(d.data_attrs.get("data-flag").map(String::as_str), Some(""));
        assert_eq!(fragment.inner_text(), "Hi");
    }

    #[test]
    fn fragment_without_element_is_invalid() {
        for text in ["", "   ", "just text", "<!-- only a comment -->"] {
            assert!(
                matches!(Fragment::parse(text), Err(EngineError::InvalidFragment)),
                "{text:?}"
            );
        }
    }

    #[test]
    fn empty_id_and_class_are_absent() {
        let fragment = Fragment::parse("<div id=\"\" class=\"  \">x</div>").unwrap();
        assert!(!fragment.descriptor().has_attribute_evidence());
    }

    #[test]
    fn attribute_map_normalizes_class_order() {
        let a = Fragment::parse("<p class=\"b a\" hidden>x</p>").unwrap();
        let b = Fragment::parse("<p hidden class=\"a   b\">x</p>").unwrap();
        assert_eq!(a.attributes(), b.attributes());
        assert_eq!(a.attributes().get("hidden").map(String::as_str), Some(""));
    }
}
