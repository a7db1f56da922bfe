use crate::document::Document;
use crate::types::{NodeId, NodeKind};

/// Pre-order (document order) iterator over `start` and its descendants.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}

pub fn descendants(doc: &Document, start: NodeId) -> Descendants<'_> {
    Descendants {
        doc,
        stack: vec![start],
    }
}

/// Element nodes of the document in document order.
pub fn elements(doc: &Document) -> impl Iterator<Item = NodeId> + '_ {
    descendants(doc, doc.root()).filter(|id| matches!(doc.kind(*id), NodeKind::Element { .. }))
}

/// Elements named `name` (ASCII case-insensitive) in document order.
pub fn elements_named<'a>(doc: &'a Document, name: &'a str) -> impl Iterator<Item = NodeId> + 'a {
    elements(doc).filter(move |id| doc.is_element_named(*id, name))
}

/// Parents of `id`, nearest first, ending with the document root.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.doc.parent(id);
        Some(id)
    }
}

pub fn ancestors(doc: &Document, id: NodeId) -> Ancestors<'_> {
    Ancestors {
        doc,
        next: doc.parent(id),
    }
}

/// Concatenated text of all text descendants of `id`, comments excluded.
pub fn text_content(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    for node in descendants(doc, id) {
        if let NodeKind::Text { text } = doc.kind(node) {
            out.push_str(text);
        }
    }
    out
}

/// [`text_content`] with whitespace runs collapsed and both ends trimmed.
pub fn normalized_text(doc: &Document, id: NodeId) -> String {
    tools::collapse_whitespace(&text_content(doc, id))
}

pub fn first_element(doc: &Document) -> Option<NodeId> {
    elements(doc).next()
}
