//! Arena-backed document tree.
//!
//! Nodes are addressed by [`NodeId`] indices into a single `Vec`. Every record
//! stores its parent index and an ordered list of child indices, so parent
//! walks and subtree replacement never need shared ownership or back-pointers.
//!
//! Invariants:
//! - `NodeId(0)` is the document root and is never detached.
//! - An attached node appears exactly once in its parent's child list.
//! - Detached subtrees stay in the arena but are unreachable from the root;
//!   their ids stay valid for reading and are never reused.

use crate::types::{Attributes, NodeId, NodeKind, NodeRecord, TreeError};

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeRecord>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![NodeRecord::new(NodeKind::Document { doctype: None })],
        }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    /// Number of arena slots, including detached records.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id.index())
    }

    /// Panics if `id` was not produced by this document.
    pub fn node(&self, id: NodeId) -> &NodeRecord {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn doctype(&self) -> Option<&str> {
        match &self.nodes[0].kind {
            NodeKind::Document { doctype } => doctype.as_deref(),
            _ => None,
        }
    }

    pub fn set_doctype(&mut self, value: String) {
        if let NodeKind::Document { doctype } = &mut self.nodes[0].kind {
            *doctype = Some(value);
        }
    }

    /// Tag name for element nodes.
    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_element_named(&self, id: NodeId, target: &str) -> bool {
        self.element_name(id)
            .is_some_and(|name| name.eq_ignore_ascii_case(target))
    }

    /// Attribute list for element nodes; empty for every other kind.
    pub fn attributes(&self, id: NodeId) -> &[(String, Option<String>)] {
        match self.kind(id) {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Value of attribute `key`; valueless attributes read as `""`.
    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    /// Whether the whitespace-separated token list in attribute `key` contains `token`.
    pub fn attr_has_token(&self, id: NodeId, key: &str, token: &str) -> bool {
        self.attr(id, key)
            .is_some_and(|v| v.split_ascii_whitespace().any(|t| t.eq_ignore_ascii_case(token)))
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == Self::ROOT {
                return true;
            }
            match self.get(current).and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeRecord::new(kind));
        id
    }

    fn check(&self, id: NodeId) -> Result<(), TreeError> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(TreeError::UnknownNode(id))
        }
    }

    /// Creates a node and appends it as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId, TreeError> {
        self.check(parent)?;
        if !self.node(parent).kind.allows_children() {
            return Err(TreeError::InvalidParent(parent));
        }
        let child = self.push(kind);
        self.nodes[parent.index()].children.push(child);
        self.nodes[child.index()].parent = Some(parent);
        Ok(child)
    }

    pub fn append_element(
        &mut self,
        parent: NodeId,
        name: &str,
        attributes: Attributes,
    ) -> Result<NodeId, TreeError> {
        self.append(
            parent,
            NodeKind::Element {
                name: name.to_ascii_lowercase(),
                attributes,
            },
        )
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, TreeError> {
        self.append(
            parent,
            NodeKind::Text {
                text: text.to_string(),
            },
        )
    }

    /// Replaces the text of a text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), TreeError> {
        self.check(id)?;
        match &mut self.nodes[id.index()].kind {
            NodeKind::Text { text: existing } => {
                existing.clear();
                existing.push_str(text);
                Ok(())
            }
            _ => Err(TreeError::WrongNodeKind(id)),
        }
    }

    /// Unlinks `id` from its parent. The subtree stays in the arena.
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.check(id)?;
        let parent = self.nodes[id.index()]
            .parent
            .take()
            .ok_or(TreeError::Detached(id))?;
        self.nodes[parent.index()].children.retain(|c| *c != id);
        Ok(())
    }

    /// Replaces the subtree rooted at `target` with the top-level nodes of `fragment`.
    ///
    /// The fragment's nodes are copied into this arena and spliced into `target`'s
    /// parent at `target`'s position; `target` is detached. Returns the ids of the
    /// inserted top-level nodes in order.
    pub fn replace_with_fragment(
        &mut self,
        target: NodeId,
        fragment: &Document,
    ) -> Result<Vec<NodeId>, TreeError> {
        self.check(target)?;
        let parent = self.node(target).parent.ok_or(TreeError::Detached(target))?;
        let position = self
            .children(parent)
            .iter()
            .position(|c| *c == target)
            .ok_or(TreeError::Detached(target))?;

        let inserted: Vec<NodeId> = fragment
            .children(fragment.root())
            .iter()
            .map(|&child| self.import_subtree(fragment, child))
            .collect();

        for &id in &inserted {
            self.nodes[id.index()].parent = Some(parent);
        }
        let siblings = &mut self.nodes[parent.index()].children;
        siblings.splice(position..=position, inserted.iter().copied());
        self.nodes[target.index()].parent = None;
        Ok(inserted)
    }

    /// Copies the subtree rooted at `src_root` of `src` into this arena, unlinked.
    fn import_subtree(&mut self, src: &Document, src_root: NodeId) -> NodeId {
        let new_root = self.push(src.kind(src_root).clone());
        // Iterative pre-order copy so deeply nested fragments cannot overflow the stack.
        let mut stack = vec![(src_root, new_root)];
        while let Some((src_id, dst_id)) = stack.pop() {
            for &src_child in src.children(src_id) {
                let dst_child = self.push(src.kind(src_child).clone());
                self.nodes[dst_child.index()].parent = Some(dst_id);
                self.nodes[dst_id.index()].children.push(dst_child);
                stack.push((src_child, dst_child));
            }
        }
        new_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{outer_html, parse_document, to_html};

    fn first_element(doc: &Document, name: &str) -> NodeId {
        crate::traverse::descendants(doc, doc.root())
            .find(|id| doc.is_element_named(*id, name))
            .unwrap()
    }

    #[test]
    fn parent_links_match_child_lists() {
        let doc = parse_document("<div><p>a</p><p>b<span>c</span></p></div>");
        for id in crate::traverse::descendants(&doc, doc.root()) {
            if id == doc.root() {
                assert_eq!(doc.parent(id), None);
                continue;
            }
            let parent = doc.parent(id).unwrap();
            let occurrences = doc.children(parent).iter().filter(|c| **c == id).count();
            assert_eq!(occurrences, 1, "node {id} must appear once in its parent");
        }
    }

    #[test]
    fn replace_with_fragment_relinks_parent_children() {
        let mut doc = parse_document("<ul><li>one</li><li id=\"two\">two</li><li>three</li></ul>");
        let target = first_element(&doc, "ul");
        let two = doc.children(target)[1];
        let replacement = parse_document("<li id=\"two\" class=\"new\">2</li>");

        let inserted = doc.replace_with_fragment(two, &replacement).unwrap();

        assert_eq!(inserted.len(), 1);
        assert_eq!(doc.parent(inserted[0]), Some(target));
        assert_eq!(doc.children(target)[1], inserted[0]);
        assert_eq!(doc.parent(two), None);
        assert!(!doc.is_attached(two));
        assert_eq!(
            to_html(&doc),
            "<ul><li>one</li><li id=\"two\" class=\"new\">2</li><li>three</li></ul>"
        );
    }

    #[test]
    fn replace_with_multi_node_fragment_keeps_order() {
        let mut doc = parse_document("<div><b>x</b></div>");
        let b = first_element(&doc, "b");
        let replacement = parse_document("<i>1</i> <u>2</u>");
        doc.replace_with_fragment(b, &replacement).unwrap();
        let div = first_element(&doc, "div");
        assert_eq!(outer_html(&doc, div), "<div><i>1</i> <u>2</u></div>");
    }

    #[test]
    fn root_cannot_be_replaced_or_detached() {
        let mut doc = parse_document("<p>x</p>");
        let replacement = parse_document("<p>y</p>");
        assert_eq!(
            doc.replace_with_fragment(doc.root(), &replacement),
            Err(TreeError::Detached(Document::ROOT))
        );
        assert_eq!(doc.detach(Document::ROOT), Err(TreeError::Detached(Document::ROOT)));
    }

    #[test]
    fn text_nodes_cannot_have_children() {
        let mut doc = parse_document("<p>x</p>");
        let p = first_element(&doc, "p");
        let text = doc.children(p)[0];
        assert_eq!(
            doc.append_text(text, "nope"),
            Err(TreeError::InvalidParent(text))
        );
        assert_eq!(doc.set_text(p, "nope"), Err(TreeError::WrongNodeKind(p)));
        doc.set_text(text, "y").unwrap();
        assert_eq!(to_html(&doc), "<p>y</p>");
    }

    #[test]
    fn attr_lookup_is_case_insensitive_and_valueless_reads_empty() {
        let doc = parse_document("<input DISABLED class=\"a  b\">");
        let input = first_element(&doc, "input");
        assert_eq!(doc.attr(input, "disabled"), Some(""));
        assert!(doc.attr_has_token(input, "class", "b"));
        assert!(!doc.attr_has_token(input, "class", "c"));
    }
}
