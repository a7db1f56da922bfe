//! Markup serialization.
//!
//! Output rules:
//! - Attributes keep source order; values are double-quoted and escaped.
//!   Valueless attributes are written bare (`<input disabled>`).
//! - Void elements have no end tag and no trailing slash.
//! - Text inside `<script>`/`<style>` is written raw; all other text is escaped.
//! - The doctype is written back as `<!{doctype}>` using the preserved spelling.

use crate::document::Document;
use crate::entities::{escape_attr, escape_text};
use crate::tokenizer::{is_rawtext_element, is_void_element};
use crate::types::{NodeId, NodeKind};

/// Serializes the whole document, doctype included.
pub fn to_html(doc: &Document) -> String {
    let mut out = String::new();
    if let Some(doctype) = doc.doctype() {
        out.push_str("<!");
        out.push_str(doctype);
        out.push('>');
    }
    for &child in doc.children(doc.root()) {
        write_subtree(doc, child, &mut out);
    }
    out
}

/// Serializes `id` and its descendants ("outer HTML").
pub fn outer_html(doc: &Document, id: NodeId) -> String {
    if id == doc.root() {
        return to_html(doc);
    }
    let mut out = String::new();
    write_subtree(doc, id, &mut out);
    out
}

/// Serializes the children of `id` ("inner HTML").
pub fn inner_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    for &child in doc.children(id) {
        write_subtree(doc, child, &mut out);
    }
    out
}

enum Step {
    Open(NodeId),
    Close(NodeId),
}

fn write_subtree(doc: &Document, id: NodeId, out: &mut String) {
    // Explicit stack instead of recursion: documents can nest arbitrarily deep.
    let mut stack = vec![Step::Open(id)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Open(id) => match doc.kind(id) {
                NodeKind::Document { .. } => {
                    for &child in doc.children(id).iter().rev() {
                        stack.push(Step::Open(child));
                    }
                }
                NodeKind::Element { name, attributes } => {
                    out.push('<');
                    out.push_str(name);
                    for (key, value) in attributes {
                        out.push(' ');
                        out.push_str(key);
                        if let Some(value) = value {
                            out.push_str("=\"");
                            escape_attr(value, out);
                            out.push('"');
                        }
                    }
                    out.push('>');
                    if is_void_element(name) {
                        continue;
                    }
                    stack.push(Step::Close(id));
                    for &child in doc.children(id).iter().rev() {
                        stack.push(Step::Open(child));
                    }
                }
                NodeKind::Text { text } => {
                    let raw = doc
                        .parent(id)
                        .and_then(|p| doc.element_name(p))
                        .is_some_and(is_rawtext_element);
                    if raw {
                        out.push_str(text);
                    } else {
                        escape_text(text, out);
                    }
                }
                NodeKind::Comment { text } => {
                    out.push_str("<!--");
                    out.push_str(text);
                    out.push_str("-->");
                }
            },
            Step::Close(id) => {
                if let Some(name) = doc.element_name(id) {
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_document;

    #[test]
    fn serializes_back_to_canonical_markup() {
        let input = r#"<h2 id="t1" class="title">Old</h2>"#;
        assert_eq!(to_html(&parse_document(input)), input);
    }

    #[test]
    fn normalizes_quotes_and_case() {
        let doc = parse_document("<DIV Class='a b' data-x=1 hidden>x</DIV>");
        assert_eq!(to_html(&doc), r#"<div class="a b" data-x="1" hidden>x</div>"#);
    }

    #[test]
    fn void_elements_have_no_end_tag() {
        let doc = parse_document("<p>a<br/>b<img src=\"x.png\"></p>");
        assert_eq!(to_html(&doc), r#"<p>a<br>b<img src="x.png"></p>"#);
    }

    #[test]
    fn escapes_text_but_not_rawtext() {
        let doc = parse_document("<p>a &amp; b &lt; c</p><script>if (a < b) {}</script>");
        assert_eq!(
            to_html(&doc),
            "<p>a &amp; b &lt; c</p><script>if (a < b) {}</script>"
        );
    }

    #[test]
    fn preserves_doctype_comments_and_whitespace() {
        let input = "<!DOCTYPE html>\n<html>\n  <!-- nav -->\n  <body>\n  </body>\n</html>";
        assert_eq!(to_html(&parse_document(input)), input);
    }

    #[test]
    fn inner_and_outer_html() {
        let doc = parse_document("<ul><li>1</li><li>2</li></ul>");
        let ul = doc.children(doc.root())[0];
        assert_eq!(inner_html(&doc, ul), "<li>1</li><li>2</li>");
        assert_eq!(outer_html(&doc, ul), "<ul><li>1</li><li>2</li></ul>");
    }
}
