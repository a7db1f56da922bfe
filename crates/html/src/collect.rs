use crate::document::Document;
use crate::traverse::elements_named;
use crate::types::{NodeId, NodeKind};

/// Inline `<style>` elements in document order.
pub fn style_blocks(doc: &Document) -> Vec<NodeId> {
    elements_named(doc, "style").collect()
}

/// Inline `<script>` elements (no `src`) in document order.
pub fn inline_script_blocks(doc: &Document) -> Vec<NodeId> {
    elements_named(doc, "script")
        .filter(|id| doc.attr(*id, "src").is_none())
        .collect()
}

/// Raw text of a rawtext element (`<style>`/`<script>`): its text children concatenated.
pub fn block_text(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    for &child in doc.children(id) {
        if let NodeKind::Text { text } = doc.kind(child) {
            out.push_str(text);
        }
    }
    out
}

/// Replaces the text of a rawtext element, creating the text child if needed.
pub fn set_block_text(doc: &mut Document, id: NodeId, text: &str) -> Result<(), crate::TreeError> {
    let text_children: Vec<NodeId> = doc
        .children(id)
        .iter()
        .copied()
        .filter(|c| matches!(doc.kind(*c), NodeKind::Text { .. }))
        .collect();
    match text_children.split_first() {
        Some((&first, rest)) => {
            doc.set_text(first, text)?;
            for &extra in rest {
                doc.detach(extra)?;
            }
            Ok(())
        }
        None => doc.append_text(id, text).map(|_| ()),
    }
}

/// Text of every inline `<style>` block, in document order.
pub fn collect_style_texts(doc: &Document) -> Vec<String> {
    style_blocks(doc)
        .into_iter()
        .map(|id| block_text(doc, id))
        .collect()
}

/// Text of every inline `<script>` block, in document order.
pub fn collect_script_texts(doc: &Document) -> Vec<String> {
    inline_script_blocks(doc)
        .into_iter()
        .map(|id| block_text(doc, id))
        .collect()
}

/// Collect `<link rel="stylesheet" href="…">` href values.
pub fn collect_stylesheet_hrefs(doc: &Document) -> Vec<String> {
    elements_named(doc, "link")
        .filter(|id| doc.attr_has_token(*id, "rel", "stylesheet"))
        .filter_map(|id| doc.attr(id, "href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collect `<script src="…">` values.
pub fn collect_script_srcs(doc: &Document) -> Vec<String> {
    elements_named(doc, "script")
        .filter_map(|id| doc.attr(id, "src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_document, to_html};

    const PAGE: &str = r#"<html><head>
<link rel="stylesheet" href="css/main.css">
<link rel="icon" href="favicon.ico">
<link rel="preload stylesheet" href=" css/extra.css ">
<style>.title { color: black; }</style>
</head><body>
<script src="js/app.js"></script>
<script>document.getElementById('t1');</script>
<style>#t1 { margin: 0; }</style>
</body></html>"#;

    #[test]
    fn collects_stylesheet_hrefs_by_rel_token() {
        let doc = parse_document(PAGE);
        assert_eq!(collect_stylesheet_hrefs(&doc), ["css/main.css", "css/extra.css"]);
    }

    #[test]
    fn collects_script_srcs_and_inline_scripts() {
        let doc = parse_document(PAGE);
        assert_eq!(collect_script_srcs(&doc), ["js/app.js"]);
        assert_eq!(
            collect_script_texts(&doc),
            ["document.getElementById('t1');"]
        );
    }

    #[test]
    fn collects_style_texts_in_document_order() {
        let doc = parse_document(PAGE);
        assert_eq!(
            collect_style_texts(&doc),
            [".title { color: black; }", "#t1 { margin: 0; }"]
        );
    }

    #[test]
    fn set_block_text_creates_missing_text_child() {
        let mut doc = parse_document("<style></style>");
        let style = style_blocks(&doc)[0];
        set_block_text(&mut doc, style, ".a { b: c; }").unwrap();
        assert_eq!(to_html(&doc), "<style>.a { b: c; }</style>");
        set_block_text(&mut doc, style, ".a { b: d; }").unwrap();
        assert_eq!(block_text(&doc, style), ".a { b: d; }");
    }
}
