use crate::document::Document;
use crate::tokenizer::tokenize;
use crate::types::{NodeId, NodeKind, Token};

/// Parses `input` into an arena document.
pub fn parse_document(input: &str) -> Document {
    build_document(tokenize(input))
}

/// Builds a document from a token list.
///
/// Tree construction is a plain open-element stack: start tags push, end tags
/// pop back to the nearest open element with the same name. An end tag with no
/// matching open element is ignored, so stray closers never unwind unrelated
/// containers. Elements still open at the end of input are closed implicitly.
pub fn build_document(tokens: Vec<Token>) -> Document {
    let mut doc = Document::new();
    let root = doc.root();
    let mut open_elements: Vec<NodeId> = Vec::new();

    for token in tokens {
        let parent = open_elements.last().copied().unwrap_or(root);
        match token {
            Token::Doctype(s) => doc.set_doctype(s),
            Token::Comment(text) => {
                append_or_log(&mut doc, parent, NodeKind::Comment { text });
            }
            Token::Text(text) => {
                if !text.is_empty() {
                    append_or_log(&mut doc, parent, NodeKind::Text { text });
                }
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                let Some(id) = append_or_log(&mut doc, parent, NodeKind::Element { name, attributes })
                else {
                    continue;
                };
                if !self_closing {
                    open_elements.push(id);
                }
            }
            Token::EndTag(name) => {
                match open_elements
                    .iter()
                    .rposition(|open| doc.is_element_named(*open, &name))
                {
                    Some(pos) => open_elements.truncate(pos),
                    None => {
                        log::trace!(target: "html.tree_builder", "ignoring unmatched end tag </{name}>");
                    }
                }
            }
        }
    }

    doc
}

fn append_or_log(doc: &mut Document, parent: NodeId, kind: NodeKind) -> Option<NodeId> {
    match doc.append(parent, kind) {
        Ok(id) => Some(id),
        Err(err) => {
            // Open-element parents are always elements.
            log::warn!(target: "html.tree_builder", "dropping node: {err}");
            None
        }
    }
}
