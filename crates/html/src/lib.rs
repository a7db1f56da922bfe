//! Lenient HTML parsing into an arena tree, plus serialization and traversal helpers.

pub mod collect;
pub mod traverse;

mod document;
mod dom_builder;
mod entities;
mod entity_table;
mod serialize;
mod tokenizer;
mod types;

pub use crate::document::Document;
pub use crate::dom_builder::{build_document, parse_document};
pub use crate::serialize::{inner_html, outer_html, to_html};
pub use crate::tokenizer::{Tokenizer, tokenize};
pub use crate::types::{Attributes, NodeId, NodeKind, NodeRecord, Token, TreeError};
