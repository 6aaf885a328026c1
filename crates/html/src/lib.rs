//! HTML plumbing for reparsing rendered documents.
//!
//! A tolerant tokenizer, an arena DOM with parent/sibling navigation and
//! mutation, and a serializer. The point is to model what a browser hands a
//! client script after load: comments survive as nodes, attribute quoting is
//! normalized, and entity references are decoded.

pub mod debug;

mod builder;
mod dom;
mod entities;
mod serialize;
mod tokenizer;

pub use crate::builder::parse_document;
pub use crate::dom::{Children, Descendants, Dom, DomError, NodeId, NodeKind};
pub use crate::serialize::{inner_html, outer_html, to_html};
pub use crate::tokenizer::{Token, Tokenizer, is_rawtext_element, is_void_element, tokenize};
