//! Small, strict HTML fragment layer for editor-produced markup.
//!
//! `tokenize` + `build_fragment` turn a string into an owned [`Node`] tree,
//! `to_html` writes it back. Attribute order and values survive a round trip
//! untouched. [`flat`] offers the same tree as a linear event list for
//! passes that need to cut it at text positions.

pub mod debug;
pub mod dom_utils;
pub mod flat;
pub mod serialize;
pub mod style;

mod dom_builder;
mod entities;
mod error;
mod tokenizer;
mod types;

pub use crate::dom_builder::build_fragment;
pub use crate::error::{StructuralError, StructuralErrorKind};
pub use crate::flat::{Event, flatten, rebuild, rebuild_single};
pub use crate::serialize::{children_to_html, to_html};
pub use crate::tokenizer::tokenize;
pub use crate::types::{AtomId, AtomTable, Node, Token, TokenStream};

/// Tokenize and build in one step.
pub fn parse_fragment(html: &str) -> Result<Node, StructuralError> {
    build_fragment(&tokenize(html))
}
