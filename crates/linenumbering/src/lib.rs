//! Line numbering for motion text.
//!
//! A document is split into paragraph units ([`paragraphs`]), each unit gets
//! line markers inserted at wrap points ([`numbering`]), and markers are
//! hoisted out of inline formatting ([`inline_split`]). Numbered units can
//! be cut by line ([`range`]) and merged with change recommendations
//! ([`diff`]), either as a review rendering or as accepted text.
//! [`document`] runs the same operations over a whole document.

pub mod config;
pub mod diff;
pub mod document;
pub mod error;
pub mod inline_split;
pub mod markers;
pub mod numbering;
pub mod paragraphs;
pub mod range;
pub mod types;

mod tag_stack;

pub use crate::config::{DEFAULT_MAX_LINE_LENGTH, DiffMarkup, LineNumberingConfig, MarkupStyle};
pub use crate::diff::{apply_recommendations, build_diff, check_conflicts};
pub use crate::document::{LineNumbering, NumberedDocument};
pub use crate::error::{ConfigError, DiffError, LineNumberingError, MergeConflict, RangeError};
pub use crate::inline_split::split_inline_at_anchors;
pub use crate::markers::{
    Marker, line_break_marker, line_number_marker, line_numbers, strip_line_numbers,
    strip_line_numbers_html,
};
pub use crate::numbering::{NumberedUnit, line_anchors, number_lines, renumber, shift_line_numbers};
pub use crate::paragraphs::{join_paragraphs, split_html, split_paragraphs};
pub use crate::range::{extract_lines, get_range, get_range_html, get_range_in_context};
pub use crate::types::{
    ChangeRecommendation, LineAnchor, LineRange, ListContext, ListTag, ParagraphUnit,
};
