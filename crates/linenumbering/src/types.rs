use std::fmt;

use html::{Node, StructuralError, parse_fragment, to_html};
use serde::{Deserialize, Serialize};

use crate::error::RangeError;
use crate::range::get_range_in_context;

/// Inclusive range of line numbers, `from <= to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawLineRange")]
pub struct LineRange {
    from: u32,
    to: u32,
}

#[derive(Deserialize)]
struct RawLineRange {
    from: u32,
    to: u32,
}

impl TryFrom<RawLineRange> for LineRange {
    type Error = RangeError;

    fn try_from(raw: RawLineRange) -> Result<Self, Self::Error> {
        LineRange::new(raw.from, raw.to)
    }
}

impl LineRange {
    pub fn new(from: u32, to: u32) -> Result<Self, RangeError> {
        if from > to {
            return Err(RangeError::Inverted { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn single(line: u32) -> Self {
        Self {
            from: line,
            to: line,
        }
    }

    pub fn from(&self) -> u32 {
        self.from
    }

    pub fn to(&self) -> u32 {
        self.to
    }

    pub fn len(&self) -> u32 {
        self.to - self.from + 1
    }

    pub fn contains(&self, line: u32) -> bool {
        (self.from..=self.to).contains(&line)
    }

    pub fn overlaps(&self, other: &LineRange) -> bool {
        self.from <= other.to && other.from <= self.to
    }

    pub fn covers(&self, other: &LineRange) -> bool {
        self.from <= other.from && other.to <= self.to
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// A line number marker and the character offset it sits at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LineAnchor {
    pub line_number: u32,
    /// Characters of text before the anchor, counted from the start of the unit.
    pub offset: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListTag {
    Ul,
    Ol,
}

impl ListTag {
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("ul") {
            Some(ListTag::Ul)
        } else if name.eq_ignore_ascii_case("ol") {
            Some(ListTag::Ol)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ListTag::Ul => "ul",
            ListTag::Ol => "ol",
        }
    }
}

/// Set on units split off a list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListContext {
    pub tag: ListTag,
    /// Ordinal of the item in an `ol`, when it is not 1.
    pub start: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParagraphUnit {
    pub ordinal: usize,
    pub list_context: Option<ListContext>,
    pub node: Node,
}

impl ParagraphUnit {
    pub fn new(ordinal: usize, list_context: Option<ListContext>, node: Node) -> Self {
        Self {
            ordinal,
            list_context,
            node,
        }
    }

    pub fn to_html(&self) -> String {
        to_html(&self.node)
    }

    pub(crate) fn with_node(&self, node: Node) -> Self {
        Self {
            ordinal: self.ordinal,
            list_context: self.list_context,
            node,
        }
    }
}

/// Proposed replacement for a contiguous range of lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeRecommendation {
    range: LineRange,
    replacement: Node,
}

impl ChangeRecommendation {
    pub fn new(range: LineRange, replacement: Node) -> Self {
        Self { range, replacement }
    }

    pub fn from_html(range: LineRange, replacement: &str) -> Result<Self, StructuralError> {
        Ok(Self::new(range, parse_fragment(replacement)?))
    }

    /// Recommendation replacing the lines covered by `original` with `edited`.
    ///
    /// `original` is the numbered fragment the edit started from; `context`
    /// is the line to fall back to when it carries no line numbers.
    pub fn from_edit(
        original: &Node,
        edited: Node,
        context: Option<u32>,
    ) -> Result<Self, RangeError> {
        let range = get_range_in_context(original, context)?;
        Ok(Self::new(range, edited))
    }

    pub fn range(&self) -> LineRange {
        self.range
    }

    pub fn replacement(&self) -> &Node {
        &self.replacement
    }
}
