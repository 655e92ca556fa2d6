//! Whole-document facade: numbering across units and routing of
//! recommendations to the unit that holds their lines.

use html::{Node, children_to_html, parse_fragment};

use crate::config::{DiffMarkup, LineNumberingConfig};
use crate::diff::{apply_numbered, build_diff, check_conflicts};
use crate::error::{DiffError, LineNumberingError, RangeError};
use crate::numbering::{renumber, shift_line_numbers};
use crate::paragraphs::split_paragraphs;
use crate::range::{extract_lines, get_range};
use crate::types::{ChangeRecommendation, LineRange, ParagraphUnit};

const LOG_TARGET: &str = "linenumbering.document";

#[derive(Clone, Debug, Default)]
pub struct LineNumbering {
    config: LineNumberingConfig,
}

impl LineNumbering {
    pub fn new(config: LineNumberingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LineNumberingConfig {
        &self.config
    }

    /// Split, number continuously from `first_line`, and hoist markers.
    pub fn number_html(&self, html: &str) -> Result<NumberedDocument, LineNumberingError> {
        self.number_fragment(parse_fragment(html)?)
    }

    pub fn number_fragment(&self, root: Node) -> Result<NumberedDocument, LineNumberingError> {
        let mut line = self.config.first_line;
        let mut units = Vec::new();
        for unit in split_paragraphs(root)? {
            let numbered = renumber(unit, line, self.config.max_line_length)?;
            line = numbered.next_line;
            units.push(numbered.unit);
        }
        log::debug!(
            target: LOG_TARGET,
            "numbered {} units, lines {}..{line}",
            units.len(),
            self.config.first_line
        );
        Ok(NumberedDocument {
            units,
            first_line: self.config.first_line,
            next_line: line,
            max_line_length: self.config.max_line_length,
            markup: self.config.markup.clone(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumberedDocument {
    units: Vec<ParagraphUnit>,
    first_line: u32,
    next_line: u32,
    max_line_length: usize,
    markup: DiffMarkup,
}

impl NumberedDocument {
    pub fn units(&self) -> &[ParagraphUnit] {
        &self.units
    }

    pub fn first_line(&self) -> u32 {
        self.first_line
    }

    pub fn next_line(&self) -> u32 {
        self.next_line
    }

    pub fn to_html(&self) -> String {
        let nodes: Vec<Node> = self.units.iter().map(|u| u.node.clone()).collect();
        children_to_html(&nodes)
    }

    pub fn unit_for_line(&self, line: u32) -> Option<&ParagraphUnit> {
        self.units
            .iter()
            .find(|u| get_range(&u.node).is_ok_and(|r| r.contains(line)))
    }

    /// Lines `range` of the document; may span several units.
    pub fn extract_lines(&self, range: LineRange) -> Result<Node, LineNumberingError> {
        let bounds = self.bounds()?;
        if !bounds.covers(&range) {
            return Err(RangeError::OutOfBounds {
                from: range.from(),
                to: range.to(),
                first: bounds.from(),
                last: bounds.to(),
            }
            .into());
        }
        let mut parts = Vec::new();
        for unit in &self.units {
            let Ok(lines) = get_range(&unit.node) else {
                continue;
            };
            if !lines.overlaps(&range) {
                continue;
            }
            let clipped = LineRange::new(
                lines.from().max(range.from()),
                lines.to().min(range.to()),
            )?;
            parts.push(extract_lines(unit, clipped)?);
        }
        Ok(Node::fragment(parts))
    }

    /// Review rendering of the whole document.
    pub fn build_diff(&self, recs: Vec<ChangeRecommendation>) -> Result<Node, DiffError> {
        let routed = self.route(recs)?;
        let mut nodes = Vec::with_capacity(self.units.len());
        for (unit, recs) in self.units.iter().zip(routed) {
            if recs.is_empty() {
                nodes.push(unit.node.clone());
            } else {
                nodes.push(build_diff(unit.clone(), recs, &self.markup)?);
            }
        }
        Ok(Node::fragment(nodes))
    }

    /// Accept `recs` and shift every later unit by the change in line count.
    pub fn apply(&self, recs: Vec<ChangeRecommendation>) -> Result<NumberedDocument, DiffError> {
        let routed = self.route(recs)?;
        let mut units = Vec::with_capacity(self.units.len());
        let mut delta = 0i64;
        for (unit, recs) in self.units.iter().zip(routed) {
            let mut unit = unit.clone();
            if !recs.is_empty() {
                let old_next = get_range(&unit.node)?.to() + 1;
                let applied = apply_numbered(unit, recs, self.max_line_length)?;
                let unit_delta = i64::from(applied.next_line) - i64::from(old_next);
                unit = applied.unit;
                if delta != 0 {
                    unit = shift_line_numbers(unit, delta)?;
                }
                delta += unit_delta;
            } else if delta != 0 {
                unit = shift_line_numbers(unit, delta)?;
            }
            units.push(unit);
        }
        let next_line = (i64::from(self.next_line) + delta).max(i64::from(self.first_line));
        log::debug!(target: LOG_TARGET, "applied recommendations, line delta {delta}");
        Ok(NumberedDocument {
            units,
            first_line: self.first_line,
            next_line: u32::try_from(next_line).unwrap_or(self.first_line),
            max_line_length: self.max_line_length,
            markup: self.markup.clone(),
        })
    }

    fn bounds(&self) -> Result<LineRange, RangeError> {
        if self.next_line <= self.first_line {
            return Err(RangeError::NoLineNumbers);
        }
        LineRange::new(self.first_line, self.next_line - 1)
    }

    /// Recommendations grouped by unit index, after a global conflict check.
    fn route(
        &self,
        recs: Vec<ChangeRecommendation>,
    ) -> Result<Vec<Vec<ChangeRecommendation>>, DiffError> {
        let recs = check_conflicts(recs)?;
        let ranges: Vec<Option<LineRange>> =
            self.units.iter().map(|u| get_range(&u.node).ok()).collect();
        let mut routed = vec![Vec::new(); self.units.len()];
        for rec in recs {
            let range = rec.range();
            let Some(index) = ranges
                .iter()
                .position(|r| r.is_some_and(|r| r.contains(range.from())))
            else {
                let bounds = self.bounds()?;
                return Err(RangeError::OutOfBounds {
                    from: range.from(),
                    to: range.to(),
                    first: bounds.from(),
                    last: bounds.to(),
                }
                .into());
            };
            if ranges[index].is_some_and(|r| !r.covers(&range)) {
                return Err(RangeError::SpansParagraphs {
                    from: range.from(),
                    to: range.to(),
                }
                .into());
            }
            routed[index].push(rec);
        }
        Ok(routed)
    }
}
