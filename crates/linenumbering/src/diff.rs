//! Diff/merge engine.
//!
//! Both modes walk the unit once, in document order, with the
//! recommendations sorted by first line. Content on a recommended line is
//! either wrapped in deletion markup (review) or dropped (accept); the
//! replacement goes in at block level right after the last content of the
//! range. Accept mode then renumbers from the first replaced line on.

use html::dom_utils::is_block_element;
use html::{Event, Node, StructuralError, flatten, rebuild_single};

use crate::config::DiffMarkup;
use crate::error::{DiffError, MergeConflict, RangeError};
use crate::inline_split::split_inline_at_anchors;
use crate::markers::{Marker, event_marker, is_hard_break, marker_events, strip_line_numbers};
use crate::numbering::{Anchor, NumberedUnit, Resume, number_events};
use crate::range::{annotate_lines, check_bounds, get_range};
use crate::tag_stack::TagStack;
use crate::types::{ChangeRecommendation, LineRange, ParagraphUnit};

const LOG_TARGET: &str = "linenumbering.diff";

/// Sort by first line and reject overlapping ranges.
pub fn check_conflicts(
    recs: Vec<ChangeRecommendation>,
) -> Result<Vec<ChangeRecommendation>, MergeConflict> {
    let mut recs = recs;
    recs.sort_by_key(|r| (r.range().from(), r.range().to()));
    for pair in recs.windows(2) {
        if pair[0].range().to() >= pair[1].range().from() {
            log::debug!(
                target: LOG_TARGET,
                "conflict between lines {} and {}",
                pair[0].range(),
                pair[1].range()
            );
            return Err(MergeConflict {
                a: pair[0].clone(),
                b: pair[1].clone(),
            });
        }
    }
    Ok(recs)
}

/// Review mode: deleted lines wrapped in the deletion element, replacements
/// in the insertion element, every original line marker kept.
pub fn build_diff(
    original: ParagraphUnit,
    recs: Vec<ChangeRecommendation>,
    markup: &DiffMarkup,
) -> Result<Node, DiffError> {
    let recs = prepare(&original, recs)?;
    if recs.is_empty() {
        return Ok(original.node);
    }
    let merged = merge(original.node, &recs, Mode::Review(markup))?;
    Ok(rebuild_single(merged.events)?)
}

/// Accept mode: replaced lines are gone and the unit is renumbered from the
/// first replaced line on. Lines before it keep their markers.
pub fn apply_recommendations(
    original: ParagraphUnit,
    recs: Vec<ChangeRecommendation>,
    max_line_length: usize,
) -> Result<ParagraphUnit, DiffError> {
    Ok(apply_numbered(original, recs, max_line_length)?.unit)
}

pub(crate) fn apply_numbered(
    original: ParagraphUnit,
    recs: Vec<ChangeRecommendation>,
    max_line_length: usize,
) -> Result<NumberedUnit, DiffError> {
    let recs = prepare(&original, recs)?;
    let Some(first) = recs.first() else {
        let next_line = get_range(&original.node).map_or(1, |r| r.to() + 1);
        return Ok(NumberedUnit {
            unit: original,
            next_line,
        });
    };
    let first_line = first.range().from();
    let unit_first_line = get_range(&original.node)?.from();

    let merged = merge(original.node.clone(), &recs, Mode::Accept)?;
    let Some(splice) = merged.first_splice else {
        return Err(RangeError::NoLineNumbers.into());
    };
    let anchor = match splice.leading {
        Some(anchor) => anchor,
        None if first_line == unit_first_line => Anchor::First,
        None => Anchor::Block,
    };
    let (events, next_line) = number_events(
        merged.events,
        Resume {
            prefix: splice.position,
            line: first_line,
            anchor,
        },
        max_line_length,
    )?;
    let unit = split_inline_at_anchors(original.with_node(rebuild_single(events)?))?;
    log::debug!(
        target: LOG_TARGET,
        "applied {} recommendation(s), unit now ends before line {next_line}",
        recs.len()
    );
    Ok(NumberedUnit { unit, next_line })
}

fn prepare(
    unit: &ParagraphUnit,
    recs: Vec<ChangeRecommendation>,
) -> Result<Vec<ChangeRecommendation>, DiffError> {
    let recs = check_conflicts(recs)?;
    for rec in &recs {
        check_bounds(&unit.node, rec.range())?;
    }
    Ok(recs)
}

#[derive(Clone, Copy)]
enum Mode<'a> {
    Review(&'a DiffMarkup),
    Accept,
}

struct Merged {
    events: Vec<Event>,
    first_splice: Option<Splice>,
}

/// Where accept mode starts renumbering.
struct Splice {
    position: usize,
    /// Set when the first replaced line starts with a break.
    leading: Option<Anchor>,
}

/// Insertion point for the replacement of the active range.
struct Record {
    position: usize,
    /// Inline elements open at `position`, outermost first.
    inline: Vec<Node>,
    /// Written elements up to the innermost block.
    path: Vec<String>,
}

impl Record {
    fn at(out: &[Event], stack: &TagStack) -> Self {
        Self {
            position: out.len(),
            inline: stack.inline_context(),
            path: stack.block_path(),
        }
    }
}

struct Merger<'a> {
    mode: Mode<'a>,
    out: Vec<Event>,
    stack: TagStack,
    first_splice: Option<Splice>,
}

fn merge(node: Node, recs: &[ChangeRecommendation], mode: Mode<'_>) -> Result<Merged, DiffError> {
    let bounds = get_range(&node)?;
    let events = marker_events(node);
    let lines = annotate_lines(&events);
    let mut merger = Merger {
        mode,
        out: Vec::with_capacity(events.len()),
        stack: TagStack::new(),
        first_splice: None,
    };

    let mut next = 0usize;
    let mut active: Option<Record> = None;
    for (event, line) in events.into_iter().zip(lines) {
        match event {
            Event::Open(shell) => {
                merger.stack.open(shell);
                if merger.stack.depth() == 1 {
                    merger.stack.flush(&mut merger.out);
                }
            }
            Event::Close => {
                let inline = !merger.stack.top_is_block();
                merger.stack.close(&mut merger.out, active.is_none())?;
                if inline && let Some(record) = active.as_mut() {
                    *record = Record::at(&merger.out, &merger.stack);
                }
            }
            event => {
                if let Some(record) = active.take_if(|_| line > recs[next].range().to()) {
                    merger.finish(record, &recs[next])?;
                    next += 1;
                }
                if active.is_none() && next < recs.len() {
                    let range = recs[next].range();
                    if line > range.to() {
                        return Err(missing_lines(range, bounds).into());
                    }
                    if range.contains(line) {
                        active = Some(merger.start(&event));
                        if is_hard_break(&event) {
                            // It ends the line before the range and stays.
                            merger.push(event, false);
                            if let Some(record) = active.as_mut() {
                                *record = Record::at(&merger.out, &merger.stack);
                            }
                            continue;
                        }
                    }
                }
                let in_range = active.is_some();
                merger.push(event, in_range);
                if in_range
                    && let Some(record) = active.as_mut()
                {
                    *record = Record::at(&merger.out, &merger.stack);
                }
            }
        }
    }
    if let Some(record) = active.take() {
        merger.finish(record, &recs[next])?;
        next += 1;
    }
    if let Some(rec) = recs.get(next) {
        return Err(missing_lines(rec.range(), bounds).into());
    }
    Ok(Merged {
        events: merger.out,
        first_splice: merger.first_splice,
    })
}

/// A range inside the unit's bounds whose lines have no markers.
fn missing_lines(range: LineRange, bounds: LineRange) -> RangeError {
    RangeError::OutOfBounds {
        from: range.from(),
        to: range.to(),
        first: bounds.from(),
        last: bounds.to(),
    }
}

impl Merger<'_> {
    fn start(&mut self, first: &Event) -> Record {
        self.stack.suspend_inline(&mut self.out);
        self.stack.flush_blocks(&mut self.out);
        if matches!(self.mode, Mode::Accept) && self.first_splice.is_none() {
            let leading = match event_marker(first) {
                Some(Marker::Break) => Some(Anchor::Wrap),
                _ if is_hard_break(first) => Some(Anchor::Hard),
                _ => None,
            };
            self.first_splice = Some(Splice {
                position: self.out.len(),
                leading,
            });
        }
        Record::at(&self.out, &self.stack)
    }

    fn push(&mut self, event: Event, in_range: bool) {
        self.stack.mark_content();
        if event_marker(&event).is_some() {
            let keep = match self.mode {
                Mode::Review(_) => true,
                Mode::Accept => self.first_splice.is_none(),
            };
            if keep {
                self.stack.suspend_inline(&mut self.out);
                self.stack.flush_blocks(&mut self.out);
                self.out.push(event);
            }
            return;
        }
        match (self.mode, in_range) {
            (_, false) => {
                self.stack.flush(&mut self.out);
                self.out.push(event);
            }
            (Mode::Review(markup), true) => {
                self.stack.flush(&mut self.out);
                self.out.push(Event::Open(markup.deletion.shell()));
                self.out.push(event);
                self.out.push(Event::Close);
            }
            (Mode::Accept, true) => {}
        }
    }

    fn finish(&mut self, record: Record, rec: &ChangeRecommendation) -> Result<(), StructuralError> {
        let content = replacement_events(rec.replacement(), &record.path, self.mode)?;
        log::trace!(
            target: LOG_TARGET,
            "lines {}: {} replacement event(s) at {}",
            rec.range(),
            content.len(),
            record.position
        );
        if content.is_empty() {
            return Ok(());
        }
        let unchanged = record.position == self.out.len()
            && self.stack.block_path() == record.path
            && self.stack.inline_context() == record.inline;
        if unchanged {
            self.stack.suspend_inline(&mut self.out);
            self.stack.mark_content();
            self.out.extend(content);
            return Ok(());
        }
        let mut chunk = Vec::with_capacity(content.len() + 2 * record.inline.len());
        chunk.extend(record.inline.iter().map(|_| Event::Close));
        chunk.extend(content);
        chunk.extend(record.inline.iter().cloned().map(Event::Open));
        let at = record.position.min(self.out.len());
        self.out.splice(at..at, chunk);
        Ok(())
    }
}

/// Replacement content without markers, with wrappers that repeat the
/// elements open at the insertion point removed. Blocks going into a
/// paragraph or heading are flattened to their content, one `<br>` between
/// consecutive blocks.
fn replacement_events(
    replacement: &Node,
    path: &[String],
    mode: Mode<'_>,
) -> Result<Vec<Event>, StructuralError> {
    let mut nodes = match strip_line_numbers(replacement.clone())? {
        Node::Fragment { children } => children,
        other => vec![other],
    };
    let mut depth = 0usize;
    loop {
        let mut significant = nodes.iter().filter(|n| !is_blank_text(n));
        let (Some(single), None) = (significant.next(), significant.next()) else {
            break;
        };
        let Some(name) = single.name() else {
            break;
        };
        let Some(k) = path[depth..].iter().position(|p| p.eq_ignore_ascii_case(name)) else {
            break;
        };
        depth += k + 1;
        let Some(single) = nodes.into_iter().find(|n| !is_blank_text(n)) else {
            return Ok(Vec::new());
        };
        nodes = single.into_children();
    }
    if path.last().is_some_and(|name| takes_inline_only(name))
        && nodes.iter().any(is_block_node)
    {
        let mut inline = Vec::with_capacity(nodes.len());
        inline_blocks(nodes, &mut inline);
        nodes = inline;
    }

    let events = flatten(nodes, |_| false);
    let Mode::Review(markup) = mode else {
        return Ok(events);
    };
    let mut wrapped = Vec::with_capacity(events.len() * 3);
    for event in events {
        match event {
            Event::Text(_) | Event::Leaf(_) => {
                wrapped.push(Event::Open(markup.insertion.shell()));
                wrapped.push(event);
                wrapped.push(Event::Close);
            }
            structural => wrapped.push(structural),
        }
    }
    Ok(wrapped)
}

fn is_blank_text(node: &Node) -> bool {
    matches!(node, Node::Text { text } if text.trim().is_empty())
}

fn is_block_node(node: &Node) -> bool {
    node.name().is_some_and(is_block_element)
}

/// Elements that may not hold block children.
fn takes_inline_only(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    matches!(name.as_str(), "p" | "pre" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

fn inline_blocks(nodes: Vec<Node>, out: &mut Vec<Node>) {
    let mut after_block = false;
    for node in nodes {
        let block = is_block_node(&node);
        if after_block && is_blank_text(&node) {
            continue;
        }
        if block || after_block {
            push_line_break(out);
        }
        after_block = block;
        if block {
            inline_blocks(node.into_children(), out);
        } else {
            out.push(node);
        }
    }
}

fn push_line_break(out: &mut Vec<Node>) {
    let has_content = out.iter().any(|n| !is_blank_text(n));
    let ends_in_break = out.last().is_some_and(|n| n.is_element_named("br"));
    if has_content && !ends_in_break {
        out.push(Node::element("br", Vec::new(), Vec::new()));
    }
}
