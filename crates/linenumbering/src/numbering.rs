//! Line numberer.
//!
//! Works on the flat event view of a unit. Text is fed one character at a
//! time into the current line buffer; when a character would overflow the
//! line, the buffer is cut at the last whitespace break opportunity (or at
//! the character itself if the line has none) and a break marker plus a
//! number marker go in between. Existing markers are dropped on the way in,
//! so numbering an already numbered unit gives the same result.

use html::dom_utils::is_block_element;
use html::{Event, Node, StructuralError, StructuralErrorKind, rebuild_single};

use crate::error::{LineNumberingError, RangeError};
use crate::inline_split::split_inline_at_anchors;
use crate::markers::{
    Marker, event_marker, is_marker, line_break_marker, line_number_marker, marker_events,
    shift_markers,
};
use crate::types::{LineAnchor, ParagraphUnit};

const LOG_TARGET: &str = "linenumbering.numbering";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumberedUnit {
    pub unit: ParagraphUnit,
    /// One past the last line number in `unit`.
    pub next_line: u32,
}

/// How the next line begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Anchor {
    /// First line of the unit.
    First,
    /// New block element.
    Block,
    /// After a `<br>` from the input.
    Hard,
    /// Soft wrap; needs a break marker.
    Wrap,
}

/// Insert line markers into `unit`, numbering from `start_line`.
///
/// Markers are placed at their text positions and may sit inside inline
/// elements; [`renumber`] also hoists them to block level. `start_line` must
/// be at least 1 and `next_line` must fit in a `u32`.
pub fn number_lines(
    unit: ParagraphUnit,
    start_line: u32,
    max_line_length: usize,
) -> Result<NumberedUnit, LineNumberingError> {
    if !matches!(unit.node, Node::Element { .. }) {
        return Err(StructuralError::new(StructuralErrorKind::NotAContainer).into());
    }
    let events = marker_events(unit.node.clone());
    let (events, next_line) = number_events(
        events,
        Resume {
            prefix: 0,
            line: start_line,
            anchor: Anchor::First,
        },
        max_line_length,
    )?;
    Ok(NumberedUnit {
        unit: unit.with_node(rebuild_single(events)?),
        next_line,
    })
}

/// `number_lines` followed by the inline split.
pub fn renumber(
    unit: ParagraphUnit,
    start_line: u32,
    max_line_length: usize,
) -> Result<NumberedUnit, LineNumberingError> {
    let numbered = number_lines(unit, start_line, max_line_length)?;
    Ok(NumberedUnit {
        unit: split_inline_at_anchors(numbered.unit)?,
        next_line: numbered.next_line,
    })
}

pub fn shift_line_numbers(unit: ParagraphUnit, delta: i64) -> Result<ParagraphUnit, StructuralError> {
    let node = shift_markers(unit.node.clone(), delta)?;
    Ok(unit.with_node(node))
}

/// Number markers of `unit` with the text offset each one sits at.
pub fn line_anchors(unit: &ParagraphUnit) -> Vec<LineAnchor> {
    let mut anchors = Vec::new();
    let mut offset = 0usize;
    for event in marker_events(unit.node.clone()) {
        match event_marker(&event) {
            Some(Marker::Number(line_number)) => anchors.push(LineAnchor {
                line_number,
                offset,
            }),
            Some(Marker::Break) => {}
            None => {
                if let Event::Text(text) = &event {
                    offset += text.chars().count();
                }
            }
        }
    }
    anchors
}

/// Where numbering starts. Events before `prefix` are copied as they are.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Resume {
    pub prefix: usize,
    /// Number of the line that starts at `prefix`.
    pub line: u32,
    pub anchor: Anchor,
}

pub(crate) fn number_events(
    mut events: Vec<Event>,
    resume: Resume,
    max_line_length: usize,
) -> Result<(Vec<Event>, u32), LineNumberingError> {
    if resume.line == 0 {
        return Err(RangeError::ZeroStartLine.into());
    }
    let rest = events.split_off(resume.prefix.min(events.len()));
    let mut numberer = LineNumberer::resume(events, resume, max_line_length.max(1))?;
    for event in rest {
        numberer.push(event)?;
    }
    numberer.finish()
}

fn is_break_opportunity(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

struct LineNumberer {
    max: usize,
    out: Vec<Event>,
    /// Events of the current line that may still be cut by a wrap.
    line_buf: Vec<Event>,
    /// Byte position in a `line_buf` text event just after whitespace.
    last_break: Option<(usize, usize)>,
    col: usize,
    has_word: bool,
    /// Last number written.
    line: u32,
    pending: Option<Anchor>,
    /// One flag per open element: is it a block.
    blocks: Vec<bool>,
}

impl LineNumberer {
    fn resume(prefix: Vec<Event>, resume: Resume, max: usize) -> Result<Self, LineNumberingError> {
        let mut blocks = Vec::new();
        for event in &prefix {
            match event {
                Event::Open(shell) => blocks.push(blocks.is_empty() || is_block(shell)),
                Event::Close => {
                    blocks
                        .pop()
                        .ok_or_else(|| StructuralError::new(StructuralErrorKind::UnbalancedEvents))?;
                }
                Event::Text(_) | Event::Leaf(_) => {}
            }
        }
        Ok(Self {
            max,
            out: prefix,
            line_buf: Vec::new(),
            last_break: None,
            col: 0,
            has_word: false,
            line: resume.line - 1,
            pending: Some(resume.anchor),
            blocks,
        })
    }

    fn push(&mut self, event: Event) -> Result<(), LineNumberingError> {
        match event {
            Event::Open(shell) => {
                let block = self.blocks.is_empty() || is_block(&shell);
                if block {
                    self.block_boundary();
                }
                self.blocks.push(block);
                self.line_buf.push(Event::Open(shell));
            }
            Event::Close => {
                let block = self
                    .blocks
                    .pop()
                    .ok_or_else(|| StructuralError::new(StructuralErrorKind::UnbalancedEvents))?;
                if block {
                    if self.pending == Some(Anchor::First) {
                        // Empty unit: the first line still gets its number.
                        self.emit_pending()?;
                    }
                    self.block_boundary();
                }
                self.line_buf.push(Event::Close);
            }
            Event::Text(text) => {
                for ch in text.chars() {
                    self.push_char(ch)?;
                }
            }
            Event::Leaf(node) => self.push_leaf(node)?,
        }
        Ok(())
    }

    fn push_leaf(&mut self, node: Node) -> Result<(), RangeError> {
        if is_marker(&node) {
            return Ok(());
        }
        match &node {
            Node::Comment { .. } => {}
            n if n.is_element_named("br") => {
                if self.pending.is_none() {
                    self.pending = Some(Anchor::Hard);
                }
            }
            n if is_block(n) => {
                self.block_boundary();
            }
            _ => {
                // Images and other replaced content: zero width, but they
                // belong to a line.
                self.emit_pending()?;
                self.has_word = true;
            }
        }
        self.line_buf.push(Event::Leaf(node));
        Ok(())
    }

    fn push_char(&mut self, ch: char) -> Result<(), RangeError> {
        if is_break_opportunity(ch) {
            self.append(ch);
            if self.pending.is_some() {
                return Ok(());
            }
            self.col += 1;
            if self.has_word
                && let Some(Event::Text(text)) = self.line_buf.last()
            {
                self.last_break = Some((self.line_buf.len() - 1, text.len()));
            }
            return Ok(());
        }
        if self.pending.is_some() {
            self.emit_pending()?;
        } else if self.col >= self.max {
            self.wrap()?;
        }
        self.append(ch);
        self.col += 1;
        self.has_word = true;
        Ok(())
    }

    fn append(&mut self, ch: char) {
        match self.line_buf.last_mut() {
            Some(Event::Text(text)) => text.push(ch),
            _ => self.line_buf.push(Event::Text(ch.to_string())),
        }
    }

    fn block_boundary(&mut self) {
        if self.pending != Some(Anchor::First) {
            self.pending = Some(Anchor::Block);
        }
        self.commit();
    }

    fn commit(&mut self) {
        self.out.append(&mut self.line_buf);
        self.last_break = None;
    }

    fn emit_pending(&mut self) -> Result<(), RangeError> {
        let Some(anchor) = self.pending.take() else {
            return Ok(());
        };
        self.commit();
        self.start_line(anchor == Anchor::Wrap)?;
        self.col = 0;
        self.has_word = false;
        Ok(())
    }

    fn start_line(&mut self, with_break: bool) -> Result<(), RangeError> {
        self.line = self
            .line
            .checked_add(1)
            .ok_or(RangeError::LineOverflow { last: self.line })?;
        log::trace!(target: LOG_TARGET, "line {} starts (break marker: {with_break})", self.line);
        if with_break {
            self.out.push(Event::Leaf(line_break_marker()));
        }
        self.out.push(Event::Leaf(line_number_marker(self.line)));
        Ok(())
    }

    /// Cut the current line at the last break opportunity, or right here.
    fn wrap(&mut self) -> Result<(), RangeError> {
        let (index, at) = self.last_break.take().unwrap_or((self.line_buf.len(), 0));
        let mut tail = self.line_buf.split_off(index);
        if at > 0
            && let Some(Event::Text(text)) = tail.first_mut()
        {
            let rest = text.split_off(at);
            let head = std::mem::replace(text, rest);
            self.line_buf.push(Event::Text(head));
            if text.is_empty() {
                tail.remove(0);
            }
        }
        self.commit();
        self.start_line(true)?;
        self.col = tail
            .iter()
            .map(|e| match e {
                Event::Text(t) => t.chars().count(),
                _ => 0,
            })
            .sum();
        self.has_word = self.col > 0;
        self.line_buf = tail;
        Ok(())
    }

    fn finish(mut self) -> Result<(Vec<Event>, u32), LineNumberingError> {
        if !self.blocks.is_empty() {
            return Err(StructuralError::new(StructuralErrorKind::UnbalancedEvents).into());
        }
        self.commit();
        if let Some(anchor) = self.pending
            && anchor != Anchor::First
        {
            log::trace!(target: LOG_TARGET, "dropping trailing {anchor:?} anchor");
        }
        let next_line = self
            .line
            .checked_add(1)
            .ok_or(RangeError::LineOverflow { last: self.line })?;
        Ok((self.out, next_line))
    }
}

fn is_block(node: &Node) -> bool {
    node.name().is_some_and(is_block_element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::strip_line_numbers_html;
    use crate::paragraphs::split_html;
    use html::dom_utils::text_content;
    use html::parse_fragment;

    const N: &str = r#"<span contenteditable="false" class="os-line-number line-number-"#;

    fn unit(html: &str) -> ParagraphUnit {
        let mut units = split_html(html).expect("well-formed");
        assert_eq!(units.len(), 1, "{html}");
        units.remove(0)
    }

    fn numbered(html: &str, start: u32, max: usize) -> (String, u32) {
        let out = number_lines(unit(html), start, max).expect("numbered");
        (out.unit.to_html(), out.next_line)
    }

    fn num(line: u32) -> String {
        format!(r#"{N}{line}" data-line-number="{line}">&nbsp;</span>"#)
    }

    fn wrap(line: u32) -> String {
        format!(r#"<br class="os-line-break">{}"#, num(line))
    }

    #[test]
    fn short_paragraph_gets_one_anchor() {
        let (html, next) = numbered("<p>Hello world</p>", 1, 85);
        assert_eq!(html, format!("<p>{}Hello world</p>", num(1)));
        assert_eq!(next, 2);
    }

    #[test]
    fn wraps_at_last_whitespace() {
        let (html, next) = numbered("<p>Lorem ipsum dolor sit amet</p>", 1, 10);
        assert_eq!(
            html,
            format!(
                "<p>{}Lorem {}ipsum {}dolor sit {}amet</p>",
                num(1),
                wrap(2),
                wrap(3),
                wrap(4)
            )
        );
        assert_eq!(next, 5);
    }

    #[test]
    fn long_word_is_forced_at_exact_length() {
        let (html, next) = numbered("<p>abcdefghijkl</p>", 7, 5);
        assert_eq!(
            html,
            format!("<p>{}abcde{}fghij{}kl</p>", num(7), wrap(8), wrap(9))
        );
        assert_eq!(next, 10);
    }

    #[test]
    fn whitespace_never_triggers_a_wrap() {
        let (html, _) = numbered("<p>abcde     fg</p>", 1, 5);
        assert_eq!(html, format!("<p>{}abcde     {}fg</p>", num(1), wrap(2)));
    }

    #[test]
    fn tags_are_transparent_to_counting() {
        let (html, _) = numbered("<p>Lorem <strong>ipsum</strong> dolor</p>", 1, 10);
        assert_eq!(
            html,
            format!(
                "<p>{}Lorem {}<strong>ipsum</strong> {}dolor</p>",
                num(1),
                wrap(2),
                wrap(3)
            )
        );
    }

    #[test]
    fn marker_may_land_inside_inline_element() {
        let (html, _) = numbered("<p><em>aaa bbb ccc</em></p>", 1, 4);
        assert_eq!(
            html,
            format!("<p><em>{}aaa {}bbb {}ccc</em></p>", num(1), wrap(2), wrap(3))
        );
    }

    #[test]
    fn hard_break_gets_number_only() {
        let (html, next) = numbered("<p>one<br>two</p>", 3, 85);
        assert_eq!(html, format!("<p>{}one<br>{}two</p>", num(3), num(4)));
        assert_eq!(next, 5);
    }

    #[test]
    fn nested_blocks_start_new_lines_without_break_marker() {
        let (html, next) = numbered("<div>intro<p>para</p>tail</div>", 1, 85);
        assert_eq!(
            html,
            format!("<div>{}intro<p>{}para</p>{}tail</div>", num(1), num(2), num(3))
        );
        assert_eq!(next, 4);
    }

    #[test]
    fn list_item_anchor_is_inside_the_item() {
        let (html, _) = numbered("<ol start=\"2\"><li>Item</li></ol>", 1, 85);
        assert_eq!(html, format!("<ol start=\"2\"><li>{}Item</li></ol>", num(1)));
    }

    #[test]
    fn leading_whitespace_does_not_take_the_anchor() {
        let (html, _) = numbered("<p>  Hi</p>", 1, 85);
        assert_eq!(html, format!("<p>  {}Hi</p>", num(1)));
    }

    #[test]
    fn empty_unit_still_gets_its_first_anchor() {
        let (html, next) = numbered("<p></p>", 4, 85);
        assert_eq!(html, format!("<p>{}</p>", num(4)));
        assert_eq!(next, 5);
    }

    #[test]
    fn image_counts_as_content() {
        let (html, _) = numbered("<p><img src=\"a.png\"></p>", 1, 85);
        assert_eq!(html, format!("<p>{}<img src=\"a.png\"></p>", num(1)));
    }

    #[test]
    fn numbering_twice_is_idempotent() {
        let u = unit("<p>Lorem <strong>ipsum <em>dolor</em> sit</strong> amet, consetetur sadipscing elitr</p>");
        let once = number_lines(u, 1, 12).expect("numbered");
        let twice = number_lines(once.unit.clone(), 1, 12).expect("numbered");
        assert_eq!(twice, once);
        let after_split = renumber(once.unit.clone(), 1, 12).expect("numbered");
        let again = renumber(after_split.unit.clone(), 1, 12).expect("numbered");
        assert_eq!(again, after_split);
        assert_eq!(line_anchors(&after_split.unit), line_anchors(&once.unit));
    }

    #[test]
    fn renumber_replaces_stale_numbers() {
        let stale = format!("<p>{}Hello {}world</p>", num(40), wrap(41));
        let (html, next) = numbered(&stale, 1, 85);
        assert_eq!(html, format!("<p>{}Hello world</p>", num(1)));
        assert_eq!(next, 2);
    }

    #[test]
    fn anchors_report_text_offsets() {
        let out = number_lines(unit("<p>Lorem ipsum dolor sit amet</p>"), 1, 10).expect("ok");
        let anchors = line_anchors(&out.unit);
        let offsets: Vec<_> = anchors.iter().map(|a| (a.line_number, a.offset)).collect();
        assert_eq!(offsets, vec![(1, 0), (2, 6), (3, 12), (4, 22)]);
    }

    #[test]
    fn numbering_preserves_text() {
        let html = "<p>Lorem <strong>ipsum</strong> dolor sit amet, <em>consetetur</em> sadipscing</p>";
        let out = renumber(unit(html), 1, 7).expect("ok");
        let stripped = parse_fragment(&strip_line_numbers_html(&out.unit.to_html()).expect("ok"))
            .expect("fragment");
        let original = parse_fragment(html).expect("fragment");
        assert_eq!(text_content(&stripped), text_content(&original));
    }

    #[test]
    fn shift_line_numbers_moves_every_marker() {
        let out = number_lines(unit("<p>Lorem ipsum dolor sit amet</p>"), 1, 10).expect("ok");
        let shifted = shift_line_numbers(out.unit, 10).expect("ok");
        let lines: Vec<_> = line_anchors(&shifted).iter().map(|a| a.line_number).collect();
        assert_eq!(lines, vec![11, 12, 13, 14]);
    }

    #[test]
    fn line_zero_is_rejected() {
        assert_eq!(
            number_lines(unit("<p>Hi</p>"), 0, 85),
            Err(LineNumberingError::Range(RangeError::ZeroStartLine))
        );
    }

    #[test]
    fn numbering_stops_at_the_last_representable_line() {
        let (_, next) = numbered("<p>aaa bbb ccc</p>", u32::MAX - 3, 4);
        assert_eq!(next, u32::MAX);
        assert_eq!(
            number_lines(unit("<p>aaa bbb ccc</p>"), u32::MAX, 4),
            Err(LineNumberingError::Range(RangeError::LineOverflow { last: u32::MAX }))
        );
        assert_eq!(
            number_lines(unit("<p>aaa</p>"), u32::MAX, 4),
            Err(LineNumberingError::Range(RangeError::LineOverflow { last: u32::MAX }))
        );
    }

    #[test]
    fn text_root_is_rejected() {
        let unit = ParagraphUnit::new(0, None, parse_fragment("x").expect("fragment"));
        assert!(number_lines(unit, 1, 85).is_err());
    }
}
