//! Line range extraction.

use html::{Event, Node, parse_fragment, rebuild_single};

use crate::error::{LineNumberingError, RangeError};
use crate::markers::{Marker, event_marker, is_hard_break, line_numbers, marker_events};
use crate::tag_stack::TagStack;
use crate::types::{LineRange, ParagraphUnit};

/// Lines spanned by a numbered fragment: first to last number marker.
pub fn get_range(fragment: &Node) -> Result<LineRange, RangeError> {
    let numbers = line_numbers(fragment);
    match (numbers.first(), numbers.last()) {
        (Some(&from), Some(&to)) => LineRange::new(from, to),
        _ => Err(RangeError::NoLineNumbers),
    }
}

/// Like [`get_range`], but a fragment without markers falls back to the
/// line it sits on, when the caller knows it.
pub fn get_range_in_context(
    fragment: &Node,
    context: Option<u32>,
) -> Result<LineRange, RangeError> {
    match get_range(fragment) {
        Err(RangeError::NoLineNumbers) => context
            .map(LineRange::single)
            .ok_or(RangeError::NoLineNumbers),
        other => other,
    }
}

pub fn get_range_html(html: &str) -> Result<LineRange, LineNumberingError> {
    Ok(get_range(&parse_fragment(html)?)?)
}

/// Line each event belongs to.
///
/// A break marker opens the following line, and so does a `<br>` that only
/// whitespace or tags separate from the next number marker. Events in front
/// of the first number marker belong to the first line.
pub(crate) fn annotate_lines(events: &[Event]) -> Vec<u32> {
    let mut current = events
        .iter()
        .find_map(|event| match event_marker(event) {
            Some(Marker::Number(line)) => Some(line),
            _ => None,
        })
        .unwrap_or(0);
    let mut lines: Vec<u32> = events
        .iter()
        .map(|event| match event_marker(event) {
            Some(Marker::Number(line)) => {
                current = line;
                line
            }
            Some(Marker::Break) => current.saturating_add(1),
            None => current,
        })
        .collect();

    for (at, event) in events.iter().enumerate() {
        if !is_hard_break(event) {
            continue;
        }
        let gap = events[at + 1..]
            .iter()
            .take_while(|e| match e {
                Event::Open(_) | Event::Close => true,
                Event::Text(text) => text.trim().is_empty(),
                Event::Leaf(_) => false,
            })
            .count();
        if let Some(Marker::Number(line)) = events.get(at + 1 + gap).and_then(event_marker) {
            lines[at..at + 1 + gap].fill(line);
        }
    }
    lines
}

/// Check `range` against the lines present in `unit`.
pub(crate) fn check_bounds(unit: &Node, range: LineRange) -> Result<(), RangeError> {
    let bounds = get_range(unit)?;
    if !bounds.covers(&range) {
        return Err(RangeError::OutOfBounds {
            from: range.from(),
            to: range.to(),
            first: bounds.from(),
            last: bounds.to(),
        });
    }
    Ok(())
}

/// The part of `unit` on lines `range`, inside the ancestors that hold it.
///
/// Markers are kept, except the break marker or `<br>` that ends the line
/// before the range.
pub fn extract_lines(
    unit: &ParagraphUnit,
    range: LineRange,
) -> Result<Node, LineNumberingError> {
    check_bounds(&unit.node, range)?;
    let first_line = get_range(&unit.node)?.from();
    let events = marker_events(unit.node.clone());
    let lines = annotate_lines(&events);

    let mut out = Vec::new();
    let mut stack = TagStack::new();
    for (event, line) in events.into_iter().zip(lines) {
        let inside = range.contains(line);
        match event {
            Event::Open(shell) => stack.open(shell),
            Event::Close => stack.close(&mut out, inside)?,
            event => {
                stack.mark_content();
                let leading_break = line == range.from()
                    && range.from() > first_line
                    && (event_marker(&event) == Some(Marker::Break) || is_hard_break(&event));
                if !inside || leading_break {
                    continue;
                }
                stack.flush(&mut out);
                out.push(event);
            }
        }
    }
    Ok(rebuild_single(out)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::{line_break_marker, line_number_marker};
    use crate::numbering::renumber;
    use crate::paragraphs::split_html;
    use html::to_html;

    fn num(line: u32) -> String {
        to_html(&line_number_marker(line))
    }

    fn wrap(line: u32) -> String {
        format!("{}{}", to_html(&line_break_marker()), num(line))
    }

    fn range(from: u32, to: u32) -> LineRange {
        LineRange::new(from, to).expect("ordered")
    }

    #[test]
    fn range_of_lines_four_to_nine() {
        let mut html = format!("<p>{}line four ", num(4));
        for line in 5..=9 {
            html.push_str(&format!("{}line {line} ", wrap(line)));
        }
        html.push_str("</p>");
        assert_eq!(get_range_html(&html).expect("numbered"), range(4, 9));
    }

    #[test]
    fn worked_example_spans_two_lines() {
        let html = r#"<p><span class="os-line-number line-number-2" data-line-number="2" contenteditable="false">&nbsp;</span>et accusam et justo duo dolores et ea <span style="color: red;"><strike>rebum</strike></span> <span style="color: green;">Inserted Text</span>. Stet clita kasd <br class="os-line-break"><span class="os-line-number line-number-3" data-line-number="3" contenteditable="false">&nbsp;</span>gubergren,</p>"#;
        assert_eq!(get_range_html(html).expect("numbered"), range(2, 3));
    }

    #[test]
    fn unnumbered_fragment_needs_context() {
        let node = parse_fragment("<p>short</p>").expect("fragment");
        assert_eq!(get_range(&node), Err(RangeError::NoLineNumbers));
        assert_eq!(get_range_in_context(&node, Some(12)), Ok(LineRange::single(12)));
        assert_eq!(
            get_range_in_context(&node, None),
            Err(RangeError::NoLineNumbers)
        );
    }

    #[test]
    fn malformed_html_is_structural() {
        assert!(matches!(
            get_range_html("<p><em>x</p>"),
            Err(LineNumberingError::Structural(_))
        ));
    }

    #[test]
    fn annotation_assigns_breaks_to_the_next_line() {
        let html = format!("<p>{}a{}b</p>", num(1), wrap(2));
        let events = marker_events(parse_fragment(&html).expect("fragment"));
        // p, num, "a", br, num, "b", /p
        assert_eq!(annotate_lines(&events), vec![1, 1, 1, 2, 2, 2, 2]);
    }

    fn numbered(html: &str) -> ParagraphUnit {
        let mut units = split_html(html).expect("well-formed");
        renumber(units.remove(0), 1, 12).expect("numbered").unit
    }

    fn numbered_unit() -> ParagraphUnit {
        numbered(
            "<p>Lorem <strong>ipsum dolor</strong> sit amet, <em>consetetur</em> sadipscing elitr</p>",
        )
    }

    #[test]
    fn extract_middle_lines() {
        let unit = numbered_unit();
        // Lines: "Lorem ipsum " / "dolor sit " / "amet, " / "consetetur " / "sadipscing " / "elitr"
        let extracted = extract_lines(&unit, range(2, 3)).expect("in bounds");
        assert_eq!(
            to_html(&extracted),
            format!(
                "<p>{}<strong>dolor</strong> sit {}amet, </p>",
                num(2),
                wrap(3)
            )
        );
        assert_eq!(get_range(&extracted), Ok(range(2, 3)));
    }

    #[test]
    fn extract_whole_unit_is_identity() {
        let units = [
            numbered_unit(),
            numbered("<p>  Hi there</p>"),
            numbered("<p>one<br>two three<br>four</p>"),
        ];
        for unit in units {
            let all = get_range(&unit.node).expect("numbered");
            let extracted = extract_lines(&unit, all).expect("in bounds");
            assert_eq!(to_html(&extracted), unit.to_html());
        }
    }

    #[test]
    fn leading_whitespace_belongs_to_the_first_line() {
        let unit = numbered("<p>  Hi there</p>");
        assert_eq!(unit.to_html(), format!("<p>  {}Hi there</p>", num(1)));
        let events = marker_events(unit.node.clone());
        // p, "  ", num, "Hi there", /p
        assert_eq!(annotate_lines(&events), vec![1, 1, 1, 1, 1]);
    }

    #[test]
    fn hard_break_opens_the_line_after_it() {
        let unit = numbered("<p>one<br>two three<br>four</p>");
        assert_eq!(
            unit.to_html(),
            format!("<p>{}one<br>{}two three<br>{}four</p>", num(1), num(2), num(3))
        );
        let events = marker_events(unit.node.clone());
        // p, num, "one", br, num, "two three", br, num, "four", /p
        assert_eq!(annotate_lines(&events), vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 3]);

        let middle = extract_lines(&unit, range(2, 2)).expect("in bounds");
        assert_eq!(to_html(&middle), format!("<p>{}two three</p>", num(2)));
        let first = extract_lines(&unit, range(1, 1)).expect("in bounds");
        assert_eq!(to_html(&first), format!("<p>{}one</p>", num(1)));
    }

    #[test]
    fn break_before_whitespace_still_opens_the_next_line() {
        let html = format!("<p>{}one<br> {}two</p>", num(1), num(2));
        let events = marker_events(parse_fragment(&html).expect("fragment"));
        // p, num, "one", br, " ", num, "two", /p
        assert_eq!(annotate_lines(&events), vec![1, 1, 1, 2, 2, 2, 2, 2]);
    }

    #[test]
    fn trailing_break_stays_on_its_line() {
        let html = format!("<p>{}one<br>two</p>", num(1));
        let events = marker_events(parse_fragment(&html).expect("fragment"));
        assert_eq!(annotate_lines(&events), vec![1, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn extract_out_of_bounds() {
        let unit = numbered_unit();
        assert_eq!(
            extract_lines(&unit, range(5, 9)),
            Err(LineNumberingError::Range(RangeError::OutOfBounds {
                from: 5,
                to: 9,
                first: 1,
                last: 6
            }))
        );
    }
}
