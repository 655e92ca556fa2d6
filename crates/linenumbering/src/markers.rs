//! Line marker nodes.
//!
//! A wrapped line starts with a break marker followed by a number marker; the
//! first line of a unit or of a nested block gets the number marker only.
//! Recognition accepts any attribute order and extra classes, so markers that
//! went through an editor round trip are still found.

use html::dom_utils::normalize_text;
use html::{Event, Node, StructuralError, flatten, parse_fragment, rebuild, to_html};

pub const LINE_BREAK_CLASS: &str = "os-line-break";
pub const LINE_NUMBER_CLASS: &str = "os-line-number";
pub const LINE_NUMBER_CLASS_PREFIX: &str = "line-number-";
pub const LINE_NUMBER_ATTRIBUTE: &str = "data-line-number";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    Break,
    Number(u32),
}

pub fn line_break_marker() -> Node {
    Node::element(
        "br",
        vec![("class".to_string(), Some(LINE_BREAK_CLASS.to_string()))],
        Vec::new(),
    )
}

pub fn line_number_marker(line: u32) -> Node {
    Node::element(
        "span",
        vec![
            ("contenteditable".to_string(), Some("false".to_string())),
            (
                "class".to_string(),
                Some(format!(
                    "{LINE_NUMBER_CLASS} {LINE_NUMBER_CLASS_PREFIX}{line}"
                )),
            ),
            (LINE_NUMBER_ATTRIBUTE.to_string(), Some(line.to_string())),
        ],
        vec![Node::text("\u{00A0}")],
    )
}

pub fn marker_kind(node: &Node) -> Option<Marker> {
    if node.is_element_named("br") && node.has_class(LINE_BREAK_CLASS) {
        return Some(Marker::Break);
    }
    if !node.is_element_named("span") || !node.has_class(LINE_NUMBER_CLASS) {
        return None;
    }
    let from_attribute = node
        .attr(LINE_NUMBER_ATTRIBUTE)
        .and_then(|v| v.trim().parse::<u32>().ok());
    let line = from_attribute.or_else(|| {
        node.attr("class")?
            .split_ascii_whitespace()
            .find_map(|c| c.strip_prefix(LINE_NUMBER_CLASS_PREFIX)?.parse::<u32>().ok())
    })?;
    (line >= 1).then_some(Marker::Number(line))
}

pub fn is_marker(node: &Node) -> bool {
    marker_kind(node).is_some()
}

pub(crate) fn event_marker(event: &Event) -> Option<Marker> {
    match event {
        Event::Leaf(node) => marker_kind(node),
        _ => None,
    }
}

/// A `<br>` from the input, as opposed to a break marker.
pub(crate) fn is_hard_break(event: &Event) -> bool {
    matches!(event, Event::Leaf(node) if node.is_element_named("br") && !is_marker(node))
}

pub(crate) fn marker_event(marker: Marker) -> Event {
    match marker {
        Marker::Break => Event::Leaf(line_break_marker()),
        Marker::Number(line) => Event::Leaf(line_number_marker(line)),
    }
}

/// Flatten a node with markers as opaque leaves. Fragments contribute their children.
pub(crate) fn marker_events(node: Node) -> Vec<Event> {
    match node {
        Node::Fragment { children } => flatten(children, is_marker),
        other => flatten(vec![other], is_marker),
    }
}

/// Rebuild events; a root that was a fragment comes back as one.
pub(crate) fn rebuild_like(events: Vec<Event>, fragment: bool) -> Result<Node, StructuralError> {
    let mut nodes = rebuild(events)?;
    if !fragment && nodes.len() == 1 {
        return Ok(nodes.remove(0));
    }
    Ok(Node::fragment(nodes))
}

/// Line numbers of all number markers, in document order.
pub fn line_numbers(node: &Node) -> Vec<u32> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(n) = stack.pop() {
        if let Some(Marker::Number(line)) = marker_kind(n) {
            out.push(line);
            continue;
        }
        stack.extend(n.children().iter().rev());
    }
    out
}

/// Remove every marker and re-join the text they separated.
pub fn strip_line_numbers(node: Node) -> Result<Node, StructuralError> {
    let fragment = matches!(node, Node::Fragment { .. });
    let events = marker_events(node)
        .into_iter()
        .filter(|e| event_marker(e).is_none())
        .collect();
    let mut stripped = rebuild_like(events, fragment)?;
    normalize_text(&mut stripped);
    Ok(stripped)
}

pub fn strip_line_numbers_html(html: &str) -> Result<String, StructuralError> {
    Ok(to_html(&strip_line_numbers(parse_fragment(html)?)?))
}

/// Move every number marker by `delta` lines. Numbers are clamped at 1.
pub fn shift_markers(node: Node, delta: i64) -> Result<Node, StructuralError> {
    if delta == 0 {
        return Ok(node);
    }
    let fragment = matches!(node, Node::Fragment { .. });
    let events = marker_events(node)
        .into_iter()
        .map(|event| match event_marker(&event) {
            Some(Marker::Number(line)) => {
                let shifted = (i64::from(line) + delta).clamp(1, i64::from(u32::MAX));
                marker_event(Marker::Number(shifted as u32))
            }
            _ => event,
        })
        .collect();
    rebuild_like(events, fragment)
}
