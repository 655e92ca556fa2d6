//! Splits a fragment into independently addressable paragraph units.
//!
//! Top-level elements become one unit each. List items are lifted out of
//! their list into a singleton list of the same tag and attributes; ordered
//! items carry a `start` so numbering survives the split.

use html::dom_utils::is_void_element;
use html::{Node, StructuralError, StructuralErrorKind, parse_fragment};

use crate::types::{ListContext, ListTag, ParagraphUnit};

const LOG_TARGET: &str = "linenumbering.paragraphs";

pub fn split_paragraphs(root: Node) -> Result<Vec<ParagraphUnit>, StructuralError> {
    if !matches!(root, Node::Fragment { .. } | Node::Element { .. }) {
        return Err(StructuralError::new(StructuralErrorKind::NotAContainer));
    }
    check_void_elements(&root)?;

    let mut units = Vec::new();
    for child in root.into_children() {
        match child {
            Node::Text { text } => {
                if !text.trim().is_empty() {
                    log::debug!(target: LOG_TARGET, "dropping root-level text {text:?}");
                }
            }
            Node::Comment { .. } => {}
            Node::Element { ref name, .. } if is_void_element(name) => {
                log::debug!(target: LOG_TARGET, "dropping root-level <{name}>");
            }
            Node::Element { ref name, .. } if ListTag::from_name(name).is_some() => {
                split_list(child, &mut units);
            }
            element => {
                let ordinal = units.len();
                units.push(ParagraphUnit::new(ordinal, None, element));
            }
        }
    }
    log::trace!(target: LOG_TARGET, "split into {} units", units.len());
    Ok(units)
}

pub fn split_html(html: &str) -> Result<Vec<ParagraphUnit>, StructuralError> {
    split_paragraphs(parse_fragment(html)?)
}

/// Reassemble units in ordinal order.
pub fn join_paragraphs(mut units: Vec<ParagraphUnit>) -> Node {
    units.sort_by_key(|u| u.ordinal);
    Node::fragment(units.into_iter().map(|u| u.node).collect())
}

fn split_list(list: Node, units: &mut Vec<ParagraphUnit>) {
    let Some(tag) = list.name().and_then(ListTag::from_name) else {
        return;
    };
    let shell = list.shell();
    let base = match tag {
        ListTag::Ol => list
            .attr("start")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(1),
        ListTag::Ul => 1,
    };

    let mut items = 0u32;
    for child in list.into_children() {
        match child {
            Node::Text { text } => {
                if !text.trim().is_empty() {
                    log::warn!(target: LOG_TARGET, "dropping text directly inside <{}>: {text:?}", tag.as_str());
                }
            }
            Node::Comment { .. } => {}
            child => {
                let mut wrapper = shell.clone();
                let context = if child.is_element_named("li") {
                    let start = base.saturating_add(items);
                    items += 1;
                    item_context(tag, start, &mut wrapper)
                } else {
                    log::warn!(
                        target: LOG_TARGET,
                        "non-item <{}> inside <{}> kept as its own unit",
                        child.name().unwrap_or(""),
                        tag.as_str()
                    );
                    ListContext { tag, start: None }
                };
                if let Some(children) = wrapper.children_mut() {
                    children.push(child);
                }
                let ordinal = units.len();
                units.push(ParagraphUnit::new(ordinal, Some(context), wrapper));
            }
        }
    }
}

fn item_context(tag: ListTag, start: u32, wrapper: &mut Node) -> ListContext {
    if tag == ListTag::Ul {
        return ListContext { tag, start: None };
    }
    if start == 1 {
        wrapper.remove_attr("start");
        ListContext { tag, start: None }
    } else {
        wrapper.set_attr("start", Some(start.to_string()));
        ListContext {
            tag,
            start: Some(start),
        }
    }
}

fn check_void_elements(root: &Node) -> Result<(), StructuralError> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if let Node::Element { name, children, .. } = node {
            if is_void_element(name) && !children.is_empty() {
                return Err(StructuralError::new(
                    StructuralErrorKind::VoidElementWithChildren { name: name.clone() },
                ));
            }
        }
        stack.extend(node.children());
    }
    Ok(())
}
