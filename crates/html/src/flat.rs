//! Flat, document-order view of a fragment tree.
//!
//! Line-oriented transforms need to cut a tree at arbitrary text positions.
//! Doing that on nested `Vec<Node>` means tracking paths; on a flat event list
//! it is a splice. `flatten` produces the events, `rebuild` turns a balanced
//! event list back into owned nodes using the same open-element stack as the
//! fragment builder.

use crate::Node;
use crate::dom_utils::is_void_element;
use crate::error::{StructuralError, StructuralErrorKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Element start; the node is a childless shell carrying name and attributes.
    Open(Node),
    Close,
    Text(String),
    /// A subtree treated as one opaque unit (void elements, comments, and
    /// whatever the caller's leaf predicate selects).
    Leaf(Node),
}

/// Flatten `nodes` in document order. Fragments are transparent.
pub fn flatten<F>(nodes: Vec<Node>, is_leaf: F) -> Vec<Event>
where
    F: Fn(&Node) -> bool,
{
    let mut out = Vec::new();
    // Explicit stack instead of recursion: `None` marks a pending Close.
    let mut stack: Vec<Option<Node>> = nodes.into_iter().rev().map(Some).collect();
    while let Some(entry) = stack.pop() {
        let Some(node) = entry else {
            out.push(Event::Close);
            continue;
        };
        match node {
            Node::Fragment { children } => {
                stack.extend(children.into_iter().rev().map(Some));
            }
            Node::Text { text } => out.push(Event::Text(text)),
            Node::Comment { .. } => out.push(Event::Leaf(node)),
            Node::Element { ref name, .. } if is_void_element(name) || is_leaf(&node) => {
                out.push(Event::Leaf(node));
            }
            Node::Element { .. } => {
                let shell = node.shell();
                let children = node.into_children();
                out.push(Event::Open(shell));
                stack.push(None);
                stack.extend(children.into_iter().rev().map(Some));
            }
        }
    }
    out
}

/// Rebuild nodes from a balanced event list.
pub fn rebuild(events: Vec<Event>) -> Result<Vec<Node>, StructuralError> {
    let mut roots: Vec<Node> = Vec::new();
    let mut open: Vec<Node> = Vec::new();

    fn push_child(open: &mut [Node], roots: &mut Vec<Node>, node: Node) {
        match open.last_mut().and_then(Node::children_mut) {
            Some(children) => children.push(node),
            None => roots.push(node),
        }
    }

    for event in events {
        match event {
            Event::Open(shell) => open.push(shell),
            Event::Close => {
                let node = open
                    .pop()
                    .ok_or_else(|| StructuralError::new(StructuralErrorKind::UnbalancedEvents))?;
                push_child(&mut open, &mut roots, node);
            }
            Event::Text(text) => {
                if text.is_empty() {
                    continue;
                }
                let siblings = match open.last_mut().and_then(Node::children_mut) {
                    Some(children) => children,
                    None => &mut roots,
                };
                match siblings.last_mut() {
                    Some(Node::Text { text: prev }) => prev.push_str(&text),
                    _ => siblings.push(Node::Text { text }),
                }
            }
            Event::Leaf(node) => push_child(&mut open, &mut roots, node),
        }
    }

    if !open.is_empty() {
        return Err(StructuralError::new(StructuralErrorKind::UnbalancedEvents));
    }
    Ok(roots)
}

/// Rebuild and require exactly one root node.
pub fn rebuild_single(events: Vec<Event>) -> Result<Node, StructuralError> {
    let mut roots = rebuild(events)?;
    if roots.len() != 1 {
        return Err(StructuralError::new(StructuralErrorKind::UnbalancedEvents));
    }
    Ok(roots.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_fragment, to_html};

    fn no_leaves(_: &Node) -> bool {
        false
    }

    #[test]
    fn flatten_then_rebuild_is_identity() {
        let html = r#"<p class="a">x<strong>y<em>z</em></strong><br>w<!-- c --></p><ol start="2"><li>i</li></ol>"#;
        let root = parse_fragment(html).expect("fragment");
        let events = flatten(root.into_children(), no_leaves);
        let rebuilt = rebuild(events).expect("balanced");
        assert_eq!(to_html(&Node::fragment(rebuilt)), html);
    }

    #[test]
    fn leaf_predicate_keeps_subtrees_opaque() {
        let root = parse_fragment("<p><span class=\"m\">1</span>x</p>").expect("fragment");
        let events = flatten(root.into_children(), |n| n.has_class("m"));
        assert_eq!(events.len(), 4, "{events:?}");
        assert!(matches!(&events[1], Event::Leaf(n) if n.is_element_named("span")));
    }

    #[test]
    fn rebuild_rejects_unbalanced_events() {
        let p = Node::element("p", Vec::new(), Vec::new());
        assert!(rebuild(vec![Event::Open(p)]).is_err());
        assert!(rebuild(vec![Event::Close]).is_err());
    }

    #[test]
    fn rebuild_joins_adjacent_text() {
        let p = Node::element("p", Vec::new(), Vec::new());
        let node = rebuild_single(vec![
            Event::Open(p),
            Event::Text("a".into()),
            Event::Text(String::new()),
            Event::Text("b".into()),
            Event::Close,
        ])
        .expect("balanced");
        assert_eq!(node.children(), &[Node::text("ab")]);
    }
}
