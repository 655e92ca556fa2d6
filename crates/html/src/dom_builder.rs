use crate::error::{StructuralError, StructuralErrorKind};
use crate::types::{Node, Token, TokenStream};

/// Build a `Node::Fragment` from a token stream.
///
/// Strict: every element must be closed by its own end tag, in order. Void
/// elements close themselves. Doctypes are ignored; adjacent text tokens are
/// joined into one text node.
pub fn build_fragment(stream: &TokenStream) -> Result<Node, StructuralError> {
    let atoms = stream.atoms();
    let mut arena = NodeArena::new();
    let root_index = arena.push(ArenaNode::Fragment {
        children: Vec::new(),
    });

    let mut open_elements: Vec<usize> = Vec::new();

    for (position, token) in stream.tokens().iter().enumerate() {
        let parent_index = open_elements.last().copied().unwrap_or(root_index);
        match token {
            Token::Doctype(_) => {
                log::debug!(target: "html.dom_builder", "ignoring doctype in fragment");
            }
            Token::Comment(c) => {
                arena.add_child(parent_index, ArenaNode::Comment { text: c.clone() });
            }
            Token::Text(txt) => {
                if txt.is_empty() {
                    continue;
                }
                if !arena.append_to_last_text(parent_index, txt) {
                    arena.add_child(parent_index, ArenaNode::Text { text: txt.clone() });
                }
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                let resolved_attributes: Vec<(String, Option<String>)> = attributes
                    .iter()
                    .map(|(k, v)| (atoms.resolve(*k).to_string(), v.clone()))
                    .collect();
                let new_index = arena.add_child(
                    parent_index,
                    ArenaNode::Element {
                        name: atoms.resolve(*name).to_string(),
                        attributes: resolved_attributes,
                        children: Vec::new(),
                    },
                );
                if !*self_closing {
                    open_elements.push(new_index);
                }
            }
            Token::EndTag(name) => {
                let target = atoms.resolve(*name);
                match open_elements.last() {
                    Some(&open_index) if arena.is_element_named(open_index, target) => {
                        open_elements.pop();
                    }
                    Some(&open_index) => {
                        let expected = arena.element_name(open_index).to_string();
                        let kind = if open_elements
                            .iter()
                            .any(|&i| arena.is_element_named(i, target))
                        {
                            StructuralErrorKind::MismatchedEndTag {
                                expected,
                                found: target.to_string(),
                            }
                        } else {
                            StructuralErrorKind::UnexpectedEndTag {
                                name: target.to_string(),
                            }
                        };
                        return Err(StructuralError::at(kind, position));
                    }
                    None => {
                        return Err(StructuralError::at(
                            StructuralErrorKind::UnexpectedEndTag {
                                name: target.to_string(),
                            },
                            position,
                        ));
                    }
                }
            }
        }
    }

    if let Some(&open_index) = open_elements.last() {
        return Err(StructuralError::at(
            StructuralErrorKind::UnclosedElement {
                name: arena.element_name(open_index).to_string(),
            },
            stream.tokens().len(),
        ));
    }

    Ok(arena.into_tree(root_index))
}

#[derive(Debug)]
enum ArenaNode {
    Fragment {
        children: Vec<usize>,
    },
    Element {
        name: String,
        attributes: Vec<(String, Option<String>)>,
        children: Vec<usize>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

impl ArenaNode {
    fn children(&self) -> Option<&[usize]> {
        match self {
            ArenaNode::Fragment { children } | ArenaNode::Element { children, .. } => {
                Some(children)
            }
            ArenaNode::Text { .. } | ArenaNode::Comment { .. } => None,
        }
    }
}

#[derive(Debug)]
struct NodeArena {
    nodes: Vec<ArenaNode>,
}

impl NodeArena {
    fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    fn push(&mut self, node: ArenaNode) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        index
    }

    fn add_child(&mut self, parent_index: usize, child: ArenaNode) -> usize {
        let child_index = self.push(child);
        match &mut self.nodes[parent_index] {
            ArenaNode::Fragment { children } | ArenaNode::Element { children, .. } => {
                children.push(child_index);
            }
            _ => unreachable!("dom builder parent cannot have children"),
        }
        child_index
    }

    fn append_to_last_text(&mut self, parent_index: usize, txt: &str) -> bool {
        let Some(&last) = self.nodes[parent_index].children().and_then(|c| c.last()) else {
            return false;
        };
        match &mut self.nodes[last] {
            ArenaNode::Text { text } => {
                text.push_str(txt);
                true
            }
            _ => false,
        }
    }

    fn is_element_named(&self, node_index: usize, target: &str) -> bool {
        match &self.nodes[node_index] {
            ArenaNode::Element { name, .. } => name.eq_ignore_ascii_case(target),
            _ => false,
        }
    }

    fn element_name(&self, node_index: usize) -> &str {
        match &self.nodes[node_index] {
            ArenaNode::Element { name, .. } => name,
            _ => "",
        }
    }

    fn into_tree(self, root_index: usize) -> Node {
        let mut nodes = self.nodes;
        let mut built_nodes: Vec<Node> = Vec::with_capacity(nodes.len());

        fn take_children(n: usize, built: &mut Vec<Node>) -> Vec<Node> {
            let split = built.len() - n;
            built.split_off(split)
        }

        // Iterative postorder: when a node is seen the second time, its direct
        // children are the last `child_count` entries of `built_nodes`, in order.
        let mut stack: Vec<(usize, bool)> = vec![(root_index, false)];

        while let Some((node_index, visited)) = stack.pop() {
            if !visited {
                stack.push((node_index, true));
                if let Some(children) = nodes[node_index].children() {
                    for &child_index in children.iter().rev() {
                        stack.push((child_index, false));
                    }
                }
                continue;
            }

            let node = match &mut nodes[node_index] {
                ArenaNode::Fragment { children } => {
                    let child_count = children.len();
                    Node::Fragment {
                        children: take_children(child_count, &mut built_nodes),
                    }
                }
                ArenaNode::Element {
                    name,
                    attributes,
                    children,
                } => {
                    let child_count = children.len();
                    Node::element(
                        std::mem::take(name),
                        std::mem::take(attributes),
                        take_children(child_count, &mut built_nodes),
                    )
                }
                ArenaNode::Text { text } => Node::Text {
                    text: std::mem::take(text),
                },
                ArenaNode::Comment { text } => Node::Comment {
                    text: std::mem::take(text),
                },
            };
            built_nodes.push(node);
        }

        debug_assert_eq!(built_nodes.len(), 1, "dom builder builds exactly one root");
        built_nodes.pop().unwrap_or(Node::Fragment {
            children: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize;

    fn build(html: &str) -> Result<Node, StructuralError> {
        build_fragment(&tokenize(html))
    }

    #[test]
    fn builds_nested_fragment() {
        let root = build("<p>a<em>b</em></p><ul><li>c</li></ul>").expect("well-formed");
        let children = root.children();
        assert_eq!(children.len(), 2);
        assert!(children[0].is_element_named("p"));
        assert_eq!(children[0].children().len(), 2);
        assert!(children[1].children()[0].is_element_named("li"));
    }

    #[test]
    fn joins_adjacent_text_tokens() {
        let root = build("<p>a < b</p>").expect("well-formed");
        assert_eq!(root.children()[0].children(), &[Node::text("a < b")]);
    }

    #[test]
    fn rejects_unclosed_element() {
        let err = build("<p>text").expect_err("unclosed p");
        assert_eq!(
            err.kind,
            StructuralErrorKind::UnclosedElement { name: "p".into() }
        );
    }

    #[test]
    fn rejects_stray_end_tag() {
        let err = build("<p>text</p></div>").expect_err("stray end tag");
        assert_eq!(
            err.kind,
            StructuralErrorKind::UnexpectedEndTag { name: "div".into() }
        );
        assert_eq!(err.position, Some(3));
    }

    #[test]
    fn rejects_misnested_inline_elements() {
        let err = build("<p><b><i>x</b></i></p>").expect_err("misnested");
        assert_eq!(
            err.kind,
            StructuralErrorKind::MismatchedEndTag {
                expected: "i".into(),
                found: "b".into()
            }
        );
    }

    #[test]
    fn void_elements_do_not_need_end_tags() {
        let root = build("<p>a<br>b<br/>c</p>").expect("void elements");
        assert_eq!(root.children()[0].children().len(), 5);
    }

    #[test]
    fn build_stress_deep_nesting() {
        let depth = 2_000;
        let html = format!("{}{}", "<div>".repeat(depth), "</div>".repeat(depth));
        let root = build(&html).expect("deep nesting");
        let mut current = &root.children()[0];
        let mut seen = 1;
        while let Some(child) = current.children().first() {
            current = child;
            seen += 1;
        }
        assert_eq!(seen, depth);
    }
}
