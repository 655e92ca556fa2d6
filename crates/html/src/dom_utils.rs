use crate::Node;

pub fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_heading(name: &str) -> bool {
    let b = name.as_bytes();
    b.len() == 2 && (b[0] | 0x20) == b'h' && (b'1'..=b'6').contains(&b[1])
}

/// Elements that start a new visual line when they open and when they close.
pub fn is_block_element(name: &str) -> bool {
    is_heading(name)
        || matches!(
            name.to_ascii_lowercase().as_str(),
            "p" | "div"
                | "ul"
                | "ol"
                | "li"
                | "blockquote"
                | "pre"
                | "section"
                | "article"
                | "header"
                | "footer"
                | "table"
                | "thead"
                | "tbody"
                | "tr"
                | "td"
                | "th"
                | "dl"
                | "dt"
                | "dd"
                | "hr"
        )
}

pub fn is_list_element(name: &str) -> bool {
    name.eq_ignore_ascii_case("ul") || name.eq_ignore_ascii_case("ol")
}

pub fn is_non_rendering_element(node: &Node) -> bool {
    match node {
        Node::Element { name, .. } => {
            let n = name.to_ascii_lowercase();
            matches!(n.as_str(), "style" | "script" | "title" | "meta" | "link")
        }
        _ => false,
    }
}

/// Concatenated text of all descendants, in document order.
pub fn text_content(node: &Node) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

pub fn collect_text(node: &Node, out: &mut String) {
    match node {
        Node::Text { text } => out.push_str(text),
        Node::Element { .. } if is_non_rendering_element(node) => {}
        Node::Element { children, .. } | Node::Fragment { children } => {
            for c in children {
                collect_text(c, out);
            }
        }
        Node::Comment { .. } => {}
    }
}

/// Text with whitespace runs collapsed and block boundaries turned into blank lines.
pub fn collect_visible_text(node: &Node, out: &mut String) {
    match node {
        Node::Text { text } => {
            for word in text.split_whitespace() {
                if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                    out.push(' ');
                }
                out.push_str(word);
            }
        }
        Node::Element { .. } if is_non_rendering_element(node) => {}
        Node::Element { name, children, .. } => {
            for c in children {
                collect_visible_text(c, out);
            }
            if is_block_element(name) && !out.is_empty() && !out.ends_with("\n\n") {
                out.push_str("\n\n");
            }
        }
        Node::Fragment { children } => {
            for c in children {
                collect_visible_text(c, out);
            }
        }
        Node::Comment { .. } => {}
    }
}

/// Merge adjacent text siblings throughout the tree and drop empty text nodes.
pub fn normalize_text(node: &mut Node) {
    let Some(children) = node.children_mut() else {
        return;
    };
    let mut merged: Vec<Node> = Vec::with_capacity(children.len());
    for mut child in children.drain(..) {
        normalize_text(&mut child);
        if let Node::Text { text } = &child {
            if text.is_empty() {
                continue;
            }
            if let Some(Node::Text { text: prev }) = merged.last_mut() {
                prev.push_str(text);
                continue;
            }
        }
        merged.push(child);
    }
    *children = merged;
}
