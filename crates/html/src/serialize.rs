//! HTML serialization for fragment trees.
//!
//! Attributes are written in stored order with their stored values, so
//! anything parsed from editor output (classes, inline styles) round-trips
//! byte-for-byte as long as it was not modified.

use crate::Node;
use crate::dom_utils::is_void_element;

pub fn to_html(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

pub fn children_to_html(children: &[Node]) -> String {
    let mut out = String::new();
    for child in children {
        write_node(child, &mut out);
    }
    out
}

pub fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Fragment { children } => {
            for c in children {
                write_node(c, out);
            }
        }
        Node::Element {
            name,
            attributes,
            children,
            ..
        } => {
            out.push('<');
            out.push_str(name);
            for (k, v) in attributes {
                out.push(' ');
                out.push_str(k);
                if let Some(v) = v {
                    out.push_str("=\"");
                    escape_attribute(v, out);
                    out.push('"');
                }
            }
            out.push('>');
            if is_void_element(name) && children.is_empty() {
                return;
            }
            let raw = name.eq_ignore_ascii_case("script") || name.eq_ignore_ascii_case("style");
            for c in children {
                match c {
                    Node::Text { text } if raw => out.push_str(text),
                    _ => write_node(c, out),
                }
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        Node::Text { text } => escape_text(text, out),
        Node::Comment { text } => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}
