use crate::Node;
use std::fmt::Write;

pub fn first_styles(style: &[(String, String)]) -> String {
    let mut out = String::new();
    for (i, (k, v)) in style.iter().take(3).enumerate() {
        if i != 0 {
            out.push(' ');
        }
        let _ = write!(&mut out, r#"{k}: {v};"#);
    }
    out
}

/// Indented one-line-per-node outline, capped at `cap` nodes.
pub fn outline_from_dom(root: &Node, cap: usize) -> Vec<String> {
    struct IndentGuard<'a> {
        indent: &'a mut String,
        step: usize,
    }

    impl Drop for IndentGuard<'_> {
        fn drop(&mut self) {
            let new_len = self.indent.len() - self.step;
            self.indent.truncate(new_len);
        }
    }

    fn push_preview_replace_newlines(out: &mut String, s: &str, max_chars: usize) {
        for (i, ch) in s.chars().enumerate() {
            if i == max_chars {
                out.push('…');
                break;
            }
            out.push(match ch {
                '\n' => ' ',
                '\u{00A0}' => '·',
                _ => ch,
            });
        }
    }

    const INDENT_STEP: &str = "  ";
    const PREVIEW_CHARS: usize = 40;

    fn walk(node: &Node, indent: &mut String, out: &mut Vec<String>, left: &mut usize) {
        if *left == 0 {
            return;
        }
        *left -= 1;
        let children = match node {
            Node::Fragment { children } => {
                out.push(format!("{indent}#fragment"));
                children
            }
            Node::Element {
                name,
                children,
                style,
                ..
            } => {
                let mut line = String::with_capacity(indent.len() + 64);
                line.push_str(indent);
                line.push('<');
                line.push_str(name);
                for key in ["class", "start", "data-line-number"] {
                    if let Some(value) = node.attr(key) {
                        let _ = write!(&mut line, r#" {key}="{value}""#);
                    }
                }
                line.push('>');
                let styl = first_styles(style);
                if !styl.is_empty() {
                    let _ = write!(&mut line, "  /* {styl} */");
                }
                out.push(line);
                children
            }
            Node::Text { text } => {
                if !text.trim().is_empty() || text.contains('\u{00A0}') {
                    let mut line = String::with_capacity(indent.len() + 64);
                    line.push_str(indent);
                    line.push('"');
                    push_preview_replace_newlines(&mut line, text, PREVIEW_CHARS);
                    line.push('"');
                    out.push(line);
                }
                return;
            }
            Node::Comment { text } => {
                let mut line = String::with_capacity(indent.len() + 64);
                line.push_str(indent);
                line.push_str("<!-- ");
                push_preview_replace_newlines(&mut line, text, PREVIEW_CHARS);
                line.push_str(" -->");
                out.push(line);
                return;
            }
        };
        indent.push_str(INDENT_STEP);
        let guard = IndentGuard {
            indent,
            step: INDENT_STEP.len(),
        };
        for c in children {
            walk(c, &mut *guard.indent, out, left);
        }
    }

    let mut out = Vec::new();
    let mut left = cap;
    let mut indent = String::new();
    walk(root, &mut indent, &mut out, &mut left);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_fragment;

    #[test]
    fn outline_shows_structure_and_markers() {
        let root = parse_fragment(
            r#"<p style="color: red"><span class="os-line-number line-number-1" data-line-number="1">&nbsp;</span>Hello</p>"#,
        )
        .expect("fragment");
        assert_eq!(
            outline_from_dom(&root, 10),
            vec![
                "#fragment",
                "  <p>  /* color: red; */",
                r#"    <span class="os-line-number line-number-1" data-line-number="1">"#,
                "      \"·\"",
                "    \"Hello\"",
            ]
        );
    }

    #[test]
    fn outline_respects_cap() {
        let root = parse_fragment("<p>a</p><p>b</p><p>c</p>").expect("fragment");
        assert_eq!(outline_from_dom(&root, 3).len(), 3);
    }
}
