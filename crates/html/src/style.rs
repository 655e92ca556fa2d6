//! Inline `style` attribute declarations.
//!
//! Declarations are split on `;` outside of quotes and parentheses, so values
//! such as `url("a;b")` or `rgb(0, 0, 0)` survive intact. Property names are
//! kept as written; lookups are ASCII case-insensitive.

pub fn parse_style_declarations(input: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for declaration in split_top_level(input, b';') {
        let Some(colon) = find_top_level(declaration, b':') else {
            continue;
        };
        let property = declaration[..colon].trim();
        let value = declaration[colon + 1..].trim();
        if property.is_empty() {
            continue;
        }
        out.push((property.to_string(), value.to_string()));
    }
    out
}

pub fn render_style_declarations(declarations: &[(String, String)]) -> String {
    let mut out = String::new();
    for (i, (k, v)) in declarations.iter().enumerate() {
        if i != 0 {
            out.push(' ');
        }
        out.push_str(k);
        out.push_str(": ");
        out.push_str(v);
        out.push(';');
    }
    out
}

fn split_top_level(input: &str, separator: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    for (i, &b) in input.as_bytes().iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                _ if b == separator && depth == 0 => {
                    parts.push(&input[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    parts.push(&input[start..]);
    parts
}

fn find_top_level(input: &str, needle: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    for (i, &b) in input.as_bytes().iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                _ if b == needle && depth == 0 => return Some(i),
                _ => {}
            },
        }
    }
    None
}
