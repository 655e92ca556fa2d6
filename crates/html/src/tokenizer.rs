//! Tokenizer for editor-produced HTML fragments.
//!
//! Tag and attribute names are ASCII `[A-Za-z0-9:_-]` and are interned
//! lowercased. Text and attribute values are entity-decoded. `script` and
//! `style` bodies are passed through as raw text.
//!
//! This is deliberately not an HTML5 state machine: input is expected to be
//! well-formed editor output and the tree builder rejects anything it cannot
//! nest, instead of recovering.
use crate::dom_utils::is_void_element;
use crate::entities::decode_entities;
use crate::types::{AtomId, AtomTable, Token, TokenStream};
use memchr::memchr;

const HTML_COMMENT_START: &str = "<!--";
const HTML_COMMENT_END: &str = "-->";

// < cannot appear in UTF-8 continuation bytes, so byte scanning for it is safe.
const SCRIPT_CLOSE_TAG: &[u8] = b"</script";
const STYLE_CLOSE_TAG: &[u8] = b"</style";

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn scan_name(bytes: &[u8], start: usize) -> usize {
    let mut j = start;
    while j < bytes.len() && is_name_byte(bytes[j]) {
        j += 1;
    }
    j
}

fn find_rawtext_close_tag(haystack: &str, close_tag: &[u8]) -> Option<(usize, usize)> {
    let hay = haystack.as_bytes();
    let n = close_tag.len();
    let mut i = 0;
    while i + n <= hay.len() {
        i += memchr(b'<', &hay[i..])?;
        if starts_with_ignore_ascii_case_at(hay, i, close_tag) {
            let mut k = i + n;
            while k < hay.len() && hay[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < hay.len() && hay[k] == b'>' {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

/// Parse attributes from `bytes[k..]` up to and including the closing `>`.
///
/// Returns the attributes, whether the tag was written self-closing, and the
/// position after the tag.
fn scan_attributes(
    input: &str,
    mut k: usize,
    atoms: &mut AtomTable,
) -> (Vec<(AtomId, Option<String>)>, bool, usize) {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut attributes = Vec::new();
    let mut self_closing = false;

    let skip_whitespace = |k: &mut usize| {
        while *k < len && bytes[*k].is_ascii_whitespace() {
            *k += 1;
        }
    };

    loop {
        skip_whitespace(&mut k);
        if k >= len {
            break;
        }
        if bytes[k] == b'>' {
            k += 1;
            break;
        }
        if bytes[k] == b'/' {
            if k + 1 < len && bytes[k + 1] == b'>' {
                self_closing = true;
                k += 2;
                break;
            }
            k += 1;
            continue;
        }
        let name_start = k;
        k = scan_name(bytes, k);
        if name_start == k {
            k += 1;
            continue;
        }
        let attribute_name = atoms.intern_ascii_lowercase(&input[name_start..k]);

        skip_whitespace(&mut k);
        let value = if k < len && bytes[k] == b'=' {
            k += 1;
            skip_whitespace(&mut k);
            if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
                let quote = bytes[k];
                k += 1;
                let vstart = k;
                k += memchr(quote, &bytes[k..]).unwrap_or(len - k);
                let raw = &input[vstart..k];
                if k < len {
                    k += 1;
                }
                Some(decode_entities(raw))
            } else {
                let vstart = k;
                while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                    if bytes[k] == b'/' && k + 1 < len && bytes[k + 1] == b'>' {
                        break;
                    }
                    k += 1;
                }
                Some(decode_entities(&input[vstart..k]))
            }
        } else {
            None
        };
        attributes.push((attribute_name, value));
    }
    (attributes, self_closing, k)
}

/// Tokenizes into a token stream with interned tag/attribute names.
pub fn tokenize(input: &str) -> TokenStream {
    let mut out = Vec::new();
    let mut atoms = AtomTable::new();
    let bytes = input.as_bytes();
    let mut i = 0;
    // Slices are only cut at ASCII structural bytes, so every endpoint is a
    // UTF-8 char boundary.
    while i < bytes.len() {
        if bytes[i] != b'<' {
            let start = i;
            i += memchr(b'<', &bytes[i..]).unwrap_or(bytes.len() - i);
            let decoded = decode_entities(&input[start..i]);
            if !decoded.is_empty() {
                out.push(Token::Text(decoded));
            }
            continue;
        }

        if input[i..].starts_with(HTML_COMMENT_START) {
            let body_start = i + HTML_COMMENT_START.len();
            match input[body_start..].find(HTML_COMMENT_END) {
                Some(end) => {
                    out.push(Token::Comment(input[body_start..body_start + end].to_string()));
                    i = body_start + end + HTML_COMMENT_END.len();
                    continue;
                }
                None => {
                    out.push(Token::Comment(input[body_start..].to_string()));
                    break;
                }
            }
        }

        if starts_with_ignore_ascii_case_at(bytes, i, b"<!doctype") {
            let rest = &input[i + 2..];
            match rest.find('>') {
                Some(end) => {
                    out.push(Token::Doctype(rest[..end].trim().to_string()));
                    i += 2 + end + 1;
                    continue;
                }
                None => break,
            }
        }

        if bytes.get(i + 1) == Some(&b'/') {
            let start = i + 2;
            let mut j = scan_name(bytes, start);
            let name = atoms.intern_ascii_lowercase(&input[start..j]);
            j += memchr(b'>', &bytes[j..]).map_or(bytes.len() - j, |p| p + 1);
            out.push(Token::EndTag(name));
            i = j;
            continue;
        }

        let start = i + 1;
        let j = scan_name(bytes, start);
        if j == start {
            // A lone '<' that does not open a tag is text.
            out.push(Token::Text("<".to_string()));
            i += 1;
            continue;
        }
        let name = atoms.intern_ascii_lowercase(&input[start..j]);
        let (attributes, mut self_closing, k) = scan_attributes(input, j, &mut atoms);
        if is_void_element(atoms.resolve(name)) {
            self_closing = true;
        }
        out.push(Token::StartTag {
            name,
            attributes,
            self_closing,
        });
        i = k;

        let name_str = atoms.resolve(name);
        if (name_str == "script" || name_str == "style") && !self_closing {
            let close_tag = if name_str == "script" {
                SCRIPT_CLOSE_TAG
            } else {
                STYLE_CLOSE_TAG
            };
            match find_rawtext_close_tag(&input[i..], close_tag) {
                Some((rel_start, rel_end)) => {
                    let raw = &input[i..i + rel_start];
                    if !raw.is_empty() {
                        out.push(Token::Text(raw.to_string()));
                    }
                    out.push(Token::EndTag(name));
                    i += rel_end;
                }
                None => {
                    let raw = &input[i..];
                    if !raw.is_empty() {
                        out.push(Token::Text(raw.to_string()));
                    }
                    break;
                }
            }
        }
    }
    log::trace!(target: "html.tokenizer", "tokenized {} bytes into {} tokens", input.len(), out.len());
    TokenStream::new(out, atoms)
}
