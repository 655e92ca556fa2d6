/// Decode the HTML entities rich-text editors actually emit.
///
/// Contract:
/// - Named entities are looked up in [`NAMED_ENTITIES`] and must be
///   semicolon-terminated.
/// - Numeric entities decode only when well-formed and semicolon-terminated:
///   `&#123;` (decimal) and `&#x1F4A9;` (hex), and only to valid Unicode scalars.
/// - Anything else (unknown names, missing semicolons, overlong digit runs)
///   passes through unchanged.
pub(crate) fn decode_entities(s: &str) -> String {
    let bytes = s.as_bytes();
    if memchr::memchr(b'&', bytes).is_none() {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    let mut copy_start = 0;

    const MAX_HEX_DIGITS: usize = 6; // 0x10FFFF
    const MAX_DEC_DIGITS: usize = 7; // 1114111
    const MAX_NAME_LEN: usize = 8;

    // Bounded scan to avoid quadratic behavior on adversarial input.
    fn scan_numeric_entity(
        bytes: &[u8],
        start: usize,
        max_digits: usize,
        is_hex: bool,
    ) -> Option<usize> {
        let mut j = start;
        let mut digits = 0usize;
        while j < bytes.len() {
            let b = bytes[j];
            if b == b';' {
                return (digits > 0).then_some(j);
            }
            if digits == max_digits {
                return None;
            }
            let ok = if is_hex {
                b.is_ascii_hexdigit()
            } else {
                b.is_ascii_digit()
            };
            if !ok {
                return None;
            }
            digits += 1;
            j += 1;
        }
        None
    }

    fn scan_named_entity(bytes: &[u8], start: usize) -> Option<usize> {
        let mut j = start;
        while j < bytes.len() && j - start <= MAX_NAME_LEN {
            let b = bytes[j];
            if b == b';' {
                return (j > start).then_some(j);
            }
            if !b.is_ascii_alphanumeric() {
                return None;
            }
            j += 1;
        }
        None
    }

    while i < bytes.len() {
        if bytes[i] != b'&' {
            i += 1;
            continue;
        }
        if copy_start < i {
            out.push_str(&s[copy_start..i]);
        }

        let decoded = if bytes.get(i + 1) == Some(&b'#') {
            let is_hex = matches!(bytes.get(i + 2), Some(b'x') | Some(b'X'));
            let digits_start = if is_hex { i + 3 } else { i + 2 };
            let max = if is_hex { MAX_HEX_DIGITS } else { MAX_DEC_DIGITS };
            scan_numeric_entity(bytes, digits_start, max, is_hex).and_then(|end| {
                let digits = &s[digits_start..end];
                let radix = if is_hex { 16 } else { 10 };
                u32::from_str_radix(digits, radix)
                    .ok()
                    .and_then(char::from_u32)
                    .map(|ch| (ch, end))
            })
        } else {
            scan_named_entity(bytes, i + 1).and_then(|end| {
                lookup_named_entity(&s[i + 1..end]).map(|ch| (ch, end))
            })
        };

        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                i = end + 1;
            }
            None => {
                out.push('&');
                i += 1;
            }
        }
        copy_start = i;
    }

    if copy_start < bytes.len() {
        out.push_str(&s[copy_start..]);
    }
    out
}

/// Named entities recognised by [`decode_entities`].
pub(crate) const NAMED_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{00A0}'),
    ("shy", '\u{00AD}'),
    ("auml", 'ä'),
    ("ouml", 'ö'),
    ("uuml", 'ü'),
    ("Auml", 'Ä'),
    ("Ouml", 'Ö'),
    ("Uuml", 'Ü'),
    ("szlig", 'ß'),
    ("eacute", 'é'),
    ("egrave", 'è'),
    ("agrave", 'à'),
    ("ccedil", 'ç'),
    ("euro", '€'),
    ("sect", '§'),
    ("para", '¶'),
    ("copy", '©'),
    ("reg", '®'),
    ("deg", '°'),
    ("middot", '·'),
    ("laquo", '«'),
    ("raquo", '»'),
    ("ndash", '–'),
    ("mdash", '—'),
    ("hellip", '…'),
    ("lsquo", '‘'),
    ("rsquo", '’'),
    ("sbquo", '‚'),
    ("ldquo", '“'),
    ("rdquo", '”'),
    ("bdquo", '„'),
    ("bull", '•'),
    ("times", '×'),
];

fn lookup_named_entity(name: &str) -> Option<char> {
    NAMED_ENTITIES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, ch)| *ch)
}
