#![no_main]

use html::dom_utils::text_content;
use libfuzzer_sys::fuzz_target;
use linenumbering::{LineNumbering, LineNumberingConfig, join_paragraphs, split_html};

fuzz_target!(|data: &[u8]| {
    let Some((&width, rest)) = data.split_first() else {
        return;
    };
    let Ok(input) = std::str::from_utf8(rest) else {
        return;
    };
    let numbering = LineNumbering::new(LineNumberingConfig {
        max_line_length: usize::from(width % 64) + 1,
        ..LineNumberingConfig::default()
    });
    let Ok(doc) = numbering.number_html(input) else {
        return;
    };
    let html = doc.to_html();

    // Numbering is idempotent.
    let again = numbering
        .number_html(&html)
        .expect("numbered output is well-formed");
    assert_eq!(again.to_html(), html);

    // Markers are the only text added.
    let stripped = linenumbering::strip_line_numbers_html(&html).expect("well-formed");
    let original = join_paragraphs(split_html(input).expect("parsed once already"));
    let stripped = html::parse_fragment(&stripped).expect("well-formed");
    assert_eq!(text_content(&stripped), text_content(&original));
});
