#![no_main]

use libfuzzer_sys::fuzz_target;
use linenumbering::{ChangeRecommendation, LineNumbering, LineNumberingConfig, LineRange};

fuzz_target!(|data: &[u8]| {
    let [width, from, len, split @ ..] = data else {
        return;
    };
    let Ok(text) = std::str::from_utf8(split) else {
        return;
    };
    let (input, replacement) = text.split_once('|').unwrap_or((text, ""));
    let numbering = LineNumbering::new(LineNumberingConfig {
        max_line_length: usize::from(width % 32) + 1,
        ..LineNumberingConfig::default()
    });
    let Ok(doc) = numbering.number_html(input) else {
        return;
    };
    let from = u32::from(*from % 16) + 1;
    let Ok(range) = LineRange::new(from, from + u32::from(*len % 4)) else {
        return;
    };
    let Ok(rec) = ChangeRecommendation::from_html(range, replacement) else {
        return;
    };
    // Errors are fine; panics and unbalanced output are not.
    if let Ok(diff) = doc.build_diff(vec![rec.clone()]) {
        html::parse_fragment(&html::to_html(&diff)).expect("diff output is well-formed");
    }
    if let Ok(merged) = doc.apply(vec![rec]) {
        html::parse_fragment(&merged.to_html()).expect("merged output is well-formed");
        assert!(merged.next_line() >= merged.first_line());
    }
});
