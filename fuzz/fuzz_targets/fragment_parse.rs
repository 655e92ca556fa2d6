#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(root) = html::parse_fragment(input) else {
        return;
    };
    // Serialized output parses back to the same tree.
    let serialized = html::to_html(&root);
    let reparsed = html::parse_fragment(&serialized).expect("serializer output is well-formed");
    assert_eq!(html::to_html(&reparsed), serialized);
});
