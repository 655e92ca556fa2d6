use std::path::Path;

use html::dom_utils::text_content;
use html::{Node, parse_fragment, to_html};
use linenumbering::{
    ChangeRecommendation, ConfigError, DiffError, LineNumbering, LineNumberingConfig, LineRange,
    ListContext, ListTag, MergeConflict, apply_recommendations, build_diff,
    check_conflicts, get_range, get_range_html, join_paragraphs, line_anchors,
    line_break_marker, line_number_marker, markers::marker_kind, number_lines, renumber,
    split_html, strip_line_numbers,
};

fn range(from: u32, to: u32) -> LineRange {
    LineRange::new(from, to).expect("ordered")
}

fn rec(from: u32, to: u32, html: &str) -> ChangeRecommendation {
    ChangeRecommendation::from_html(range(from, to), html).expect("replacement")
}

fn num(line: u32) -> String {
    to_html(&line_number_marker(line))
}

fn wrap(line: u32) -> String {
    format!("{}{}", to_html(&line_break_marker()), num(line))
}

const MOTION: &str = concat!(
    r#"<p class="intro" style="font-weight: bold;">Lorem ipsum dolor sit amet, "#,
    r#"<strong>consetetur <em>sadipscing</em> elitr</strong>, sed diam nonumy eirmod "#,
    r#"tempor invidunt ut <a href="https://example.org">labore et dolore</a> magna.</p>"#,
    r#"<div><p>At vero eos et accusam</p><p>et justo duo dolores</p></div>"#,
    r#"<ol start="2"><li>first</li><li>second <span style="color: blue;">item</span></li></ol>"#,
);

#[test]
fn split_and_join_keeps_blocks_and_inline_content() {
    let html = r#"<p class="a" style="color: red;">Lorem <em>ipsum</em></p><div><p>x</p><p>y</p></div><h2>Title</h2>"#;
    let units = split_html(html).expect("well-formed");
    assert_eq!(units.len(), 3);
    assert_eq!(to_html(&join_paragraphs(units)), html);
}

#[test]
fn split_and_join_lists_only_loses_grouping() {
    let units = split_html(MOTION).expect("well-formed");
    let joined = join_paragraphs(units);
    let original = parse_fragment(MOTION).expect("well-formed");
    assert_eq!(text_content(&joined), text_content(&original));
    let items = joined
        .children()
        .iter()
        .filter(|n| n.is_element_named("ol"))
        .count();
    assert_eq!(items, 2);
}

#[test]
fn join_orders_by_ordinal() {
    let mut units = split_html("<p>a</p><p>b</p><p>c</p>").expect("well-formed");
    units.reverse();
    assert_eq!(to_html(&join_paragraphs(units)), "<p>a</p><p>b</p><p>c</p>");
}

#[test]
fn third_item_of_ordered_list_starts_at_three() {
    let units = split_html("<ol><li>A</li><li>B</li><li>C</li></ol>").expect("well-formed");
    assert_eq!(
        units[2].list_context,
        Some(ListContext {
            tag: ListTag::Ol,
            start: Some(3)
        })
    );
    assert_eq!(units[2].to_html(), r#"<ol start="3"><li>C</li></ol>"#);
    assert_eq!(units[0].list_context.as_ref().and_then(|c| c.start), None);
}

#[test]
fn numbering_twice_gives_the_same_anchors() {
    for max in [8, 20, 40, 85] {
        let mut line = 1;
        for unit in split_html(MOTION).expect("well-formed") {
            let once = number_lines(unit, line, max).expect("numbered");
            let twice = number_lines(once.unit.clone(), line, max).expect("numbered");
            assert_eq!(line_anchors(&once.unit), line_anchors(&twice.unit), "max {max}");
            assert_eq!(once.next_line, twice.next_line);
            line = once.next_line;
        }
    }
}

#[test]
fn numbering_keeps_text_and_attributes() {
    let doc = LineNumbering::new(LineNumberingConfig {
        max_line_length: 12,
        ..LineNumberingConfig::default()
    })
    .number_html(MOTION)
    .expect("numbered");
    let html = doc.to_html();
    assert!(html.starts_with(&format!(
        r#"<p class="intro" style="font-weight: bold;">{}Lorem ipsum "#,
        num(1)
    )));
    assert!(html.contains(r#"<a href="https://example.org">"#), "{html}");
    let stripped = strip_line_numbers(parse_fragment(&html).expect("numbered html"))
        .expect("stripped");
    let original = join_paragraphs(split_html(MOTION).expect("well-formed"));
    assert_eq!(text_content(&stripped), text_content(&original));
}

#[test]
fn inline_split_preserves_text_at_every_width() {
    let html = "<p>a <em>bb <strong>ccc dddd</strong> ee</em> f <span>gg hhh</span></p>";
    let original = text_content(&parse_fragment(html).expect("well-formed"));
    for max in 1..=original.chars().count() {
        let unit = split_html(html).expect("well-formed").remove(0);
        let numbered = renumber(unit, 1, max).expect("numbered");
        for child in numbered.unit.node.children() {
            assert!(
                !contains_marker(child),
                "marker nested in inline element at max {max}: {}",
                numbered.unit.to_html()
            );
        }
        let stripped = strip_line_numbers(numbered.unit.node).expect("stripped");
        assert_eq!(text_content(&stripped), original, "max {max}");
    }
}

fn contains_marker(node: &Node) -> bool {
    node.children()
        .iter()
        .any(|c| marker_kind(c).is_some() || contains_marker(c))
}

#[test]
fn numbered_lines_four_to_nine() {
    let unit = split_html("<p>aaaa bbbb cccc dddd eeee ffff</p>")
        .expect("well-formed")
        .remove(0);
    let numbered = renumber(unit, 4, 5).expect("numbered");
    assert_eq!(get_range(&numbered.unit.node), Ok(range(4, 9)));
    assert_eq!(numbered.next_line, 10);
}

#[test]
fn worked_example_range() {
    let html = format!(
        "<p>{}et accusam et justo duo dolores et ea <strike>rebum</strike> Inserted Text. Stet clita kasd {}gubergren,</p>",
        num(2),
        wrap(3)
    );
    assert_eq!(get_range_html(&html).expect("numbered"), range(2, 3));
}

#[test]
fn overlapping_recommendations_conflict() {
    let a = rec(2, 5, "x");
    let b = rec(4, 6, "y");
    assert_eq!(
        check_conflicts(vec![a.clone(), b.clone()]),
        Err(MergeConflict { a, b })
    );
}

#[test]
fn merge_conflict_is_never_merged_silently() {
    let unit = split_html("<p>aaaa bbbb cccc dddd eeee ffff</p>")
        .expect("well-formed")
        .remove(0);
    let unit = renumber(unit, 1, 5).expect("numbered").unit;
    let recs = vec![rec(2, 5, "x"), rec(4, 6, "y")];
    assert!(matches!(
        build_diff(unit.clone(), recs.clone(), &Default::default()),
        Err(DiffError::Conflict(_))
    ));
    assert!(matches!(
        apply_recommendations(unit, recs, 5),
        Err(DiffError::Conflict(_))
    ));
}

#[test]
fn replacing_three_lines_with_one_shifts_the_rest_by_two() {
    let doc = LineNumbering::new(LineNumberingConfig {
        max_line_length: 5,
        ..LineNumberingConfig::default()
    })
    .number_html("<p>aaaa bbbb cccc dddd eeee ffff</p><p>gggg</p><p>hhhh</p>")
    .expect("numbered");
    assert_eq!(doc.next_line(), 9);
    let merged = doc.apply(vec![rec(2, 4, "zz ")]).expect("merge");
    assert_eq!(
        merged.units()[0].to_html(),
        format!("<p>{}aaaa {}zz {}eeee {}ffff</p>", num(1), wrap(2), wrap(3), wrap(4))
    );
    assert_eq!(merged.units()[1].to_html(), format!("<p>{}gggg</p>", num(5)));
    assert_eq!(merged.units()[2].to_html(), format!("<p>{}hhhh</p>", num(6)));
    assert_eq!(merged.next_line(), 7);
}

#[test]
fn line_range_deserializes_only_when_ordered() {
    let ok: LineRange = serde_json::from_str(r#"{"from": 3, "to": 5}"#).expect("ordered");
    assert_eq!(ok, range(3, 5));
    assert!(serde_json::from_str::<LineRange>(r#"{"from": 5, "to": 3}"#).is_err());
    assert_eq!(serde_json::to_string(&ok).expect("serialize"), r#"{"from":3,"to":5}"#);
}

#[test]
fn meeting_config_loads_from_file() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("meeting.toml");
    let config = LineNumberingConfig::load(&path).expect("valid config");
    assert_eq!(config.max_line_length, 60);
    assert_eq!(config.markup.deletion.tag, "span");
    assert_eq!(config.markup.insertion.color.as_deref(), Some("green"));
}

#[test]
fn missing_config_file_is_an_io_error() {
    let err = LineNumberingConfig::load(Path::new("does/not/exist.toml")).expect_err("missing");
    assert!(matches!(err, ConfigError::Io { .. }), "{err}");
}
