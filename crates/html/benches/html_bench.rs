use criterion::{Criterion, black_box, criterion_group, criterion_main};
use html::{build_fragment, flatten, parse_fragment, rebuild, to_html, tokenize};

const SMALL_PARAGRAPHS: usize = 16;
const LARGE_PARAGRAPHS: usize = 5_000;

const PARAGRAPH_TEMPLATE: &str = "<p class=\"motion\">Lorem ipsum dolor sit amet, <strong>consetetur <em>sadipscing</em> elitr</strong>, sed diam nonumy eirmod tempor invidunt ut labore et dolore magna aliquyam erat, <span style=\"color: red;\">sed diam voluptua</span>.</p>";
const LIST_TEMPLATE: &str = "<ol start=\"3\"><li>At vero eos et accusam</li><li>et justo duo dolores&nbsp;et ea rebum.</li></ol>";

fn make_motion(paragraphs: usize) -> String {
    let mut html =
        String::with_capacity((PARAGRAPH_TEMPLATE.len() + LIST_TEMPLATE.len()) * paragraphs);
    for i in 0..paragraphs {
        html.push_str(PARAGRAPH_TEMPLATE);
        if i % 4 == 3 {
            html.push_str(LIST_TEMPLATE);
        }
    }
    html
}

fn bench_tokenize_small(c: &mut Criterion) {
    let input = make_motion(SMALL_PARAGRAPHS);
    c.bench_function("bench_tokenize_small", |b| {
        b.iter(|| {
            let stream = tokenize(black_box(&input));
            black_box(stream.tokens().len());
        });
    });
}

fn bench_tokenize_large(c: &mut Criterion) {
    let input = make_motion(LARGE_PARAGRAPHS);
    c.bench_function("bench_tokenize_large", |b| {
        b.iter(|| {
            let stream = tokenize(black_box(&input));
            black_box(stream.tokens().len());
        });
    });
}

fn bench_fragment_build_large(c: &mut Criterion) {
    let input = make_motion(LARGE_PARAGRAPHS);
    let stream = tokenize(&input);
    c.bench_function("bench_fragment_build_large", |b| {
        b.iter(|| {
            let root = build_fragment(black_box(&stream)).expect("bench input is well-formed");
            black_box(root);
        });
    });
}

fn bench_parse_serialize_large(c: &mut Criterion) {
    let input = make_motion(LARGE_PARAGRAPHS);
    c.bench_function("bench_parse_serialize_large", |b| {
        b.iter(|| {
            let root = parse_fragment(black_box(&input)).expect("bench input is well-formed");
            black_box(to_html(&root).len());
        });
    });
}

fn bench_flatten_rebuild_large(c: &mut Criterion) {
    let input = make_motion(LARGE_PARAGRAPHS);
    let root = parse_fragment(&input).expect("bench input is well-formed");
    c.bench_function("bench_flatten_rebuild_large", |b| {
        b.iter(|| {
            let events = flatten(black_box(root.clone()).into_children(), |_| false);
            let nodes = rebuild(events).expect("balanced");
            black_box(nodes.len());
        });
    });
}

criterion_group!(
    benches,
    bench_tokenize_small,
    bench_tokenize_large,
    bench_fragment_build_large,
    bench_parse_serialize_large,
    bench_flatten_rebuild_large
);
criterion_main!(benches);
