use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use html::{build_document, parse_document, to_html, tokenize};

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 20_000;

const BLOCK_TEMPLATE: &str =
    "<div class=\"box card\" data-id=\"7\"><h2 class=\"title\">hello</h2><img src=x></div>\n";

fn make_blocks(blocks: usize) -> String {
    let mut html = String::with_capacity(BLOCK_TEMPLATE.len() * blocks + 64);
    html.push_str("<!DOCTYPE html><html><body>\n");
    for _ in 0..blocks {
        html.push_str(BLOCK_TEMPLATE);
    }
    html.push_str("</body></html>");
    html
}

fn make_rawtext_adversarial(bytes: usize) -> String {
    let mut body = String::with_capacity(bytes + 32);
    body.push_str("<script>");
    while body.len() < bytes {
        body.push_str("</scri<pt");
    }
    body.push_str("</script>");
    body
}

fn bench_tokenize_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("bench_tokenize_small", |b| {
        b.iter(|| black_box(tokenize(black_box(&input)).len()));
    });
}

fn bench_tokenize_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_tokenize_large", |b| {
        b.iter(|| black_box(tokenize(black_box(&input)).len()));
    });
}

fn bench_tree_build_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    let tokens = tokenize(&input);
    c.bench_function("bench_tree_build_large", |b| {
        b.iter_batched(
            || tokens.clone(),
            |tokens| black_box(build_document(tokens)),
            BatchSize::LargeInput,
        );
    });
}

fn bench_parse_serialize_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_parse_serialize_large", |b| {
        b.iter(|| {
            let doc = parse_document(black_box(&input));
            black_box(to_html(&doc).len());
        });
    });
}

fn bench_tokenize_rawtext_adversarial(c: &mut Criterion) {
    let input = make_rawtext_adversarial(512 * 1024);
    c.bench_function("bench_tokenize_rawtext_adversarial", |b| {
        b.iter(|| black_box(tokenize(black_box(&input)).len()));
    });
}

criterion_group!(
    benches,
    bench_tokenize_small,
    bench_tokenize_large,
    bench_tree_build_large,
    bench_parse_serialize_large,
    bench_tokenize_rawtext_adversarial
);
criterion_main!(benches);
