use criterion::{Criterion, black_box, criterion_group, criterion_main};
use engine::{ContextConfig, Fragment, Locator, Resources, collect_context};
use html::parse_document;

const CARDS: usize = 5_000;

fn make_page(cards: usize) -> String {
    let mut html = String::with_capacity(cards * 96 + 256);
    html.push_str("<!DOCTYPE html><html><head><style>");
    for i in (0..cards).step_by(50) {
        html.push_str(&format!(".card-{i} {{ color: red; }}\n"));
    }
    html.push_str("</style></head><body><main>\n");
    for i in 0..cards {
        html.push_str(&format!(
            "<div class=\"card card-{i}\" data-idx=\"{i}\"><h2>title {i}</h2><p>body</p></div>\n"
        ));
    }
    html.push_str("</main></body></html>");
    html
}

fn bench_locate_by_tier(c: &mut Criterion) {
    let doc = parse_document(&make_page(CARDS));
    let locator = Locator::default();
    let last = CARDS - 1;
    let cases = [
        ("data_attributes", format!("<div data-idx=\"{last}\">x</div>")),
        ("class_set", format!("<div class=\"card-{last} card\">x</div>")),
        ("serialization", format!("<h2>title {last}</h2>")),
    ];
    for (name, fragment) in cases {
        let fragment = Fragment::parse(&fragment).unwrap();
        c.bench_function(&format!("bench_locate_{name}"), |b| {
            b.iter(|| black_box(locator.locate(black_box(&doc), &fragment).is_ok()));
        });
    }
}

fn bench_collect_context(c: &mut Criterion) {
    let doc = parse_document(&make_page(CARDS));
    let fragment = Fragment::parse("<div class=\"card card-2500\" data-idx=\"2500\"></div>").unwrap();
    let found = Locator::default().locate(&doc, &fragment).unwrap();
    let resources = Resources::new();
    let config = ContextConfig::default();
    c.bench_function("bench_collect_context", |b| {
        b.iter(|| black_box(collect_context(&doc, found.node, &resources, &config)));
    });
}

criterion_group!(benches, bench_locate_by_tier, bench_collect_context);
criterion_main!(benches);
