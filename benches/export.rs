//! Benchmarks for the pure export stages.

use std::fmt::Write;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mermaid_export::export::{ExportOptions, normalize};
use mermaid_export::geometry::BBox;
use mermaid_export::svg::{parse_document, serialize};

fn flowchart(nodes: usize) -> String {
    let mut markup = String::from(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="100%" viewBox="0 0 800 600">"#,
    );
    for i in 0..nodes {
        let _ = write!(
            markup,
            r#"<g class="node" id="n{i}"><rect x="{x}" y="{y}" width="80" height="40"/><text x="{x}" y="{y}">Node {i}</text></g>"#,
            x = (i % 10) * 90,
            y = (i / 10) * 60,
        );
    }
    markup.push_str("</svg>");
    markup
}

fn bench_parse(c: &mut Criterion) {
    let markup = flowchart(200);
    c.bench_function("parse_flowchart", |b| {
        b.iter(|| parse_document(black_box(&markup)).unwrap())
    });
}

fn bench_normalize(c: &mut Criterion) {
    let svg = parse_document(&flowchart(200)).unwrap();
    let options = ExportOptions::default();
    let bounds = Some(BBox::new(0.0, 0.0, 890.0, 1220.0));
    c.bench_function("normalize_flowchart", |b| {
        b.iter(|| normalize(black_box(&svg), bounds, &options))
    });
}

fn bench_serialize(c: &mut Criterion) {
    let svg = parse_document(&flowchart(200)).unwrap();
    c.bench_function("serialize_flowchart", |b| b.iter(|| serialize(black_box(&svg))));
}

criterion_group!(benches, bench_parse, bench_normalize, bench_serialize);
criterion_main!(benches);
