use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use web2md_core::{Document, ExtractConfig, Extractor, extract_content, postprocess_html, preprocess_html};

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("../../tests/fixtures/{name}")).unwrap()
}

fn bench_parse(c: &mut Criterion) {
    let minimal = fixture("minimal_article.html");
    let article = fixture("article.html");

    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("minimal", "1KB"), &minimal, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("article", "6KB"), &article, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.finish();
}

fn bench_preprocess(c: &mut Criterion) {
    let html = fixture("article.html");
    let config = Default::default();

    c.bench_function("preprocess", |b| b.iter(|| preprocess_html(black_box(&html), &config)));
}

fn bench_scoring(c: &mut Criterion) {
    let html = fixture("article.html");
    let preprocessed = preprocess_html(&html, &Default::default());
    let doc = Document::parse(&preprocessed).unwrap();
    let config = ExtractConfig::default();

    c.bench_function("scoring_and_selection", |b| {
        b.iter(|| extract_content(black_box(&doc), black_box(&config)))
    });
}

fn bench_postprocess(c: &mut Criterion) {
    let html = fixture("article.html");
    let config = Default::default();

    c.bench_function("postprocess", |b| b.iter(|| postprocess_html(black_box(&html), &config)));
}

fn bench_to_markdown(c: &mut Criterion) {
    let html = fixture("article.html");
    let extractor = Extractor::default();

    c.bench_function("html_to_markdown", |b| {
        b.iter(|| extractor.extract_html(black_box(&html), Some("https://blog.example.com/posts/ownership")))
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_preprocess,
    bench_scoring,
    bench_postprocess,
    bench_to_markdown
);
criterion_main!(benches);
