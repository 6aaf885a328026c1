use collector::{CollectorConfig, collect};
use core_types::Frame;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use html::parse_document;
use recorder::Recorder;

const ROWS: usize = 5_000;

// A table rendered through the recorder: one outer mark, one nested mark per row.
fn render_table(rows: usize) -> String {
    let mut rec = Recorder::new();
    let table = rec.begin_mark(Some(&[Frame::new("table.rs", 1)]), &["<table>"]);
    rec.write(&table.text);
    for i in 0..rows {
        let frame = Frame::new("row.rs", (i % 50) as u32 + 1);
        rec.mark_chunk(&[frame], &format!("<tr><td>{i}</td></tr>"));
    }
    rec.write("</table>");
    if let Err(err) = rec.end_mark(table.id) {
        panic!("table mark should close: {err}");
    }
    rec.finish()
}

fn bench_collect(c: &mut Criterion) {
    let dom = parse_document(&render_table(ROWS));
    let config = CollectorConfig::default();
    c.bench_function("bench_collect", |b| {
        b.iter(|| black_box(collect(black_box(&dom), &config).mapping_count()));
    });
}

fn bench_nearest_mapping(c: &mut Criterion) {
    let dom = parse_document(&render_table(ROWS));
    let map = collect(&dom, &CollectorConfig::default());
    let cells: Vec<_> = dom
        .descendants(dom.root())
        .filter(|&n| dom.element_name(n) == Some("td"))
        .collect();
    c.bench_function("bench_nearest_mapping", |b| {
        b.iter(|| {
            for &cell in &cells {
                black_box(map.nearest_mapping(&dom, cell));
            }
        });
    });
}

fn bench_forest(c: &mut Criterion) {
    let dom = parse_document(&render_table(ROWS));
    let map = collect(&dom, &CollectorConfig::default());
    c.bench_function("bench_forest", |b| {
        b.iter(|| black_box(map.forest(&dom).len()));
    });
}

criterion_group!(benches, bench_collect, bench_nearest_mapping, bench_forest);
criterion_main!(benches);
