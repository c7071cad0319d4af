use criterion::{Criterion, black_box, criterion_group, criterion_main};
use strconcat::analysis::analyze;
use strconcat::cancel::CancellationToken;
use strconcat::model::Reference;
use strconcat::project::{Document, Snapshot};

/// A class with `methods` methods, each concatenating a few values.
fn generate_source(methods: usize) -> String {
    let mut text = String::from("using System;\n\nnamespace Bench\n{\n    class Program\n    {\n");
    for idx in 0..methods {
        text.push_str(&format!(
            "        string M{idx}(int a, double b, long c)\n        {{\n            string s = \"a: \" + a;\n            s += b;\n            return s + \", c: \" + c + (a * 2);\n        }}\n"
        ));
    }
    text.push_str("    }\n}\n");
    text
}

fn benchmark_analyze(c: &mut Criterion) {
    let content = generate_source(200);
    let document = Document::parse("Bench.cs", content.as_str()).unwrap();
    let snapshot = Snapshot::standalone(&Reference::ALL, document.clone());
    let cancel = CancellationToken::new();

    let mut group = c.benchmark_group("group");

    group.bench_function("parse", |b| {
        b.iter(|| Document::parse("Bench.cs", black_box(content.as_str())).unwrap());
    });
    group.bench_function("bind", |b| {
        b.iter(|| Snapshot::standalone(&Reference::ALL, black_box(document.clone())));
    });
    group.bench_function("analyze", |b| {
        b.iter(|| analyze(black_box(&snapshot), &cancel).unwrap());
    });
}

criterion_group!(benches, benchmark_analyze);
criterion_main!(benches);
