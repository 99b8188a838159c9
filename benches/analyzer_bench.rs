use criterion::{black_box, criterion_group, criterion_main, Criterion};

use jack::compiler;

fn generated_class(subroutines: usize) -> Vec<String> {
    let mut lines = vec!["class Bench {".to_string(), "field int x, y;".to_string()];
    for i in 0..subroutines {
        lines.push(format!("method int step{i}(int a, int b) {{"));
        lines.push("var int t;".to_string());
        lines.push("let t = (a + b) * x - (y / 2);".to_string());
        lines.push("while (t > 0) { let t = t - 1; do Output.printInt(t); }".to_string());
        lines.push(format!("if (~(t = {i})) {{ let x = t; }} else {{ let y = -t; }}"));
        lines.push("return t;".to_string());
        lines.push("}".to_string());
    }
    lines.push("}".to_string());
    lines
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let lines = generated_class(200);
    c.bench_function("compile", |b| {
        b.iter(|| compiler::compile(black_box(lines.as_slice())).unwrap());
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
