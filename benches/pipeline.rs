use std::io;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tinylang::{analyze, codegen, config, machine, parser, scanner};

const WORKLOADS: [(&str, &str); 2] = [
    ("countdown", "tests/programs/loop.tny"),
    ("factorial", "tests/programs/factorial.tny"),
];

fn bench_pipeline(c: &mut Criterion) {
    let reserved = config::default_reserved();

    for (label, path) in WORKLOADS {
        let source =
            std::fs::read_to_string(path).unwrap_or_else(|err| panic!("read {path}: {err}"));
        let tokens = scanner::tokenize(&source, &reserved);
        let program = parser::parse_tokens(tokens.clone()).expect("parse");
        let symtab = analyze::build_symtab(&program);
        let listing = codegen::generate(&program, &symtab);
        // factorial reads one integer; countdown ignores the feed.
        let input = b"12\n";

        c.bench_function(&format!("pipeline_tokenize_{label}"), |b| {
            b.iter(|| {
                let out = scanner::tokenize(black_box(&source), black_box(&reserved));
                black_box(out);
            })
        });

        c.bench_function(&format!("pipeline_parse_only_{label}"), |b| {
            b.iter(|| {
                let out = parser::parse_tokens(black_box(tokens.clone())).expect("parse");
                black_box(out);
            })
        });

        c.bench_function(&format!("pipeline_compile_{label}"), |b| {
            b.iter(|| {
                let tokens = scanner::tokenize(black_box(&source), &reserved);
                let program = parser::parse_tokens(tokens).expect("parse");
                analyze::type_check(&program).expect("type check");
                let symtab = analyze::build_symtab(&program);
                let out = codegen::generate(&program, &symtab);
                black_box(out);
            })
        });

        c.bench_function(&format!("pipeline_load_and_run_{label}"), |b| {
            b.iter(|| {
                let mut machine =
                    machine::Machine::load(black_box(&listing)).expect("load");
                machine.run(&input[..], io::sink()).expect("run");
            })
        });
    }
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
