use ark::ArkState;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn compile(program: &str) -> (ArkState, serde_json::Value) {
    let state = ArkState::new();
    let json: serde_json::Value = serde_json::from_str(program).unwrap();
    (state, json)
}

pub fn fib_15_recursive(c: &mut Criterion) {
    let program = r#"
        ["let", ["params", "fib"],
            ["seq",
                ["set", ["ref", "fib"],
                    ["fn", ["params", "n"],
                        ["if", ["or", ["=", "n", 0], ["=", "n", 1]],
                            "n",
                            ["+", ["get", "fib", ["-", "n", 1]], ["get", "fib", ["-", "n", 2]]]]]],
                ["get", "fib", 15]]]
    "#;
    let (state, json) = compile(program);
    let compiled = state.compile(&json).unwrap();

    c.bench_function("fib 15", |b| {
        b.iter(|| state.run(black_box(&compiled)))
    });
}

pub fn fact_1_150_iterative(c: &mut Criterion) {
    let program = r#"
        ["let", ["params", "n", "acc"],
            ["seq",
                ["set", ["ref", "n"], 1],
                ["set", ["ref", "acc"], 1],
                ["loop",
                    ["seq",
                        ["if", [">", "n", 150], ["break", "acc"]],
                        ["set", ["ref", "acc"], ["*", "acc", "n"]],
                        ["set", ["ref", "n"], ["+", "n", 1]]]]]]
    "#;
    let (state, json) = compile(program);
    let compiled = state.compile(&json).unwrap();

    c.bench_function("fact 1-150", |b| {
        b.iter(|| state.run(black_box(&compiled)))
    });
}

criterion_group!(benches, fib_15_recursive, fact_1_150_iterative);
criterion_main!(benches);
