//! Benchmarks for the playground runners.
//!
//! Run with: cargo bench
//!
//! The embedded Python groups require rustpython.wasm at assets/rustpython.wasm
//! and are skipped without it.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;
use tokio::runtime::Runtime;

use code_playground_rs::prelude::*;
use code_playground_rs::{ExecuteResponse, InterpreterConfig, JavaScriptRunner, WasmInterpreter};

fn interpreter_config() -> Option<InterpreterConfig> {
    let path = std::path::Path::new("assets/rustpython.wasm");
    path.exists().then(|| InterpreterConfig {
        index_url: path.display().to_string(),
        timeout: Duration::from_secs(30),
        max_memory: 64 * 1024 * 1024,
        ..InterpreterConfig::default()
    })
}

/// A fresh QuickJS engine per run, so this includes engine startup.
fn bench_javascript(c: &mut Criterion) {
    let runner = JavaScriptRunner::default();
    let mut group = c.benchmark_group("javascript");

    group.bench_function("return_value", |b| {
        b.iter(|| black_box(runner.run_blocking("return 6 * 7;")));
    });

    group.bench_function("console_log", |b| {
        b.iter(|| black_box(runner.run_blocking("console.log('a', 1); console.warn('b');")));
    });

    for lines in [1, 10, 100] {
        group.throughput(Throughput::Elements(lines));
        group.bench_with_input(BenchmarkId::new("log_lines", lines), &lines, |b, &lines| {
            let code = format!("for (let i = 0; i < {lines}; i++) console.log('line', i);");
            b.iter(|| black_box(runner.run_blocking(&code)));
        });
    }

    group.bench_function("thrown_error", |b| {
        b.iter(|| black_box(runner.run_blocking("throw new Error('boom');")));
    });

    group.finish();
}

fn bench_response_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("remote_response");

    let small = r#"{"output": "42\n"}"#;
    let large = serde_json::json!({ "output": "x".repeat(64 * 1024), "error": "" }).to_string();

    group.bench_function("small", |b| {
        b.iter(|| black_box(ExecuteResponse::parse(black_box(small.as_bytes())).unwrap().display_text()));
    });
    group.throughput(Throughput::Bytes(large.len() as u64));
    group.bench_function("64k_output", |b| {
        b.iter(|| black_box(ExecuteResponse::parse(black_box(large.as_bytes())).unwrap().display_text()));
    });

    group.finish();
}

/// Interpreter compilation, the cost paid once on mount.
fn bench_python_load(c: &mut Criterion) {
    let Some(config) = interpreter_config() else {
        eprintln!("Skipping python_load benchmark: rustpython.wasm not found");
        return;
    };

    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("python_load");
    group.sample_size(10);

    group.bench_function("compile_interpreter", |b| {
        b.iter(|| black_box(rt.block_on(WasmInterpreter::load(config.clone())).unwrap()));
    });

    group.finish();
}

fn bench_python_execution(c: &mut Criterion) {
    let Some(config) = interpreter_config() else {
        eprintln!("Skipping python_execution benchmark: rustpython.wasm not found");
        return;
    };

    let rt = Runtime::new().unwrap();
    let interpreter = rt.block_on(WasmInterpreter::load(config.clone())).unwrap();

    let mut group = c.benchmark_group("python_execution");

    group.bench_function("simple_print", |b| {
        b.iter(|| black_box(rt.block_on(interpreter.execute("print(1 + 1)")).unwrap()));
    });

    group.bench_function("loop_100", |b| {
        b.iter(|| {
            let result = rt
                .block_on(interpreter.execute("total = 0\nfor i in range(100): total += i\nprint(total)"))
                .unwrap();
            black_box(result)
        });
    });

    // Through the playground, including output streaming.
    let playground_config = PlaygroundConfig::builder()
        .python_mode(PythonMode::Embedded)
        .index_url(config.index_url.clone())
        .build();
    let playground = Playground::from_config(&playground_config).unwrap();
    rt.block_on(playground.mount());

    group.bench_function("playground_run", |b| {
        b.iter(|| black_box(rt.block_on(playground.run(Language::Python, "print('hi')"))));
    });

    group.finish();
}

fn bench_memory_limits(c: &mut Criterion) {
    let Some(config) = interpreter_config() else {
        eprintln!("Skipping memory_limits benchmark: rustpython.wasm not found");
        return;
    };

    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("memory_limits");
    group.sample_size(10);

    for memory_mb in [32u64, 64, 128] {
        group.bench_with_input(
            BenchmarkId::new("allocation", format!("{memory_mb}MB")),
            &memory_mb,
            |b, &memory_mb| {
                let config = InterpreterConfig {
                    max_memory: memory_mb * 1024 * 1024,
                    ..config.clone()
                };
                let interpreter = rt.block_on(WasmInterpreter::load(config)).unwrap();

                b.iter(|| {
                    let result = rt
                        .block_on(interpreter.execute("data = [i for i in range(10000)]\nprint(len(data))"))
                        .unwrap();
                    black_box(result)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_javascript,
    bench_response_parsing,
    bench_python_load,
    bench_python_execution,
    bench_memory_limits,
);

criterion_main!(benches);
