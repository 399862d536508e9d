//! Benchmarks for layer walking.
//!
//! Measures raw walk throughput, the cost of content materialization and the
//! effect of skip pruning.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::hint::black_box;
use std::io::Read;

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use layerscan_core::LayerWalker;
use layerscan_core::WalkConfig;
use layerscan_core::inspect_reader;
use layerscan_core::NoopProgress;
use layerscan_core::test_utils;
use layerscan_core::test_utils::TarTestBuilder;

/// Creates a layer with many small files spread over a few directories.
fn create_many_small_files_layer(file_count: usize) -> Vec<u8> {
    let mut builder = TarTestBuilder::new();
    for dir in 0..10 {
        builder = builder.add_directory(&format!("usr/lib/d{dir}/"));
    }
    for i in 0..file_count {
        builder = builder.add_file(&format!("usr/lib/d{}/file{i:05}.so", i % 10), format!("content{i}").as_bytes());
    }
    builder.build()
}

/// Creates a layer with a single large file.
fn create_large_file_layer(size_bytes: usize) -> Vec<u8> {
    TarTestBuilder::new()
        .add_file("var/lib/large.bin", &vec![0xAB_u8; size_bytes])
        .build()
}

/// Creates a layer where most entries sit below a skipped directory.
fn create_node_modules_layer(file_count: usize) -> Vec<u8> {
    let mut builder = TarTestBuilder::new()
        .add_directory("app/")
        .add_directory("app/node_modules/");
    for i in 0..file_count {
        builder = builder.add_file(&format!("app/node_modules/pkg{i}/index.js"), b"module.exports = {}");
    }
    builder.add_file("app/main.js", b"require('pkg0')").build()
}

fn benchmark_walk_without_content(c: &mut Criterion) {
    let mut group = c.benchmark_group("walk_without_content");

    for file_count in [100, 1000, 10000] {
        let layer = create_many_small_files_layer(file_count);
        group.throughput(Throughput::Elements(file_count as u64));

        group.bench_with_input(BenchmarkId::from_parameter(file_count), &layer, |b, data| {
            let walker = LayerWalker::new(&WalkConfig::default());
            b.iter(|| {
                let mut count = 0usize;
                walker
                    .walk(data.as_slice(), |_, _, _| {
                        count += 1;
                        Ok(())
                    })
                    .unwrap();
                black_box(count)
            });
        });
    }

    group.finish();
}

fn benchmark_walk_with_content(c: &mut Criterion) {
    let mut group = c.benchmark_group("walk_with_content");

    for size_bytes in [64 * 1024, 1024 * 1024, 16 * 1024 * 1024] {
        let layer = create_large_file_layer(size_bytes);
        group.throughput(Throughput::Bytes(size_bytes as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size_bytes), &layer, |b, data| {
            let walker = LayerWalker::new(&WalkConfig::default());
            b.iter(|| {
                let mut total = 0usize;
                walker
                    .walk(data.as_slice(), |_, _, accessor| {
                        let (mut reader, release) = accessor.open()?;
                        let mut buf = Vec::new();
                        total += reader.read_to_end(&mut buf)?;
                        release.release()?;
                        Ok(())
                    })
                    .unwrap();
                black_box(total)
            });
        });
    }

    group.finish();
}

fn benchmark_skip_pruning(c: &mut Criterion) {
    let layer = create_node_modules_layer(5000);
    let config = WalkConfig::default().with_skip_dirs(vec!["app/node_modules".to_string()]);
    let walker = LayerWalker::new(&config);

    c.bench_function("skip_pruning_5000", |b| {
        b.iter(|| {
            walker
                .walk(layer.as_slice(), |path, _, _| {
                    black_box(path);
                    Ok(())
                })
                .unwrap()
        });
    });
}

fn benchmark_inspect_gzip(c: &mut Criterion) {
    let layer = create_many_small_files_layer(1000);
    let compressed = test_utils::gzip(&layer);
    let mut group = c.benchmark_group("inspect");
    group.throughput(Throughput::Bytes(layer.len() as u64));

    group.bench_function("gzip_1000", |b| {
        b.iter(|| {
            let (_, decoded) = layerscan_core::formats::decode_layer(compressed.as_slice()).unwrap();
            inspect_reader(decoded, &WalkConfig::default(), &mut NoopProgress).unwrap()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_walk_without_content,
    benchmark_walk_with_content,
    benchmark_skip_pruning,
    benchmark_inspect_gzip
);
criterion_main!(benches);
