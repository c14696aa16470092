use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use toolsift_core::ToolLoader;
use toolsift_test_utils::catalog::synthetic_catalog;
use toolsift_test_utils::config::TestConfigBuilder;

fn loader_with(n: usize) -> ToolLoader {
    let config = TestConfigBuilder::new()
        .essential_tools(&["search_tools"])
        .build_selector();
    let loader = ToolLoader::new(config).unwrap();
    loader.register_tools(synthetic_catalog(n)).unwrap();
    loader
}

fn bench_uncached_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("uncached_search");

    for size in [100, 500, 2000] {
        let loader = loader_with(size);
        let options = loader.default_options();
        // Build corpus stats once, outside the measurement.
        loader.load("warm up", options).unwrap();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| loader.load(black_box("export invoice"), options).unwrap());
        });
    }

    group.finish();
}

fn bench_cached_search(c: &mut Criterion) {
    let loader = loader_with(500);
    loader.search("export invoice", 15, 4000).unwrap();

    c.bench_function("cached_search_500", |b| {
        b.iter(|| loader.search(black_box("export invoice"), 15, 4000).unwrap());
    });
}

fn bench_registration(c: &mut Criterion) {
    let catalog = synthetic_catalog(500);

    c.bench_function("register_500_then_search", |b| {
        b.iter(|| {
            let loader = ToolLoader::new(TestConfigBuilder::new().build_selector()).unwrap();
            loader.register_tools(catalog.clone()).unwrap();
            loader.search(black_box("sync calendar"), 15, 4000).unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_uncached_search,
    bench_cached_search,
    bench_registration
);
criterion_main!(benches);
