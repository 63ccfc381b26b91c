//! Version matching and parsing performance benchmarks
//!
//! Benchmarks version and range parsing, compatibility checks, manifest
//! header parsing and platform description loading.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use osgi_benchmarks::{criterion_config, synthetic_features, synthetic_platform, version_strings};
use osgi_config::PlatformDescription;
use osgi_core::{
    compare_versions, is_compatible_version, HeaderKind, ManifestEntry, Version, VersionRange,
};

fn bench_version_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("version_parsing");
    let inputs = version_strings(1000);

    group.throughput(Throughput::Elements(inputs.len() as u64));
    group.bench_function("versions_and_ranges", |b| {
        b.iter(|| {
            inputs
                .iter()
                .filter(|input| Version::parse(input).is_ok() || VersionRange::parse(input).is_ok())
                .count()
        });
    });

    group.finish();
}

fn bench_version_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("version_matching");
    let requirements = version_strings(200);
    let given: Vec<String> = (0..50).map(|i| format!("{}.{}.{}", i % 6, i % 9, i)).collect();

    group.throughput(Throughput::Elements((requirements.len() * given.len()) as u64));
    group.bench_function("is_compatible_version", |b| {
        b.iter(|| {
            let mut matches = 0usize;
            for requirement in &requirements {
                for version in &given {
                    if is_compatible_version(requirement, version) {
                        matches += 1;
                    }
                }
            }
            black_box(matches)
        });
    });

    group.bench_function("compare_versions", |b| {
        b.iter(|| {
            given
                .windows(2)
                .filter_map(|pair| compare_versions(&pair[0], &pair[1]).ok())
                .count()
        });
    });

    group.finish();
}

fn bench_manifest_headers(c: &mut Criterion) {
    let mut group = c.benchmark_group("manifest_headers");

    for clauses in [10, 100, 500] {
        let header: Vec<String> = (0..clauses)
            .map(|i| match i % 3 {
                0 => format!("org.bench.p{};bundle-version=\"[1.0.0,2.0.0)\"", i),
                1 => format!("org.bench.p{};resolution:=optional;visibility:=reexport", i),
                _ => format!("org.bench.p{}", i),
            })
            .collect();
        let header = header.join(",");
        group.throughput(Throughput::Elements(clauses as u64));

        group.bench_with_input(BenchmarkId::new("require_bundle", clauses), &header, |b, header| {
            b.iter(|| black_box(ManifestEntry::parse_header(HeaderKind::RequireBundle, header)))
        });
    }

    group.finish();
}

fn bench_platform_description(c: &mut Criterion) {
    let mut group = c.benchmark_group("platform_description");

    for size in [100, 1000] {
        let description = PlatformDescription {
            plugins: synthetic_platform(size, false),
            features: synthetic_features(size),
        };
        let Ok(json) = serde_json::to_string(&description) else {
            continue;
        };
        group.throughput(Throughput::Bytes(json.len() as u64));

        group.bench_with_input(BenchmarkId::new("json", size), &json, |b, json| {
            b.iter(|| black_box(PlatformDescription::parse_json(json, "platform.json")))
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_version_parsing, bench_version_matching, bench_manifest_headers, bench_platform_description
}
criterion_main!(benches);
