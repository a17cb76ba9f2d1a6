//! 설정 컴파일 벤치마크
//!
//! 파이프라인 수에 따른 백엔드별 컴파일 시간을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use opsforge_confgen::{CompileOptions, UnifiedConfig, generate};
use opsforge_core::{Backend, PlatformFacts};

/// 파이프라인 `count`개짜리 설정 (파이프라인마다 files 리시버 + 파서 2개)
fn config_with_pipelines(count: usize) -> String {
    let mut yaml = String::from(
        "logging:\n  processors:\n    json:\n      type: parse_json\n    java:\n      type: parse_multiline\n      match_any:\n        - type: language_exceptions\n          language: java\n  receivers:\n",
    );
    for i in 0..count {
        yaml.push_str(&format!(
            "    r{i}:\n      type: files\n      include_paths: [/var/log/app{i}/*.log]\n"
        ));
    }
    yaml.push_str("  service:\n    pipelines:\n");
    for i in 0..count {
        yaml.push_str(&format!(
            "      p{i}:\n        receivers: [r{i}]\n        processors: [java, json]\n"
        ));
    }
    yaml.push_str(
        "metrics:\n  receivers:\n    hostmetrics:\n      type: hostmetrics\n  service:\n    pipelines:\n      default:\n        receivers: [hostmetrics]\n",
    );
    yaml
}

fn bench_parse(c: &mut Criterion) {
    let yaml = config_with_pipelines(50);

    c.bench_function("parse_50_pipelines", |b| {
        b.iter(|| UnifiedConfig::parse(black_box(&yaml)).unwrap())
    });
}

fn bench_generate(c: &mut Criterion) {
    let platform = PlatformFacts::for_tests();
    let options = CompileOptions::default();

    let mut group = c.benchmark_group("generate");
    for count in [1, 10, 100] {
        let config = UnifiedConfig::parse(&config_with_pipelines(count)).unwrap();
        group.throughput(Throughput::Elements(count as u64));

        for backend in [Backend::FluentBit, Backend::Otel] {
            group.bench_with_input(
                BenchmarkId::new(backend.to_string(), count),
                &config,
                |b, config| {
                    b.iter(|| generate(black_box(config), backend, &platform, &options).unwrap())
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_generate);
criterion_main!(benches);
