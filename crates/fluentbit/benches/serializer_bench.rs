//! 직렬화기 벤치마크
//!
//! 파이프라인 수에 따른 파서 중복 제거 + 모듈형 설정 렌더링 처리량을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use opsforge_fluentbit::filters::{identity_filter, parse_chain};
use opsforge_fluentbit::inputs::TailInput;
use opsforge_fluentbit::service::{service, variables};
use opsforge_fluentbit::{Component, ModularConfig, ParserDefinition, ParserRegistry, PipelineTag};

/// 파이프라인 하나당 tail 입력, json 파싱 체인, 식별 필터를 생성합니다.
fn components_for(pipelines: usize) -> Vec<Component> {
    let mut out = vec![service("info")];
    for i in 0..pipelines {
        let tag = PipelineTag::for_instance(&format!("p{i}"), "files", false);
        let tail = TailInput {
            include_paths: vec![format!("/var/log/app{i}/*.log")],
            ..Default::default()
        };
        out.extend(tail.component(&tag));
        let parser = format!("{}.0", tag.base);
        out.extend(parse_chain(&tag.routing, None, &[parser.clone()], false));
        out.push(ParserDefinition::json(parser).component());
        out.push(identity_filter(&tag.routing, &format!("p{i}"), "files", "bench-host"));
    }
    out
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("modular_generate");

    for pipelines in [1usize, 10, 100] {
        let components = components_for(pipelines);
        group.throughput(Throughput::Elements(pipelines as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(pipelines),
            &components,
            |b, components| {
                b.iter(|| {
                    let deduped = ParserRegistry::deduplicate(black_box(components.clone()))
                        .expect("parsers should not collide");
                    ModularConfig::new(variables("/buffers", "/logs"), deduped)
                        .generate()
                        .expect("should render")
                })
            },
        );
    }

    group.finish();
}

fn bench_render_component(c: &mut Criterion) {
    let component = identity_filter("p1.r1", "p1", "r1", "bench-host");
    c.bench_function("component_render", |b| {
        b.iter(|| black_box(&component).render())
    });
}

criterion_group!(benches, bench_generate, bench_render_component);
criterion_main!(benches);
