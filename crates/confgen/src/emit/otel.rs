//! 컬렉터 emitter -- 메트릭 파이프라인과 `backend: otel` 로그 파이프라인
//!
//! 인스턴스마다 리시버 파이프라인(리시버가 여러 개로 분해되면 여러 개)과
//! 그것을 참조하는 처리 파이프라인을 하나씩 만듭니다. 이름은 `{pipeline}_{receiver}`이고
//! 분해된 경우 `_{i}`가 붙습니다.

use std::collections::BTreeMap;

use tracing::debug;

use opsforge_core::error::CompileError;
use opsforge_core::platform::PlatformFacts;
use opsforge_core::types::{ComponentRole, Subagent};
use opsforge_otel::component::{ottl_quote, transform};
use opsforge_otel::{
    self as otel, CONFIG_FILE_NAME, ExporterType, ModularConfig, Pipeline, ReceiverPipeline,
    Signal,
};

use crate::{CompileOptions, OutputFiles};
use crate::emit::missing_capability;
use crate::exporters::otel_exporter;
use crate::model::{LoggingBackend, UnifiedConfig};
use crate::resolver::{LoggingInstance, resolve_logging, resolve_metrics};
use crate::simplifier::expand;

/// 로그 이름을 담는 리소스 속성
pub const LOG_NAME_ATTRIBUTE: &str = "gcp.log_name";

/// 파이프라인 ID를 담는 속성
pub const PIPELINE_ATTRIBUTE: &str = "logging.googleapis.com/labels.pipeline";

/// 리시버 파이프라인 이름 목록
fn receiver_pipeline_names(pipeline_id: &str, receiver_id: &str, count: usize) -> Vec<String> {
    if count == 1 {
        return vec![format!("{pipeline_id}_{receiver_id}")];
    }
    (0..count)
        .map(|i| format!("{pipeline_id}_{receiver_id}_{i}"))
        .collect()
}

/// 로그 레코드에 로그 이름과 파이프라인 ID를 찍는 transform 프로세서
fn identity_transform(instance: &LoggingInstance) -> otel::Component {
    transform(
        "log",
        "log",
        &[
            format!(
                "set(attributes[{}], {})",
                ottl_quote(LOG_NAME_ATTRIBUTE),
                ottl_quote(&instance.receiver_id)
            ),
            format!(
                "set(attributes[{}], {})",
                ottl_quote(PIPELINE_ATTRIBUTE),
                ottl_quote(&instance.pipeline_id)
            ),
        ],
    )
}

/// 그래프 조립 상태
#[derive(Default)]
struct Graph {
    receiver_pipelines: BTreeMap<String, ReceiverPipeline>,
    pipelines: BTreeMap<String, Pipeline>,
    exporter_types: Vec<ExporterType>,
}

impl Graph {
    fn add(
        &mut self,
        subagent: Subagent,
        name: String,
        signal: Signal,
        default_exporter: ExporterType,
        mut rp: ReceiverPipeline,
        processors: Vec<otel::Component>,
    ) -> Result<(), CompileError> {
        if self.pipelines.contains_key(&name) {
            return Err(CompileError::Cardinality {
                subagent,
                rule: format!("collector pipeline name {name:?} must be unique across logging and metrics"),
                found: 2,
            });
        }
        let exporter_type = *rp.exporter_types.entry(signal).or_insert(default_exporter);
        if !self.exporter_types.contains(&exporter_type) {
            self.exporter_types.push(exporter_type);
        }
        self.pipelines.insert(
            name.clone(),
            Pipeline {
                signal,
                receiver_pipeline_name: name.clone(),
                processors,
            },
        );
        self.receiver_pipelines.insert(name, rp);
        Ok(())
    }
}

fn add_metrics(config: &UnifiedConfig, graph: &mut Graph) -> Result<(), CompileError> {
    for instance in resolve_metrics(config)? {
        let rps = instance.receiver.receiver_pipelines();
        let names = receiver_pipeline_names(&instance.pipeline_id, &instance.receiver_id, rps.len());
        let processors: Vec<otel::Component> = instance
            .processors
            .iter()
            .flat_map(|(_, p)| p.processors())
            .collect();
        for (name, rp) in names.into_iter().zip(rps) {
            debug!(pipeline = %name, receiver = %rp.receiver.type_name, "emitted metrics pipeline");
            graph.add(
                Subagent::Metrics,
                name,
                Signal::Metrics,
                instance.exporter_type,
                rp,
                processors.clone(),
            )?;
        }
    }
    Ok(())
}

fn add_logging(config: &UnifiedConfig, graph: &mut Graph) -> Result<(), CompileError> {
    for instance in resolve_logging(config, LoggingBackend::Otel)? {
        // multiline 병합은 컬렉터에 해당 사항이 없으므로 확장만 적용
        let instance = expand(instance);
        let receiver = instance.receiver.as_otel().ok_or_else(|| {
            missing_capability(
                Subagent::Logging,
                ComponentRole::Receiver,
                &instance.receiver_id,
                &instance.pipeline_id,
                "otel",
            )
        })?;

        let mut processors = Vec::new();
        for binding in &instance.processors {
            let processor = binding.processor.as_otel().ok_or_else(|| {
                missing_capability(
                    Subagent::Logging,
                    ComponentRole::Processor,
                    &binding.id,
                    &instance.pipeline_id,
                    "otel",
                )
            })?;
            processors.extend(processor.processors());
        }
        processors.push(identity_transform(&instance));

        let rps = receiver.receiver_pipelines();
        let names = receiver_pipeline_names(&instance.pipeline_id, &instance.receiver_id, rps.len());
        for (name, rp) in names.into_iter().zip(rps) {
            debug!(pipeline = %name, receiver = %rp.receiver.type_name, "emitted logs pipeline");
            graph.add(
                Subagent::Logging,
                name,
                Signal::Logs,
                ExporterType::CloudLogging,
                rp,
                processors.clone(),
            )?;
        }
    }
    Ok(())
}

/// 컬렉터 설정 파일 맵을 생성합니다.
pub fn emit(
    config: &UnifiedConfig,
    platform: &PlatformFacts,
    options: &CompileOptions,
) -> Result<OutputFiles, CompileError> {
    let mut graph = Graph::default();
    add_metrics(config, &mut graph)?;
    add_logging(config, &mut graph)?;

    let exporters = graph
        .exporter_types
        .iter()
        .map(|t| (*t, otel_exporter(*t, platform)))
        .collect();
    let modular = ModularConfig {
        log_level: config
            .collector_log_level(&options.default_log_level)
            .to_owned(),
        receiver_pipelines: graph.receiver_pipelines,
        pipelines: graph.pipelines,
        exporters,
        disable_self_metrics: false,
        json_logs: false,
    };
    let yaml = modular.generate()?;
    Ok(BTreeMap::from([(CONFIG_FILE_NAME.to_owned(), yaml)]))
}
