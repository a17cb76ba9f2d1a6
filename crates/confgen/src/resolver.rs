//! 파이프라인 리졸버 -- 서비스 파이프라인의 ID 참조를 구체 컴포넌트 인스턴스로 바인딩
//!
//! 파이프라인 하나는 리시버 수만큼의 인스턴스로 펼쳐집니다. 파이프라인은 사전순,
//! 리시버는 파이프라인에 나열된 순서를 따르므로 같은 입력은 항상 같은 순서를 냅니다.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use opsforge_core::error::CompileError;
use opsforge_core::types::{ComponentRole, Subagent, is_reserved};
use opsforge_fluentbit::PipelineTag;
use opsforge_fluentbit::parser::is_builtin_parser;
use opsforge_otel::ExporterType;

use crate::capability::{MetricsProcessor, MetricsReceiver, ProcessorRef, ReceiverRef};
use crate::exporters::DEFAULT_LOGGING_EXPORTER;
use crate::logging::BuiltinParser;
use crate::model::{LoggingBackend, UnifiedConfig, check_reserved_ids};

/// 파이프라인 안의 프로세서 하나와 그 설정 ID
///
/// 확장으로 생긴 프로세서는 확장된 컴포넌트의 ID를 물려받습니다.
#[derive(Clone)]
pub struct ProcessorBinding {
    pub id: String,
    pub processor: ProcessorRef,
}

impl fmt::Debug for ProcessorBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.processor.type_name())
    }
}

/// (파이프라인, 리시버) 쌍 하나로 해석된 로그 파이프라인 인스턴스
#[derive(Debug, Clone)]
pub struct LoggingInstance {
    pub pipeline_id: String,
    pub receiver_id: String,
    pub receiver: ReceiverRef,
    pub processors: Vec<ProcessorBinding>,
    /// 출력이 향하는 익스포터 ID (비어 있던 파이프라인은 내장 익스포터)
    pub exporter_ids: Vec<String>,
    pub backend: LoggingBackend,
}

impl LoggingInstance {
    /// 인스턴스 라우팅 태그
    pub fn tag(&self) -> PipelineTag {
        PipelineTag::for_instance(
            &self.pipeline_id,
            &self.receiver_id,
            self.receiver.dynamic_tag(),
        )
    }

    /// 현재 프로세서 타입 이름 목록 (로그/테스트용)
    pub fn processor_types(&self) -> Vec<&'static str> {
        self.processors
            .iter()
            .map(|b| b.processor.type_name())
            .collect()
    }
}

/// 해석된 메트릭 파이프라인 인스턴스
#[derive(Debug, Clone)]
pub struct MetricsInstance {
    pub pipeline_id: String,
    pub receiver_id: String,
    pub receiver: Arc<dyn MetricsReceiver>,
    pub processors: Vec<(String, Arc<dyn MetricsProcessor>)>,
    pub exporter_type: ExporterType,
}

fn undefined(subagent: Subagent, role: ComponentRole, id: &str, pipeline: &str) -> CompileError {
    CompileError::UndefinedReference {
        subagent,
        role,
        id: id.to_owned(),
        pipeline: pipeline.to_owned(),
    }
}

/// 주어진 백엔드로 향하는 로그 파이프라인 인스턴스를 해석합니다.
pub fn resolve_logging(
    config: &UnifiedConfig,
    backend: LoggingBackend,
) -> Result<Vec<LoggingInstance>, CompileError> {
    let Some(logging) = &config.logging else {
        return Ok(Vec::new());
    };
    let subagent = Subagent::Logging;
    check_reserved_ids(subagent, ComponentRole::Receiver, logging.receivers.keys())?;
    check_reserved_ids(subagent, ComponentRole::Processor, logging.processors.keys())?;
    check_reserved_ids(subagent, ComponentRole::Exporter, logging.exporters.keys())?;
    check_reserved_ids(
        subagent,
        ComponentRole::Pipeline,
        logging.service.pipelines.keys(),
    )?;

    let mut instances = Vec::new();
    for (pipeline_id, pipeline) in &logging.service.pipelines {
        if pipeline.backend != backend {
            continue;
        }

        let mut processors = Vec::with_capacity(pipeline.processors.len());
        for id in &pipeline.processors {
            let processor: ProcessorRef = if is_reserved(id) {
                // 예약 이름은 내장 파서만 참조할 수 있음
                if !is_builtin_parser(id) {
                    return Err(undefined(subagent, ComponentRole::Processor, id, pipeline_id));
                }
                Arc::new(BuiltinParser { name: id.clone() })
            } else {
                logging
                    .processors
                    .get(id)
                    .ok_or_else(|| undefined(subagent, ComponentRole::Processor, id, pipeline_id))?
                    .instantiate()
            };
            processors.push(ProcessorBinding {
                id: id.clone(),
                processor,
            });
        }

        let exporter_ids = if pipeline.exporters.is_empty() {
            vec![DEFAULT_LOGGING_EXPORTER.to_owned()]
        } else {
            for id in &pipeline.exporters {
                if id != DEFAULT_LOGGING_EXPORTER && !logging.exporters.contains_key(id) {
                    return Err(undefined(subagent, ComponentRole::Exporter, id, pipeline_id));
                }
            }
            pipeline.exporters.clone()
        };

        for receiver_id in &pipeline.receivers {
            let receiver = logging
                .receivers
                .get(receiver_id)
                .ok_or_else(|| {
                    undefined(subagent, ComponentRole::Receiver, receiver_id, pipeline_id)
                })?
                .instantiate();
            debug!(
                pipeline = %pipeline_id,
                receiver = %receiver_id,
                receiver_type = receiver.type_name(),
                processors = processors.len(),
                "resolved pipeline instance"
            );
            instances.push(LoggingInstance {
                pipeline_id: pipeline_id.clone(),
                receiver_id: receiver_id.clone(),
                receiver,
                processors: processors.clone(),
                exporter_ids: exporter_ids.clone(),
                backend,
            });
        }
    }
    check_tag_collisions(&instances)?;
    Ok(instances)
}

/// ID에 `.`이 들어가면 서로 다른 (파이프라인, 리시버) 쌍이 같은 기본 태그를 만들 수 있습니다.
fn check_tag_collisions(instances: &[LoggingInstance]) -> Result<(), CompileError> {
    let mut owners: BTreeMap<String, &LoggingInstance> = BTreeMap::new();
    for instance in instances {
        let tag = instance.tag().base;
        if let Some(first) = owners.get(&tag) {
            return Err(CompileError::TagCollision {
                tag,
                first_pipeline: first.pipeline_id.clone(),
                first_receiver: first.receiver_id.clone(),
                second_pipeline: instance.pipeline_id.clone(),
                second_receiver: instance.receiver_id.clone(),
            });
        }
        owners.insert(tag, instance);
    }
    Ok(())
}

/// 메트릭 파이프라인 인스턴스를 해석합니다.
///
/// 파이프라인 하나의 익스포터는 모두 같은 종류여야 합니다. 익스포터가 없으면
/// 기본 모니터링 익스포터로 보냅니다.
pub fn resolve_metrics(config: &UnifiedConfig) -> Result<Vec<MetricsInstance>, CompileError> {
    let Some(metrics) = &config.metrics else {
        return Ok(Vec::new());
    };
    let subagent = Subagent::Metrics;
    check_reserved_ids(subagent, ComponentRole::Receiver, metrics.receivers.keys())?;
    check_reserved_ids(subagent, ComponentRole::Processor, metrics.processors.keys())?;
    check_reserved_ids(subagent, ComponentRole::Exporter, metrics.exporters.keys())?;
    check_reserved_ids(
        subagent,
        ComponentRole::Pipeline,
        metrics.service.pipelines.keys(),
    )?;

    let mut instances = Vec::new();
    for (pipeline_id, pipeline) in &metrics.service.pipelines {
        let mut exporter_types = Vec::new();
        for id in &pipeline.exporters {
            let exporter = metrics
                .exporters
                .get(id)
                .ok_or_else(|| undefined(subagent, ComponentRole::Exporter, id, pipeline_id))?;
            let exporter_type = exporter.exporter_type();
            if !exporter_types.contains(&exporter_type) {
                exporter_types.push(exporter_type);
            }
        }
        if exporter_types.len() > 1 {
            return Err(CompileError::Cardinality {
                subagent,
                rule: format!(
                    "metrics pipeline {pipeline_id:?} must send to exporters of a single type"
                ),
                found: exporter_types.len(),
            });
        }
        let exporter_type = exporter_types.first().copied().unwrap_or_default();

        let mut processors = Vec::with_capacity(pipeline.processors.len());
        for id in &pipeline.processors {
            let processor = metrics
                .processors
                .get(id)
                .ok_or_else(|| undefined(subagent, ComponentRole::Processor, id, pipeline_id))?;
            processors.push((id.clone(), processor.instantiate()));
        }

        for receiver_id in &pipeline.receivers {
            let receiver = metrics
                .receivers
                .get(receiver_id)
                .ok_or_else(|| {
                    undefined(subagent, ComponentRole::Receiver, receiver_id, pipeline_id)
                })?
                .instantiate();
            debug!(
                pipeline = %pipeline_id,
                receiver = %receiver_id,
                exporter = %exporter_type,
                "resolved metrics pipeline instance"
            );
            instances.push(MetricsInstance {
                pipeline_id: pipeline_id.clone(),
                receiver_id: receiver_id.clone(),
                receiver,
                processors: processors.clone(),
                exporter_type,
            });
        }
    }
    Ok(instances)
}
