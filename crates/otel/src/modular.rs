//! 모듈형 컬렉터 설정 -- 리시버 파이프라인과 처리 파이프라인을 YAML 문서로 펼침
//!
//! 파이프라인 하나는 다음 순서로 생성됩니다:
//! 리시버 → 리시버 프로세서 → 파이프라인 프로세서 → 전역 프로세서 → 익스포터
//!
//! 파이프라인 프로세서 번호는 리시버 프로세서 번호에 이어서 매깁니다. 파이프라인과
//! 리시버 파이프라인이 같은 이름이어도 프로세서 이름이 겹치지 않습니다.
//!
//! ```text
//! metrics/p1:
//!   receivers: [hostmetrics/p1_hostmetrics]
//!   processors: [filter/p1_hostmetrics_0, filter/p1_1, resourcedetection/_global_0]
//!   exporters: [googlecloud]
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value, json};

use crate::component::{Component, resource_detector};
use crate::error::OtelError;

/// 컬렉터 설정 파일 이름
pub const CONFIG_FILE_NAME: &str = "otel.yaml";

/// 컬렉터 자체 메트릭을 노출하는 포트
pub const SELF_METRICS_PORT: u16 = 20201;

/// 데이터 신호 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Signal {
    Metrics,
    Traces,
    Logs,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metrics => "metrics",
            Self::Traces => "traces",
            Self::Logs => "logs",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 파이프라인 출력이 향하는 익스포터 종류
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExporterType {
    /// 일반 모니터링 메트릭/트레이스
    #[default]
    CloudMonitoring,
    /// Prometheus 호환 관리형 메트릭
    ManagedPrometheus,
    /// 로그 엔트리
    CloudLogging,
}

impl ExporterType {
    /// 익스포터 인스턴스 이름 접미사
    ///
    /// 모니터링과 관리형 Prometheus 익스포터는 타입 이름이 달라 빈 접미사를 공유합니다.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::CloudMonitoring | Self::ManagedPrometheus => "",
            Self::CloudLogging => "logging",
        }
    }
}

impl fmt::Display for ExporterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CloudMonitoring => "cloud_monitoring",
            Self::ManagedPrometheus => "managed_prometheus",
            Self::CloudLogging => "cloud_logging",
        };
        f.write_str(name)
    }
}

/// 리소스 속성 감지 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceDetectionMode {
    /// 감지된 속성으로 덮어씀
    #[default]
    Override,
    /// 없는 속성만 채움
    SetIfMissing,
    /// 감지하지 않음
    None,
}

/// 리시버 하나와 그 뒤에 항상 붙는 신호별 프로세서 목록
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiverPipeline {
    pub receiver: Component,
    /// 신호별 프로세서. 키가 없는 신호의 파이프라인에서는 이 리시버를 쓰지 않습니다.
    pub processors: BTreeMap<Signal, Vec<Component>>,
    /// 신호별 익스포터 종류 (없으면 기본값)
    pub exporter_types: BTreeMap<Signal, ExporterType>,
    /// 신호별 리소스 감지 방식 (없으면 기본값)
    pub resource_detection: BTreeMap<Signal, ResourceDetectionMode>,
}

impl ReceiverPipeline {
    /// 단일 신호용 리시버 파이프라인
    pub fn new(receiver: Component, signal: Signal, processors: Vec<Component>) -> Self {
        Self {
            receiver,
            processors: BTreeMap::from([(signal, processors)]),
            exporter_types: BTreeMap::new(),
            resource_detection: BTreeMap::new(),
        }
    }

    pub fn with_exporter(mut self, signal: Signal, exporter_type: ExporterType) -> Self {
        self.exporter_types.insert(signal, exporter_type);
        self
    }

    pub fn with_resource_detection(mut self, signal: Signal, mode: ResourceDetectionMode) -> Self {
        self.resource_detection.insert(signal, mode);
        self
    }
}

/// 리시버 파이프라인 하나를 소비하는 처리 파이프라인
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub signal: Signal,
    pub receiver_pipeline_name: String,
    pub processors: Vec<Component>,
}

/// 한 번의 컴파일에서 생성된 컬렉터 그래프 전체
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModularConfig {
    /// 컬렉터 자체 로그 레벨
    pub log_level: String,
    pub receiver_pipelines: BTreeMap<String, ReceiverPipeline>,
    pub pipelines: BTreeMap<String, Pipeline>,
    pub exporters: BTreeMap<ExporterType, Component>,
    /// 컬렉터 자체 메트릭 비활성화
    pub disable_self_metrics: bool,
    /// 컬렉터 자체 로그를 JSON으로 출력
    pub json_logs: bool,
}

impl ModularConfig {
    fn telemetry(&self) -> Value {
        let mut telemetry = Map::new();
        let metrics = if self.disable_self_metrics {
            json!({ "level": "none" })
        } else {
            json!({
                "readers": [{
                    "pull": {
                        "exporter": {
                            "prometheus": {
                                "host": "0.0.0.0",
                                "port": SELF_METRICS_PORT,
                                "without_scope_info": true,
                                "without_type_suffix": true,
                                "without_units": true,
                            }
                        }
                    }
                }]
            })
        };
        telemetry.insert("metrics".to_owned(), metrics);

        let mut logs = Map::new();
        if !self.log_level.is_empty() && self.log_level != "info" {
            logs.insert("level".to_owned(), Value::String(self.log_level.clone()));
        }
        if self.json_logs {
            logs.insert("encoding".to_owned(), Value::String("json".to_owned()));
        }
        if !logs.is_empty() {
            telemetry.insert("logs".to_owned(), Value::Object(logs));
        }
        Value::Object(telemetry)
    }

    /// YAML 문서를 생성합니다.
    pub fn generate(&self) -> Result<String, OtelError> {
        let mut receivers = Map::new();
        let mut processors = Map::new();
        let mut exporters = Map::new();
        let mut exporter_names: BTreeMap<ExporterType, String> = BTreeMap::new();
        let mut pipelines = Map::new();

        let global_processors: BTreeMap<ResourceDetectionMode, (String, Component)> = [
            (ResourceDetectionMode::Override, resource_detector(true)),
            (ResourceDetectionMode::SetIfMissing, resource_detector(false)),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (mode, c))| (mode, (c.name(&format!("_global_{i}")), c)))
        .collect();

        // BTreeMap 순회 -- 파이프라인 이름순이어야 출력이 결정적입니다.
        for (name, pipeline) in &self.pipelines {
            let rp_name = &pipeline.receiver_pipeline_name;
            let rp = self.receiver_pipelines.get(rp_name).ok_or_else(|| {
                OtelError::UnknownReceiverPipeline {
                    pipeline: name.clone(),
                    receiver_pipeline: rp_name.clone(),
                }
            })?;
            let Some(rp_processors) = rp.processors.get(&pipeline.signal) else {
                tracing::debug!(
                    pipeline = %name,
                    signal = %pipeline.signal,
                    "receiver pipeline does not produce this signal, skipping"
                );
                continue;
            };

            let receiver_name = rp.receiver.name(rp_name);
            receivers.insert(receiver_name.clone(), rp.receiver.config.clone());

            let mut processor_names = Vec::new();
            for (i, processor) in rp_processors.iter().enumerate() {
                let pname = processor.name(&format!("{rp_name}_{i}"));
                processors.insert(pname.clone(), processor.config.clone());
                processor_names.push(pname);
            }
            let offset = rp_processors.len();
            for (i, processor) in pipeline.processors.iter().enumerate() {
                let pname = processor.name(&format!("{name}_{}", offset + i));
                processors.insert(pname.clone(), processor.config.clone());
                processor_names.push(pname);
            }
            let mode = rp
                .resource_detection
                .get(&pipeline.signal)
                .copied()
                .unwrap_or_default();
            if let Some((pname, processor)) = global_processors.get(&mode) {
                processors.insert(pname.clone(), processor.config.clone());
                processor_names.push(pname.clone());
            }

            let exporter_type = rp
                .exporter_types
                .get(&pipeline.signal)
                .copied()
                .unwrap_or_default();
            let exporter_name = match exporter_names.get(&exporter_type) {
                Some(existing) => existing.clone(),
                None => {
                    let exporter = self.exporters.get(&exporter_type).ok_or_else(|| {
                        OtelError::MissingExporter {
                            exporter_type: exporter_type.to_string(),
                            pipeline: name.clone(),
                        }
                    })?;
                    let ename = exporter.name(exporter_type.suffix());
                    exporters.insert(ename.clone(), exporter.config.clone());
                    exporter_names.insert(exporter_type, ename.clone());
                    ename
                }
            };

            pipelines.insert(
                format!("{}/{name}", pipeline.signal),
                json!({
                    "receivers": [receiver_name],
                    "processors": processor_names,
                    "exporters": [exporter_name],
                }),
            );
        }

        tracing::debug!(
            receivers = receivers.len(),
            processors = processors.len(),
            pipelines = pipelines.len(),
            "rendered collector configuration"
        );
        metrics::counter!(
            opsforge_core::metrics::COMPONENTS_EMITTED_TOTAL,
            opsforge_core::metrics::LABEL_BACKEND => "otel",
            opsforge_core::metrics::LABEL_KIND => "receiver"
        )
        .increment(receivers.len() as u64);

        let document = json!({
            "receivers": receivers,
            "processors": processors,
            "exporters": exporters,
            "service": {
                "pipelines": pipelines,
                "telemetry": self.telemetry(),
            },
        });
        Ok(serde_yaml::to_string(&document)?)
    }
}
