//! 컴포넌트 카탈로그 -- 등록된 컴포넌트 타입과 역량 조회
//!
//! 설정 파일에 쓸 수 있는 모든 `type` 값과, 각 타입이 선언한 역량을 나열합니다.
//! 역량은 대표 인스턴스를 만들어 접근자로 질의하므로 실제 컴파일 경로와 항상 일치합니다.

use std::sync::Arc;

use serde::Serialize;

use opsforge_core::types::{ComponentRole, Subagent};
use opsforge_fluentbit::parser::BUILTIN_PARSERS;

use crate::capability::{ProcessorRef, ReceiverRef, processor_capabilities, receiver_capabilities};
use crate::exporters::{LoggingExporterConfig, MetricsExporterConfig};
use crate::logging::{
    AppLog, AppProcessor, AppReceiver, BuiltinParser, ExcludeLogs, FilesReceiver,
    ForwardReceiver, ModifyFields, ParseJson, ParseMultiline, ParseRegex, SyslogReceiver,
    TcpReceiver, WinlogReceiver,
};
use crate::model::{LoggingProcessorConfig, LoggingReceiverConfig, MetricsProcessorConfig, MetricsReceiverConfig};

/// 컴포넌트 타입 하나의 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentInfo {
    /// 도메인
    pub subagent: Subagent,
    /// 역할
    pub role: ComponentRole,
    /// 설정 파일의 `type` 값 (내장 파서는 예약 ID)
    pub type_name: String,
    /// 선언된 역량 이름
    pub capabilities: Vec<String>,
}

impl ComponentInfo {
    fn new(subagent: Subagent, role: ComponentRole, type_name: &str, caps: &[&str]) -> Self {
        Self {
            subagent,
            role,
            type_name: type_name.to_owned(),
            capabilities: caps.iter().map(|c| (*c).to_owned()).collect(),
        }
    }

    /// 역량 보유 여부
    pub fn has(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

fn sample_receiver(type_name: &str) -> Option<ReceiverRef> {
    let files = FilesReceiver::default();
    let receiver: ReceiverRef = match type_name {
        "files" => Arc::new(files),
        "syslog" => Arc::new(SyslogReceiver {
            transport_protocol: "tcp".to_owned(),
            listen_host: "0.0.0.0".to_owned(),
            listen_port: 5140,
        }),
        "tcp" => Arc::new(TcpReceiver {
            listen_host: None,
            listen_port: None,
            format: "json".to_owned(),
        }),
        "fluent_forward" => Arc::new(ForwardReceiver::default()),
        "windows_event_log" => Arc::new(WinlogReceiver {
            channels: vec!["System".to_owned()],
        }),
        other => {
            let app = AppLog::from_type_name(other)?;
            Arc::new(AppReceiver { app, files })
        }
    };
    Some(receiver)
}

fn sample_processor(type_name: &str) -> Option<ProcessorRef> {
    let processor: ProcessorRef = match type_name {
        "parse_json" => Arc::new(ParseJson::default()),
        "parse_regex" => Arc::new(ParseRegex::default()),
        "parse_multiline" => Arc::new(ParseMultiline::default()),
        "exclude_logs" => Arc::new(ExcludeLogs::default()),
        "modify_fields" => Arc::new(ModifyFields::default()),
        other => Arc::new(AppProcessor {
            app: AppLog::from_type_name(other)?,
        }),
    };
    Some(processor)
}

/// 등록된 모든 컴포넌트 타입 (도메인, 역할, 타입 이름 순)
pub fn components() -> Vec<ComponentInfo> {
    let mut out = Vec::new();

    for type_name in LoggingReceiverConfig::TYPES {
        if let Some(receiver) = sample_receiver(type_name) {
            out.push(ComponentInfo::new(
                Subagent::Logging,
                ComponentRole::Receiver,
                type_name,
                &receiver_capabilities(receiver.as_ref()),
            ));
        }
    }
    for type_name in LoggingProcessorConfig::TYPES {
        if let Some(processor) = sample_processor(type_name) {
            out.push(ComponentInfo::new(
                Subagent::Logging,
                ComponentRole::Processor,
                type_name,
                &processor_capabilities(processor.as_ref()),
            ));
        }
    }
    for (name, _, _) in BUILTIN_PARSERS {
        let parser = BuiltinParser {
            name: name.to_owned(),
        };
        out.push(ComponentInfo::new(
            Subagent::Logging,
            ComponentRole::Processor,
            name,
            &processor_capabilities(&parser),
        ));
    }
    for type_name in LoggingExporterConfig::TYPES {
        out.push(ComponentInfo::new(
            Subagent::Logging,
            ComponentRole::Exporter,
            type_name,
            &["fluent-bit", "otel"],
        ));
    }

    for type_name in MetricsReceiverConfig::TYPES {
        let caps: &[&str] = if type_name == "hostmetrics" {
            &["otel", "collectd"]
        } else {
            &["otel"]
        };
        out.push(ComponentInfo::new(
            Subagent::Metrics,
            ComponentRole::Receiver,
            type_name,
            caps,
        ));
    }
    for type_name in MetricsProcessorConfig::TYPES {
        out.push(ComponentInfo::new(
            Subagent::Metrics,
            ComponentRole::Processor,
            type_name,
            &["otel"],
        ));
    }
    for type_name in MetricsExporterConfig::TYPES {
        let caps: &[&str] = if type_name == "google_cloud_monitoring" {
            &["otel", "collectd"]
        } else {
            &["otel"]
        };
        out.push(ComponentInfo::new(
            Subagent::Metrics,
            ComponentRole::Exporter,
            type_name,
            caps,
        ));
    }

    out.sort_by(|a, b| {
        (a.subagent, a.role, &a.type_name).cmp(&(b.subagent, b.role, &b.type_name))
    });
    out
}
