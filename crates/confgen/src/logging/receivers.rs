//! 로그 리시버 -- files, syslog, tcp, fluent_forward, windows_event_log, 내부 tail
//!
//! `files`는 항상 내부 `tail` 리시버로 확장되며, `tail`만이 multiline 프로세서를
//! 흡수하는 병합 역량을 가집니다.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use opsforge_core::error::CompileError;
use opsforge_core::types::ComponentRole;
use opsforge_fluentbit::filters::{self, ModifyOp, MultilineRule};
use opsforge_fluentbit::inputs::{self, TailInput};
use opsforge_fluentbit::{Component, ParserDefinition, PipelineTag};
use opsforge_otel::{self as otel, ExporterType, ReceiverPipeline, Signal};

use crate::capability::{
    ExpandableReceiver, FluentBitReceiver, LoggingReceiver, MergeableReceiver, OtelReceiver,
    ProcessorRef, ReceiverRef,
};
use crate::model::{invalid_logging, parse_interval};

/// 파일 경로를 기록하는 레코드 키
pub const LOG_FILE_PATH_KEY: &str = "agent.googleapis.com/log_file_path";

/// 심각도를 기록하는 레코드 키
pub const SEVERITY_KEY: &str = "logging.googleapis.com/severity";

const DEFAULT_TCP_PORT: u16 = 5170;
const DEFAULT_FORWARD_PORT: u16 = 24224;
const DEFAULT_LISTEN_HOST: &str = "127.0.0.1";

// ─── files / tail ───────────────────────────────────────────────────

/// `files` 리시버 설정
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilesReceiver {
    #[serde(default)]
    pub include_paths: Vec<String>,
    #[serde(default)]
    pub exclude_paths: Vec<String>,
    /// 와일드카드 재검색 주기 (예: `"60s"`)
    #[serde(default)]
    pub wildcard_refresh_interval: Option<String>,
    #[serde(default)]
    pub record_log_file_path: bool,
    #[serde(default)]
    pub buffer_in_memory: bool,
}

impl FilesReceiver {
    /// 파라미터 검증. `require_paths`가 참이면 포함 경로가 하나 이상 있어야 합니다.
    pub fn validate(&self, id: &str, require_paths: bool) -> Result<(), CompileError> {
        if require_paths && self.include_paths.is_empty() {
            return Err(invalid_logging(
                ComponentRole::Receiver,
                id,
                "include_paths",
                "at least one path is required",
            ));
        }
        if self.include_paths.iter().any(|p| p.trim().is_empty()) {
            return Err(invalid_logging(
                ComponentRole::Receiver,
                id,
                "include_paths",
                "paths must not be empty",
            ));
        }
        if let Some(interval) = &self.wildcard_refresh_interval {
            let parsed = parse_interval(interval).filter(|d| d.as_secs() >= 1);
            if parsed.is_none() {
                return Err(invalid_logging(
                    ComponentRole::Receiver,
                    id,
                    "wildcard_refresh_interval",
                    &format!("{interval:?} is not an interval of at least 1s"),
                ));
            }
        }
        Ok(())
    }
}

impl LoggingReceiver for FilesReceiver {
    fn type_name(&self) -> &'static str {
        "files"
    }

    fn as_fluent_bit(&self) -> Option<&dyn FluentBitReceiver> {
        Some(self)
    }

    fn as_otel(&self) -> Option<&dyn OtelReceiver> {
        Some(self)
    }

    fn as_expandable(&self) -> Option<&dyn ExpandableReceiver> {
        Some(self)
    }
}

impl FluentBitReceiver for FilesReceiver {
    fn components(&self, tag: &PipelineTag) -> Vec<Component> {
        TailReceiver::from_files(self.clone()).components(tag)
    }
}

impl OtelReceiver for FilesReceiver {
    fn receiver_pipelines(&self) -> Vec<ReceiverPipeline> {
        TailReceiver::from_files(self.clone()).receiver_pipelines()
    }
}

impl ExpandableReceiver for FilesReceiver {
    fn expand(&self) -> (ReceiverRef, Vec<ProcessorRef>) {
        (Arc::new(TailReceiver::from_files(self.clone())), Vec::new())
    }
}

/// 내부 tail 리시버 -- multiline 규칙을 한 번 흡수할 수 있음
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailReceiver {
    pub files: FilesReceiver,
    pub multiline_rules: Vec<MultilineRule>,
}

impl TailReceiver {
    pub fn from_files(files: FilesReceiver) -> Self {
        Self {
            files,
            multiline_rules: Vec::new(),
        }
    }

    fn refresh_interval_secs(&self) -> Option<u64> {
        self.files
            .wildcard_refresh_interval
            .as_deref()
            .and_then(parse_interval)
            .map(|d| d.as_secs())
    }
}

impl LoggingReceiver for TailReceiver {
    fn type_name(&self) -> &'static str {
        "tail"
    }

    fn as_fluent_bit(&self) -> Option<&dyn FluentBitReceiver> {
        Some(self)
    }

    fn as_otel(&self) -> Option<&dyn OtelReceiver> {
        // 컬렉터 filelog 리시버에는 multiline 상태 머신이 없음
        if self.multiline_rules.is_empty() {
            Some(self)
        } else {
            None
        }
    }

    fn as_mergeable(&self) -> Option<&dyn MergeableReceiver> {
        // 병합은 한 번만
        if self.multiline_rules.is_empty() {
            Some(self)
        } else {
            None
        }
    }
}

impl FluentBitReceiver for TailReceiver {
    fn components(&self, tag: &PipelineTag) -> Vec<Component> {
        let mut input = TailInput {
            include_paths: self.files.include_paths.clone(),
            exclude_paths: self.files.exclude_paths.clone(),
            refresh_interval_secs: self.refresh_interval_secs(),
            path_key: self
                .files
                .record_log_file_path
                .then(|| LOG_FILE_PATH_KEY.to_owned()),
            multiline_parser: None,
            buffer_in_memory: self.files.buffer_in_memory,
        };

        let mut out = Vec::new();
        if !self.multiline_rules.is_empty() {
            // 청크 경계를 넘는 메시지를 합치려면 입력 단계에서 multiline을 적용해야 함
            let parser_name = format!("multiline.{}", tag.base);
            out.push(filters::multiline_parser(&parser_name, &self.multiline_rules));
            out.push(filters::modify_filter(
                &tag.routing,
                &[ModifyOp::Rename("log".to_owned(), "message".to_owned())],
            ));
            out.extend(filters::strip_newline_filter(&tag.routing));
            input.multiline_parser = Some(parser_name);
        }
        out.extend(input.component(tag));
        out
    }
}

impl OtelReceiver for TailReceiver {
    fn receiver_pipelines(&self) -> Vec<ReceiverPipeline> {
        let mut operators = vec![json!({
            "id": "body",
            "type": "move",
            "from": "body",
            "to": "body.message",
        })];
        let mut config = json!({
            "include": self.files.include_paths,
            "exclude": self.files.exclude_paths,
            "start_at": "beginning",
            "include_file_name": false,
            "preserve_leading_whitespaces": true,
            "preserve_trailing_whitespaces": true,
        });
        if let Some(interval) = &self.files.wildcard_refresh_interval {
            config["poll_interval"] = json!(interval);
        }
        if self.files.record_log_file_path {
            config["include_file_path"] = json!(true);
            operators.push(json!({
                "id": "record_log_file_path",
                "type": "move",
                "from": r#"attributes["log.file.path"]"#,
                "to": format!(r#"attributes["{LOG_FILE_PATH_KEY}"]"#),
            }));
        }
        config["operators"] = json!(operators);

        vec![
            ReceiverPipeline::new(otel::Component::new("filelog", config), Signal::Logs, Vec::new())
                .with_exporter(Signal::Logs, ExporterType::CloudLogging),
        ]
    }
}

impl MergeableReceiver for TailReceiver {
    fn merge(&self, processor: ProcessorRef) -> (ReceiverRef, Option<ProcessorRef>) {
        match processor.multiline_rules() {
            Some(rules) if self.multiline_rules.is_empty() => {
                let merged = Self {
                    files: self.files.clone(),
                    multiline_rules: rules,
                };
                (Arc::new(merged), None)
            }
            _ => (Arc::new(self.clone()), Some(processor)),
        }
    }
}

// ─── syslog ─────────────────────────────────────────────────────────

/// `syslog` 리시버 설정
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyslogReceiver {
    /// `tcp` 또는 `udp`
    pub transport_protocol: String,
    pub listen_host: String,
    pub listen_port: u16,
}

impl SyslogReceiver {
    pub fn validate(&self, id: &str) -> Result<(), CompileError> {
        if !matches!(self.transport_protocol.as_str(), "tcp" | "udp") {
            return Err(invalid_logging(
                ComponentRole::Receiver,
                id,
                "transport_protocol",
                &format!(
                    "{:?} is not one of [tcp, udp]",
                    self.transport_protocol
                ),
            ));
        }
        if self.listen_host.trim().is_empty() {
            return Err(invalid_logging(
                ComponentRole::Receiver,
                id,
                "listen_host",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

impl LoggingReceiver for SyslogReceiver {
    fn type_name(&self) -> &'static str {
        "syslog"
    }

    fn as_fluent_bit(&self) -> Option<&dyn FluentBitReceiver> {
        Some(self)
    }

    fn listen_port(&self) -> Option<u16> {
        Some(self.listen_port)
    }
}

impl FluentBitReceiver for SyslogReceiver {
    fn components(&self, tag: &PipelineTag) -> Vec<Component> {
        inputs::syslog_input(
            tag,
            &self.transport_protocol,
            &self.listen_host,
            self.listen_port,
        )
    }
}

// ─── tcp ────────────────────────────────────────────────────────────

/// `tcp` 리시버 설정
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TcpReceiver {
    #[serde(default)]
    pub listen_host: Option<String>,
    #[serde(default)]
    pub listen_port: Option<u16>,
    /// 현재는 `json`만 지원
    pub format: String,
}

impl TcpReceiver {
    pub fn validate(&self, id: &str) -> Result<(), CompileError> {
        if self.format != "json" {
            return Err(invalid_logging(
                ComponentRole::Receiver,
                id,
                "format",
                &format!("{:?} is not one of [json]", self.format),
            ));
        }
        Ok(())
    }
}

impl LoggingReceiver for TcpReceiver {
    fn type_name(&self) -> &'static str {
        "tcp"
    }

    fn as_fluent_bit(&self) -> Option<&dyn FluentBitReceiver> {
        Some(self)
    }

    fn listen_port(&self) -> Option<u16> {
        Some(self.listen_port.unwrap_or(DEFAULT_TCP_PORT))
    }
}

impl FluentBitReceiver for TcpReceiver {
    fn components(&self, tag: &PipelineTag) -> Vec<Component> {
        vec![inputs::tcp_input(
            tag,
            self.listen_host.as_deref().unwrap_or(DEFAULT_LISTEN_HOST),
            self.listen_port.unwrap_or(DEFAULT_TCP_PORT),
            &self.format,
        )]
    }
}

// ─── fluent_forward ─────────────────────────────────────────────────

/// `fluent_forward` 리시버 설정
///
/// 클라이언트 태그가 라우팅 태그 뒤에 붙으므로 동적 태그를 사용합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForwardReceiver {
    #[serde(default)]
    pub listen_host: Option<String>,
    #[serde(default)]
    pub listen_port: Option<u16>,
}

impl LoggingReceiver for ForwardReceiver {
    fn type_name(&self) -> &'static str {
        "fluent_forward"
    }

    fn as_fluent_bit(&self) -> Option<&dyn FluentBitReceiver> {
        Some(self)
    }

    fn listen_port(&self) -> Option<u16> {
        Some(self.listen_port.unwrap_or(DEFAULT_FORWARD_PORT))
    }

    fn dynamic_tag(&self) -> bool {
        true
    }
}

impl FluentBitReceiver for ForwardReceiver {
    fn components(&self, tag: &PipelineTag) -> Vec<Component> {
        vec![inputs::forward_input(
            tag,
            self.listen_host.as_deref().unwrap_or(DEFAULT_LISTEN_HOST),
            self.listen_port.unwrap_or(DEFAULT_FORWARD_PORT),
        )]
    }
}

// ─── windows_event_log ──────────────────────────────────────────────

/// `windows_event_log` 리시버 설정
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WinlogReceiver {
    pub channels: Vec<String>,
}

const WINLOG_TIMESTAMP_REGEX: &str = r"(?<timestamp>\d+-\d+-\d+ \d+:\d+:\d+ [+-]\d{4})";
const WINLOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// 이벤트 유형 → 심각도
const WINLOG_SEVERITIES: [(&str, &str); 5] = [
    ("Error", "ERROR"),
    ("Information", "INFO"),
    ("Warning", "WARNING"),
    ("SuccessAudit", "NOTICE"),
    ("FailureAudit", "NOTICE"),
];

impl WinlogReceiver {
    pub fn validate(&self, id: &str) -> Result<(), CompileError> {
        if self.channels.is_empty() || self.channels.iter().any(|c| c.trim().is_empty()) {
            return Err(invalid_logging(
                ComponentRole::Receiver,
                id,
                "channels",
                "at least one non-empty channel is required",
            ));
        }
        Ok(())
    }
}

impl LoggingReceiver for WinlogReceiver {
    fn type_name(&self) -> &'static str {
        "windows_event_log"
    }

    fn as_fluent_bit(&self) -> Option<&dyn FluentBitReceiver> {
        Some(self)
    }
}

impl FluentBitReceiver for WinlogReceiver {
    fn components(&self, tag: &PipelineTag) -> Vec<Component> {
        let parser_name = format!("{}.timestamp_parser", tag.base);
        let mut out = vec![
            inputs::winlog_input(tag, &self.channels),
            ParserDefinition::regex(parser_name.as_str(), WINLOG_TIMESTAMP_REGEX)
                .with_time("timestamp", WINLOG_TIMESTAMP_FORMAT)
                .component(),
            filters::parser_filter(&tag.routing, "TimeGenerated", &[parser_name], true),
        ];
        out.extend(filters::translation_filters(
            &tag.routing,
            "EventType",
            SEVERITY_KEY,
            false,
            &WINLOG_SEVERITIES,
        ));
        out
    }
}
