//! 애플리케이션 로그 매크로 -- nginx/apache 접근·에러 로그
//!
//! 같은 타입 이름이 리시버와 프로세서 양쪽에 있습니다.
//! - 리시버: 기본 경로를 채운 tail 리시버 + 파싱 프로세서로 확장
//! - 프로세서: 파싱 프로세서 목록으로 확장

use std::sync::Arc;

use opsforge_fluentbit::filters::{self, ModifyOp};
use opsforge_fluentbit::{Component, PipelineTag};

use crate::capability::{
    ExpandableProcessor, ExpandableReceiver, FluentBitProcessor, LoggingProcessor,
    LoggingReceiver, ProcessorRef, ReceiverRef,
};
use crate::logging::processors::ParseRegex;
use crate::logging::receivers::{FilesReceiver, SEVERITY_KEY, TailReceiver};

const ACCESS_TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

const ACCESS_REGEX: &str = r#"^(?<http_request_remoteIp>[^ ]*) (?<host>[^ ]*) (?<user>[^ ]*) \[(?<time>[^\]]*)\] "(?<http_request_requestMethod>\S+)(?: +(?<http_request_requestUrl>[^\"]*?)(?: +(?<http_request_protocol>\S+))?)?" (?<http_request_status>[^ ]*) (?<http_request_responseSize>[^ ]*)(?: "(?<http_request_referer>[^\"]*)" "(?<http_request_userAgent>[^\"]*)")?$"#;

const NGINX_ACCESS_REGEX: &str = r#"^(?<http_request_remoteIp>[^ ]*) (?<host>[^ ]*) (?<user>[^ ]*) \[(?<time>[^\]]*)\] "(?<http_request_requestMethod>\S+)(?: +(?<http_request_requestUrl>[^\"]*?)(?: +(?<http_request_protocol>\S+))?)?" (?<http_request_status>[^ ]*) (?<http_request_responseSize>[^ ]*)(?: "(?<http_request_referer>[^\"]*)" "(?<http_request_userAgent>[^\"]*)")?(?: "(?<gzip_ratio>[^\"]*)")?$"#;

const APACHE_ERROR_REGEX: &str = r"^\[(?<time>[^\]]+)\] \[(?:(?<module>\w+):)?(?<level>[\w\d]+)\](?: \[pid (?<pid>\d+)(?::tid (?<tid>[0-9]+))?\])?(?: (?<errorCode>[^\[:]*):?)?(?: \[client (?<client>[^\]]*)\])? (?<message>.*)$";

const NGINX_ERROR_REGEX: &str = r#"^(?<time>[0-9]+[./-][0-9]+[./-][0-9]+[- ][0-9]+:[0-9]+:[0-9]+) \[(?<level>[^\]]*)\] (?<pid>[0-9]+)#(?<tid>[0-9]+):(?: \*(?<connection>[0-9]+))? (?<message>.*?)(?:, client: (?<client>[^,]+))?(?:, server: (?<server>[^,]+))?(?:, request: "(?<request>[^"]*)")?(?:, subrequest: \"(?<subrequest>[^\"]*)\")?(?:, upstream: \"(?<upstream>[^"]*)\")?(?:, host: \"(?<host>[^\"]*)\")?(?:, referrer: \"(?<referer>[^"]*)\")?$"#;

const NGINX_SEVERITIES: [(&str, &str); 8] = [
    ("emerg", "EMERGENCY"),
    ("alert", "ALERT"),
    ("crit", "CRITICAL"),
    ("error", "ERROR"),
    ("warn", "WARNING"),
    ("notice", "NOTICE"),
    ("info", "INFO"),
    ("debug", "DEBUG"),
];

const APACHE_SEVERITIES: [(&str, &str); 16] = [
    ("emerg", "EMERGENCY"),
    ("alert", "ALERT"),
    ("crit", "CRITICAL"),
    ("error", "ERROR"),
    ("warn", "WARNING"),
    ("notice", "NOTICE"),
    ("info", "INFO"),
    ("debug", "DEBUG"),
    ("trace1", "DEBUG"),
    ("trace2", "DEBUG"),
    ("trace3", "DEBUG"),
    ("trace4", "DEBUG"),
    ("trace5", "DEBUG"),
    ("trace6", "DEBUG"),
    ("trace7", "DEBUG"),
    ("trace8", "DEBUG"),
];

/// 지원하는 애플리케이션 로그 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppLog {
    NginxAccess,
    NginxError,
    ApacheAccess,
    ApacheError,
}

impl AppLog {
    pub const ALL: [AppLog; 4] = [
        AppLog::NginxAccess,
        AppLog::NginxError,
        AppLog::ApacheAccess,
        AppLog::ApacheError,
    ];

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::NginxAccess => "nginx_access",
            Self::NginxError => "nginx_error",
            Self::ApacheAccess => "apache_access",
            Self::ApacheError => "apache_error",
        }
    }

    pub fn from_type_name(type_name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|app| app.type_name() == type_name)
    }

    /// 포함 경로를 지정하지 않았을 때 쓰는 기본 경로
    pub fn default_include_paths(&self) -> &'static [&'static str] {
        match self {
            Self::NginxAccess => &["/var/log/nginx/access.log"],
            Self::NginxError => &["/var/log/nginx/error.log"],
            Self::ApacheAccess => &["/var/log/apache2/access.log"],
            Self::ApacheError => &["/var/log/apache2/error.log"],
        }
    }

    /// 이 형식을 파싱하는 프로세서 목록
    pub fn processors(&self) -> Vec<ProcessorRef> {
        match self {
            Self::NginxAccess => access_processors(NGINX_ACCESS_REGEX),
            Self::ApacheAccess => access_processors(ACCESS_REGEX),
            Self::NginxError => vec![
                Arc::new(ParseRegex {
                    regex: NGINX_ERROR_REGEX.to_owned(),
                    time_key: Some("time".to_owned()),
                    time_format: Some("%Y/%m/%d %H:%M:%S".to_owned()),
                    types: [("pid", "integer"), ("tid", "integer"), ("connection", "integer")]
                        .into_iter()
                        .map(|(k, v)| (k.to_owned(), v.to_owned()))
                        .collect(),
                    ..Default::default()
                }),
                Arc::new(SeverityTranslation {
                    source: "level",
                    table: &NGINX_SEVERITIES,
                }),
            ],
            Self::ApacheError => vec![
                Arc::new(ParseRegex {
                    regex: APACHE_ERROR_REGEX.to_owned(),
                    time_key: Some("time".to_owned()),
                    time_format: Some("%a %b %d %H:%M:%S.%L %Y".to_owned()),
                    types: [("pid", "integer"), ("tid", "integer")]
                        .into_iter()
                        .map(|(k, v)| (k.to_owned(), v.to_owned()))
                        .collect(),
                    ..Default::default()
                }),
                Arc::new(SeverityTranslation {
                    source: "level",
                    table: &APACHE_SEVERITIES,
                }),
            ],
        }
    }
}

fn access_processors(regex: &str) -> Vec<ProcessorRef> {
    vec![
        Arc::new(ParseRegex {
            regex: regex.to_owned(),
            time_key: Some("time".to_owned()),
            time_format: Some(ACCESS_TIME_FORMAT.to_owned()),
            types: [("http_request_status".to_owned(), "integer".to_owned())]
                .into_iter()
                .collect(),
            ..Default::default()
        }),
        Arc::new(HttpRequestFields),
    ]
}

// ─── 확장 가능한 리시버/프로세서 ─────────────────────────────────────

/// 애플리케이션 로그 리시버 (tail + 파싱으로 확장)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppReceiver {
    pub app: AppLog,
    pub files: FilesReceiver,
}

impl LoggingReceiver for AppReceiver {
    fn type_name(&self) -> &'static str {
        self.app.type_name()
    }

    fn as_expandable(&self) -> Option<&dyn ExpandableReceiver> {
        Some(self)
    }
}

impl ExpandableReceiver for AppReceiver {
    fn expand(&self) -> (ReceiverRef, Vec<ProcessorRef>) {
        let mut files = self.files.clone();
        if files.include_paths.is_empty() {
            files.include_paths = self
                .app
                .default_include_paths()
                .iter()
                .map(|p| (*p).to_owned())
                .collect();
        }
        (Arc::new(TailReceiver::from_files(files)), self.app.processors())
    }
}

/// 애플리케이션 로그 프로세서 (파싱 프로세서 목록으로 확장)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppProcessor {
    pub app: AppLog,
}

impl LoggingProcessor for AppProcessor {
    fn type_name(&self) -> &'static str {
        self.app.type_name()
    }

    fn as_expandable(&self) -> Option<&dyn ExpandableProcessor> {
        Some(self)
    }
}

impl ExpandableProcessor for AppProcessor {
    fn expand(&self) -> Vec<ProcessorRef> {
        self.app.processors()
    }
}

// ─── 내부 후처리 프로세서 ────────────────────────────────────────────

/// 로그 레벨 필드를 심각도로 번역
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SeverityTranslation {
    source: &'static str,
    table: &'static [(&'static str, &'static str)],
}

impl LoggingProcessor for SeverityTranslation {
    fn type_name(&self) -> &'static str {
        "severity_translation"
    }

    fn as_fluent_bit(&self) -> Option<&dyn FluentBitProcessor> {
        Some(self)
    }
}

impl FluentBitProcessor for SeverityTranslation {
    fn components(&self, tag: &PipelineTag, _uid: &str) -> Vec<Component> {
        filters::translation_filters(&tag.routing, self.source, SEVERITY_KEY, false, self.table)
    }
}

/// 값이 없는 필드(`-`)를 지우고 `http_request_*` 필드를 요청 구조체로 묶음
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HttpRequestFields;

const DASH_FIELDS: [&str; 3] = ["host", "user", "http_request_referer"];

impl LoggingProcessor for HttpRequestFields {
    fn type_name(&self) -> &'static str {
        "http_request_fields"
    }

    fn as_fluent_bit(&self) -> Option<&dyn FluentBitProcessor> {
        Some(self)
    }
}

impl FluentBitProcessor for HttpRequestFields {
    fn components(&self, tag: &PipelineTag, _uid: &str) -> Vec<Component> {
        let mut out: Vec<Component> = DASH_FIELDS
            .iter()
            .map(|field| {
                filters::conditional_modify(
                    &tag.routing,
                    &format!("Key_value_equals {field} -"),
                    &ModifyOp::Remove((*field).to_owned()),
                )
            })
            .collect();
        out.push(filters::nest_filter(
            &tag.routing,
            "http_request_*",
            "logging.googleapis.com/http_request",
            "http_request_",
        ));
        out
    }
}
