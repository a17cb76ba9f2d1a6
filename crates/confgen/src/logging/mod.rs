//! 로그 도메인 컴포넌트 -- 리시버, 프로세서, 애플리케이션 매크로
//!
//! # 구성
//! - [`receivers`]: files/tail, syslog, tcp, fluent_forward, windows_event_log
//! - [`processors`]: parse_json, parse_regex, parse_multiline, exclude_logs, modify_fields, 내장 파서
//! - [`apps`]: nginx/apache 매크로 (리시버·프로세서 양쪽)
//! - [`multiline`]: 언어별 예외 트레이스 규칙

pub mod apps;
pub mod multiline;
pub mod processors;
pub mod receivers;

pub use apps::{AppLog, AppProcessor, AppReceiver};
pub use processors::{
    BuiltinParser, ExcludeLogs, ExcludeRule, FieldModification, ModifyFields, MultilineGroup,
    ParseJson, ParseMultiline, ParseRegex,
};
pub use receivers::{
    FilesReceiver, ForwardReceiver, SyslogReceiver, TailReceiver, TcpReceiver, WinlogReceiver,
};
