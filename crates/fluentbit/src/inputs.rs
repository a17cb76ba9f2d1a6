//! INPUT 섹션 빌더 -- tail, syslog, tcp, forward, winlog
//!
//! 모든 네트워크/파일 입력은 파일시스템 버퍼(`storage.type filesystem`)와
//! `Mem_Buf_Limit 10M`을 사용해 백프레셔 상황에서도 데이터를 디스크에 보존합니다.

use crate::component::{Component, Kind};
use crate::modular;
use crate::tag::PipelineTag;

/// 메모리에 유지할 수 있는 입력 데이터 상한
const MEM_BUF_LIMIT: &str = "10M";

/// 버퍼 디렉토리 매크로 참조
pub fn buffers_dir_ref() -> String {
    format!("${{{}}}", modular::BUFFERS_DIR_VARIABLE)
}

fn buffered_input(name: &str) -> Component {
    Component::new(Kind::Input)
        .with("Name", name)
        .with("storage.type", "filesystem")
        .with("Mem_Buf_Limit", MEM_BUF_LIMIT)
}

/// 파일 tail 입력
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailInput {
    /// 포함할 경로 (glob 허용)
    pub include_paths: Vec<String>,
    /// 제외할 경로
    pub exclude_paths: Vec<String>,
    /// 와일드카드 재검색 주기 (초)
    pub refresh_interval_secs: Option<u64>,
    /// 레코드에 원본 파일 경로를 저장할 키
    pub path_key: Option<String>,
    /// 입력 단계에서 적용할 multiline 파서 이름
    pub multiline_parser: Option<String>,
    /// 파일시스템 대신 메모리 버퍼 사용
    pub buffer_in_memory: bool,
}

impl TailInput {
    /// INPUT 컴포넌트를 생성합니다. 포함 경로가 없으면 입력도 없습니다.
    pub fn component(&self, tag: &PipelineTag) -> Option<Component> {
        if self.include_paths.is_empty() {
            return None;
        }
        let mut c = buffered_input("tail")
            .with("Tag", tag.input.as_str())
            .with("Path", self.include_paths.join(","))
            .with("DB", format!("{}/{}", buffers_dir_ref(), tag.file_safe()))
            .with("DB.locking", "true")
            .with("Read_from_Head", "True")
            .with("Buffer_Chunk_Size", "512k")
            .with("Buffer_Max_Size", "2M")
            .with("Key", "message")
            .with("Rotate_Wait", "30")
            .with("Skip_Long_Lines", "On");
        if !self.exclude_paths.is_empty() {
            c.set("Exclude_Path", self.exclude_paths.join(","));
        }
        if let Some(secs) = self.refresh_interval_secs {
            c.set("Refresh_Interval", secs.to_string());
        }
        if let Some(key) = &self.path_key {
            c.set("Path_Key", key.as_str());
        }
        if let Some(parser) = &self.multiline_parser {
            c.set("multiline.parser", parser.as_str());
        }
        if self.buffer_in_memory {
            c.set("storage.type", "memory");
        }
        Some(c)
    }
}

/// syslog 입력과 메시지 전체를 `message`로 저장하는 전용 파서
pub fn syslog_input(tag: &PipelineTag, mode: &str, listen: &str, port: u16) -> Vec<Component> {
    vec![
        buffered_input("syslog")
            .with("Tag", tag.input.as_str())
            .with("Mode", mode)
            .with("Listen", listen)
            .with("Port", port.to_string())
            .with("Parser", tag.input.as_str()),
        Component::new(Kind::Parser)
            .with("Name", tag.input.as_str())
            .with("Format", "regex")
            .with("Regex", r"^(?<message>.*)$"),
    ]
}

/// TCP 입력
pub fn tcp_input(tag: &PipelineTag, listen: &str, port: u16, format: &str) -> Component {
    buffered_input("tcp")
        .with("Tag", tag.input.as_str())
        .with("Listen", listen)
        .with("Port", port.to_string())
        .with("Format", format)
        .with("Chunk_Size", "512k")
}

/// forward 프로토콜 입력
///
/// 클라이언트가 보낸 태그가 `Tag_Prefix` 뒤에 붙으므로 동적 태그를 사용해야 합니다.
pub fn forward_input(tag: &PipelineTag, listen: &str, port: u16) -> Component {
    buffered_input("forward")
        .with("Tag_Prefix", tag.input.as_str())
        .with("Listen", listen)
        .with("Port", port.to_string())
}

/// Windows 이벤트 로그 입력
pub fn winlog_input(tag: &PipelineTag, channels: &[String]) -> Component {
    Component::new(Kind::Input)
        .with("Name", "winlog")
        .with("Tag", tag.input.as_str())
        .with("String_Inserts", "true")
        .with("Channels", channels.join(","))
        .with("Interval_Sec", "1")
        .with("DB", format!("{}/{}", buffers_dir_ref(), tag.file_safe()))
}
