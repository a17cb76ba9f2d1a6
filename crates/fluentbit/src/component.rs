//! 섹션 컴포넌트 -- 네이티브 설정 섹션 하나를 나타내는 렌더링 단위
//!
//! [`Component`]는 종류([`Kind`]), 정렬되어 렌더링되는 키/값 집합(`config`),
//! 그리고 키 중복과 순서가 의미를 갖는 목록(`ordered_config`)으로 구성됩니다.
//!
//! # 렌더링 형식
//! ```text
//! [INPUT]
//!     Name            tail
//!     Path            /var/log/syslog
//!     Read_from_Head  True
//! ```
//! 모든 값은 같은 열에서 시작합니다. 열 너비는 해당 컴포넌트의 가장 긴 키 길이에 한 칸을 더한 값입니다.

use std::collections::BTreeMap;
use std::fmt;

/// 원시 출력 파일 컴포넌트의 내부 종류 이름
pub const OUTPUT_FILE_KIND: &str = "OPSAGENTOUTPUTFILE";
const OUTPUT_FILE_NAME_KEY: &str = "filename";
const OUTPUT_FILE_CONTENTS_KEY: &str = "contents";

/// 섹션 종류
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Service,
    Input,
    Filter,
    Output,
    Parser,
    MultilineParser,
    /// 섹션 렌더링을 건너뛰고 지정된 파일로 그대로 복사되는 가상 종류
    OutputFile,
    /// 인식되지 않는 종류 -- 직렬화 단계에서 에러가 됩니다.
    Other(String),
}

impl Kind {
    /// 네이티브 섹션 헤더 이름
    pub fn as_str(&self) -> &str {
        match self {
            Self::Service => "SERVICE",
            Self::Input => "INPUT",
            Self::Filter => "FILTER",
            Self::Output => "OUTPUT",
            Self::Parser => "PARSER",
            Self::MultilineParser => "MULTILINE_PARSER",
            Self::OutputFile => OUTPUT_FILE_KIND,
            Self::Other(name) => name,
        }
    }

    /// 헤더 이름에서 종류를 결정합니다.
    pub fn from_name(name: &str) -> Self {
        match name {
            "SERVICE" => Self::Service,
            "INPUT" => Self::Input,
            "FILTER" => Self::Filter,
            "OUTPUT" => Self::Output,
            "PARSER" => Self::Parser,
            "MULTILINE_PARSER" => Self::MultilineParser,
            OUTPUT_FILE_KIND => Self::OutputFile,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 네이티브 설정 섹션 하나
///
/// 생성 후 공유되거나 수정되지 않는 값 타입입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// 섹션 종류
    pub kind: Kind,
    /// 고유 키 집합 (키 순으로 렌더링)
    pub config: BTreeMap<String, String>,
    /// 순서가 의미를 갖는 키/값 목록 (삽입 순으로 `config` 뒤에 렌더링)
    pub ordered_config: Vec<(String, String)>,
}

impl Component {
    /// 빈 컴포넌트를 생성합니다.
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            config: BTreeMap::new(),
            ordered_config: Vec::new(),
        }
    }

    /// `config` 항목을 추가한 컴포넌트를 반환합니다.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// `ordered_config` 항목을 추가한 컴포넌트를 반환합니다.
    pub fn with_ordered(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_ordered(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.config.insert(key.into(), value.into());
    }

    pub fn push_ordered(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.ordered_config.push((key.into(), value.into()));
    }

    /// `config`에서 값을 조회합니다.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }

    /// 지정된 파일로 그대로 복사될 원시 출력 파일 컴포넌트를 생성합니다.
    pub fn output_file(filename: impl Into<String>, contents: impl Into<String>) -> Self {
        Self::new(Kind::OutputFile)
            .with(OUTPUT_FILE_NAME_KEY, filename)
            .with(OUTPUT_FILE_CONTENTS_KEY, contents)
    }

    /// 원시 출력 파일 컴포넌트의 (파일 이름, 내용)
    pub fn as_output_file(&self) -> Option<(&str, &str)> {
        if self.kind != Kind::OutputFile {
            return None;
        }
        Some((
            self.get(OUTPUT_FILE_NAME_KEY).unwrap_or_default(),
            self.get(OUTPUT_FILE_CONTENTS_KEY).unwrap_or_default(),
        ))
    }

    /// 값이 시작하는 열 너비 (가장 긴 키 길이)
    fn key_width(&self) -> usize {
        self.config
            .keys()
            .chain(self.ordered_config.iter().map(|(k, _)| k))
            .map(|k| k.len())
            .max()
            .unwrap_or(0)
    }

    /// 섹션 텍스트를 렌더링합니다. 결과는 항상 개행으로 끝납니다.
    pub fn render(&self) -> String {
        let width = self.key_width();
        let lines: Vec<String> = self
            .config
            .iter()
            .chain(self.ordered_config.iter().map(|(k, v)| (k, v)))
            .map(|(k, v)| format!("    {k:<width$} {v}"))
            .collect();
        format!("[{}]\n{}\n", self.kind, lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_align_to_longest_key() {
        let c = Component::new(Kind::Input)
            .with("A", "1")
            .with("ABCDEFGHIJ", "2");
        assert_eq!(
            c.render(),
            "[INPUT]\n    A          1\n    ABCDEFGHIJ 2\n"
        );
    }

    #[test]
    fn config_is_sorted_and_ordered_config_follows() {
        let c = Component::new(Kind::Filter)
            .with("Name", "parser")
            .with("Match", "p1.r1")
            .with_ordered("Parser", "b")
            .with_ordered("Parser", "a");
        assert_eq!(
            c.render(),
            "[FILTER]\n    Match  p1.r1\n    Name   parser\n    Parser b\n    Parser a\n"
        );
    }

    #[test]
    fn ordered_keys_participate_in_width() {
        let c = Component::new(Kind::MultilineParser)
            .with("name", "m")
            .with_ordered("flush_timeout_long", "1");
        let rendered = c.render();
        assert!(rendered.contains("    name               m\n"));
    }

    #[test]
    fn empty_component_renders_header_only() {
        let c = Component::new(Kind::Service);
        assert_eq!(c.render(), "[SERVICE]\n\n");
    }

    #[test]
    fn kind_round_trips_through_name() {
        for kind in [
            Kind::Service,
            Kind::Input,
            Kind::Filter,
            Kind::Output,
            Kind::Parser,
            Kind::MultilineParser,
            Kind::OutputFile,
        ] {
            assert_eq!(Kind::from_name(kind.as_str()), kind);
        }
        assert_eq!(Kind::from_name("BOGUS"), Kind::Other("BOGUS".to_owned()));
    }

    #[test]
    fn output_file_exposes_name_and_contents() {
        let c = Component::output_file("abc.lua", "function f() end");
        assert_eq!(c.as_output_file(), Some(("abc.lua", "function f() end")));
        assert_eq!(Component::new(Kind::Input).as_output_file(), None);
    }
}
