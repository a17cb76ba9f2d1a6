//! 모듈형 설정 직렬화 -- 모든 컴포넌트를 백엔드 파일 레이아웃으로 렌더링
//!
//! 출력 규칙:
//! - 변수는 이름순 `@SET name=value` 블록과 빈 줄로 주 파일 맨 앞에 렌더링
//! - SERVICE, INPUT, FILTER, OUTPUT 순으로 주 파일에 렌더링 (종류 내에서는 생성 순서 유지)
//! - PARSER, MULTILINE_PARSER 순으로 파서 파일에 렌더링
//! - 원시 출력 파일 컴포넌트는 지정된 파일 이름으로 그대로 복사
//! - 인식되지 않는 종류가 하나라도 있으면 전체 목록과 함께 실패

use std::collections::{BTreeMap, BTreeSet};

use opsforge_core::metrics as m;

use crate::component::{Component, Kind};
use crate::error::FluentBitError;

/// 주 설정 파일 이름
pub const MAIN_CONFIG_FILE_NAME: &str = "fluent_bit_main.conf";

/// 파서 설정 파일 이름
pub const PARSER_CONFIG_FILE_NAME: &str = "fluent_bit_parser.conf";

/// 버퍼 디렉토리 변수 이름 (`${buffers_dir}`)
pub const BUFFERS_DIR_VARIABLE: &str = "buffers_dir";

/// 에이전트 로그 디렉토리 변수 이름 (`${logs_dir}`)
pub const LOGS_DIR_VARIABLE: &str = "logs_dir";

const MAIN_KINDS: [Kind; 4] = [Kind::Service, Kind::Input, Kind::Filter, Kind::Output];
const PARSER_KINDS: [Kind; 2] = [Kind::Parser, Kind::MultilineParser];

/// 한 번의 컴파일에서 생성된 변수와 컴포넌트 전체
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModularConfig {
    /// 파일 수준 매크로 (`@SET`)
    pub variables: BTreeMap<String, String>,
    /// 모든 파이프라인 인스턴스의 컴포넌트 (생성 순서)
    pub components: Vec<Component>,
}

impl ModularConfig {
    pub fn new(variables: BTreeMap<String, String>, components: Vec<Component>) -> Self {
        Self {
            variables,
            components,
        }
    }

    /// 파일 이름 → 렌더링된 텍스트 매핑을 생성합니다.
    pub fn generate(self) -> Result<BTreeMap<String, String>, FluentBitError> {
        let mut files: BTreeMap<String, String> = BTreeMap::new();
        let mut sections_by_kind: BTreeMap<Kind, Vec<String>> = BTreeMap::new();
        let mut unknown: BTreeSet<String> = BTreeSet::new();

        for component in &self.components {
            match &component.kind {
                Kind::OutputFile => {
                    let (filename, contents) = component.as_output_file().unwrap_or_default();
                    if let Some(existing) = files.get(filename) {
                        if existing != contents {
                            return Err(FluentBitError::ConflictingOutputFile {
                                filename: filename.to_owned(),
                            });
                        }
                        continue;
                    }
                    files.insert(filename.to_owned(), contents.to_owned());
                }
                Kind::Other(name) => {
                    unknown.insert(name.clone());
                }
                kind => {
                    sections_by_kind
                        .entry(kind.clone())
                        .or_default()
                        .push(component.render());
                }
            }
        }

        if !unknown.is_empty() {
            return Err(FluentBitError::UnknownSections {
                kinds: unknown.into_iter().collect(),
            });
        }

        for (kind, sections) in &sections_by_kind {
            metrics::counter!(
                m::COMPONENTS_EMITTED_TOTAL,
                m::LABEL_BACKEND => "fluent-bit",
                m::LABEL_KIND => kind.as_str().to_owned()
            )
            .increment(sections.len() as u64);
        }

        // BTreeMap 순회 -- 변수 블록은 이름순으로 렌더링되어야 출력이 결정적입니다.
        let mut main_parts: Vec<String> = self
            .variables
            .iter()
            .map(|(name, value)| format!("@SET {name}={value}"))
            .collect();
        // 변수 블록과 첫 섹션 사이의 빈 줄. 변수가 없으면 파일은 첫 섹션으로 시작합니다.
        if !main_parts.is_empty() {
            main_parts.push(String::new());
        }
        for kind in &MAIN_KINDS {
            main_parts.extend(sections_by_kind.remove(kind).unwrap_or_default());
        }

        let mut parser_parts: Vec<String> = Vec::new();
        for kind in &PARSER_KINDS {
            parser_parts.extend(sections_by_kind.remove(kind).unwrap_or_default());
        }

        tracing::debug!(
            components = self.components.len(),
            raw_files = files.len(),
            "rendered log backend configuration"
        );

        files.insert(MAIN_CONFIG_FILE_NAME.to_owned(), main_parts.join("\n"));
        files.insert(PARSER_CONFIG_FILE_NAME.to_owned(), parser_parts.join("\n"));
        Ok(files)
    }
}
