//! 파서 레지스트리 -- 내장 파서와 사용자 파서의 중복 없는 카탈로그
//!
//! 최종 PARSER 섹션 순서:
//! 1. 내장 파서 ([`BUILTIN_PARSERS`] 순서 고정)
//! 2. 파이프라인 컴포넌트에서 수집한 사용자 파서 (처음 등장한 순서)
//!
//! 사용자 파서 이름이 내장(예약) 이름이나 이미 등록된 이름과 같으면 에러입니다.

use std::collections::{BTreeMap, HashSet};

use opsforge_core::types::is_reserved;

use crate::component::{Component, Kind};
use crate::error::FluentBitError;

/// 파서 매칭 규칙
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserFormat {
    /// JSON 객체로 파싱
    Json,
    /// 명명된 캡처 그룹을 필드로 저장하는 정규식
    Regex(String),
}

/// 파서 정의
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserDefinition {
    /// 파서 이름 (FILTER에서 이름으로 참조)
    pub name: String,
    /// 매칭 규칙
    pub format: ParserFormat,
    /// 타임스탬프 필드 이름
    pub time_key: Option<String>,
    /// 타임스탬프 형식 (strptime)
    pub time_format: Option<String>,
    /// 필드 타입 변환 (`field:type`)
    pub types: BTreeMap<String, String>,
}

impl ParserDefinition {
    pub fn json(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: ParserFormat::Json,
            time_key: None,
            time_format: None,
            types: BTreeMap::new(),
        }
    }

    pub fn regex(name: impl Into<String>, regex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: ParserFormat::Regex(regex.into()),
            time_key: None,
            time_format: None,
            types: BTreeMap::new(),
        }
    }

    pub fn with_time(mut self, key: impl Into<String>, format: impl Into<String>) -> Self {
        self.time_key = Some(key.into());
        self.time_format = Some(format.into());
        self
    }

    /// PARSER 섹션 컴포넌트로 변환합니다.
    pub fn component(&self) -> Component {
        let mut c = Component::new(Kind::Parser).with("Name", self.name.as_str());
        match &self.format {
            ParserFormat::Json => c.set("Format", "json"),
            ParserFormat::Regex(regex) => {
                c.set("Format", "regex");
                c.set("Regex", regex.as_str());
            }
        }
        if let Some(key) = &self.time_key {
            c.set("Time_Key", key.as_str());
        }
        if let Some(format) = &self.time_format {
            c.set("Time_Format", format.as_str());
        }
        if !self.types.is_empty() {
            // BTreeMap 순회 -- 타입 목록은 필드 이름순이어야 출력이 결정적입니다.
            let types: Vec<String> = self
                .types
                .iter()
                .map(|(field, ty)| format!("{field}:{ty}"))
                .collect();
            c.set("Types", types.join(" "));
        }
        c
    }
}

/// 내장 파서 (이름, 정규식, Time_Key, Time_Format)
pub const BUILTIN_PARSERS: [(&str, &str, Option<(&str, &str)>); 8] = [
    ("lib:default_message_parser", r"^(?<message>.*)$", None),
    (
        "lib:apache",
        r#"^(?<host>[^ ]*) [^ ]* (?<user>[^ ]*) \[(?<time>[^\]]*)\] "(?<method>\S+)(?: +(?<path>[^\"]*?)(?: +\S*)?)?" (?<code>[^ ]*) (?<size>[^ ]*)(?: "(?<referer>[^\"]*)" "(?<agent>[^\"]*)")?$"#,
        Some(("time", "%d/%b/%Y:%H:%M:%S %z")),
    ),
    (
        "lib:apache2",
        r#"^(?<host>[^ ]*) [^ ]* (?<user>[^ ]*) \[(?<time>[^\]]*)\] "(?<method>\S+)(?: +(?<path>[^ ]*) +\S*)?" (?<code>[^ ]*) (?<size>[^ ]*)(?: "(?<referer>[^\"]*)" "(?<agent>.*)")?$"#,
        Some(("time", "%d/%b/%Y:%H:%M:%S %z")),
    ),
    (
        "lib:apache_error",
        r"^\[[^ ]* (?<time>[^\]]*)\] \[(?<level>[^\]]*)\](?: \[pid (?<pid>[^\]]*)\])?( \[client (?<client>[^\]]*)\])? (?<message>.*)$",
        None,
    ),
    (
        "lib:mongodb",
        r"^(?<time>[^ ]*)\s+(?<severity>\w)\s+(?<component>[^ ]+)\s+\[(?<context>[^\]]+)]\s+(?<message>.*?) *(?<ms>(\d+))?(:?ms)?$",
        Some(("time", "%Y-%m-%dT%H:%M:%S.%L")),
    ),
    (
        "lib:nginx",
        r#"^(?<remote>[^ ]*) (?<host>[^ ]*) (?<user>[^ ]*) \[(?<time>[^\]]*)\] "(?<method>\S+)(?: +(?<path>[^\"]*?)(?: +\S*)?)?" (?<code>[^ ]*) (?<size>[^ ]*)(?: "(?<referer>[^\"]*)" "(?<agent>[^\"]*)")"#,
        Some(("time", "%d/%b/%Y:%H:%M:%S %z")),
    ),
    (
        "lib:syslog-rfc5424",
        r"^\<(?<pri>[0-9]{1,5})\>1 (?<time>[^ ]+) (?<host>[^ ]+) (?<ident>[^ ]+) (?<pid>[-0-9]+) (?<msgid>[^ ]+) (?<extradata>(\[(.*?)\]|-)) (?<message>.+)$",
        Some(("time", "%Y-%m-%dT%H:%M:%S.%L%Z")),
    ),
    (
        "lib:syslog-rfc3164",
        r"/^\<(?<pri>[0-9]+)\>(?<time>[^ ]* {1,2}[^ ]* [^ ]*) (?<host>[^ ]*) (?<ident>[a-zA-Z0-9_\/\.\-]*)(?:\[(?<pid>[0-9]+)\])?(?:[^\:]*\:)? *(?<message>.*)$/",
        Some(("time", "%b %d %H:%M:%S")),
    ),
];

/// 내장 파서 정의 목록 (고정 순서)
pub fn builtin_parsers() -> Vec<ParserDefinition> {
    BUILTIN_PARSERS
        .iter()
        .map(|(name, regex, time)| {
            let def = ParserDefinition::regex(*name, *regex);
            match time {
                Some((key, format)) => def.with_time(*key, *format),
                None => def,
            }
        })
        .collect()
}

/// 이름이 내장 파서인지 확인합니다.
pub fn is_builtin_parser(name: &str) -> bool {
    BUILTIN_PARSERS.iter().any(|(builtin, _, _)| *builtin == name)
}

/// 파서 카탈로그
///
/// 컴파일 실행마다 새로 생성되며 실행 간에 공유되지 않습니다.
#[derive(Debug, Clone)]
pub struct ParserRegistry {
    builtins: Vec<Component>,
    user: Vec<Component>,
    names: HashSet<String>,
}

impl ParserRegistry {
    /// 내장 파서가 미리 등록된 레지스트리를 생성합니다.
    pub fn new() -> Self {
        let builtins: Vec<Component> = builtin_parsers()
            .iter()
            .map(ParserDefinition::component)
            .collect();
        let names = BUILTIN_PARSERS
            .iter()
            .map(|(name, _, _)| (*name).to_owned())
            .collect();
        Self {
            builtins,
            user: Vec::new(),
            names,
        }
    }

    /// 사용자 PARSER 컴포넌트를 등록합니다.
    pub fn register(&mut self, parser: Component) -> Result<(), FluentBitError> {
        let name = parser
            .get("Name")
            .filter(|n| !n.is_empty())
            .ok_or(FluentBitError::EmptyParserName)?
            .to_owned();
        if is_reserved(&name) || !self.names.insert(name.clone()) {
            return Err(FluentBitError::ParserCollision { name });
        }
        self.user.push(parser);
        Ok(())
    }

    /// 사용자 파서 수
    pub fn user_count(&self) -> usize {
        self.user.len()
    }

    /// 등록된 이름인지 확인합니다.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// 최종 PARSER 목록 (내장 → 사용자)
    pub fn into_components(self) -> Vec<Component> {
        let mut out = self.builtins;
        out.extend(self.user);
        out
    }

    /// 컴포넌트 목록에서 PARSER를 추출해 레지스트리 순서로 재배치합니다.
    ///
    /// PARSER가 아닌 컴포넌트는 원래 순서를 유지하며, 파서는 목록 끝에
    /// 내장 파서 → 사용자 파서 순으로 붙습니다.
    pub fn deduplicate(components: Vec<Component>) -> Result<Vec<Component>, FluentBitError> {
        let mut registry = Self::new();
        let mut others = Vec::with_capacity(components.len());
        for component in components {
            if component.kind == Kind::Parser {
                registry.register(component)?;
            } else {
                others.push(component);
            }
        }
        tracing::debug!(
            builtin = BUILTIN_PARSERS.len(),
            user = registry.user_count(),
            "collected parser definitions"
        );
        others.extend(registry.into_components());
        Ok(others)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_come_first_in_fixed_order() {
        let registry = ParserRegistry::new();
        let names: Vec<String> = registry
            .into_components()
            .iter()
            .map(|c| c.get("Name").unwrap().to_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "lib:default_message_parser",
                "lib:apache",
                "lib:apache2",
                "lib:apache_error",
                "lib:mongodb",
                "lib:nginx",
                "lib:syslog-rfc5424",
                "lib:syslog-rfc3164",
            ]
        );
    }

    #[test]
    fn user_parsers_follow_in_encounter_order() {
        let mut registry = ParserRegistry::new();
        registry
            .register(ParserDefinition::json("p2.r2.0").component())
            .unwrap();
        registry
            .register(ParserDefinition::json("p1.r1.0").component())
            .unwrap();
        let components = registry.into_components();
        let tail: Vec<&str> = components[8..]
            .iter()
            .map(|c| c.get("Name").unwrap())
            .collect();
        assert_eq!(tail, vec!["p2.r2.0", "p1.r1.0"]);
    }

    #[test]
    fn registering_same_user_name_twice_collides() {
        let mut registry = ParserRegistry::new();
        registry
            .register(ParserDefinition::json("p1.r1.0").component())
            .unwrap();
        let err = registry
            .register(ParserDefinition::json("p1.r1.0").component())
            .unwrap_err();
        assert_eq!(
            err,
            FluentBitError::ParserCollision {
                name: "p1.r1.0".to_owned()
            }
        );
    }

    #[test]
    fn reserved_names_collide() {
        let mut registry = ParserRegistry::new();
        let err = registry
            .register(ParserDefinition::json("lib:apache").component())
            .unwrap_err();
        assert!(matches!(err, FluentBitError::ParserCollision { .. }));

        let err = registry
            .register(ParserDefinition::json("lib:not_builtin").component())
            .unwrap_err();
        assert!(matches!(err, FluentBitError::ParserCollision { .. }));
    }

    #[test]
    fn nameless_parser_is_rejected() {
        let mut registry = ParserRegistry::new();
        let err = registry
            .register(Component::new(Kind::Parser).with("Format", "json"))
            .unwrap_err();
        assert_eq!(err, FluentBitError::EmptyParserName);
    }

    #[test]
    fn definition_renders_time_and_types() {
        let mut def = ParserDefinition::regex("x", "^(?<a>.*)$").with_time("time", "%s");
        def.types.insert("b".to_owned(), "integer".to_owned());
        def.types.insert("a".to_owned(), "float".to_owned());
        let c = def.component();
        assert_eq!(c.get("Format"), Some("regex"));
        assert_eq!(c.get("Time_Key"), Some("time"));
        assert_eq!(c.get("Types"), Some("a:float b:integer"));
    }

    #[test]
    fn deduplicate_moves_parsers_after_other_components() {
        let components = vec![
            ParserDefinition::json("p.r.0").component(),
            Component::new(Kind::Input).with("Name", "tail"),
        ];
        let out = ParserRegistry::deduplicate(components).unwrap();
        assert_eq!(out[0].kind, Kind::Input);
        assert_eq!(out.len(), 1 + 8 + 1);
        assert_eq!(out.last().unwrap().get("Name"), Some("p.r.0"));
    }

    #[test]
    fn builtin_lookup() {
        assert!(is_builtin_parser("lib:nginx"));
        assert!(!is_builtin_parser("lib:unknown"));
        assert!(ParserRegistry::new().contains("lib:mongodb"));
    }
}
