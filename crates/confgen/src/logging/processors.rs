//! 로그 프로세서 -- parse_json, parse_regex, parse_multiline, exclude_logs, modify_fields, 내장 파서

use std::collections::BTreeMap;

use serde::Deserialize;

use opsforge_core::error::CompileError;
use opsforge_core::types::ComponentRole;
use opsforge_fluentbit::filters::{self, DEFAULT_PARSE_KEY, ModifyOp, MultilineRule};
use opsforge_fluentbit::{Component, ParserDefinition, PipelineTag};
use opsforge_otel::{self as otel, component::ottl_quote};

use crate::capability::{FluentBitProcessor, LoggingProcessor, OtelProcessor};
use crate::logging::multiline::{LANGUAGE_EXCEPTIONS, SUPPORTED_LANGUAGES, language_rules};
use crate::model::invalid_logging;

/// 파서 `Types`에 허용되는 타입 이름
const FIELD_TYPES: [&str; 5] = ["string", "integer", "bool", "float", "hex"];

fn body(field: &str) -> String {
    format!("body[{}]", ottl_quote(field))
}

/// 파싱 결과를 본문에 합치는 OTTL 문장 (fluent-bit의 nest → parser → merge 체인과 같은 효과)
fn parse_statements(
    field: &str,
    extract: &str,
    time_key: Option<&str>,
    time_format: Option<&str>,
) -> Vec<String> {
    let source = body(field);
    let mut statements = vec![
        format!(r#"set(cache["parsed"], {extract}) where IsString({source})"#),
        format!(r#"delete_key(body, {}) where cache["parsed"] != nil"#, ottl_quote(field)),
        r#"merge_maps(body, cache["parsed"], "upsert") where cache["parsed"] != nil"#.to_owned(),
    ];
    if let (Some(key), Some(format)) = (time_key, time_format) {
        let time_field = body(key);
        statements.push(format!(
            "set(time, Time({time_field}, {})) where {time_field} != nil",
            ottl_quote(format)
        ));
    }
    statements
}

fn validate_types(id: &str, types: &BTreeMap<String, String>) -> Result<(), CompileError> {
    for (field, ty) in types {
        if !FIELD_TYPES.contains(&ty.as_str()) {
            return Err(invalid_logging(
                ComponentRole::Processor,
                id,
                "types",
                &format!(
                    "field {field:?} has type {ty:?} which is not one of [{}]",
                    FIELD_TYPES.join(", ")
                ),
            ));
        }
    }
    Ok(())
}

// ─── parse_json ─────────────────────────────────────────────────────

/// `parse_json` 프로세서
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParseJson {
    /// 파싱할 필드 (기본 `message`)
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub time_key: Option<String>,
    #[serde(default)]
    pub time_format: Option<String>,
}

impl ParseJson {
    fn field(&self) -> &str {
        self.field.as_deref().unwrap_or(DEFAULT_PARSE_KEY)
    }
}

impl LoggingProcessor for ParseJson {
    fn type_name(&self) -> &'static str {
        "parse_json"
    }

    fn as_fluent_bit(&self) -> Option<&dyn FluentBitProcessor> {
        Some(self)
    }

    fn as_otel(&self) -> Option<&dyn OtelProcessor> {
        Some(self)
    }
}

impl FluentBitProcessor for ParseJson {
    fn components(&self, tag: &PipelineTag, uid: &str) -> Vec<Component> {
        let mut parser = ParserDefinition::json(uid);
        parser.time_key = self.time_key.clone();
        parser.time_format = self.time_format.clone();

        let mut out = vec![parser.component()];
        out.extend(filters::parse_chain(
            &tag.routing,
            self.field.as_deref(),
            &[uid.to_owned()],
            false,
        ));
        out
    }
}

impl OtelProcessor for ParseJson {
    fn processors(&self) -> Vec<otel::Component> {
        let extract = format!("ParseJSON({})", body(self.field()));
        vec![otel::component::transform(
            "log",
            "log",
            &parse_statements(
                self.field(),
                &extract,
                self.time_key.as_deref(),
                self.time_format.as_deref(),
            ),
        )]
    }
}

// ─── parse_regex ────────────────────────────────────────────────────

/// `parse_regex` 프로세서
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParseRegex {
    #[serde(default)]
    pub field: Option<String>,
    /// 명명된 캡처 그룹 `(?<name>...)`이 필드가 되는 정규식
    pub regex: String,
    #[serde(default)]
    pub time_key: Option<String>,
    #[serde(default)]
    pub time_format: Option<String>,
    /// 필드 타입 변환 (`integer`, `float`, ...)
    #[serde(default)]
    pub types: BTreeMap<String, String>,
}

impl ParseRegex {
    pub fn validate(&self, id: &str) -> Result<(), CompileError> {
        if self.regex.trim().is_empty() {
            return Err(invalid_logging(
                ComponentRole::Processor,
                id,
                "regex",
                "must not be empty",
            ));
        }
        validate_types(id, &self.types)
    }

    fn field(&self) -> &str {
        self.field.as_deref().unwrap_or(DEFAULT_PARSE_KEY)
    }

    fn definition(&self, name: &str) -> ParserDefinition {
        let mut parser = ParserDefinition::regex(name, self.regex.as_str());
        parser.time_key = self.time_key.clone();
        parser.time_format = self.time_format.clone();
        parser.types = self.types.clone();
        parser
    }
}

impl LoggingProcessor for ParseRegex {
    fn type_name(&self) -> &'static str {
        "parse_regex"
    }

    fn as_fluent_bit(&self) -> Option<&dyn FluentBitProcessor> {
        Some(self)
    }

    fn as_otel(&self) -> Option<&dyn OtelProcessor> {
        Some(self)
    }
}

impl FluentBitProcessor for ParseRegex {
    fn components(&self, tag: &PipelineTag, uid: &str) -> Vec<Component> {
        let mut out = vec![self.definition(uid).component()];
        out.extend(filters::parse_chain(
            &tag.routing,
            self.field.as_deref(),
            &[uid.to_owned()],
            false,
        ));
        out
    }
}

impl OtelProcessor for ParseRegex {
    fn processors(&self) -> Vec<otel::Component> {
        // 컬렉터 정규식 엔진은 `(?P<name>...)` 명명 그룹만 인식
        let regex = self.regex.replace("(?<", "(?P<");
        let extract = format!(
            "ExtractPatterns({}, {})",
            body(self.field()),
            ottl_quote(&regex)
        );
        vec![otel::component::transform(
            "log",
            "log",
            &parse_statements(
                self.field(),
                &extract,
                self.time_key.as_deref(),
                self.time_format.as_deref(),
            ),
        )]
    }
}

// ─── parse_multiline ────────────────────────────────────────────────

/// multiline 규칙 그룹
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MultilineGroup {
    #[serde(rename = "type")]
    pub group_type: String,
    pub language: String,
}

/// `parse_multiline` 프로세서
///
/// tail 리시버 뒤에 오면 입력 단계로 병합되고, 그 외에는 multiline FILTER로 생성됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParseMultiline {
    pub match_any: Vec<MultilineGroup>,
}

impl ParseMultiline {
    /// 언어 목록으로 프로세서를 만듭니다.
    pub fn for_languages(languages: &[&str]) -> Self {
        Self {
            match_any: languages
                .iter()
                .map(|language| MultilineGroup {
                    group_type: LANGUAGE_EXCEPTIONS.to_owned(),
                    language: (*language).to_owned(),
                })
                .collect(),
        }
    }

    pub fn validate(&self, id: &str) -> Result<(), CompileError> {
        if self.match_any.is_empty() {
            return Err(invalid_logging(
                ComponentRole::Processor,
                id,
                "match_any",
                "at least one rule group is required",
            ));
        }
        for group in &self.match_any {
            if group.group_type != LANGUAGE_EXCEPTIONS {
                return Err(invalid_logging(
                    ComponentRole::Processor,
                    id,
                    "match_any.type",
                    &format!(
                        "{:?} is not one of [{LANGUAGE_EXCEPTIONS}]",
                        group.group_type
                    ),
                ));
            }
            if language_rules(&group.language).is_none() {
                return Err(invalid_logging(
                    ComponentRole::Processor,
                    id,
                    "match_any.language",
                    &format!(
                        "{:?} is not one of [{}]",
                        group.language,
                        SUPPORTED_LANGUAGES.join(", ")
                    ),
                ));
            }
        }
        Ok(())
    }

    /// 모든 그룹의 규칙을 선언 순서대로 합칩니다.
    pub fn combined_rules(&self) -> Vec<MultilineRule> {
        self.match_any
            .iter()
            .filter_map(|group| language_rules(&group.language))
            .flatten()
            .collect()
    }
}

impl LoggingProcessor for ParseMultiline {
    fn type_name(&self) -> &'static str {
        "parse_multiline"
    }

    fn as_fluent_bit(&self) -> Option<&dyn FluentBitProcessor> {
        Some(self)
    }

    fn multiline_rules(&self) -> Option<Vec<MultilineRule>> {
        Some(self.combined_rules())
    }
}

impl FluentBitProcessor for ParseMultiline {
    fn components(&self, tag: &PipelineTag, uid: &str) -> Vec<Component> {
        let parser_name = format!("multiline.{uid}");
        vec![
            filters::multiline_parser(&parser_name, &self.combined_rules()),
            filters::multiline_filter(&tag.routing, &parser_name),
        ]
    }
}

// ─── exclude_logs ───────────────────────────────────────────────────

/// 제외 규칙 하나 -- 필드 값이 정규식에 매칭되면 레코드를 버림
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExcludeRule {
    pub field: String,
    pub regex: String,
}

/// `exclude_logs` 프로세서 (규칙 중 하나라도 매칭되면 제외)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExcludeLogs {
    pub match_any: Vec<ExcludeRule>,
}

impl ExcludeLogs {
    pub fn validate(&self, id: &str) -> Result<(), CompileError> {
        if self.match_any.is_empty() {
            return Err(invalid_logging(
                ComponentRole::Processor,
                id,
                "match_any",
                "at least one rule is required",
            ));
        }
        for rule in &self.match_any {
            if rule.field.trim().is_empty() || rule.regex.is_empty() {
                return Err(invalid_logging(
                    ComponentRole::Processor,
                    id,
                    "match_any",
                    "every rule needs a non-empty field and regex",
                ));
            }
        }
        Ok(())
    }
}

impl LoggingProcessor for ExcludeLogs {
    fn type_name(&self) -> &'static str {
        "exclude_logs"
    }

    fn as_fluent_bit(&self) -> Option<&dyn FluentBitProcessor> {
        Some(self)
    }
}

impl FluentBitProcessor for ExcludeLogs {
    fn components(&self, tag: &PipelineTag, _uid: &str) -> Vec<Component> {
        let rules: Vec<(String, String)> = self
            .match_any
            .iter()
            .map(|r| (r.field.clone(), r.regex.clone()))
            .collect();
        vec![filters::exclude_filter(&tag.routing, &rules)]
    }
}

// ─── modify_fields ──────────────────────────────────────────────────

/// 필드 하나에 대한 수정
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldModification {
    /// 다른 필드를 이 이름으로 옮김
    #[serde(default)]
    pub move_from: Option<String>,
    /// 다른 필드를 이 이름으로 복사
    #[serde(default)]
    pub copy_from: Option<String>,
    /// 항상 이 값으로 설정
    #[serde(default)]
    pub static_value: Option<String>,
    /// 필드가 없을 때만 이 값으로 설정
    #[serde(default)]
    pub default_value: Option<String>,
    /// 값 치환표
    #[serde(default)]
    pub map_values: BTreeMap<String, String>,
    /// 필드 삭제
    #[serde(default)]
    pub remove: bool,
}

impl FieldModification {
    fn source_count(&self) -> usize {
        [
            self.move_from.is_some(),
            self.copy_from.is_some(),
            self.static_value.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }
}

/// `modify_fields` 프로세서
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModifyFields {
    pub fields: BTreeMap<String, FieldModification>,
}

impl ModifyFields {
    pub fn validate(&self, id: &str) -> Result<(), CompileError> {
        if self.fields.is_empty() {
            return Err(invalid_logging(
                ComponentRole::Processor,
                id,
                "fields",
                "at least one field is required",
            ));
        }
        for (name, m) in &self.fields {
            if m.source_count() > 1 {
                return Err(invalid_logging(
                    ComponentRole::Processor,
                    id,
                    "fields",
                    &format!(
                        "field {name:?} may set only one of move_from, copy_from and static_value"
                    ),
                ));
            }
            let has_other = m.source_count() > 0
                || m.default_value.is_some()
                || !m.map_values.is_empty();
            if m.remove && has_other {
                return Err(invalid_logging(
                    ComponentRole::Processor,
                    id,
                    "fields",
                    &format!("field {name:?} cannot be removed and modified at once"),
                ));
            }
        }
        Ok(())
    }

    /// 연산 순서: 복사 → 이동 → 고정값 → 기본값 → 삭제
    ///
    /// 복사를 먼저 해야 같은 원본을 옮기는 다른 필드가 있어도 값을 읽을 수 있습니다.
    fn ops(&self) -> Vec<ModifyOp> {
        // BTreeMap 순회 -- 같은 단계 안에서는 필드 이름순이어야 출력이 결정적입니다.
        let fields = &self.fields;
        let mut ops = Vec::new();
        ops.extend(fields.iter().filter_map(|(name, m)| {
            m.copy_from
                .as_ref()
                .map(|src| ModifyOp::HardCopy(src.clone(), name.clone()))
        }));
        ops.extend(fields.iter().filter_map(|(name, m)| {
            m.move_from
                .as_ref()
                .map(|src| ModifyOp::HardRename(src.clone(), name.clone()))
        }));
        ops.extend(fields.iter().filter_map(|(name, m)| {
            m.static_value
                .as_ref()
                .map(|v| ModifyOp::Set(name.clone(), v.clone()))
        }));
        ops.extend(fields.iter().filter_map(|(name, m)| {
            m.default_value
                .as_ref()
                .map(|v| ModifyOp::Add(name.clone(), v.clone()))
        }));
        ops.extend(
            fields
                .iter()
                .filter(|(_, m)| m.remove)
                .map(|(name, _)| ModifyOp::Remove(name.clone())),
        );
        ops
    }
}

impl LoggingProcessor for ModifyFields {
    fn type_name(&self) -> &'static str {
        "modify_fields"
    }

    fn as_fluent_bit(&self) -> Option<&dyn FluentBitProcessor> {
        Some(self)
    }
}

impl FluentBitProcessor for ModifyFields {
    fn components(&self, tag: &PipelineTag, _uid: &str) -> Vec<Component> {
        let mut out = Vec::new();
        let ops = self.ops();
        if !ops.is_empty() {
            out.push(filters::modify_filter(&tag.routing, &ops));
        }
        for (name, m) in &self.fields {
            for (from, to) in &m.map_values {
                out.push(filters::conditional_modify(
                    &tag.routing,
                    &format!("Key_value_equals {name} {from}"),
                    &ModifyOp::Set(name.clone(), to.clone()),
                ));
            }
        }
        out
    }
}

// ─── 내장 파서 ──────────────────────────────────────────────────────

/// 예약 이름으로 참조하는 내장 파서 프로세서 (예: `lib:apache`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinParser {
    pub name: String,
}

impl LoggingProcessor for BuiltinParser {
    fn type_name(&self) -> &'static str {
        "builtin_parser"
    }

    fn as_fluent_bit(&self) -> Option<&dyn FluentBitProcessor> {
        Some(self)
    }
}

impl FluentBitProcessor for BuiltinParser {
    fn components(&self, tag: &PipelineTag, _uid: &str) -> Vec<Component> {
        vec![filters::parser_filter(
            &tag.routing,
            DEFAULT_PARSE_KEY,
            &[self.name.clone()],
            false,
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsforge_fluentbit::Kind;

    fn tag() -> PipelineTag {
        PipelineTag::for_instance("p1", "r1", false)
    }

    #[test]
    fn parse_json_emits_parser_and_chain() {
        let p = ParseJson {
            time_key: Some("time".to_owned()),
            time_format: Some("%Y-%m-%dT%H:%M:%S".to_owned()),
            ..Default::default()
        };
        let components = p.components(&tag(), "p1.r1.0");
        assert_eq!(components[0].kind, Kind::Parser);
        assert_eq!(components[0].get("Name"), Some("p1.r1.0"));
        assert_eq!(components[0].get("Format"), Some("json"));
        assert_eq!(components[0].get("Time_Key"), Some("time"));

        let parser_filter = components
            .iter()
            .find(|c| c.get("Name") == Some("parser"))
            .unwrap();
        assert_eq!(parser_filter.get("Key_Name"), Some("message"));
        assert_eq!(parser_filter.get("Match"), Some("p1.r1"));
    }

    #[test]
    fn parse_regex_custom_field_and_types() {
        let p = ParseRegex {
            field: Some("raw".to_owned()),
            regex: r"^(?<a>\d+)$".to_owned(),
            types: BTreeMap::from([("a".to_owned(), "integer".to_owned())]),
            ..Default::default()
        };
        let components = p.components(&tag(), "u");
        assert_eq!(components[0].get("Regex"), Some(r"^(?<a>\d+)$"));
        assert_eq!(components[0].get("Types"), Some("a:integer"));
        assert!(components.iter().any(|c| c.get("Key_Name") == Some("raw")));
    }

    #[test]
    fn parse_regex_otel_uses_named_groups_the_collector_understands() {
        let p = ParseRegex {
            regex: r"^(?<level>\w+) (?<message>.*)$".to_owned(),
            ..Default::default()
        };
        let processors = p.processors();
        let statements = processors[0].config["log_statements"][0]["statements"].clone();
        let first = statements[0].as_str().unwrap();
        assert!(first.contains("ExtractPatterns"));
        assert!(first.contains("(?P<level>"));
        assert!(!first.contains("(?<level>"));
    }

    #[test]
    fn parse_regex_requires_regex() {
        let p = ParseRegex::default();
        assert!(p.validate("x").is_err());
    }

    #[test]
    fn parse_regex_rejects_unknown_types() {
        let p = ParseRegex {
            regex: "(?<a>.*)".to_owned(),
            types: BTreeMap::from([("a".to_owned(), "decimal".to_owned())]),
            ..Default::default()
        };
        assert!(p.validate("x").unwrap_err().to_string().contains("decimal"));
    }

    #[test]
    fn multiline_standalone_emits_parser_and_filter() {
        let p = ParseMultiline::for_languages(&["java", "python"]);
        let components = p.components(&tag(), "p1.r1.2");
        assert_eq!(components[0].kind, Kind::MultilineParser);
        assert_eq!(components[0].get("name"), Some("multiline.p1.r1.2"));
        assert_eq!(components[1].get("multiline.parser"), Some("multiline.p1.r1.2"));
        assert_eq!(
            p.combined_rules().len(),
            language_rules("java").unwrap().len() + language_rules("python").unwrap().len()
        );
    }

    #[test]
    fn multiline_validation() {
        assert!(ParseMultiline::default().validate("m").is_err());
        assert!(ParseMultiline::for_languages(&["go"]).validate("m").is_ok());
        let err = ParseMultiline::for_languages(&["ruby"]).validate("m").unwrap_err();
        assert!(err.to_string().contains("ruby"));
    }

    #[test]
    fn exclude_logs_uses_or_for_several_rules() {
        let p = ExcludeLogs {
            match_any: vec![
                ExcludeRule {
                    field: "severity".to_owned(),
                    regex: "^DEBUG$".to_owned(),
                },
                ExcludeRule {
                    field: "message".to_owned(),
                    regex: "healthz".to_owned(),
                },
            ],
        };
        let c = &p.components(&tag(), "u")[0];
        assert_eq!(c.get("Name"), Some("grep"));
        assert_eq!(c.get("Logical_Op"), Some("or"));
        let rendered = c.render();
        assert!(rendered.find("severity ^DEBUG$").unwrap() < rendered.find("message healthz").unwrap());
    }

    #[test]
    fn modify_fields_orders_operations() {
        let p = ModifyFields {
            fields: BTreeMap::from([
                (
                    "a".to_owned(),
                    FieldModification {
                        move_from: Some("old_a".to_owned()),
                        ..Default::default()
                    },
                ),
                (
                    "b".to_owned(),
                    FieldModification {
                        copy_from: Some("old_a".to_owned()),
                        ..Default::default()
                    },
                ),
                (
                    "c".to_owned(),
                    FieldModification {
                        remove: true,
                        ..Default::default()
                    },
                ),
                (
                    "d".to_owned(),
                    FieldModification {
                        default_value: Some("x".to_owned()),
                        map_values: BTreeMap::from([("1".to_owned(), "one".to_owned())]),
                        ..Default::default()
                    },
                ),
            ]),
        };
        let components = p.components(&tag(), "u");
        assert_eq!(components.len(), 2);
        let rendered = components[0].render();
        let copy = rendered.find("Hard_copy").unwrap();
        let rename = rendered.find("Hard_rename").unwrap();
        let add = rendered.find("Add").unwrap();
        let remove = rendered.find("Remove").unwrap();
        assert!(copy < rename && rename < add && add < remove);
        assert_eq!(components[1].get("Condition"), Some("Key_value_equals d 1"));
        assert_eq!(components[1].get("Set"), Some("d one"));
    }

    #[test]
    fn modify_fields_rejects_conflicting_sources() {
        let p = ModifyFields {
            fields: BTreeMap::from([(
                "a".to_owned(),
                FieldModification {
                    move_from: Some("x".to_owned()),
                    static_value: Some("y".to_owned()),
                    ..Default::default()
                },
            )]),
        };
        assert!(p.validate("m").is_err());
    }

    #[test]
    fn builtin_parser_references_reserved_name() {
        let p = BuiltinParser {
            name: "lib:apache".to_owned(),
        };
        let c = &p.components(&tag(), "u")[0];
        assert!(c.render().contains("lib:apache"));
        assert!(p.as_otel().is_none());
    }
}
