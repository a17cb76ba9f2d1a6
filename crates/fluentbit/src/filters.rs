//! FILTER 섹션 빌더 -- parser, lua, modify, grep, multiline
//!
//! lua 필터의 스크립트는 원시 출력 파일 컴포넌트로 함께 생성되며,
//! 파일 이름은 스크립트 내용의 해시(`<hash>.lua`)라 같은 스크립트는 하나의 파일로 합쳐집니다.

use crate::component::{Component, Kind};
use crate::tag::content_hash;

/// 파싱 대상 필드 기본값
pub const DEFAULT_PARSE_KEY: &str = "message";

/// 파싱 전 원본 레코드를 임시 키 아래로 옮기는 lua 함수
pub const PARSER_NEST_FUNCTION: &str = "parser_nest";

/// 파싱 결과와 임시 키 아래 원본 레코드를 다시 합치는 lua 함수
pub const PARSER_MERGE_FUNCTION: &str = "parser_merge_record";

/// 동적 태그의 클라이언트 접미사를 로그 이름에 붙이는 lua 함수
pub const ADD_LOG_NAME_FUNCTION: &str = "add_log_name";

/// multiline 파서가 tail 입력에서 남기는 후행 개행을 제거하는 lua 함수
pub const STRIP_NEWLINE_FUNCTION: &str = "strip_newline";

fn parser_nest_script(parse_key: &str) -> String {
    format!(
        r#"
function parser_nest(tag, timestamp, record)
  local nested = {{}}
  for k, v in pairs(record) do
    if k ~= "{parse_key}" then
      nested[k] = v
      record[k] = nil
    end
  end
  record["logging.googleapis.com/__tmp"] = nested
  return 2, timestamp, record
end
"#
    )
}

const PARSER_MERGE_SCRIPT: &str = r#"
function shallow_merge(record, parsed)
  if record == nil then
    return parsed
  end
  for k, v in pairs(parsed) do
    record[k] = v
  end
  return record
end

function merge(record, parsed)
  if record == nil then
    return parsed
  end
  for k, v in pairs(parsed) do
    if k == "logging.googleapis.com/logName" then
      -- keep the original log name
    elseif k == "logging.googleapis.com/labels" then
      record[k] = shallow_merge(record[k], v)
    else
      record[k] = v
    end
  end
  return record
end

function parser_merge_record(tag, timestamp, record)
  local original = record["logging.googleapis.com/__tmp"]
  if original == nil then
    return 0, timestamp, record
  end
  record["logging.googleapis.com/__tmp"] = nil
  return 2, timestamp, merge(original, record)
end
"#;

const STRIP_NEWLINE_SCRIPT: &str = r#"
local function trim_newline(s)
  if string.sub(s, -2) == "\r\n" then
    return string.sub(s, 1, -3)
  elseif string.sub(s, -1) == "\n" then
    return string.sub(s, 1, -2)
  end
  return s
end

function strip_newline(tag, timestamp, record)
  record["message"] = trim_newline(record["message"])
  return 2, timestamp, record
end
"#;

// 태그 형식: <pipeline>.<receiver>.<hash>.<client tag>
// 앞의 세 세그먼트에는 `.`이 없으므로 네 번째부터가 클라이언트 태그입니다.
const ADD_LOG_NAME_SCRIPT: &str = r#"
local function split(s)
  local parts = {}
  for part in string.gmatch(s, "[^.]+") do
    table.insert(parts, part)
  end
  return parts
end

function add_log_name(tag, timestamp, record)
  local parts = split(tag)
  local log_name = record["logging.googleapis.com/logName"]
  if #parts <= 3 or log_name == nil then
    return 0, timestamp, record
  end
  local client_tag = table.concat(parts, ".", 4)
  record["logging.googleapis.com/logName"] = log_name .. "." .. client_tag
  return 2, timestamp, record
end
"#;

/// lua 스크립트를 실행하는 FILTER와 스크립트 파일 컴포넌트
pub fn lua_filter(routing: &str, function: &str, script: &str) -> Vec<Component> {
    let filename = format!("{}.lua", content_hash(script));
    vec![
        Component::new(Kind::Filter)
            .with("Name", "lua")
            .with("Match", routing)
            .with("script", filename.as_str())
            .with("call", function),
        Component::output_file(filename, script),
    ]
}

/// 단일 parser FILTER
///
/// `Reserve_Data`로 파싱 전 필드(로그 이름 등)를 유지합니다.
pub fn parser_filter(
    routing: &str,
    parse_key: &str,
    parser_names: &[String],
    preserve_key: bool,
) -> Component {
    let mut c = Component::new(Kind::Filter)
        .with("Name", "parser")
        .with("Match", routing)
        .with("Key_Name", parse_key)
        .with("Reserve_Data", "True");
    if preserve_key {
        c.set("Preserve_Key", "True");
    }
    for name in parser_names {
        c.push_ordered("Parser", name.as_str());
    }
    c
}

/// 원본 필드를 보존하는 파싱 체인 (nest lua → parser → merge lua)
pub fn parse_chain(
    routing: &str,
    field: Option<&str>,
    parser_names: &[String],
    preserve_key: bool,
) -> Vec<Component> {
    let parse_key = field.filter(|f| !f.is_empty()).unwrap_or(DEFAULT_PARSE_KEY);
    let mut out = lua_filter(routing, PARSER_NEST_FUNCTION, &parser_nest_script(parse_key));
    out.push(parser_filter(routing, parse_key, parser_names, preserve_key));
    out.extend(lua_filter(routing, PARSER_MERGE_FUNCTION, PARSER_MERGE_SCRIPT));
    out
}

/// 후행 개행 제거 lua 필터
pub fn strip_newline_filter(routing: &str) -> Vec<Component> {
    lua_filter(routing, STRIP_NEWLINE_FUNCTION, STRIP_NEWLINE_SCRIPT)
}

/// forward 입력처럼 동적 태그를 쓰는 인스턴스의 로그 이름에 클라이언트 태그를 붙이는 필터
///
/// 식별 FILTER 뒤에 와야 합니다.
pub fn forward_log_name_filter(routing: &str) -> Vec<Component> {
    lua_filter(routing, ADD_LOG_NAME_FUNCTION, ADD_LOG_NAME_SCRIPT)
}

/// modify FILTER의 개별 연산
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifyOp {
    /// 키가 없을 때만 추가
    Add(String, String),
    /// 항상 설정
    Set(String, String),
    /// 키 이름 변경 (대상 키가 이미 있으면 건너뜀)
    Rename(String, String),
    /// 키 이름 변경 (대상 키를 덮어씀)
    HardRename(String, String),
    /// 키 복사 (대상 키를 덮어씀)
    HardCopy(String, String),
    /// 키 삭제
    Remove(String),
}

impl ModifyOp {
    fn entry(&self) -> (&'static str, String) {
        match self {
            Self::Add(k, v) => ("Add", format!("{k} {v}")),
            Self::Set(k, v) => ("Set", format!("{k} {v}")),
            Self::Rename(from, to) => ("Rename", format!("{from} {to}")),
            Self::HardRename(from, to) => ("Hard_rename", format!("{from} {to}")),
            Self::HardCopy(from, to) => ("Hard_copy", format!("{from} {to}")),
            Self::Remove(k) => ("Remove", k.clone()),
        }
    }
}

/// 순서가 보존되는 modify FILTER
pub fn modify_filter(routing: &str, ops: &[ModifyOp]) -> Component {
    let mut c = Component::new(Kind::Filter)
        .with("Name", "modify")
        .with("Match", routing);
    for op in ops {
        let (key, value) = op.entry();
        c.push_ordered(key, value);
    }
    c
}

/// 조건이 참인 레코드에만 연산 하나를 적용하는 modify FILTER
///
/// `condition`은 `Key_value_equals level warn` 같은 완성된 조건식입니다.
pub fn conditional_modify(routing: &str, condition: &str, op: &ModifyOp) -> Component {
    let (key, value) = op.entry();
    Component::new(Kind::Filter)
        .with("Name", "modify")
        .with("Match", routing)
        .with("Condition", condition)
        .with(key, value)
}

/// `src` 필드 값을 `dest` 필드 값으로 번역하는 FILTER 목록
///
/// 번역 쌍마다 `Key_value_equals` 조건 FILTER가 하나씩 생성됩니다.
/// `dest`가 이미 있으면 덮어쓰지 않습니다.
pub fn translation_filters(
    routing: &str,
    src: &str,
    dest: &str,
    remove_src: bool,
    translations: &[(&str, &str)],
) -> Vec<Component> {
    translations
        .iter()
        .map(|(from, to)| {
            let mut c = conditional_modify(
                routing,
                &format!("Key_value_equals {src} {from}"),
                &ModifyOp::Add(dest.to_owned(), (*to).to_owned()),
            );
            if remove_src {
                c.set("Remove", src);
            }
            c
        })
        .collect()
}

/// 접두어가 같은 필드를 하나의 맵 아래로 모으는 nest FILTER
pub fn nest_filter(routing: &str, wildcard: &str, nest_under: &str, remove_prefix: &str) -> Component {
    Component::new(Kind::Filter)
        .with("Name", "nest")
        .with("Match", routing)
        .with("Operation", "nest")
        .with("Wildcard", wildcard)
        .with("Nest_under", nest_under)
        .with("Remove_prefix", remove_prefix)
}

/// 파이프라인 인스턴스 식별 정보를 레코드에 찍는 FILTER
pub fn identity_filter(
    routing: &str,
    pipeline_id: &str,
    receiver_id: &str,
    hostname: &str,
) -> Component {
    modify_filter(
        routing,
        &[
            ModifyOp::Add(
                "logging.googleapis.com/logName".to_owned(),
                receiver_id.to_owned(),
            ),
            ModifyOp::Add(
                "logging.googleapis.com/labels.pipeline".to_owned(),
                pipeline_id.to_owned(),
            ),
            ModifyOp::Add(
                "agent.googleapis.com/hostname".to_owned(),
                hostname.to_owned(),
            ),
        ],
    )
}

/// 필드 정규식에 매칭되는 레코드를 버리는 grep FILTER
pub fn exclude_filter(routing: &str, rules: &[(String, String)]) -> Component {
    let mut c = Component::new(Kind::Filter)
        .with("Name", "grep")
        .with("Match", routing);
    for (field, regex) in rules {
        c.push_ordered("Exclude", format!("{field} {regex}"));
    }
    if rules.len() > 1 {
        c.set("Logical_Op", "or");
    }
    c
}

/// multiline 상태 전이 규칙
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultilineRule {
    pub state: String,
    pub regex: String,
    pub next_state: String,
}

impl MultilineRule {
    pub fn new(
        state: impl Into<String>,
        regex: impl Into<String>,
        next_state: impl Into<String>,
    ) -> Self {
        Self {
            state: state.into(),
            regex: regex.into(),
            next_state: next_state.into(),
        }
    }

    fn render(&self) -> String {
        format!(
            "\"{}\" \"/{}/\" \"{}\"",
            self.state, self.regex, self.next_state
        )
    }
}

/// MULTILINE_PARSER 섹션
pub fn multiline_parser(name: &str, rules: &[MultilineRule]) -> Component {
    let mut c = Component::new(Kind::MultilineParser)
        .with("name", name)
        .with("type", "regex")
        .with("flush_timeout", "1000");
    for rule in rules {
        c.push_ordered("rule", rule.render());
    }
    c
}

/// 입력 이후 단계에서 multiline 파서를 적용하는 FILTER
pub fn multiline_filter(routing: &str, parser_name: &str) -> Component {
    Component::new(Kind::Filter)
        .with("Name", "multiline")
        .with("Match", routing)
        .with("multiline.key_content", DEFAULT_PARSE_KEY)
        .with("multiline.parser", parser_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lua_filter_names_script_by_content_hash() {
        let components = lua_filter("p1.r1", "f", "function f() end");
        assert_eq!(components.len(), 2);
        let script = components[0].get("script").unwrap();
        assert!(script.ends_with(".lua"));
        assert_eq!(script.len(), 32 + ".lua".len());
        assert_eq!(
            components[1].as_output_file(),
            Some((script, "function f() end"))
        );
    }

    #[test]
    fn forward_log_name_filter_calls_add_log_name() {
        let tag = crate::PipelineTag::for_instance("p1", "fwd", true);
        let components = forward_log_name_filter(&tag.routing);
        assert_eq!(components[0].get("Match"), Some(tag.routing.as_str()));
        assert_eq!(components[0].get("call"), Some(ADD_LOG_NAME_FUNCTION));
        let (_, script) = components[1].as_output_file().unwrap();
        assert!(script.contains("function add_log_name(tag, timestamp, record)"));
        // 클라이언트 태그는 네 번째 세그먼트부터
        assert!(script.contains(r#"table.concat(parts, ".", 4)"#));
    }

    #[test]
    fn parse_chain_wraps_parser_with_nest_and_merge() {
        let chain = parse_chain("p1.r1", None, &["p1.r1.0".to_owned()], false);
        let filters: Vec<&str> = chain
            .iter()
            .filter(|c| c.kind == Kind::Filter)
            .map(|c| c.get("Name").unwrap())
            .collect();
        assert_eq!(filters, vec!["lua", "parser", "lua"]);
        let parser = chain.iter().find(|c| c.get("Name") == Some("parser")).unwrap();
        assert_eq!(parser.get("Key_Name"), Some("message"));
        assert_eq!(
            parser.ordered_config,
            vec![("Parser".to_owned(), "p1.r1.0".to_owned())]
        );
    }

    #[test]
    fn nest_script_depends_on_parse_key() {
        let a = parse_chain("t", Some("a"), &[], false);
        let b = parse_chain("t", Some("b"), &[], false);
        assert_ne!(a[0].get("script"), b[0].get("script"));
        // merge 스크립트는 키와 무관
        assert_eq!(a[3].get("script"), b[3].get("script"));
    }

    #[test]
    fn modify_filter_keeps_operation_order() {
        let c = modify_filter(
            "t",
            &[
                ModifyOp::Rename("log".to_owned(), "message".to_owned()),
                ModifyOp::Remove("tmp".to_owned()),
                ModifyOp::Set("a".to_owned(), "1".to_owned()),
            ],
        );
        let keys: Vec<&str> = c.ordered_config.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["Rename", "Remove", "Set"]);
    }

    #[test]
    fn translation_filters_one_per_pair() {
        let filters = translation_filters(
            "t",
            "level",
            "logging.googleapis.com/severity",
            false,
            &[("warn", "WARNING"), ("error", "ERROR")],
        );
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].get("Condition"), Some("Key_value_equals level warn"));
        assert_eq!(
            filters[1].get("Add"),
            Some("logging.googleapis.com/severity ERROR")
        );
        assert_eq!(filters[0].get("Remove"), None);
    }

    #[test]
    fn nest_filter_keys() {
        let c = nest_filter("t", "http_request_*", "logging.googleapis.com/http_request", "http_request_");
        assert_eq!(c.get("Operation"), Some("nest"));
        assert_eq!(c.get("Remove_prefix"), Some("http_request_"));
    }

    #[test]
    fn identity_filter_stamps_ids() {
        let c = identity_filter("p1.r1", "p1", "r1", "host");
        assert_eq!(c.get("Match"), Some("p1.r1"));
        assert_eq!(
            c.ordered_config[0],
            (
                "Add".to_owned(),
                "logging.googleapis.com/logName r1".to_owned()
            )
        );
        assert_eq!(c.ordered_config.len(), 3);
    }

    #[test]
    fn exclude_filter_uses_or_for_multiple_rules() {
        let one = exclude_filter("t", &[("severity".to_owned(), "DEBUG".to_owned())]);
        assert_eq!(one.get("Logical_Op"), None);
        let two = exclude_filter(
            "t",
            &[
                ("severity".to_owned(), "DEBUG".to_owned()),
                ("message".to_owned(), "^health".to_owned()),
            ],
        );
        assert_eq!(two.get("Logical_Op"), Some("or"));
    }

    #[test]
    fn multiline_parser_renders_rules_in_order() {
        let c = multiline_parser(
            "multiline.p1.r1",
            &[
                MultilineRule::new("start_state", r"^\d", "cont"),
                MultilineRule::new("cont", r"^\s", "cont"),
            ],
        );
        assert_eq!(c.kind, Kind::MultilineParser);
        assert_eq!(c.ordered_config[0].1, r#""start_state" "/^\d/" "cont""#);
        assert_eq!(c.ordered_config[1].0, "rule");
    }
}
