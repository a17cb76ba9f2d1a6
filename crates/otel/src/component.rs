//! 컬렉터 컴포넌트 -- 리시버, 프로세서, 익스포터 하나
//!
//! 설정 트리는 `serde_json::Value`로 표현합니다. 객체 키가 정렬된 맵으로 유지되므로
//! 직렬화 결과가 입력 순서와 무관하게 결정적입니다.

use serde_json::{Value, json};

/// 컬렉터 컴포넌트 하나
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// 컴포넌트 타입 (예: `hostmetrics`, `filter`)
    pub type_name: String,
    /// 컴포넌트 설정 트리
    pub config: Value,
}

impl Component {
    pub fn new(type_name: impl Into<String>, config: Value) -> Self {
        Self {
            type_name: type_name.into(),
            config,
        }
    }

    /// `type/suffix` 형식의 인스턴스 이름 (접미사가 비면 타입 이름 그대로)
    pub fn name(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            self.type_name.clone()
        } else {
            format!("{}/{suffix}", self.type_name)
        }
    }
}

/// 메트릭 이름 기반 filter 프로세서
///
/// `polarity`는 `include` 또는 `exclude`, `match_type`은 `strict` 또는 `regexp`.
pub fn metrics_filter(polarity: &str, match_type: &str, metric_names: &[String]) -> Component {
    Component::new(
        "filter",
        json!({
            "metrics": {
                polarity: {
                    "match_type": match_type,
                    "metric_names": metric_names,
                }
            }
        }),
    )
}

/// OTTL 문장을 실행하는 transform 프로세서
pub fn transform(signal: &str, context: &str, statements: &[String]) -> Component {
    Component::new(
        "transform",
        json!({
            "error_mode": "ignore",
            format!("{signal}_statements"): [
                {
                    "context": context,
                    "statements": statements,
                }
            ],
        }),
    )
}

/// 클라우드 리소스 감지 프로세서
pub fn resource_detector(overwrite: bool) -> Component {
    let mut config = json!({ "detectors": ["gcp"] });
    // override 기본값은 true라 생략
    if !overwrite {
        config["override"] = Value::Bool(false);
    }
    Component::new("resourcedetection", config)
}

/// cumulative 합계를 delta로 변환하는 프로세서
pub fn cumulative_to_delta(metrics: &[String]) -> Component {
    Component::new(
        "cumulativetodelta",
        json!({
            "include": {
                "match_type": "strict",
                "metrics": metrics,
            }
        }),
    )
}

/// delta 합계를 초당 비율 게이지로 변환하는 프로세서
pub fn delta_to_rate(metrics: &[String]) -> Component {
    Component::new("deltatorate", json!({ "metrics": metrics }))
}

/// 메트릭 이름에 도메인 접두어를 붙이는 metricstransform 프로세서
///
/// 컬렉터가 `$`를 환경 변수 참조로 해석하므로 정규식과 치환 문자열의 `$`는 `$$`로 씁니다.
pub fn add_prefix(prefix: &str) -> Component {
    Component::new(
        "metricstransform",
        json!({
            "transforms": [
                {
                    "include": "^(.*)$$",
                    "match_type": "regexp",
                    "action": "update",
                    "new_name": format!("{prefix}/$${{1}}"),
                }
            ]
        }),
    )
}

/// 문자열을 OTTL 문자열 리터럴로 인용합니다.
pub fn ottl_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
