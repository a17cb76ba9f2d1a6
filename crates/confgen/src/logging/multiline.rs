//! 언어별 예외 스택 트레이스 multiline 규칙
//!
//! 모든 규칙 집합은 `start_state`에서 시작하며, 여러 언어를 합치면 각 언어의
//! 시작 규칙이 나란히 놓여 어느 언어의 트레이스든 첫 줄에서 분기합니다.

use opsforge_fluentbit::filters::MultilineRule;

/// 지원하는 언어 이름
pub const SUPPORTED_LANGUAGES: [&str; 3] = ["java", "python", "go"];

/// 지원하는 그룹 타입
pub const LANGUAGE_EXCEPTIONS: &str = "language_exceptions";

const JAVA: &[(&str, &str, &str)] = &[
    (
        "start_state",
        r"(?:Exception|Error|Throwable|V8 errors stack trace)[:\r\n]",
        "java_after_exception",
    ),
    (
        "java_after_exception",
        r"^[\t ]*nested exception is:[\t ]*",
        "java_after_exception",
    ),
    ("java_after_exception", r"^[\r\n]*$", "java_after_exception"),
    ("java_after_exception", r"^[\t ]+(?:eval )?at ", "java"),
    ("java", r"^[\t ]+(?:eval )?at ", "java"),
    (
        "java",
        r"^[\t ]*(?:Caused by|Suppressed):",
        "java_after_exception",
    ),
    (
        "java",
        r"^[\t ]*... \d+ (?:more|common frames omitted)",
        "java",
    ),
];

const PYTHON: &[(&str, &str, &str)] = &[
    (
        "start_state",
        r"^Traceback \(most recent call last\):$",
        "python",
    ),
    ("python", r"^[\t ]+File ", "python_code"),
    ("python_code", r"[^\t ]", "python"),
    ("python", r"^(?:[^\s.():]+\.)*[^\s.():]+:", "start_state"),
];

const GO: &[(&str, &str, &str)] = &[
    ("start_state", r"\bpanic: ", "go_after_panic"),
    ("go_after_panic", r"^$", "go_goroutine"),
    ("go_goroutine", r"^goroutine \d+ \[[^\]]+\]:$", "go_frame_1"),
    (
        "go_frame_1",
        r"^(?:[^\s.:]+\.)*[^\s.():]+\(|^created by ",
        "go_frame_2",
    ),
    ("go_frame_2", r"^\s", "go_frame_1"),
];

/// 언어 이름의 규칙 집합. 모르는 언어면 `None`.
pub fn language_rules(language: &str) -> Option<Vec<MultilineRule>> {
    let table = match language {
        "java" => JAVA,
        "python" => PYTHON,
        "go" => GO,
        _ => return None,
    };
    Some(
        table
            .iter()
            .map(|(state, regex, next)| MultilineRule::new(*state, *regex, *next))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_language_has_a_start_state() {
        for language in SUPPORTED_LANGUAGES {
            let rules = language_rules(language).unwrap();
            assert_eq!(rules[0].state, "start_state", "{language}");
        }
    }

    #[test]
    fn unknown_language_has_no_rules() {
        assert!(language_rules("cobol").is_none());
    }

    #[test]
    fn rule_regexes_compile() {
        for language in SUPPORTED_LANGUAGES {
            for rule in language_rules(language).unwrap() {
                assert!(regex::Regex::new(&rule.regex).is_ok(), "{}", rule.regex);
            }
        }
    }
}
