//! 라우팅 태그 -- 파이프라인 인스턴스의 INPUT과 FILTER/OUTPUT 섹션을 연결하는 키
//!
//! 기본 태그는 `"<pipeline-id>.<receiver-id>"`입니다. ID에 `.`이 있으면 서로 다른 쌍이
//! 같은 기본 태그를 만들 수 있으므로 호출자가 인스턴스 간 유일성을 확인해야 합니다.
//!
//! 런타임에 예측할 수 없는 접미사가 붙는 리시버(forward 프로토콜)는 동적 태그를 사용합니다:
//! - ID 안의 `.`을 `_`로 바꿔 태그 세그먼트 경계를 명확히 유지
//! - 기본 태그의 128비트 해시를 붙여, 와일드카드 접미사가 서로 다른 파이프라인을 매칭하지 않도록 함
//! - INPUT/FILTER에는 `*` 와일드카드 태그, OUTPUT에는 이스케이프된 접두어 + `\..*` 정규식 사용

use sha2::{Digest, Sha256};

/// 콘텐츠 해시 (SHA-256 앞 128비트, 16진수 32자)
pub fn content_hash(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..32].to_owned()
}

/// 파이프라인 인스턴스 하나의 태그 집합
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineTag {
    /// 기본 태그 `"<pipeline>.<receiver>"`
    pub base: String,
    /// 입력 섹션이 레코드에 붙이는 태그 (동적 태그면 접두어)
    pub input: String,
    /// FILTER `Match`에 쓰는 라우팅 태그 (동적 태그면 `*` 접미)
    pub routing: String,
    /// OUTPUT `Match_Regex` 교대 항목 (이스케이프된 정규식)
    pub match_regex: String,
    /// 동적 접미사 처리 여부
    pub dynamic: bool,
}

impl PipelineTag {
    /// 파이프라인/리시버 ID로 태그를 생성합니다.
    pub fn for_instance(pipeline_id: &str, receiver_id: &str, dynamic: bool) -> Self {
        let base = format!("{pipeline_id}.{receiver_id}");
        if !dynamic {
            return Self {
                match_regex: regex::escape(&base),
                input: base.clone(),
                routing: base.clone(),
                base,
                dynamic,
            };
        }

        let prefix = format!(
            "{}.{}.{}",
            pipeline_id.replace('.', "_"),
            receiver_id.replace('.', "_"),
            content_hash(&base)
        );
        Self {
            input: format!("{prefix}."),
            routing: format!("{prefix}.*"),
            match_regex: format!(r"{}\..*", regex::escape(&prefix)),
            base,
            dynamic,
        }
    }

    /// 버퍼 DB 파일 등 파일 이름에 쓸 수 있는 형태의 태그
    pub fn file_safe(&self) -> String {
        self.base.replace(['.', '/', ':', '\\'], "_")
    }
}

/// 여러 태그의 교대 정규식 `^(a|b|c)$`를 만듭니다.
pub fn match_alternation<'a>(tags: impl IntoIterator<Item = &'a PipelineTag>) -> String {
    let members: Vec<&str> = tags.into_iter().map(|t| t.match_regex.as_str()).collect();
    format!("^({})$", members.join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn static_tag_uses_default_for_everything() {
        let tag = PipelineTag::for_instance("p1", "r1", false);
        assert_eq!(tag.base, "p1.r1");
        assert_eq!(tag.input, "p1.r1");
        assert_eq!(tag.routing, "p1.r1");
        assert_eq!(tag.match_regex, r"p1\.r1");
    }

    #[test]
    fn alternation_of_static_tags() {
        let a = PipelineTag::for_instance("p1", "r1", false);
        let b = PipelineTag::for_instance("p2", "r2", false);
        assert_eq!(match_alternation([&a]), r"^(p1\.r1)$");
        assert_eq!(match_alternation([&a, &b]), r"^(p1\.r1|p2\.r2)$");
    }

    #[test]
    fn dynamic_tag_has_wildcard_routing_and_escaped_regex() {
        let tag = PipelineTag::for_instance("p1", "r1", true);
        let hash = content_hash("p1.r1");
        assert_eq!(hash.len(), 32);
        assert_eq!(tag.base, "p1.r1");
        assert_eq!(tag.input, format!("p1.r1.{hash}."));
        assert_eq!(tag.routing, format!("p1.r1.{hash}.*"));
        assert!(tag.routing.ends_with('*'));
        assert_eq!(tag.match_regex, format!(r"p1\.r1\.{hash}\..*"));
        assert!(tag.match_regex.ends_with(r"\..*"));
    }

    #[test]
    fn dynamic_tag_replaces_separators_in_ids() {
        let tag = PipelineTag::for_instance("a.b", "c.d", true);
        assert!(tag.input.starts_with("a_b.c_d."));
    }

    #[test]
    fn dynamic_tags_with_colliding_sanitized_ids_differ() {
        let dotted = PipelineTag::for_instance("a.b", "c", true);
        let underscored = PipelineTag::for_instance("a_b", "c", true);
        assert_ne!(dotted.input, underscored.input);
        assert_ne!(dotted.match_regex, underscored.match_regex);
    }

    #[test]
    fn match_regex_does_not_accept_prefix_siblings() {
        let tag = PipelineTag::for_instance("p1", "r1", true);
        let re = regex::Regex::new(&match_alternation([&tag])).unwrap();
        let prefix = tag.input.trim_end_matches('.');
        assert!(re.is_match(&format!("{prefix}.client.tag")));
        assert!(!re.is_match(&format!("{prefix}x.client")));
        assert!(!re.is_match("p1.r1"));
    }

    #[test]
    fn file_safe_tag_has_no_separators() {
        let tag = PipelineTag::for_instance("p1", "r.1", false);
        assert_eq!(tag.file_safe(), "p1_r_1");
    }

    proptest! {
        // `.`이 든 ID는 기본 태그가 겹칠 수 있어 컴파일러가 따로 거부합니다.
        #[test]
        fn distinct_pairs_give_distinct_default_tags(
            p1 in "[a-z0-9_]{1,8}", r1 in "[a-z0-9_]{1,8}",
            p2 in "[a-z0-9_]{1,8}", r2 in "[a-z0-9_]{1,8}",
        ) {
            prop_assume!((p1.as_str(), r1.as_str()) != (p2.as_str(), r2.as_str()));
            let a = PipelineTag::for_instance(&p1, &r1, false);
            let b = PipelineTag::for_instance(&p2, &r2, false);
            prop_assert_ne!(a.base, b.base);
        }

        #[test]
        fn distinct_default_tags_give_distinct_dynamic_tags(
            p1 in "[a-z0-9._]{1,8}", r1 in "[a-z0-9._]{1,8}",
            p2 in "[a-z0-9._]{1,8}", r2 in "[a-z0-9._]{1,8}",
        ) {
            let a = PipelineTag::for_instance(&p1, &r1, true);
            let b = PipelineTag::for_instance(&p2, &r2, true);
            prop_assume!(a.base != b.base);
            prop_assert_ne!(a.input, b.input);
            prop_assert_ne!(a.routing, b.routing);
        }

        #[test]
        fn content_hash_is_deterministic(s in ".*") {
            prop_assert_eq!(content_hash(&s), content_hash(&s));
        }
    }
}
