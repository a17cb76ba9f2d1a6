//! 역량(capability) trait -- 리시버/프로세서가 지원하는 기능을 명시적으로 선언
//!
//! 리졸버, 단순화 단계, emitter는 구체 타입을 추측하지 않고
//! `as_*` 접근자로 역량을 질의합니다. 접근자가 `None`을 반환하면 해당 역량이 없는 것입니다.
//!
//! # 로그 리시버 역량
//! ```text
//! LoggingReceiver
//!   ├── as_fluent_bit()  -> FluentBitReceiver   (INPUT/PARSER 섹션 생성)
//!   ├── as_otel()        -> OtelReceiver        (리시버 파이프라인 생성)
//!   ├── as_expandable()  -> ExpandableReceiver  (리시버 + 프로세서로 확장)
//!   └── as_mergeable()   -> MergeableReceiver   (다음 프로세서 흡수)
//! ```

use std::fmt;
use std::sync::Arc;

use opsforge_fluentbit::filters::MultilineRule;
use opsforge_fluentbit::{Component, PipelineTag};
use opsforge_otel as otel;

/// 공유 리시버 참조
pub type ReceiverRef = Arc<dyn LoggingReceiver>;

/// 공유 프로세서 참조
pub type ProcessorRef = Arc<dyn LoggingProcessor>;

// ─── 로그 리시버 ────────────────────────────────────────────────────

/// 로그 리시버
///
/// 구현체는 지원하는 역량의 접근자만 재정의합니다.
pub trait LoggingReceiver: fmt::Debug + Send + Sync {
    /// 설정 파일의 `type` 값
    fn type_name(&self) -> &'static str;

    fn as_fluent_bit(&self) -> Option<&dyn FluentBitReceiver> {
        None
    }

    fn as_otel(&self) -> Option<&dyn OtelReceiver> {
        None
    }

    fn as_expandable(&self) -> Option<&dyn ExpandableReceiver> {
        None
    }

    fn as_mergeable(&self) -> Option<&dyn MergeableReceiver> {
        None
    }

    /// 네트워크 리시버가 점유하는 포트
    fn listen_port(&self) -> Option<u16> {
        None
    }

    /// 런타임에 태그 접미사가 붙는지 여부
    fn dynamic_tag(&self) -> bool {
        false
    }
}

/// 로그 백엔드 섹션을 생성하는 리시버
pub trait FluentBitReceiver {
    /// INPUT 섹션과 그 입력이 의존하는 섹션들
    fn components(&self, tag: &PipelineTag) -> Vec<Component>;
}

/// 컬렉터 리시버 파이프라인을 생성하는 리시버
pub trait OtelReceiver {
    fn receiver_pipelines(&self) -> Vec<otel::ReceiverPipeline>;
}

/// 다른 리시버와 프로세서 목록으로 확장되는 리시버
pub trait ExpandableReceiver {
    fn expand(&self) -> (ReceiverRef, Vec<ProcessorRef>);
}

/// 뒤따르는 프로세서를 흡수할 수 있는 리시버
pub trait MergeableReceiver {
    /// 프로세서 하나를 흡수합니다.
    ///
    /// 새 리시버와 함께, 완전히 흡수되었으면 `None`,
    /// 흡수할 수 없으면 입력 프로세서를 그대로 반환합니다.
    fn merge(&self, processor: ProcessorRef) -> (ReceiverRef, Option<ProcessorRef>);
}

// ─── 로그 프로세서 ──────────────────────────────────────────────────

/// 로그 프로세서
pub trait LoggingProcessor: fmt::Debug + Send + Sync {
    /// 설정 파일의 `type` 값 (내장 프로세서는 예약 이름)
    fn type_name(&self) -> &'static str;

    fn as_fluent_bit(&self) -> Option<&dyn FluentBitProcessor> {
        None
    }

    fn as_otel(&self) -> Option<&dyn OtelProcessor> {
        None
    }

    fn as_expandable(&self) -> Option<&dyn ExpandableProcessor> {
        None
    }

    /// 리시버에 병합 가능한 multiline 규칙
    fn multiline_rules(&self) -> Option<Vec<MultilineRule>> {
        None
    }
}

/// 로그 백엔드 섹션을 생성하는 프로세서
pub trait FluentBitProcessor {
    /// `uid`는 인스턴스 안에서 고유한 이름 접두어입니다 (파서 이름 등).
    fn components(&self, tag: &PipelineTag, uid: &str) -> Vec<Component>;
}

/// 컬렉터 프로세서를 생성하는 프로세서
pub trait OtelProcessor {
    fn processors(&self) -> Vec<otel::Component>;
}

/// 다른 프로세서 목록으로 확장되는 프로세서
pub trait ExpandableProcessor {
    fn expand(&self) -> Vec<ProcessorRef>;
}

// ─── 메트릭 ─────────────────────────────────────────────────────────

/// 메트릭 리시버 (항상 컬렉터 그래프 노드를 생성)
pub trait MetricsReceiver: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &'static str;

    /// 리시버가 분해되는 리시버 파이프라인 목록 (하나 이상)
    fn receiver_pipelines(&self) -> Vec<otel::ReceiverPipeline>;
}

/// 메트릭 프로세서
pub trait MetricsProcessor: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &'static str;

    fn processors(&self) -> Vec<otel::Component>;
}

/// 로그 리시버가 선언한 역량 이름 목록
pub fn receiver_capabilities(receiver: &dyn LoggingReceiver) -> Vec<&'static str> {
    let mut caps = Vec::new();
    if receiver.as_fluent_bit().is_some() {
        caps.push("fluent-bit");
    }
    if receiver.as_otel().is_some() {
        caps.push("otel");
    }
    if receiver.as_expandable().is_some() {
        caps.push("expand");
    }
    if receiver.as_mergeable().is_some() {
        caps.push("merge");
    }
    if receiver.dynamic_tag() {
        caps.push("dynamic-tag");
    }
    caps
}

/// 로그 프로세서가 선언한 역량 이름 목록
pub fn processor_capabilities(processor: &dyn LoggingProcessor) -> Vec<&'static str> {
    let mut caps = Vec::new();
    if processor.as_fluent_bit().is_some() {
        caps.push("fluent-bit");
    }
    if processor.as_otel().is_some() {
        caps.push("otel");
    }
    if processor.as_expandable().is_some() {
        caps.push("expand");
    }
    if processor.multiline_rules().is_some() {
        caps.push("merge-target");
    }
    caps
}
