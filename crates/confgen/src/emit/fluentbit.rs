//! 로그 파이프라인 엔진 emitter
//!
//! 인스턴스 하나는 다음 순서의 섹션이 됩니다:
//! 리시버 INPUT(과 의존 섹션) → 프로세서 FILTER/PARSER → 식별 FILTER.
//! 동적 태그 인스턴스는 마지막에 클라이언트 태그를 로그 이름에 붙이는 lua FILTER가 더해집니다.
//! OUTPUT은 인스턴스마다가 아니라 익스포터마다 한 번, 모든 태그의 교대 정규식으로 생성됩니다.

use std::collections::BTreeMap;

use tracing::debug;

use opsforge_core::error::CompileError;
use opsforge_core::platform::PlatformFacts;
use opsforge_core::types::{ComponentRole, Subagent};
use opsforge_fluentbit::filters::{forward_log_name_filter, identity_filter};
use opsforge_fluentbit::inputs::TailInput;
use opsforge_fluentbit::modular::LOGS_DIR_VARIABLE;
use opsforge_fluentbit::outputs::StackdriverOutput;
use opsforge_fluentbit::service::{service, variables};
use opsforge_fluentbit::{Component, ModularConfig, ParserRegistry, PipelineTag, match_alternation};

use crate::emit::missing_capability;
use crate::exporters::LOGGING_USER_AGENT_PREFIX;
use crate::model::{LoggingBackend, UnifiedConfig};
use crate::resolver::{LoggingInstance, resolve_logging};
use crate::simplifier::simplify;
use crate::{CompileOptions, OutputFiles};

/// 에이전트 자체 로그 태그
pub const SELF_LOGS_TAG: &str = "ops-agent-fluent-bit";

/// 에이전트 자체 로그 파일 이름 (`logs_dir` 아래)
pub const SELF_LOGS_FILE: &str = "logging-module.log";

/// 인스턴스 하나의 섹션 목록
///
/// 리시버나 프로세서가 로그 백엔드 역량을 제공하지 않으면 실패합니다.
pub fn instance_components(
    instance: &LoggingInstance,
    tag: &PipelineTag,
    platform: &PlatformFacts,
) -> Result<Vec<Component>, CompileError> {
    let receiver = instance.receiver.as_fluent_bit().ok_or_else(|| {
        missing_capability(
            Subagent::Logging,
            ComponentRole::Receiver,
            &instance.receiver_id,
            &instance.pipeline_id,
            "fluent-bit",
        )
    })?;
    let mut components = receiver.components(tag);

    for (i, binding) in instance.processors.iter().enumerate() {
        let processor = binding.processor.as_fluent_bit().ok_or_else(|| {
            missing_capability(
                Subagent::Logging,
                ComponentRole::Processor,
                &binding.id,
                &instance.pipeline_id,
                "fluent-bit",
            )
        })?;
        components.extend(processor.components(tag, &format!("{}.{i}", tag.base)));
    }

    components.push(identity_filter(
        &tag.routing,
        &instance.pipeline_id,
        &instance.receiver_id,
        &platform.hostname,
    ));
    if tag.dynamic {
        components.extend(forward_log_name_filter(&tag.routing));
    }
    Ok(components)
}

/// 에이전트 자체 로그를 수집하는 INPUT과 전용 OUTPUT
fn self_log_components(platform: &PlatformFacts) -> Vec<Component> {
    let tag = PipelineTag {
        base: SELF_LOGS_TAG.to_owned(),
        input: SELF_LOGS_TAG.to_owned(),
        routing: SELF_LOGS_TAG.to_owned(),
        match_regex: regex::escape(SELF_LOGS_TAG),
        dynamic: false,
    };
    let tail = TailInput {
        include_paths: vec![format!("${{{LOGS_DIR_VARIABLE}}}/{SELF_LOGS_FILE}")],
        ..Default::default()
    };
    let mut out: Vec<Component> = tail.component(&tag).into_iter().collect();
    out.push(
        StackdriverOutput::new(
            match_alternation([&tag]),
            platform.user_agent(LOGGING_USER_AGENT_PREFIX),
            platform.output_workers(),
        )
        .component(),
    );
    out
}

/// 로그 백엔드 파일 맵을 생성합니다.
pub fn emit(
    config: &UnifiedConfig,
    platform: &PlatformFacts,
    options: &CompileOptions,
) -> Result<OutputFiles, CompileError> {
    let mut components = vec![service(config.backend_log_level(&options.default_log_level))];
    // 익스포터 ID 사전순으로 OUTPUT을 한 번씩 생성
    let mut outputs: BTreeMap<String, Vec<PipelineTag>> = BTreeMap::new();

    for instance in resolve_logging(config, LoggingBackend::Fluentbit)? {
        let instance = simplify(instance);
        let tag = instance.tag();
        let emitted = instance_components(&instance, &tag, platform)?;
        debug!(
            pipeline = %instance.pipeline_id,
            receiver = %instance.receiver_id,
            tag = %tag.base,
            components = emitted.len(),
            "emitted pipeline instance"
        );
        components.extend(emitted);
        for exporter_id in &instance.exporter_ids {
            outputs
                .entry(exporter_id.clone())
                .or_default()
                .push(tag.clone());
        }
    }

    let user_agent = platform.user_agent(LOGGING_USER_AGENT_PREFIX);
    for (exporter_id, tags) in &outputs {
        debug!(exporter = %exporter_id, pipelines = tags.len(), "emitted output");
        components.push(
            StackdriverOutput::new(
                match_alternation(tags),
                user_agent.as_str(),
                platform.output_workers(),
            )
            .component(),
        );
    }

    if options.self_logs {
        components.extend(self_log_components(platform));
    }

    let components = ParserRegistry::deduplicate(components)?;
    for component in &components {
        debug!(
            kind = %component.kind,
            name = component.get("Name").unwrap_or_default(),
            "emitted component"
        );
    }

    let files = ModularConfig::new(
        variables(&platform.buffers_dir(), &platform.logs_dir),
        components,
    )
    .generate()?;
    Ok(files)
}
