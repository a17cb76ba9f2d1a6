//! 리시버/프로세서 단순화 -- 매크로 확장 후 프로세서를 리시버로 병합
//!
//! 최적화 단계일 뿐이므로 생략해도 출력은 (더 길어질 뿐) 올바릅니다.
//!
//! ```text
//! nginx_access            tail + [parse_regex, http_request]      (expand)
//! tail + [parse_multiline, parse_json]
//!   -> tail(multiline) + [parse_json]                             (merge)
//! ```

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::capability::ReceiverRef;
use crate::resolver::{LoggingInstance, ProcessorBinding};

/// 리시버와 프로세서의 매크로를 한 단계 확장합니다.
///
/// 리시버가 확장되면 생긴 프로세서가 기존 프로세서 앞에 붙고 리시버 ID를 물려받습니다.
/// 확장 결과는 다시 확장하지 않습니다.
pub fn expand(instance: LoggingInstance) -> LoggingInstance {
    let LoggingInstance {
        pipeline_id,
        receiver_id,
        receiver,
        processors,
        exporter_ids,
        backend,
    } = instance;

    let mut expanded = Vec::new();
    let receiver = match receiver.as_expandable() {
        Some(expandable) => {
            let (inner, extra) = expandable.expand();
            expanded.extend(extra.into_iter().map(|processor| ProcessorBinding {
                id: receiver_id.clone(),
                processor,
            }));
            inner
        }
        None => receiver,
    };

    for binding in processors {
        match binding.processor.as_expandable() {
            Some(expandable) => {
                expanded.extend(expandable.expand().into_iter().map(|processor| {
                    ProcessorBinding {
                        id: binding.id.clone(),
                        processor,
                    }
                }));
            }
            None => expanded.push(binding),
        }
    }

    LoggingInstance {
        pipeline_id,
        receiver_id,
        receiver,
        processors: expanded,
        exporter_ids,
        backend,
    }
}

/// 확장 후 앞쪽 프로세서부터 리시버로 병합합니다.
///
/// 병합할 수 없는 프로세서를 만나면 멈추고, 그 프로세서를 포함한 나머지는 그대로 남습니다.
/// 뒤쪽 프로세서가 병합 가능하더라도 다시 시도하지 않습니다.
pub fn simplify(instance: LoggingInstance) -> LoggingInstance {
    let mut instance = expand(instance);
    let mut receiver = instance.receiver.clone();
    let mut pending: VecDeque<ProcessorBinding> = instance.processors.drain(..).collect();

    while let Some(next) = pending.pop_front() {
        let Some(mergeable) = receiver.as_mergeable() else {
            pending.push_front(next);
            break;
        };
        let (merged, leftover) = mergeable.merge(next.processor.clone());
        match leftover {
            None => {
                debug!(
                    pipeline = %instance.pipeline_id,
                    receiver = %instance.receiver_id,
                    processor = %next.id,
                    "merged processor into receiver"
                );
                receiver = merged;
            }
            Some(processor) => {
                receiver = merged;
                pending.push_front(ProcessorBinding {
                    id: next.id,
                    processor,
                });
                report_stop(&instance, &receiver, &pending);
                break;
            }
        }
    }

    instance.receiver = receiver;
    instance.processors = pending.into();
    instance
}

/// 병합 루프가 멈춘 이유를 기록합니다. 뒤쪽에 병합 가능한 프로세서가 남았으면 경고합니다.
fn report_stop(
    instance: &LoggingInstance,
    receiver: &ReceiverRef,
    pending: &VecDeque<ProcessorBinding>,
) {
    let Some(mergeable) = receiver.as_mergeable() else {
        return;
    };
    let skipped = pending
        .iter()
        .skip(1)
        .find(|b| mergeable.merge(b.processor.clone()).1.is_none());
    match (skipped, pending.front()) {
        (Some(skipped), Some(blocking)) => warn!(
            pipeline = %instance.pipeline_id,
            receiver = %instance.receiver_id,
            blocking = %blocking.id,
            skipped = %skipped.id,
            "merge stopped early; a later processor stays unmerged"
        ),
        (None, Some(blocking)) => debug!(
            pipeline = %instance.pipeline_id,
            receiver = %instance.receiver_id,
            blocking = %blocking.id,
            "merge stopped"
        ),
        _ => {}
    }
}
