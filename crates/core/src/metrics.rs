//! 메트릭 상수 및 설명 등록
//!
//! 컴파일러가 기록하는 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 라이브러리는 레코더를 설치하지 않으므로 호스트가 레코더를 설치하기 전까지는 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `opsforge_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(opsforge_core::metrics::COMPILE_RUNS_TOTAL, "backend" => "otel").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 백엔드 레이블 키 (fluent-bit, otel, collectd)
pub const LABEL_BACKEND: &str = "backend";

/// 섹션 종류 레이블 키 (INPUT, FILTER, ...)
pub const LABEL_KIND: &str = "kind";

// ─── 컴파일러 메트릭 ────────────────────────────────────────────────

/// 컴파일 실행 수 (counter, label: backend)
pub const COMPILE_RUNS_TOTAL: &str = "opsforge_compile_runs_total";

/// 실패한 컴파일 수 (counter, label: backend)
pub const COMPILE_FAILURES_TOTAL: &str = "opsforge_compile_failures_total";

/// 생성된 컴포넌트 수 (counter, labels: backend, kind)
pub const COMPONENTS_EMITTED_TOTAL: &str = "opsforge_components_emitted_total";

/// 단일 컴파일 소요 시간 (histogram, 초)
pub const COMPILE_DURATION_SECONDS: &str = "opsforge_compile_duration_seconds";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 컴파일 소요 시간 히스토그램 버킷 (초)
pub const COMPILE_DURATION_BUCKETS: [f64; 8] = [0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 1.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        COMPILE_RUNS_TOTAL,
        "Total number of configuration compilations per backend"
    );
    describe_counter!(
        COMPILE_FAILURES_TOTAL,
        "Total number of configuration compilations that failed"
    );
    describe_counter!(
        COMPONENTS_EMITTED_TOTAL,
        "Total number of native configuration sections emitted"
    );
    describe_histogram!(
        COMPILE_DURATION_SECONDS,
        "Time to compile a unified configuration into backend files in seconds"
    );
}
