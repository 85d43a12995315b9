//! 메트릭 상수 및 설명 등록
//!
//! 인터프리터가 사용하는 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 레코더가 설치되지 않았으면 `metrics` 매크로는 아무 일도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `joran_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(joran_core::metrics::ELEMENTS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (clean, errors, fatal)
pub const LABEL_RESULT: &str = "result";

// ─── 인터프리터 메트릭 ─────────────────────────────────────────────

/// 처리된 요소 수 (counter)
pub const ELEMENTS_TOTAL: &str = "joran_elements_total";

/// 기록된 복구 가능 에러 수 (counter)
pub const ERRORS_TOTAL: &str = "joran_errors_total";

/// 스킵된 요소 수 (counter)
pub const SKIPPED_ELEMENTS_TOTAL: &str = "joran_skipped_elements_total";

/// 설정 실행 횟수 (counter, label: result)
pub const CONFIGURATIONS_TOTAL: &str = "joran_configurations_total";

/// 문서 하나를 해석하는 데 걸린 시간 (histogram, 초)
pub const CONFIGURE_DURATION_SECONDS: &str = "joran_configure_duration_seconds";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(ELEMENTS_TOTAL, "Total XML elements dispatched by the interpreter");
    describe_counter!(ERRORS_TOTAL, "Total recoverable errors recorded during interpretation");
    describe_counter!(
        SKIPPED_ELEMENTS_TOTAL,
        "Total elements skipped after an action failure"
    );
    describe_counter!(
        CONFIGURATIONS_TOTAL,
        "Total configuration runs by result (clean, errors, fatal)"
    );
    describe_histogram!(
        CONFIGURE_DURATION_SECONDS,
        "Time spent interpreting one configuration document"
    );
}
