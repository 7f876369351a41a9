//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `flowgate_`
//! - 모듈명: `filter_`, `daemon_`
//! - 접미어: `_total` (counter), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 스테이지 레이블 키 (ban_filter, rate_limiter)
pub const LABEL_STAGE: &str = "stage";

// ─── Filter 메트릭 ─────────────────────────────────────────────────

/// Filter: 스테이지별 폐기 패킷 수 (counter, label: stage)
pub const FILTER_DISCARDS_TOTAL: &str = "flowgate_filter_discards_total";

/// Filter: 레이트 리미터를 통과한 패킷 수 (counter)
pub const FILTER_RATE_ADMITS_TOTAL: &str = "flowgate_filter_rate_admits_total";

/// Filter: 헤더가 잘려 검사 없이 통과된 패킷 수 (counter)
pub const FILTER_TRUNCATED_TOTAL: &str = "flowgate_filter_truncated_total";

/// Filter: 카운터 테이블 삽입 실패로 fail-open된 패킷 수 (counter)
pub const FILTER_COUNTER_FAILURES_TOTAL: &str = "flowgate_filter_counter_failures_total";

/// Filter: 디스패치 슬롯이 비어 fail-open된 패킷 수 (counter)
pub const FILTER_DISPATCH_FAILURES_TOTAL: &str = "flowgate_filter_dispatch_failures_total";

/// Filter: 유저스페이스가 수신한 폐기 이벤트 수 (counter, label: stage)
pub const FILTER_DISCARD_EVENTS_TOTAL: &str = "flowgate_filter_discard_events_total";

/// Filter: 채널 포화로 버려진 폐기 이벤트 수 (counter)
pub const FILTER_EVENTS_DROPPED_TOTAL: &str = "flowgate_filter_events_dropped_total";

/// Filter: 초당 폐기 패킷 수 (gauge)
pub const FILTER_DISCARDS_PER_SECOND: &str = "flowgate_filter_discards_per_second";

/// Filter: 차단 목록 엔트리 수 (gauge)
pub const FILTER_BANNED_ADDRESSES: &str = "flowgate_filter_banned_addresses";

/// Filter: 카운터 윈도우 리셋 횟수 (counter)
pub const FILTER_COUNTER_RESETS_TOTAL: &str = "flowgate_filter_counter_resets_total";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 빌드 정보 (gauge, 항상 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "flowgate_daemon_build_info";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        FILTER_DISCARDS_TOTAL,
        "Packets discarded by XDP, per stage (ban_filter, rate_limiter)"
    );
    describe_counter!(
        FILTER_RATE_ADMITS_TOTAL,
        "Packets admitted by the rate limiter stage"
    );
    describe_counter!(
        FILTER_TRUNCATED_TOTAL,
        "Packets admitted without inspection because the header was truncated"
    );
    describe_counter!(
        FILTER_COUNTER_FAILURES_TOTAL,
        "Packets admitted because the rate counter table could not be updated"
    );
    describe_counter!(
        FILTER_DISPATCH_FAILURES_TOTAL,
        "Packets admitted because the dispatch slot was empty"
    );
    describe_counter!(
        FILTER_DISCARD_EVENTS_TOTAL,
        "Discard diagnostic events received in userspace, per stage"
    );
    describe_counter!(
        FILTER_EVENTS_DROPPED_TOTAL,
        "Discard diagnostic events dropped because the consumer was full or gone"
    );
    describe_gauge!(
        FILTER_DISCARDS_PER_SECOND,
        "Current discard rate (packets/sec)"
    );
    describe_gauge!(
        FILTER_BANNED_ADDRESSES,
        "Number of addresses in the ban table"
    );
    describe_counter!(
        FILTER_COUNTER_RESETS_TOTAL,
        "Number of rate counter window resets"
    );

    describe_gauge!(
        DAEMON_BUILD_INFO,
        "Build information (always 1, with version label)"
    );
}
