//! 통계 수집 -- PerCpuArray 기반 판정 통계
//!
//! [`FilterStats`]는 커널 `STATS` PerCpuArray 맵에서 수집한 판정 경로별 카운터를
//! 관리합니다. 엔진 내부에서 주기적으로 폴링하여 업데이트하고, 외부에서 조회할 수
//! 있습니다.
//!
//! # 데이터 흐름
//! ```text
//! PerCpuArray (kernel) ──poll──▶ RawFilterSnapshot ──update──▶ FilterStats
//!                                (CPU별 값 합산)                (rate 계산)
//! ```

use std::time::Instant;

use flowgate_core::metrics as m;
use flowgate_filter_common::{
    STATS_IDX_BAN_DROPS, STATS_IDX_COUNTER_FAILURES, STATS_IDX_DISPATCH_FAILURES,
    STATS_IDX_RATE_ADMITS, STATS_IDX_RATE_DROPS, STATS_IDX_TRUNCATED, STATS_MAX_ENTRIES,
};
use serde::Serialize;

/// CPU별 값을 합산한 원시 카운터 스냅샷 (모두 누적값)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawFilterSnapshot {
    /// 헤더 부족으로 통과
    pub truncated: u64,
    /// 차단 필터 폐기
    pub ban_drops: u64,
    /// 레이트 리미터 폐기
    pub rate_drops: u64,
    /// 레이트 리미터 통과
    pub rate_admits: u64,
    /// 카운터 갱신 실패로 통과
    pub counter_failures: u64,
    /// tail call 실패로 통과
    pub dispatch_failures: u64,
}

impl RawFilterSnapshot {
    /// `STATS` 인덱스 순서의 합산 값 배열에서 스냅샷을 만듭니다.
    pub fn from_counters(values: [u64; STATS_MAX_ENTRIES as usize]) -> Self {
        Self {
            truncated: values[STATS_IDX_TRUNCATED as usize],
            ban_drops: values[STATS_IDX_BAN_DROPS as usize],
            rate_drops: values[STATS_IDX_RATE_DROPS as usize],
            rate_admits: values[STATS_IDX_RATE_ADMITS as usize],
            counter_failures: values[STATS_IDX_COUNTER_FAILURES as usize],
            dispatch_failures: values[STATS_IDX_DISPATCH_FAILURES as usize],
        }
    }

    /// 폐기된 패킷 수
    pub fn discards(&self) -> u64 {
        self.ban_drops.saturating_add(self.rate_drops)
    }

    /// 통과된 패킷 수
    pub fn admits(&self) -> u64 {
        self.truncated
            .saturating_add(self.rate_admits)
            .saturating_add(self.counter_failures)
            .saturating_add(self.dispatch_failures)
    }
}

/// 필터 판정 통계 (누적 + 비율)
///
/// # Rate 계산
/// `update()`를 호출할 때마다 이전 스냅샷과의 차이(delta)를 시간으로 나누어
/// 초당 폐기/통과 수를 계산합니다.
#[derive(Debug, Clone, Serialize)]
pub struct FilterStats {
    /// 헤더 부족으로 통과된 패킷 수
    pub truncated: u64,
    /// 차단 필터 폐기 수
    pub ban_drops: u64,
    /// 레이트 리미터 폐기 수
    pub rate_drops: u64,
    /// 레이트 리미터 통과 수
    pub rate_admits: u64,
    /// 카운터 갱신 실패로 통과된 수
    pub counter_failures: u64,
    /// 디스패치 실패로 통과된 수
    pub dispatch_failures: u64,
    /// 초당 폐기 수
    pub discards_per_sec: f64,
    /// 초당 통과 수
    pub admits_per_sec: f64,
    #[serde(skip)]
    last_poll: Option<Instant>,
    #[serde(skip)]
    prev_raw: Option<RawFilterSnapshot>,
}

impl FilterStats {
    /// 제로 초기화된 통계를 생성합니다.
    pub fn new() -> Self {
        Self {
            truncated: 0,
            ban_drops: 0,
            rate_drops: 0,
            rate_admits: 0,
            counter_failures: 0,
            dispatch_failures: 0,
            discards_per_sec: 0.0,
            admits_per_sec: 0.0,
            last_poll: None,
            prev_raw: None,
        }
    }

    /// 원시 스냅샷으로 통계를 업데이트합니다.
    ///
    /// 첫 번째 호출에서는 rate가 0으로 설정됩니다.
    pub fn update(&mut self, raw: RawFilterSnapshot) {
        let now = Instant::now();

        if let (Some(prev), Some(last_time)) = (&self.prev_raw, self.last_poll) {
            let elapsed = now.duration_since(last_time).as_secs_f64();
            if elapsed > 0.0 {
                self.discards_per_sec =
                    raw.discards().saturating_sub(prev.discards()) as f64 / elapsed;
                self.admits_per_sec = raw.admits().saturating_sub(prev.admits()) as f64 / elapsed;
            }
        }

        self.truncated = raw.truncated;
        self.ban_drops = raw.ban_drops;
        self.rate_drops = raw.rate_drops;
        self.rate_admits = raw.rate_admits;
        self.counter_failures = raw.counter_failures;
        self.dispatch_failures = raw.dispatch_failures;

        self.prev_raw = Some(raw);
        self.last_poll = Some(now);

        self.export();
    }

    fn export(&self) {
        metrics::counter!(m::FILTER_DISCARDS_TOTAL, m::LABEL_STAGE => "ban_filter")
            .absolute(self.ban_drops);
        metrics::counter!(m::FILTER_DISCARDS_TOTAL, m::LABEL_STAGE => "rate_limiter")
            .absolute(self.rate_drops);
        metrics::counter!(m::FILTER_RATE_ADMITS_TOTAL).absolute(self.rate_admits);
        metrics::counter!(m::FILTER_TRUNCATED_TOTAL).absolute(self.truncated);
        metrics::counter!(m::FILTER_COUNTER_FAILURES_TOTAL).absolute(self.counter_failures);
        metrics::counter!(m::FILTER_DISPATCH_FAILURES_TOTAL).absolute(self.dispatch_failures);
        metrics::gauge!(m::FILTER_DISCARDS_PER_SECOND).set(self.discards_per_sec);
    }

    /// 총 폐기 수
    pub fn discards(&self) -> u64 {
        self.ban_drops.saturating_add(self.rate_drops)
    }

    /// 통계를 초기화합니다.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for FilterStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn snapshot(ban: u64, rate_drop: u64, admit: u64) -> RawFilterSnapshot {
        RawFilterSnapshot {
            ban_drops: ban,
            rate_drops: rate_drop,
            rate_admits: admit,
            ..RawFilterSnapshot::default()
        }
    }

    #[test]
    fn test_from_counters_uses_index_layout() {
        let raw = RawFilterSnapshot::from_counters([1, 2, 3, 4, 5, 6]);
        assert_eq!(raw.truncated, 1);
        assert_eq!(raw.ban_drops, 2);
        assert_eq!(raw.rate_drops, 3);
        assert_eq!(raw.rate_admits, 4);
        assert_eq!(raw.counter_failures, 5);
        assert_eq!(raw.dispatch_failures, 6);
        assert_eq!(raw.discards(), 5);
        assert_eq!(raw.admits(), 1 + 4 + 5 + 6);
    }

    #[test]
    fn test_new_all_zeros() {
        let stats = FilterStats::new();
        assert_eq!(stats.discards(), 0);
        assert_eq!(stats.discards_per_sec, 0.0);
        assert!(stats.prev_raw.is_none());
    }

    #[test]
    fn test_first_update_sets_cumulative_only() {
        let mut stats = FilterStats::new();
        stats.update(snapshot(10, 20, 300));
        assert_eq!(stats.ban_drops, 10);
        assert_eq!(stats.rate_drops, 20);
        assert_eq!(stats.rate_admits, 300);
        assert_eq!(stats.discards_per_sec, 0.0);
        assert_eq!(stats.admits_per_sec, 0.0);
    }

    #[test]
    fn test_second_update_calculates_rate() {
        let mut stats = FilterStats::new();
        stats.update(snapshot(0, 0, 0));
        std::thread::sleep(Duration::from_millis(50));
        stats.update(snapshot(100, 100, 1000));

        assert_eq!(stats.discards(), 200);
        assert!(stats.discards_per_sec > 0.0);
        assert!(stats.admits_per_sec > stats.discards_per_sec);
    }

    #[test]
    fn test_counter_decrease_does_not_underflow() {
        let mut stats = FilterStats::new();
        stats.update(snapshot(100, 100, 100));
        std::thread::sleep(Duration::from_millis(10));
        // 맵이 다시 로드되면 누적값이 줄어들 수 있음
        stats.update(snapshot(1, 1, 1));
        assert_eq!(stats.discards_per_sec, 0.0);
        assert_eq!(stats.admits_per_sec, 0.0);
        assert_eq!(stats.ban_drops, 1);
    }

    #[test]
    fn test_reset_clears_all_state() {
        let mut stats = FilterStats::new();
        stats.update(snapshot(5, 5, 5));
        stats.reset();
        assert_eq!(stats.discards(), 0);
        assert!(stats.last_poll.is_none());
        assert!(stats.prev_raw.is_none());
    }

    #[test]
    fn test_serializes_without_internal_state() {
        let mut stats = FilterStats::new();
        stats.update(snapshot(1, 2, 3));
        let rendered = toml::to_string(&stats).unwrap();
        assert!(rendered.contains("ban_drops = 1"));
        assert!(!rendered.contains("prev_raw"));
    }
}
