//! 호스트 테이블 -- 차단 목록과 발신지별 레이트 카운터
//!
//! 커널의 `BANNED_IPS` / `RATE_LIMIT` HashMap 맵과 같은 의미를 갖는 유저스페이스
//! 테이블입니다. 둘 다 고정 용량을 가지며, 샤딩된 [`DashMap`] 위에 구현되어
//! 데이터 경로에서 전역 락 없이 접근합니다.
//!
//! 키는 커널과 동일하게 와이어 바이트 순서의 IPv4 주소를 native `u32`로
//! 해석한 값입니다 ([`addr_key`]).

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use flowgate_core::error::FilterError;
use flowgate_filter_common::{BanLookup, CounterStore, addr_key, key_octets};

const NUM_SHARDS: usize = 16;

/// 차단 테이블 이름 (에러 메시지용)
pub const BAN_TABLE: &str = "ban";
/// 카운터 테이블 이름 (에러 메시지용)
pub const COUNTER_TABLE: &str = "rate_counter";

/// 차단 목록: 주소 키 → 차단 플래그 (0이 아니면 차단)
///
/// 컨트롤 플레인만 기록하고 데이터 경로는 읽기만 합니다.
#[derive(Debug)]
pub struct BanTable {
    entries: DashMap<u32, u8>,
    capacity: usize,
}

impl BanTable {
    /// 최대 `capacity`개의 엔트리를 갖는 빈 테이블을 생성합니다.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity_and_shard_amount(capacity, NUM_SHARDS),
            capacity,
        }
    }

    /// 주소의 차단 플래그를 기록합니다.
    ///
    /// 새 주소를 추가할 때 테이블이 가득 차 있으면 `FilterError::TableFull`.
    pub fn set(&self, addr: Ipv4Addr, banned: bool) -> Result<(), FilterError> {
        let key = addr_key(addr.octets());
        let flag = u8::from(banned);

        if let Some(mut existing) = self.entries.get_mut(&key) {
            *existing = flag;
            return Ok(());
        }
        if self.entries.len() >= self.capacity {
            return Err(FilterError::TableFull {
                table: BAN_TABLE,
                capacity: self.capacity,
            });
        }
        self.entries.insert(key, flag);
        Ok(())
    }

    /// 주소 엔트리를 제거합니다. 존재했으면 `true`.
    pub fn clear(&self, addr: Ipv4Addr) -> bool {
        self.entries.remove(&addr_key(addr.octets())).is_some()
    }

    /// 주소가 차단 상태인지 확인합니다.
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.is_banned(addr_key(addr.octets()))
    }

    /// 플래그가 설정된 주소 목록
    pub fn banned(&self) -> Vec<Ipv4Addr> {
        self.entries
            .iter()
            .filter(|entry| *entry.value() != 0)
            .map(|entry| Ipv4Addr::from(key_octets(*entry.key())))
            .collect()
    }

    /// 엔트리 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 최대 엔트리 수
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl BanLookup for BanTable {
    fn is_banned(&self, addr: u32) -> bool {
        self.entries.get(&addr).is_some_and(|flag| *flag != 0)
    }
}

/// 발신지별 패킷 카운터
///
/// 엔트리마다 [`AtomicU64`]를 두어 같은 발신지에 대한 동시 증가가 유실되지
/// 않습니다. 첫 삽입 경합은 entry API로 해소되며, 늦은 쪽은 먼저 생성된
/// 엔트리에 더합니다.
#[derive(Debug)]
pub struct RateCounters {
    entries: DashMap<u32, AtomicU64>,
    capacity: usize,
    // DashMap::len()은 모든 샤드를 잠그므로 용량 검사는 별도 카운터로 함
    len: AtomicUsize,
}

impl RateCounters {
    /// 최대 `capacity`개의 발신지를 추적하는 빈 테이블을 생성합니다.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity_and_shard_amount(capacity, NUM_SHARDS),
            capacity,
            len: AtomicUsize::new(0),
        }
    }

    /// 주소의 현재 카운트. 엔트리가 없으면 `None`.
    pub fn count(&self, addr: Ipv4Addr) -> Option<u64> {
        self.entries
            .get(&addr_key(addr.octets()))
            .map(|count| count.load(Ordering::Relaxed))
    }

    /// 모든 엔트리를 제거하고 제거한 수를 반환합니다.
    pub fn reset(&self) -> usize {
        let mut removed = 0usize;
        self.entries.retain(|_, _| {
            removed += 1;
            false
        });
        self.len.fetch_sub(removed, Ordering::AcqRel);
        removed
    }

    /// 추적 중인 발신지 수
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 최대 엔트리 수
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn bump(count: &AtomicU64) -> u64 {
        count.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl CounterStore for RateCounters {
    fn increment(&self, addr: u32) -> Option<u64> {
        if let Some(count) = self.entries.get(&addr) {
            return Some(Self::bump(&count));
        }

        // 슬롯을 먼저 예약하고, 용량을 넘으면 되돌림
        if self.len.fetch_add(1, Ordering::AcqRel) >= self.capacity {
            self.len.fetch_sub(1, Ordering::AcqRel);
            return self.entries.get(&addr).map(|count| Self::bump(&count));
        }

        match self.entries.entry(addr) {
            Entry::Occupied(entry) => {
                self.len.fetch_sub(1, Ordering::AcqRel);
                Some(Self::bump(entry.get()))
            }
            Entry::Vacant(entry) => {
                entry.insert(AtomicU64::new(1));
                Some(1)
            }
        }
    }
}
