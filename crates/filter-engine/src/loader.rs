//! aya 기반 커널 오브젝트 로더 (Linux 전용)
//!
//! XDP 오브젝트를 로드하고, 맵 핸들을 꺼내고, 디스패치 테이블과 차단 목록을
//! 채우는 저수준 작업을 담당합니다. 라이프사이클 관리는 [`crate::engine`]이 합니다.

use std::net::Ipv4Addr;
use std::sync::Arc;

use aya::maps::{HashMap as AyaHashMap, MapData, MapError, PerCpuArray, ProgramArray, RingBuf};
use aya::programs::{Xdp, XdpFlags, xdp::XdpLinkId};
use aya::{Ebpf, EbpfLoader};
use tokio::sync::Mutex;
use tracing::{debug, info};

use flowgate_core::config::FilterConfig;
use flowgate_core::error::FilterError;
use flowgate_filter_common::{
    MAP_BANNED_IPS, MAP_EVENTS, MAP_RATE_LIMIT, MAP_STAGES, MAP_STATS, PROG_BAN_FILTER,
    PROG_MAIN, PROG_RATE_LIMITER, addr_key,
};

/// 카운터 맵 핸들 (엔진과 리셋 태스크가 공유)
pub(crate) type CounterMap = Arc<Mutex<AyaHashMap<MapData, u32, u64>>>;

/// 로드된 커널 오브젝트와 맵 핸들
pub(crate) struct Loaded {
    bpf: Ebpf,
    bans: AyaHashMap<MapData, u32, u8>,
    pub(crate) counters: CounterMap,
    stages: ProgramArray<MapData>,
    /// 이벤트 리더 태스크가 가져감
    pub(crate) events: Option<RingBuf<MapData>>,
    /// 통계 폴러 태스크가 가져감
    pub(crate) stats: Option<PerCpuArray<MapData, u64>>,
    link: Option<XdpLinkId>,
}

/// 설정 문자열을 XDP 어태치 플래그로 변환합니다.
pub(crate) fn xdp_flags(mode: &str) -> XdpFlags {
    match mode {
        "native" => XdpFlags::DRV_MODE,
        "hw" => XdpFlags::HW_MODE,
        _ => XdpFlags::SKB_MODE,
    }
}

fn map_err(context: &str, e: impl std::fmt::Display) -> FilterError {
    FilterError::Map(format!("{context}: {e}"))
}

fn take_map(bpf: &mut Ebpf, name: &str) -> Result<aya::maps::Map, FilterError> {
    bpf.take_map(name)
        .ok_or_else(|| FilterError::Map(format!("map {name} not found")))
}

impl Loaded {
    /// 오브젝트 파일을 읽어 커널에 로드하고 모든 XDP 프로그램을 검증기에 통과시킵니다.
    pub(crate) fn load(config: &FilterConfig) -> Result<Self, FilterError> {
        let bytes = std::fs::read(&config.program_path)
            .map_err(|e| FilterError::Load(format!("{}: {e}", config.program_path)))?;

        let ring_size = u32::try_from(config.ring_buffer_size)
            .map_err(|_| FilterError::Load("ring buffer size exceeds u32".to_owned()))?;

        let mut bpf = EbpfLoader::new()
            .set_max_entries(MAP_BANNED_IPS, config.table_max_entries)
            .set_max_entries(MAP_RATE_LIMIT, config.table_max_entries)
            .set_max_entries(MAP_EVENTS, ring_size)
            .load(&bytes)
            .map_err(|e| FilterError::Load(e.to_string()))?;

        for name in [PROG_MAIN, PROG_BAN_FILTER, PROG_RATE_LIMITER] {
            let program: &mut Xdp = bpf
                .program_mut(name)
                .ok_or_else(|| FilterError::Load(format!("program {name} not found")))?
                .try_into()
                .map_err(|e| FilterError::Load(format!("{name}: {e}")))?;
            program
                .load()
                .map_err(|e| FilterError::Load(format!("{name}: {e}")))?;
            debug!(program = name, "XDP program loaded");
        }

        let bans = AyaHashMap::try_from(take_map(&mut bpf, MAP_BANNED_IPS)?)
            .map_err(|e| map_err(MAP_BANNED_IPS, e))?;
        let counters = AyaHashMap::try_from(take_map(&mut bpf, MAP_RATE_LIMIT)?)
            .map_err(|e| map_err(MAP_RATE_LIMIT, e))?;
        let stages = ProgramArray::try_from(take_map(&mut bpf, MAP_STAGES)?)
            .map_err(|e| map_err(MAP_STAGES, e))?;
        let events = RingBuf::try_from(take_map(&mut bpf, MAP_EVENTS)?)
            .map_err(|e| map_err(MAP_EVENTS, e))?;
        let stats = PerCpuArray::try_from(take_map(&mut bpf, MAP_STATS)?)
            .map_err(|e| map_err(MAP_STATS, e))?;

        info!(path = %config.program_path, "XDP object loaded");

        Ok(Self {
            bpf,
            bans,
            counters: Arc::new(Mutex::new(counters)),
            stages,
            events: Some(events),
            stats: Some(stats),
            link: None,
        })
    }

    /// 디스패치 테이블 슬롯에 프로그램을 설치합니다.
    pub(crate) fn set_stage(&mut self, slot: u32, program: &str) -> Result<(), FilterError> {
        let xdp: &Xdp = self
            .bpf
            .program(program)
            .ok_or_else(|| FilterError::Map(format!("program {program} not found")))?
            .try_into()
            .map_err(|e| map_err(program, e))?;
        let fd = xdp.fd().map_err(|e| map_err(program, e))?;
        self.stages
            .set(slot, fd, 0)
            .map_err(|e| map_err(MAP_STAGES, e))
    }

    /// 디스패치 테이블 슬롯을 비웁니다.
    pub(crate) fn clear_stage(&mut self, slot: u32) -> Result<(), FilterError> {
        match self.stages.clear_index(&slot) {
            Ok(()) | Err(MapError::KeyNotFound) => Ok(()),
            Err(e) => Err(map_err(MAP_STAGES, e)),
        }
    }

    /// 주소를 차단 플래그 1로 기록합니다.
    pub(crate) fn insert_ban(&mut self, addr: Ipv4Addr) -> Result<(), FilterError> {
        self.bans
            .insert(addr_key(addr.octets()), 1u8, 0)
            .map_err(|e| map_err(MAP_BANNED_IPS, e))
    }

    /// 차단 엔트리를 제거합니다.
    pub(crate) fn clear_ban(&mut self, addr: Ipv4Addr) -> Result<(), FilterError> {
        match self.bans.remove(&addr_key(addr.octets())) {
            Ok(()) | Err(MapError::KeyNotFound) => Ok(()),
            Err(e) => Err(map_err(MAP_BANNED_IPS, e)),
        }
    }

    /// 차단 맵의 엔트리 수
    pub(crate) fn ban_count(&self) -> usize {
        self.bans.keys().filter(Result::is_ok).count()
    }

    /// 진입점 프로그램을 인터페이스에 어태치합니다.
    pub(crate) fn attach(&mut self, interface: &str, flags: XdpFlags) -> Result<(), FilterError> {
        let attach_err = |reason: String| FilterError::Attach {
            interface: interface.to_owned(),
            reason,
        };
        let program: &mut Xdp = self
            .bpf
            .program_mut(PROG_MAIN)
            .ok_or_else(|| attach_err(format!("program {PROG_MAIN} not found")))?
            .try_into()
            .map_err(|e| attach_err(format!("{e}")))?;
        let link = program
            .attach(interface, flags)
            .map_err(|e| attach_err(e.to_string()))?;
        self.link = Some(link);
        Ok(())
    }

    /// 어태치된 링크를 해제합니다. 어태치되어 있지 않으면 아무것도 하지 않습니다.
    pub(crate) fn detach(&mut self) -> Result<(), FilterError> {
        let Some(link) = self.link.take() else {
            return Ok(());
        };
        let program: &mut Xdp = self
            .bpf
            .program_mut(PROG_MAIN)
            .ok_or_else(|| FilterError::Map(format!("program {PROG_MAIN} not found")))?
            .try_into()
            .map_err(|e| map_err(PROG_MAIN, e))?;
        program.detach(link).map_err(|e| map_err(PROG_MAIN, e))
    }
}

/// 주소의 현재 카운트를 읽습니다. 엔트리가 없으면 `None`.
pub(crate) async fn read_counter(
    counters: &CounterMap,
    addr: Ipv4Addr,
) -> Result<Option<u64>, FilterError> {
    let map = counters.lock().await;
    match map.get(&addr_key(addr.octets()), 0) {
        Ok(count) => Ok(Some(count)),
        Err(MapError::KeyNotFound) => Ok(None),
        Err(e) => Err(map_err(MAP_RATE_LIMIT, e)),
    }
}

/// 카운터 맵을 비우고 제거한 엔트리 수를 반환합니다.
///
/// 순회 중 데이터 경로가 새 엔트리를 만들 수 있으므로 키를 먼저 모은 뒤 제거합니다.
pub(crate) async fn clear_counters(counters: &CounterMap) -> usize {
    let mut map = counters.lock().await;
    let keys: Vec<u32> = map.keys().filter_map(Result::ok).collect();
    let mut removed = 0;
    for key in &keys {
        if map.remove(key).is_ok() {
            removed += 1;
        }
    }
    removed
}

