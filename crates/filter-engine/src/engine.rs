//! 필터 엔진 -- XDP 프로그램 로드/관리 및 백그라운드 태스크
//!
//! [`FilterEngine`]은 XDP 필터의 전체 라이프사이클을 관리하는 컨트롤 플레인입니다.
//! 빌더 패턴([`FilterEngineBuilder`])으로 생성하며, [`Pipeline`] trait을 구현합니다.
//!
//! # 아키텍처
//! ```text
//! ┌──────────────┐  tail call  ┌────────────────┐     ┌──────────────┐
//! │  xdp_main    │────────────▶│ ban / rate     │────▶│ RingBuf      │
//! │  (dispatch)  │   STAGES    │ stages         │     │ (events)     │
//! └──────────────┘             └────────────────┘     └──────┬───────┘
//!        ▲  BANNED_IPS / STAGES / RATE_LIMIT                 │
//!        │                                                   ▼
//! ┌──────┴───────────────────────────────────────────────────────────┐
//! │ FilterEngine (userspace)                                         │
//! │  set_ban / set_stage / attach     event reader ──▶ mpsc::Sender  │
//! │  stats poller (STATS)             window reset (RATE_LIMIT)      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # 사용 예시
//! ```ignore
//! let (mut engine, event_rx) = FilterEngine::builder()
//!     .config(engine_config)
//!     .channel_capacity(1024)
//!     .build()?;
//!
//! engine.start().await?;
//! engine.set_ban("192.168.1.100".parse()?, true)?;
//! ```

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use flowgate_core::error::{FilterError, FlowgateError, PipelineError};
use flowgate_core::event::DiscardEvent;
use flowgate_core::metrics as m;
use flowgate_core::pipeline::{HealthStatus, Pipeline};
use flowgate_filter_common::{
    PROG_BAN_FILTER, PROG_RATE_LIMITER, SLOT_BAN_FILTER, SLOT_RATE_LIMITER, STAGE_SLOTS,
};

use crate::config::{BanRule, EngineConfig};
use crate::event::ChannelSink;
use crate::stats::FilterStats;

/// 필터 엔진 -- XDP 프로그램 로드/관리 및 이벤트 처리
///
/// # Linux 전용
/// `aya::Ebpf` 핸들은 Linux에서만 사용 가능합니다.
/// macOS/Windows에서는 attach/start 시 에러를 반환합니다.
pub struct FilterEngine {
    config: EngineConfig,
    sink: ChannelSink,
    running: bool,
    stats: Arc<RwLock<FilterStats>>,
    /// 슬롯 → 스테이지 프로그램 이름
    stages: BTreeMap<u32, String>,
    attached: Option<String>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    /// 로드된 커널 오브젝트 (Linux 전용)
    #[cfg(target_os = "linux")]
    kernel: Option<crate::loader::Loaded>,
}

/// 필터 엔진 빌더
///
/// `build()`는 `(FilterEngine, mpsc::Receiver<DiscardEvent>)` 튜플을 반환하여
/// 이벤트 수신자를 호출자에게 전달합니다.
pub struct FilterEngineBuilder {
    config: Option<EngineConfig>,
    event_tx: Option<mpsc::Sender<DiscardEvent>>,
    channel_capacity: usize,
}

impl FilterEngineBuilder {
    fn new() -> Self {
        Self {
            config: None,
            event_tx: None,
            channel_capacity: 1024,
        }
    }

    /// 엔진 설정을 지정합니다.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// 외부 이벤트 채널의 송신자를 지정합니다.
    ///
    /// 지정하면 이벤트는 이 송신자로만 전달되고, `build()`가 돌려주는 수신자는
    /// 이미 닫혀 있습니다 (`recv()`가 즉시 `None`). 지정하지 않으면 `build()` 시
    /// 내부적으로 채널을 생성합니다.
    pub fn event_sender(mut self, tx: mpsc::Sender<DiscardEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// 내부 이벤트 채널 용량을 지정합니다 (기본: 1024).
    pub fn channel_capacity(mut self, cap: usize) -> Self {
        self.channel_capacity = cap;
        self
    }

    /// 엔진과 이벤트 수신 채널을 생성합니다.
    ///
    /// # 에러
    /// - `PipelineError::InitFailed`: 필수 설정이 누락되었거나 채널 용량이 0인 경우
    pub fn build(self) -> Result<(FilterEngine, mpsc::Receiver<DiscardEvent>), FlowgateError> {
        let config = self
            .config
            .ok_or_else(|| PipelineError::InitFailed("config is required".to_owned()))?;
        if self.channel_capacity == 0 {
            return Err(
                PipelineError::InitFailed("channel capacity must be non-zero".to_owned()).into(),
            );
        }

        let (event_tx, event_rx) = match self.event_tx {
            Some(tx) => {
                // 외부 채널 사용 시 호출자에게는 닫힌 수신자를 반환
                let (_unused_tx, rx) = mpsc::channel(1);
                (tx, rx)
            }
            None => mpsc::channel(self.channel_capacity),
        };

        let stages = BTreeMap::from([
            (SLOT_BAN_FILTER, PROG_BAN_FILTER.to_owned()),
            (SLOT_RATE_LIMITER, PROG_RATE_LIMITER.to_owned()),
        ]);

        let engine = FilterEngine {
            config,
            sink: ChannelSink::new(event_tx),
            running: false,
            stats: Arc::new(RwLock::new(FilterStats::new())),
            stages,
            attached: None,
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
            #[cfg(target_os = "linux")]
            kernel: None,
        };

        Ok((engine, event_rx))
    }
}

impl FilterEngine {
    /// 빌더를 반환합니다.
    pub fn builder() -> FilterEngineBuilder {
        FilterEngineBuilder::new()
    }

    /// 현재 판정 통계의 사본을 반환합니다.
    pub async fn stats(&self) -> FilterStats {
        self.stats.read().await.clone()
    }

    /// 현재 설정을 반환합니다.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 현재 어태치된 인터페이스
    pub fn attached_interface(&self) -> Option<&str> {
        self.attached.as_deref()
    }

    /// 슬롯에 설치될 스테이지 프로그램 이름
    pub fn stage(&self, slot: u32) -> Option<&str> {
        self.stages.get(&slot).map(String::as_str)
    }

    // ─── 차단 목록 ──────────────────────────────────────────────────

    /// 주소의 차단 여부를 기록합니다.
    ///
    /// `banned = false`는 엔트리를 제거합니다 (엔트리 없음 = 차단 아님).
    /// 커널 오브젝트가 로드되어 있으면 `BANNED_IPS` 맵을 먼저 갱신하고, 성공한
    /// 경우에만 설정을 바꿉니다. 쓰기가 끝난 뒤 처리되는 패킷부터 적용됩니다.
    ///
    /// # 에러
    /// - `FilterError::TableFull`: 새 주소를 넣을 자리가 없는 경우
    /// - `FilterError::Map`: 커널 맵 쓰기 실패 (설정은 변경되지 않음)
    pub fn set_ban(&mut self, addr: Ipv4Addr, banned: bool) -> Result<(), FlowgateError> {
        if !banned {
            self.clear_ban(addr)?;
            return Ok(());
        }
        if self.config.ban_addrs().any(|a| a == addr) {
            return Ok(());
        }
        self.insert_bans(vec![BanRule::new(addr)])?;
        info!(%addr, "address banned");
        Ok(())
    }

    /// 주소의 차단 엔트리를 제거합니다. 설정에 존재했으면 `true`.
    pub fn clear_ban(&mut self, addr: Ipv4Addr) -> Result<bool, FlowgateError> {
        #[cfg(target_os = "linux")]
        if let Some(kernel) = self.kernel.as_mut() {
            kernel.clear_ban(addr)?;
            metrics::gauge!(m::FILTER_BANNED_ADDRESSES).set(kernel.ban_count() as f64);
        }

        let removed = self.config.remove_ban(addr);
        info!(%addr, removed, "ban cleared");
        Ok(removed)
    }

    /// 차단 규칙을 커널 맵과 설정에 반영하고 새로 추가된 주소 수를 반환합니다.
    ///
    /// 이미 있는 주소는 설정의 규칙(사유)만 갱신합니다. 새 주소가 남은 자리보다
    /// 많으면 아무것도 바꾸지 않고 `TableFull`을 반환합니다. 커널 쓰기가 중간에
    /// 실패하면 이번 호출에서 넣은 엔트리를 되돌립니다.
    fn insert_bans(&mut self, rules: Vec<BanRule>) -> Result<usize, FlowgateError> {
        let mut fresh: Vec<BanRule> = Vec::new();
        let mut known: Vec<BanRule> = Vec::new();
        for rule in rules {
            if self.config.ban_addrs().any(|a| a == rule.addr) {
                known.push(rule);
            } else if let Some(pos) = fresh.iter().position(|r| r.addr == rule.addr) {
                fresh[pos] = rule;
            } else {
                fresh.push(rule);
            }
        }

        let capacity = self.config.table_capacity();
        if self.ban_entries() + fresh.len() > capacity {
            return Err(FilterError::TableFull {
                table: crate::tables::BAN_TABLE,
                capacity,
            }
            .into());
        }

        #[cfg(target_os = "linux")]
        if let Some(kernel) = self.kernel.as_mut() {
            for (written, rule) in fresh.iter().enumerate() {
                if let Err(e) = kernel.insert_ban(rule.addr) {
                    for undo in &fresh[..written] {
                        if let Err(undo_err) = kernel.clear_ban(undo.addr) {
                            warn!(addr = %undo.addr, error = %undo_err, "failed to roll back ban");
                        }
                    }
                    return Err(e.into());
                }
            }
            metrics::gauge!(m::FILTER_BANNED_ADDRESSES).set(kernel.ban_count() as f64);
        }

        let added = fresh.len();
        for rule in known.into_iter().chain(fresh) {
            self.config.add_ban(rule);
        }
        Ok(added)
    }

    /// 차단 테이블이 차지한 엔트리 수. 로드된 뒤에는 커널 맵 기준.
    fn ban_entries(&self) -> usize {
        #[cfg(target_os = "linux")]
        if let Some(kernel) = self.kernel.as_ref() {
            return kernel.ban_count();
        }
        self.config.bans.len()
    }

    // ─── 디스패치 테이블 ────────────────────────────────────────────

    /// 디스패치 슬롯에 스테이지 프로그램을 지정합니다.
    ///
    /// # 에러
    /// - `FilterError::InvalidSlot`: 슬롯이 범위를 벗어난 경우
    /// - `FilterError::Map`: 로드된 오브젝트에 프로그램이 없는 경우
    pub fn set_stage(&mut self, slot: u32, program: &str) -> Result<(), FlowgateError> {
        check_slot(slot)?;

        #[cfg(target_os = "linux")]
        if let Some(kernel) = self.kernel.as_mut() {
            kernel.set_stage(slot, program)?;
        }

        self.stages.insert(slot, program.to_owned());
        info!(slot, program, "dispatch slot populated");
        Ok(())
    }

    /// 디스패치 슬롯을 비웁니다. 이후 이 슬롯으로 라우팅되는 패킷은 통과합니다.
    pub fn clear_stage(&mut self, slot: u32) -> Result<(), FlowgateError> {
        check_slot(slot)?;

        #[cfg(target_os = "linux")]
        if let Some(kernel) = self.kernel.as_mut() {
            kernel.clear_stage(slot)?;
        }

        self.stages.remove(&slot);
        info!(slot, "dispatch slot cleared");
        Ok(())
    }

    // ─── 어태치 ─────────────────────────────────────────────────────

    /// XDP 진입점을 인터페이스에 어태치합니다.
    ///
    /// 같은 인터페이스에 이미 어태치되어 있으면 아무것도 하지 않고, 다른
    /// 인터페이스면 기존 링크를 해제한 뒤 다시 어태치합니다. 오브젝트가
    /// 로드되지 않았으면 로드하고 디스패치 테이블과 차단 목록을 먼저 채웁니다.
    #[cfg(target_os = "linux")]
    pub fn attach(&mut self, interface: &str) -> Result<(), FlowgateError> {
        if self.attached.as_deref() == Some(interface) {
            info!(interface, "already attached");
            return Ok(());
        }
        if self.attached.is_some() {
            self.detach()?;
        }

        self.ensure_loaded()?;
        let flags = crate::loader::xdp_flags(&self.config.base.xdp_mode);
        if let Some(kernel) = self.kernel.as_mut() {
            kernel.attach(interface, flags)?;
        }

        self.config.base.interface = interface.to_owned();
        self.attached = Some(interface.to_owned());
        info!(
            interface,
            xdp_mode = self.config.base.xdp_mode.as_str(),
            "XDP program attached"
        );
        Ok(())
    }

    /// XDP 진입점을 어태치합니다 (비-Linux 스텁).
    #[cfg(not(target_os = "linux"))]
    pub fn attach(&mut self, interface: &str) -> Result<(), FlowgateError> {
        Err(FilterError::Attach {
            interface: interface.to_owned(),
            reason: "XDP is only supported on Linux".to_owned(),
        }
        .into())
    }

    /// 어태치된 XDP 프로그램을 해제합니다. 어태치되어 있지 않으면 아무것도 하지 않습니다.
    pub fn detach(&mut self) -> Result<(), FlowgateError> {
        let Some(interface) = self.attached.take() else {
            return Ok(());
        };

        #[cfg(target_os = "linux")]
        if let Some(kernel) = self.kernel.as_mut() {
            kernel.detach()?;
        }

        info!(interface = interface.as_str(), "XDP program detached");
        Ok(())
    }

    /// 오브젝트를 로드하고 디스패치 테이블과 차단 목록을 커널 맵에 동기화합니다.
    #[cfg(target_os = "linux")]
    fn ensure_loaded(&mut self) -> Result<(), FlowgateError> {
        if self.kernel.is_some() {
            return Ok(());
        }

        let mut kernel = crate::loader::Loaded::load(&self.config.base)?;
        for (slot, program) in &self.stages {
            kernel.set_stage(*slot, program)?;
        }
        for addr in self.config.ban_addrs() {
            kernel.insert_ban(addr)?;
        }
        metrics::gauge!(m::FILTER_BANNED_ADDRESSES).set(kernel.ban_count() as f64);
        info!(
            stages = self.stages.len(),
            bans = self.config.bans.len(),
            "kernel maps populated"
        );

        self.kernel = Some(kernel);
        Ok(())
    }

    // ─── 카운터 ─────────────────────────────────────────────────────

    /// 주소의 현재 레이트 카운트. 엔트리가 없으면 `None`.
    #[cfg(target_os = "linux")]
    pub async fn counter(&self, addr: Ipv4Addr) -> Result<Option<u64>, FlowgateError> {
        let kernel = self.kernel.as_ref().ok_or(PipelineError::NotRunning)?;
        Ok(crate::loader::read_counter(&kernel.counters, addr).await?)
    }

    /// 레이트 카운트를 조회합니다 (비-Linux 스텁).
    #[cfg(not(target_os = "linux"))]
    pub async fn counter(&self, _addr: Ipv4Addr) -> Result<Option<u64>, FlowgateError> {
        Err(FilterError::Load("eBPF is only supported on Linux".to_owned()).into())
    }

    /// 레이트 카운터 테이블을 비우고 제거한 엔트리 수를 반환합니다.
    #[cfg(target_os = "linux")]
    pub async fn reset_counters(&self) -> Result<usize, FlowgateError> {
        let kernel = self.kernel.as_ref().ok_or(PipelineError::NotRunning)?;
        let removed = crate::loader::clear_counters(&kernel.counters).await;
        metrics::counter!(m::FILTER_COUNTER_RESETS_TOTAL).increment(1);
        info!(removed, "rate counters reset");
        Ok(removed)
    }

    /// 레이트 카운터를 리셋합니다 (비-Linux 스텁).
    #[cfg(not(target_os = "linux"))]
    pub async fn reset_counters(&self) -> Result<usize, FlowgateError> {
        Err(FilterError::Load("eBPF is only supported on Linux".to_owned()).into())
    }

    // ─── 백그라운드 태스크 ──────────────────────────────────────────

    /// 규칙 파일의 차단 규칙을 설정에 병합합니다.
    async fn merge_rules_file(&mut self) -> Result<(), FlowgateError> {
        if self.config.base.rules_path.is_empty() {
            return Ok(());
        }
        let rules = EngineConfig::load_rules(&self.config.base.rules_path).await?;
        info!(
            path = self.config.base.rules_path.as_str(),
            count = rules.len(),
            "ban rules loaded"
        );
        let added = self.insert_bans(rules)?;
        debug!(added, "ban rules merged");
        Ok(())
    }

    /// RingBuf 리더, 통계 폴러, 윈도우 리셋 태스크를 스폰합니다.
    #[cfg(target_os = "linux")]
    fn spawn_tasks(&mut self) -> Result<(), FlowgateError> {
        use std::time::Duration;

        let kernel = self
            .kernel
            .as_mut()
            .ok_or_else(|| FilterError::Load("XDP object is not loaded".to_owned()))?;

        if let Some(ring) = kernel.events.take() {
            self.tasks.push(tasks::spawn_event_reader(
                ring,
                self.sink.clone(),
                self.cancel.child_token(),
            )?);
        }

        if let Some(per_cpu) = kernel.stats.take() {
            self.tasks.push(tasks::spawn_stats_poller(
                per_cpu,
                Arc::clone(&self.stats),
                Duration::from_secs(self.config.base.stats_interval_secs),
                self.cancel.child_token(),
            ));
        }

        if self.config.base.window_secs > 0 {
            self.tasks.push(tasks::spawn_window_reset(
                Arc::clone(&kernel.counters),
                Duration::from_secs(self.config.base.window_secs),
                self.cancel.child_token(),
            ));
        }

        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    fn spawn_tasks(&mut self) -> Result<(), FlowgateError> {
        Ok(())
    }

    async fn shutdown_tasks(&mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!(error = %e, "background task ended abnormally");
            }
        }
        self.cancel = CancellationToken::new();
    }
}

fn check_slot(slot: u32) -> Result<(), FilterError> {
    if slot >= STAGE_SLOTS {
        return Err(FilterError::InvalidSlot {
            slot,
            max: STAGE_SLOTS - 1,
        });
    }
    Ok(())
}

impl Pipeline for FilterEngine {
    /// XDP 프로그램을 로드하고 엔진을 시작합니다.
    ///
    /// 1. 규칙 파일 병합
    /// 2. 오브젝트 로드, 디스패치 테이블 / 차단 목록 동기화, 인터페이스 어태치
    /// 3. RingBuf 이벤트 리더, 통계 폴러, 윈도우 리셋 태스크 스폰
    async fn start(&mut self) -> Result<(), FlowgateError> {
        if self.running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        info!(
            interface = self.config.base.interface.as_str(),
            xdp_mode = self.config.base.xdp_mode.as_str(),
            window_secs = self.config.base.window_secs,
            "starting filter engine"
        );

        self.merge_rules_file().await?;
        let interface = self.config.base.interface.clone();
        self.attach(&interface)?;

        if let Err(e) = self.spawn_tasks() {
            self.shutdown_tasks().await;
            self.detach()?;
            return Err(e);
        }

        self.running = true;
        Ok(())
    }

    /// 엔진을 정지하고 리소스를 정리합니다.
    ///
    /// 1. 백그라운드 태스크 취소
    /// 2. XDP 프로그램 해제
    /// 3. 커널 오브젝트 해제 (다음 start에서 다시 로드)
    async fn stop(&mut self) -> Result<(), FlowgateError> {
        if !self.running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping filter engine");

        self.shutdown_tasks().await;
        self.detach()?;
        #[cfg(target_os = "linux")]
        {
            self.kernel = None;
        }
        self.running = false;
        Ok(())
    }

    /// 엔진의 현재 상태를 확인합니다.
    async fn health_check(&self) -> HealthStatus {
        if !self.running {
            return HealthStatus::Unhealthy("not running".to_owned());
        }
        if self.attached.is_none() {
            return HealthStatus::Degraded("XDP program not attached".to_owned());
        }
        if self.tasks.iter().any(JoinHandle::is_finished) {
            return HealthStatus::Degraded("background task exited".to_owned());
        }
        HealthStatus::Healthy
    }
}

#[cfg(target_os = "linux")]
mod tasks {
    use std::sync::Arc;
    use std::time::Duration;

    use aya::maps::{MapData, PerCpuArray, RingBuf};
    use tokio::io::unix::AsyncFd;
    use tokio::sync::RwLock;
    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;
    use tracing::{debug, warn};

    use flowgate_core::error::FlowgateError;
    use flowgate_core::metrics as m;
    use flowgate_filter_common::STATS_MAX_ENTRIES;

    use crate::event::{ChannelSink, parse_record};
    use crate::loader::{CounterMap, clear_counters};
    use crate::stats::{FilterStats, RawFilterSnapshot};

    /// RingBuf에서 폐기 이벤트를 읽어 채널로 전달합니다.
    pub(super) fn spawn_event_reader(
        ring: RingBuf<MapData>,
        sink: ChannelSink,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<()>, FlowgateError> {
        let mut fd = AsyncFd::new(ring)?;

        Ok(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    guard = fd.readable_mut() => {
                        let mut guard = match guard {
                            Ok(guard) => guard,
                            Err(e) => {
                                warn!(error = %e, "ring buffer poll failed");
                                break;
                            }
                        };
                        let ring = guard.get_inner_mut();
                        while let Some(record) = ring.next() {
                            let Some(event) = parse_record(&record) else {
                                debug!(len = record.len(), "short discard record skipped");
                                continue;
                            };
                            metrics::counter!(
                                m::FILTER_DISCARD_EVENTS_TOTAL,
                                m::LABEL_STAGE => event.stage.as_str()
                            )
                            .increment(1);
                            sink.send(event);
                        }
                        guard.clear_ready();
                    }
                }
            }
            debug!("event reader stopped");
        }))
    }

    /// `STATS` PerCpuArray를 주기적으로 합산하여 통계를 갱신합니다.
    pub(super) fn spawn_stats_poller(
        per_cpu: PerCpuArray<MapData, u64>,
        stats: Arc<RwLock<FilterStats>>,
        period: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let mut values = [0u64; STATS_MAX_ENTRIES as usize];
                        for (index, value) in values.iter_mut().enumerate() {
                            match per_cpu.get(&(index as u32), 0) {
                                Ok(per_cpu_values) => *value = per_cpu_values.iter().sum(),
                                Err(e) => debug!(index, error = %e, "stats read failed"),
                            }
                        }
                        stats.write().await.update(RawFilterSnapshot::from_counters(values));
                    }
                }
            }
            debug!("stats poller stopped");
        })
    }

    /// 고정 윈도우마다 레이트 카운터 맵을 비웁니다.
    pub(super) fn spawn_window_reset(
        counters: CounterMap,
        period: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let removed = clear_counters(&counters).await;
                        metrics::counter!(m::FILTER_COUNTER_RESETS_TOTAL).increment(1);
                        debug!(removed, "rate counter window reset");
                    }
                }
            }
            debug!("window reset stopped");
        })
    }
}
