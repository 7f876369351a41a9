//! 에러 타입 -- 도메인별 에러 정의
//!
//! 데이터 경로(XDP 프로그램, 호스트 파이프라인 모델)는 에러를 반환하지 않고
//! 항상 fail-open 판정으로 복구합니다. 여기 정의된 에러는 컨트롤 플레인
//! (로드, 어태치, 맵 갱신, 설정)에서만 사용됩니다.

/// flowgate 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum FlowgateError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 라이프사이클 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 패킷 필터 엔진 에러
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 라이프사이클 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 이미 실행 중
    #[error("pipeline is already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline is not running")]
    NotRunning,
}

/// 패킷 필터 엔진 에러
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// eBPF 오브젝트 또는 프로그램 로드 실패
    #[error("ebpf load failed: {0}")]
    Load(String),

    /// 인터페이스 어태치/디태치 실패
    #[error("xdp attach failed on '{interface}': {reason}")]
    Attach { interface: String, reason: String },

    /// eBPF 맵 접근 실패
    #[error("ebpf map error: {0}")]
    Map(String),

    /// 디스패치 테이블 범위를 벗어난 슬롯
    #[error("stage slot {slot} out of range (max: {max})")]
    InvalidSlot { slot: u32, max: u32 },

    /// 테이블 용량 초과
    #[error("table '{table}' is full ({capacity} entries)")]
    TableFull { table: &'static str, capacity: usize },
}
