//! 설정 관리 -- flowgate.toml 파싱 및 런타임 설정
//!
//! [`FlowgateConfig`]는 데몬과 필터 엔진의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`FLOWGATE_FILTER_INTERFACE=eth0` 형식)
//! 3. 설정 파일 (`flowgate.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), flowgate_core::error::FlowgateError> {
//! use flowgate_core::config::FlowgateConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = FlowgateConfig::load("flowgate.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = FlowgateConfig::parse("[filter]\ninterface = \"ens3\"")?;
//! # Ok(())
//! # }
//! ```

use std::net::Ipv4Addr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, FlowgateError};

/// flowgate 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowgateConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 패킷 필터 설정
    #[serde(default)]
    pub filter: FilterConfig,
    /// 메트릭 노출 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl FlowgateConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, FlowgateError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, FlowgateError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FlowgateError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                FlowgateError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, FlowgateError> {
        toml::from_str(toml_str).map_err(|e| {
            FlowgateError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `FLOWGATE_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "FLOWGATE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "FLOWGATE_GENERAL_LOG_FORMAT");

        // Filter
        override_bool(&mut self.filter.enabled, "FLOWGATE_FILTER_ENABLED");
        override_string(&mut self.filter.interface, "FLOWGATE_FILTER_INTERFACE");
        override_string(&mut self.filter.xdp_mode, "FLOWGATE_FILTER_XDP_MODE");
        override_string(
            &mut self.filter.program_path,
            "FLOWGATE_FILTER_PROGRAM_PATH",
        );
        override_u32(
            &mut self.filter.table_max_entries,
            "FLOWGATE_FILTER_TABLE_MAX_ENTRIES",
        );
        override_usize(
            &mut self.filter.ring_buffer_size,
            "FLOWGATE_FILTER_RING_BUFFER_SIZE",
        );
        override_u64(&mut self.filter.window_secs, "FLOWGATE_FILTER_WINDOW_SECS");
        override_u64(
            &mut self.filter.stats_interval_secs,
            "FLOWGATE_FILTER_STATS_INTERVAL_SECS",
        );
        override_string(&mut self.filter.rules_path, "FLOWGATE_FILTER_RULES_PATH");
        override_csv(&mut self.filter.bans, "FLOWGATE_FILTER_BANS");

        // Metrics
        override_bool(&mut self.metrics.enabled, "FLOWGATE_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "FLOWGATE_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "FLOWGATE_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), FlowgateError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.filter.enabled {
            let valid_modes = ["native", "skb", "hw"];
            if !valid_modes.contains(&self.filter.xdp_mode.as_str()) {
                return Err(invalid(
                    "filter.xdp_mode",
                    format!("must be one of: {}", valid_modes.join(", ")),
                ));
            }

            if self.filter.interface.is_empty() {
                return Err(invalid(
                    "filter.interface",
                    "interface must not be empty when filter is enabled".to_owned(),
                ));
            }

            if self.filter.program_path.is_empty() {
                return Err(invalid(
                    "filter.program_path",
                    "program path must not be empty when filter is enabled".to_owned(),
                ));
            }
        }

        if self.filter.table_max_entries == 0 {
            return Err(invalid(
                "filter.table_max_entries",
                "must be greater than zero".to_owned(),
            ));
        }

        // RingBuf 크기는 페이지 크기의 2의 거듭제곱 배여야 커널이 받아들임
        let ring = self.filter.ring_buffer_size;
        if ring < 4096 || !ring.is_power_of_two() {
            return Err(invalid(
                "filter.ring_buffer_size",
                "must be a power of two and at least 4096".to_owned(),
            ));
        }

        if self.filter.stats_interval_secs == 0 {
            return Err(invalid(
                "filter.stats_interval_secs",
                "must be greater than zero".to_owned(),
            ));
        }

        for addr in &self.filter.bans {
            if addr.parse::<Ipv4Addr>().is_err() {
                return Err(invalid(
                    "filter.bans",
                    format!("'{addr}' is not an IPv4 address"),
                ));
            }
        }

        if self.filter.bans.len() > self.filter.table_max_entries as usize {
            return Err(invalid(
                "filter.bans",
                format!(
                    "{} addresses exceed table_max_entries ({})",
                    self.filter.bans.len(),
                    self.filter.table_max_entries
                ),
            ));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(invalid(
                "metrics.port",
                "must be non-zero when metrics are enabled".to_owned(),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> FlowgateError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// `xtask build-ebpf --release`가 생성하는 XDP 오브젝트 기본 경로
pub const DEFAULT_PROGRAM_PATH: &str =
    "crates/filter-engine/ebpf/target/bpfel-unknown-none/release/flowgate-ebpf";

/// 패킷 필터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// XDP를 어태치할 네트워크 인터페이스
    pub interface: String,
    /// XDP 모드 (native, skb, hw)
    pub xdp_mode: String,
    /// 컴파일된 XDP 오브젝트 파일 경로
    pub program_path: String,
    /// 차단 목록 / 카운터 테이블 최대 엔트리 수
    pub table_max_entries: u32,
    /// 폐기 이벤트 링 버퍼 크기 (바이트)
    pub ring_buffer_size: usize,
    /// 레이트 카운터 리셋 주기 (초, 0이면 리셋하지 않음)
    pub window_secs: u64,
    /// 커널 통계 폴링 주기 (초)
    pub stats_interval_secs: u64,
    /// 추가 차단 규칙 TOML 파일 경로 (빈 문자열이면 사용하지 않음)
    pub rules_path: String,
    /// 시작 시 차단할 IPv4 주소 목록
    pub bans: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interface: "eth0".to_owned(),
            xdp_mode: "skb".to_owned(),
            program_path: DEFAULT_PROGRAM_PATH.to_owned(),
            table_max_entries: 1024,
            ring_buffer_size: 64 * 1024, // 64KB
            window_secs: 60,
            stats_interval_secs: 5,
            rules_path: String::new(),
            bans: Vec::new(),
        }
    }
}

/// 메트릭 노출 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
    /// 엔드포인트 경로 (현재 "/metrics"만 지원)
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    override_parsed(target, env_key, "bool");
}

fn override_usize(target: &mut usize, env_key: &str) {
    override_parsed(target, env_key, "usize");
}

fn override_u16(target: &mut u16, env_key: &str) {
    override_parsed(target, env_key, "u16");
}

fn override_u32(target: &mut u32, env_key: &str) {
    override_parsed(target, env_key, "u32");
}

fn override_u64(target: &mut u64, env_key: &str) {
    override_parsed(target, env_key, "u64");
}

fn override_parsed<T: std::str::FromStr>(target: &mut T, env_key: &str, type_name: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                expected = type_name,
                "failed to parse env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = FlowgateConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert!(config.filter.enabled);
        assert_eq!(config.filter.interface, "eth0");
        assert_eq!(config.filter.table_max_entries, 1024);
        assert_eq!(config.filter.window_secs, 60);
        assert!(config.filter.bans.is_empty());
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn default_config_passes_validation() {
        let config = FlowgateConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = FlowgateConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.filter.interface, "eth0");
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[general]
log_level = "debug"

[filter]
interface = "ens3"
bans = ["192.168.1.100"]
"#;
        let config = FlowgateConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        // log_format은 기본값 유지
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.filter.interface, "ens3");
        assert_eq!(config.filter.bans, vec!["192.168.1.100"]);
        assert_eq!(config.filter.xdp_mode, "skb");
    }

    #[test]
    fn from_str_full_toml() {
        let toml = r#"
[general]
log_level = "warn"
log_format = "pretty"

[filter]
enabled = true
interface = "ens3"
xdp_mode = "native"
table_max_entries = 4096
ring_buffer_size = 131072
window_secs = 0
stats_interval_secs = 10
rules_path = "/etc/flowgate/bans.toml"
bans = ["10.0.0.50", "192.168.1.100"]

[metrics]
enabled = true
listen_addr = "0.0.0.0"
port = 9200
"#;
        let config = FlowgateConfig::parse(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.filter.table_max_entries, 4096);
        assert_eq!(config.filter.ring_buffer_size, 131072);
        assert_eq!(config.filter.window_secs, 0);
        assert_eq!(config.filter.bans.len(), 2);
        assert_eq!(config.metrics.port, 9200);
        assert_eq!(config.metrics.endpoint, "/metrics");
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let result = FlowgateConfig::parse("invalid = [[[toml");
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            FlowgateError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = FlowgateConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = FlowgateConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_invalid_xdp_mode_when_enabled() {
        let mut config = FlowgateConfig::default();
        config.filter.xdp_mode = "turbo".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("xdp_mode"));
    }

    #[test]
    fn validate_accepts_invalid_xdp_mode_when_disabled() {
        let mut config = FlowgateConfig::default();
        config.filter.enabled = false;
        config.filter.xdp_mode = "turbo".to_owned();
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_empty_interface_when_enabled() {
        let mut config = FlowgateConfig::default();
        config.filter.interface = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("interface"));
    }

    #[test]
    fn validate_rejects_empty_program_path_when_enabled() {
        let mut config = FlowgateConfig::default();
        config.filter.program_path = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("program_path"));

        config.filter.enabled = false;
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_more_bans_than_table_entries() {
        let mut config = FlowgateConfig::default();
        config.filter.table_max_entries = 1;
        config.filter.bans = vec!["10.0.0.1".to_owned(), "10.0.0.2".to_owned()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("filter.bans"));

        config.filter.bans.pop();
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_table_size() {
        let mut config = FlowgateConfig::default();
        config.filter.table_max_entries = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("table_max_entries"));
    }

    #[test]
    fn validate_rejects_non_power_of_two_ring_buffer() {
        let mut config = FlowgateConfig::default();
        config.filter.ring_buffer_size = 100_000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ring_buffer_size"));

        config.filter.ring_buffer_size = 2048;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_stats_interval() {
        let mut config = FlowgateConfig::default();
        config.filter.stats_interval_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("stats_interval_secs"));
    }

    #[test]
    fn validate_rejects_ipv6_ban() {
        let mut config = FlowgateConfig::default();
        config.filter.bans = vec!["::1".to_owned()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("filter.bans"));
        assert!(err.to_string().contains("::1"));
    }

    #[test]
    fn validate_rejects_zero_metrics_port_when_enabled() {
        let mut config = FlowgateConfig::default();
        config.metrics.enabled = true;
        config.metrics.port = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("metrics.port"));
    }

    #[test]
    #[serial]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: #[serial]로 환경변수를 조작하는 테스트끼리 직렬화됩니다.
        unsafe { std::env::set_var("TEST_FLOWGATE_STR", "overridden") };
        override_string(&mut val, "TEST_FLOWGATE_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_FLOWGATE_STR") };
    }

    #[test]
    #[serial]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = false;
        // SAFETY: #[serial]로 환경변수를 조작하는 테스트끼리 직렬화됩니다.
        unsafe { std::env::set_var("TEST_FLOWGATE_BOOL_BAD", "not-a-bool") };
        override_bool(&mut val, "TEST_FLOWGATE_BOOL_BAD");
        assert!(!val); // 원래 값 유지
        unsafe { std::env::remove_var("TEST_FLOWGATE_BOOL_BAD") };
    }

    #[test]
    #[serial]
    fn env_override_u32_valid() {
        let mut val = 1024u32;
        // SAFETY: #[serial]로 환경변수를 조작하는 테스트끼리 직렬화됩니다.
        unsafe { std::env::set_var("TEST_FLOWGATE_U32", "2048") };
        override_u32(&mut val, "TEST_FLOWGATE_U32");
        assert_eq!(val, 2048);
        unsafe { std::env::remove_var("TEST_FLOWGATE_U32") };
    }

    #[test]
    #[serial]
    fn env_override_csv_skips_empty_items() {
        let mut val = vec!["a".to_owned()];
        // SAFETY: #[serial]로 환경변수를 조작하는 테스트끼리 직렬화됩니다.
        unsafe { std::env::set_var("TEST_FLOWGATE_CSV", "10.0.0.1, ,10.0.0.2") };
        override_csv(&mut val, "TEST_FLOWGATE_CSV");
        assert_eq!(val, vec!["10.0.0.1", "10.0.0.2"]);
        unsafe { std::env::remove_var("TEST_FLOWGATE_CSV") };
    }

    #[test]
    #[serial]
    fn apply_env_overrides_sets_interface() {
        let mut config = FlowgateConfig::default();
        // SAFETY: #[serial]로 환경변수를 조작하는 테스트끼리 직렬화됩니다.
        unsafe { std::env::set_var("FLOWGATE_FILTER_INTERFACE", "ens5") };
        config.apply_env_overrides();
        unsafe { std::env::remove_var("FLOWGATE_FILTER_INTERFACE") };
        assert_eq!(config.filter.interface, "ens5");
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_FLOWGATE_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = FlowgateConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = FlowgateConfig::parse(&toml_str).unwrap();
        assert_eq!(config.general.log_level, parsed.general.log_level);
        assert_eq!(config.filter.interface, parsed.filter.interface);
        assert_eq!(config.filter.window_secs, parsed.filter.window_secs);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = FlowgateConfig::from_file("/nonexistent/path/flowgate.toml").await;
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            FlowgateError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
