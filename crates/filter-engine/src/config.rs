//! 필터 엔진 설정 -- 차단 규칙 관리 및 동적 업데이트
//!
//! [`EngineConfig`]는 core의 [`FilterConfig`]를 확장하여 차단 규칙을 관리합니다.
//! 런타임에 규칙을 추가/삭제하면 엔진이 `BANNED_IPS` 맵을 갱신합니다.
//!
//! # 규칙 파일 예시 (TOML)
//! ```toml
//! [[bans]]
//! addr = "10.0.0.50"
//! reason = "Known port scanner"
//!
//! [[bans]]
//! addr = "192.168.1.100"
//! ```

use std::net::Ipv4Addr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use flowgate_core::config::FilterConfig;
use flowgate_core::error::{ConfigError, FilterError, FlowgateError};

/// 차단 규칙
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanRule {
    /// 차단할 발신지 주소
    pub addr: Ipv4Addr,
    /// 차단 사유
    #[serde(default)]
    pub reason: Option<String>,
}

impl BanRule {
    pub fn new(addr: Ipv4Addr) -> Self {
        Self { addr, reason: None }
    }

    pub fn with_reason(addr: Ipv4Addr, reason: impl Into<String>) -> Self {
        Self {
            addr,
            reason: Some(reason.into()),
        }
    }
}

/// 필터 엔진 확장 설정
///
/// `from_core()`로 core 설정에서 생성하고, `load_rules()`로 TOML 파일에서
/// 추가 규칙을 로드합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// core에서 가져온 기본 설정 (interface, xdp_mode, table_max_entries 등)
    #[serde(flatten)]
    pub base: FilterConfig,
    /// 차단 규칙 목록
    #[serde(default, rename = "ban_rules")]
    pub bans: Vec<BanRule>,
}

/// TOML 규칙 파일의 최상위 구조
#[derive(Debug, Clone, Deserialize)]
struct RulesFile {
    #[serde(default)]
    bans: Vec<BanRule>,
}

impl EngineConfig {
    /// core FilterConfig에서 엔진 설정을 생성합니다.
    ///
    /// `base.bans`의 주소 문자열이 규칙으로 변환됩니다.
    pub fn from_core(config: &FilterConfig) -> Result<Self, FlowgateError> {
        let mut engine_config = Self {
            base: config.clone(),
            bans: Vec::new(),
        };
        for addr in &config.bans {
            let addr = addr.parse::<Ipv4Addr>().map_err(|e| ConfigError::InvalidValue {
                field: "filter.bans".to_owned(),
                reason: format!("'{addr}': {e}"),
            })?;
            engine_config.add_ban(BanRule::new(addr));
        }
        if engine_config.bans.len() > engine_config.table_capacity() {
            return Err(FilterError::TableFull {
                table: crate::tables::BAN_TABLE,
                capacity: engine_config.table_capacity(),
            }
            .into());
        }
        Ok(engine_config)
    }

    /// TOML 파일에서 차단 규칙을 로드합니다.
    ///
    /// 파일이 존재하지 않으면 빈 Vec을 반환합니다.
    pub async fn load_rules(path: impl AsRef<Path>) -> Result<Vec<BanRule>, FlowgateError> {
        let path = path.as_ref();
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "rules file not found, skipping");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let file: RulesFile = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            reason: format!("{}: {e}", path.display()),
        })?;
        Ok(file.bans)
    }

    /// 규칙을 추가합니다.
    ///
    /// 같은 주소의 규칙이 이미 존재하면 교체합니다.
    pub fn add_ban(&mut self, rule: BanRule) {
        self.bans.retain(|r| r.addr != rule.addr);
        self.bans.push(rule);
    }

    /// 주소의 규칙을 제거합니다.
    ///
    /// 제거된 경우 `true`, 존재하지 않으면 `false`를 반환합니다.
    pub fn remove_ban(&mut self, addr: Ipv4Addr) -> bool {
        let before = self.bans.len();
        self.bans.retain(|r| r.addr != addr);
        self.bans.len() < before
    }

    /// 차단 대상 주소
    pub fn ban_addrs(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.bans.iter().map(|r| r.addr)
    }

    /// 테이블 최대 엔트리 수
    pub fn table_capacity(&self) -> usize {
        self.base.table_max_entries as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_core_converts_ban_strings() {
        let core = FilterConfig {
            bans: vec!["192.168.1.100".to_owned(), "10.0.0.50".to_owned()],
            ..FilterConfig::default()
        };
        let config = EngineConfig::from_core(&core).unwrap();
        let addrs: Vec<_> = config.ban_addrs().collect();
        assert_eq!(
            addrs,
            vec![Ipv4Addr::new(192, 168, 1, 100), Ipv4Addr::new(10, 0, 0, 50)]
        );
        assert_eq!(config.table_capacity(), 1024);
    }

    #[test]
    fn from_core_rejects_invalid_address() {
        let core = FilterConfig {
            bans: vec!["not-an-ip".to_owned()],
            ..FilterConfig::default()
        };
        let err = EngineConfig::from_core(&core).unwrap_err();
        assert!(err.to_string().contains("filter.bans"));
    }

    #[test]
    fn from_core_rejects_more_bans_than_table_entries() {
        let core = FilterConfig {
            table_max_entries: 2,
            bans: vec!["10.0.0.1".into(), "10.0.0.2".into(), "10.0.0.3".into()],
            ..FilterConfig::default()
        };
        let err = EngineConfig::from_core(&core).unwrap_err();
        assert!(matches!(
            err,
            FlowgateError::Filter(FilterError::TableFull { capacity: 2, .. })
        ));

        // 중복 주소는 한 번만 셈
        let core = FilterConfig {
            table_max_entries: 2,
            bans: vec!["10.0.0.1".into(), "10.0.0.1".into(), "10.0.0.2".into()],
            ..FilterConfig::default()
        };
        assert_eq!(EngineConfig::from_core(&core).unwrap().bans.len(), 2);
    }

    #[test]
    fn add_ban_replaces_same_address() {
        let mut config = EngineConfig::default();
        let addr = Ipv4Addr::new(10, 0, 0, 1);
        config.add_ban(BanRule::new(addr));
        config.add_ban(BanRule::with_reason(addr, "scanner"));
        assert_eq!(config.bans.len(), 1);
        assert_eq!(config.bans[0].reason.as_deref(), Some("scanner"));
    }

    #[test]
    fn remove_ban_reports_presence() {
        let mut config = EngineConfig::default();
        let addr = Ipv4Addr::new(10, 0, 0, 1);
        config.add_ban(BanRule::new(addr));
        assert!(config.remove_ban(addr));
        assert!(!config.remove_ban(addr));
    }

    #[tokio::test]
    async fn load_rules_missing_file_is_empty() {
        let rules = EngineConfig::load_rules("/nonexistent/flowgate/bans.toml")
            .await
            .unwrap();
        assert!(rules.is_empty());
    }

    #[tokio::test]
    async fn load_rules_parses_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bans.toml");
        tokio::fs::write(
            &path,
            r#"
[[bans]]
addr = "10.0.0.50"
reason = "Known port scanner"

[[bans]]
addr = "192.168.1.100"
"#,
        )
        .await
        .unwrap();

        let rules = EngineConfig::load_rules(&path).await.unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(
            rules[0],
            BanRule::with_reason(Ipv4Addr::new(10, 0, 0, 50), "Known port scanner")
        );
        assert_eq!(rules[1], BanRule::new(Ipv4Addr::new(192, 168, 1, 100)));
    }

    #[tokio::test]
    async fn load_rules_rejects_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bans.toml");
        tokio::fs::write(&path, "[[bans]]\naddr = \"999.0.0.1\"\n")
            .await
            .unwrap();

        let err = EngineConfig::load_rules(&path).await.unwrap_err();
        assert!(matches!(
            err,
            FlowgateError::Config(ConfigError::ParseFailed { .. })
        ));
    }
}
