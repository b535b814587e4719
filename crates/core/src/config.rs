//! 설정 관리 — lockscope.toml 파싱 및 런타임 설정
//!
//! [`LockscopeConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOCKSCOPE_SCAN_MIN_SEVERITY=high` 형식)
//! 3. 설정 파일 (`lockscope.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), lockscope_core::error::LockscopeError> {
//! use lockscope_core::config::LockscopeConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LockscopeConfig::load("lockscope.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LockscopeConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, LockscopeError};

/// 매니페스트 파일 최대 크기 상한 (100 MiB)
const MAX_FILE_SIZE_LIMIT: usize = 100 * 1024 * 1024;

/// 경로 길이 제한
const MAX_PATH_LEN: usize = 4096;

/// lockscope 통합 설정
///
/// `lockscope.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockscopeConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 스캔 설정
    #[serde(default)]
    pub scan: ScanConfig,
}

impl LockscopeConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LockscopeError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일이 없으면 기본값을 사용하여 로드합니다.
    ///
    /// 파일이 존재하지만 파싱이나 검증에 실패하면 에러를 반환합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, LockscopeError> {
        let path = path.as_ref();
        match Self::load(path).await {
            Err(LockscopeError::Config(ConfigError::FileNotFound { .. })) => {
                debug!(path = %path.display(), "config file not found, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LockscopeError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LockscopeError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LockscopeError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LockscopeError> {
        toml::from_str(toml_str).map_err(|e| {
            LockscopeError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOCKSCOPE_{SECTION}_{FIELD}`
    /// 예: `LOCKSCOPE_SCAN_MAX_FILE_SIZE=1048576`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOCKSCOPE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOCKSCOPE_GENERAL_LOG_FORMAT");

        // Scan
        override_usize(&mut self.scan.max_file_size, "LOCKSCOPE_SCAN_MAX_FILE_SIZE");
        override_csv(
            &mut self.scan.allowed_extensions,
            "LOCKSCOPE_SCAN_ALLOWED_EXTENSIONS",
        );
        override_string(&mut self.scan.min_severity, "LOCKSCOPE_SCAN_MIN_SEVERITY");
        override_bool(
            &mut self.scan.synthesize_fallback,
            "LOCKSCOPE_SCAN_SYNTHESIZE_FALLBACK",
        );
        override_string(&mut self.scan.rules_path, "LOCKSCOPE_SCAN_RULES_PATH");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LockscopeError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.scan.max_file_size == 0 || self.scan.max_file_size > MAX_FILE_SIZE_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "scan.max_file_size".to_owned(),
                reason: format!("must be 1-{MAX_FILE_SIZE_LIMIT}"),
            }
            .into());
        }

        if self.scan.allowed_extensions.is_empty()
            || self.scan.allowed_extensions.iter().any(|ext| ext.trim().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "scan.allowed_extensions".to_owned(),
                reason: "at least one non-empty extension required".to_owned(),
            }
            .into());
        }

        // min_severity 검증
        let valid_severities = ["low", "medium", "high", "critical"];
        if !valid_severities.contains(&self.scan.min_severity.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "scan.min_severity".to_owned(),
                reason: format!("must be one of: {}", valid_severities.join(", ")),
            }
            .into());
        }

        if !self.scan.rules_path.is_empty() {
            // Path traversal 체크: Path::components()로 ParentDir 컴포넌트 검출
            if Path::new(&self.scan.rules_path)
                .components()
                .any(|c| c == std::path::Component::ParentDir)
            {
                return Err(ConfigError::InvalidValue {
                    field: "scan.rules_path".to_owned(),
                    reason: "rules_path contains path traversal pattern '..'".to_owned(),
                }
                .into());
            }

            if self.scan.rules_path.len() > MAX_PATH_LEN {
                return Err(ConfigError::InvalidValue {
                    field: "scan.rules_path".to_owned(),
                    reason: format!("rules_path exceeds maximum length {MAX_PATH_LEN}"),
                }
                .into());
            }
        }

        Ok(())
    }
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
            log_format: "pretty".to_owned(),
        }
    }
}

/// 스캔 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 매니페스트 파일 최대 크기 (바이트)
    pub max_file_size: usize,
    /// 허용 확장자 (점 없이, 대소문자 무시)
    pub allowed_extensions: Vec<String>,
    /// 보고 최소 심각도 (low, medium, high, critical)
    pub min_severity: String,
    /// 규칙이 없는 패키지에 대해 합성 취약점을 생성할지 여부
    pub synthesize_fallback: bool,
    /// 추가 취약점 규칙 파일 경로 (비어 있으면 내장 규칙만 사용)
    pub rules_path: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_file_size: 5 * 1024 * 1024, // 5 MiB
            allowed_extensions: vec!["json".to_owned()],
            min_severity: "low".to_owned(),
            synthesize_fallback: true,
            rules_path: String::new(),
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
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.split(',').map(|s| s.trim().to_owned()).collect();
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = LockscopeConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.scan.max_file_size, 5 * 1024 * 1024);
        assert_eq!(config.scan.allowed_extensions, vec!["json"]);
        assert!(config.scan.synthesize_fallback);
        assert!(config.scan.rules_path.is_empty());
    }

    #[test]
    fn default_config_passes_validation() {
        LockscopeConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let config = LockscopeConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.scan.min_severity, "low");
    }

    #[test]
    fn parse_partial_toml_merges_with_defaults() {
        let toml = r#"
[scan]
min_severity = "high"
synthesize_fallback = false
"#;
        let config = LockscopeConfig::parse(toml).unwrap();
        assert_eq!(config.scan.min_severity, "high");
        assert!(!config.scan.synthesize_fallback);
        // max_file_size는 기본값 유지
        assert_eq!(config.scan.max_file_size, 5 * 1024 * 1024);
        assert_eq!(config.general.log_format, "pretty");
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let err = LockscopeConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            LockscopeError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = LockscopeConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = LockscopeConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_zero_max_file_size() {
        let mut config = LockscopeConfig::default();
        config.scan.max_file_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_file_size"));
    }

    #[test]
    fn validate_rejects_too_large_max_file_size() {
        let mut config = LockscopeConfig::default();
        config.scan.max_file_size = 200 * 1024 * 1024;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_extensions() {
        let mut config = LockscopeConfig::default();
        config.scan.allowed_extensions.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("allowed_extensions"));
    }

    #[test]
    fn validate_rejects_unknown_min_severity() {
        let mut config = LockscopeConfig::default();
        config.scan.min_severity = "info".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_severity"));
    }

    #[test]
    fn validate_accepts_uppercase_min_severity() {
        let mut config = LockscopeConfig::default();
        config.scan.min_severity = "HIGH".to_owned();
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_rules_path_traversal() {
        let mut config = LockscopeConfig::default();
        config.scan.rules_path = "/etc/lockscope/../../secret.json".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("rules_path"));
    }

    #[test]
    #[serial]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: #[serial]로 환경변수를 조작하는 테스트를 직렬화합니다.
        unsafe { std::env::set_var("TEST_LOCKSCOPE_STR", "overridden") };
        override_string(&mut val, "TEST_LOCKSCOPE_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_LOCKSCOPE_STR") };
    }

    #[test]
    #[serial]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = true;
        // SAFETY: #[serial]로 환경변수를 조작하는 테스트를 직렬화합니다.
        unsafe { std::env::set_var("TEST_LOCKSCOPE_BOOL_BAD", "not-a-bool") };
        override_bool(&mut val, "TEST_LOCKSCOPE_BOOL_BAD");
        assert!(val); // 원래 값 유지
        unsafe { std::env::remove_var("TEST_LOCKSCOPE_BOOL_BAD") };
    }

    #[test]
    #[serial]
    fn env_override_usize_valid() {
        let mut val = 1usize;
        // SAFETY: #[serial]로 환경변수를 조작하는 테스트를 직렬화합니다.
        unsafe { std::env::set_var("TEST_LOCKSCOPE_USIZE", "4096") };
        override_usize(&mut val, "TEST_LOCKSCOPE_USIZE");
        assert_eq!(val, 4096);
        unsafe { std::env::remove_var("TEST_LOCKSCOPE_USIZE") };
    }

    #[test]
    #[serial]
    fn env_override_csv() {
        let mut val = vec!["json".to_owned()];
        // SAFETY: #[serial]로 환경변수를 조작하는 테스트를 직렬화합니다.
        unsafe { std::env::set_var("TEST_LOCKSCOPE_CSV", "json, lock") };
        override_csv(&mut val, "TEST_LOCKSCOPE_CSV");
        assert_eq!(val, vec!["json", "lock"]);
        unsafe { std::env::remove_var("TEST_LOCKSCOPE_CSV") };
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_LOCKSCOPE_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = LockscopeConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = LockscopeConfig::parse(&toml_str).unwrap();
        assert_eq!(config.general.log_level, parsed.general.log_level);
        assert_eq!(config.scan.max_file_size, parsed.scan.max_file_size);
        assert_eq!(config.scan.allowed_extensions, parsed.scan.allowed_extensions);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = LockscopeConfig::from_file("/nonexistent/path/lockscope.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LockscopeError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    #[serial]
    async fn load_or_default_falls_back_when_missing() {
        let config = LockscopeConfig::load_or_default("/nonexistent/path/lockscope.toml")
            .await
            .unwrap();
        assert_eq!(config.scan.max_file_size, 5 * 1024 * 1024);
    }
}
