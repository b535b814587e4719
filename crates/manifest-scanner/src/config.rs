//! 매니페스트 스캐너 설정
//!
//! [`ManifestScannerConfig`]는 core의 [`ScanConfig`](lockscope_core::config::ScanConfig)를
//! 스캐너가 쓰기 좋은 형태(심각도 enum 등)로 옮긴 것입니다.
//!
//! # 사용 예시
//!
//! ```
//! use lockscope_manifest_scanner::ManifestScannerConfigBuilder;
//! use lockscope_core::types::Severity;
//!
//! let config = ManifestScannerConfigBuilder::new()
//!     .min_severity(Severity::High)
//!     .synthesize_fallback(false)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.min_severity, Severity::High);
//! ```

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use lockscope_core::config::ScanConfig;
use lockscope_core::types::Severity;

use crate::error::ManifestScannerError;

/// 매니페스트 파일 최대 크기 상한 (100 MB)
const MAX_FILE_SIZE: usize = 100 * 1024 * 1024;

/// 경로 길이 제한
const MAX_PATH_LEN: usize = 4096;

/// 매니페스트 스캐너 설정
///
/// # 필드
///
/// - **max_file_size**: 입력 파일 최대 크기 (바이트)
/// - **allowed_extensions**: 허용 확장자 (점 없이, 대소문자 무시)
/// - **min_severity**: 보고 최소 심각도
/// - **synthesize_fallback**: 규칙 미매칭 패키지에 합성 취약점 생성 여부
/// - **rules_path**: 추가 규칙 파일 경로 (빈 문자열이면 내장 규칙만)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestScannerConfig {
    pub max_file_size: usize,
    pub allowed_extensions: Vec<String>,
    pub min_severity: Severity,
    pub synthesize_fallback: bool,
    pub rules_path: String,
}

impl Default for ManifestScannerConfig {
    fn default() -> Self {
        Self {
            max_file_size: 5 * 1024 * 1024, // 5 MB
            allowed_extensions: vec!["json".to_owned()],
            min_severity: Severity::Low,
            synthesize_fallback: true,
            rules_path: String::new(),
        }
    }
}

impl ManifestScannerConfig {
    /// core의 `ScanConfig`에서 스캐너 설정을 생성합니다.
    ///
    /// 알 수 없는 심각도 문자열은 `Low`로 대체됩니다.
    pub fn from_core(core: &ScanConfig) -> Self {
        Self {
            max_file_size: core.max_file_size,
            allowed_extensions: core.allowed_extensions.clone(),
            min_severity: Severity::from_str_loose(&core.min_severity).unwrap_or(Severity::Low),
            synthesize_fallback: core.synthesize_fallback,
            rules_path: core.rules_path.clone(),
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `max_file_size`: 1-104857600 (100MB)
    /// - `allowed_extensions`: 하나 이상, 빈 문자열 불가
    /// - `rules_path`: `..` 컴포넌트 불가, 최대 4096자
    pub fn validate(&self) -> Result<(), ManifestScannerError> {
        if self.max_file_size == 0 || self.max_file_size > MAX_FILE_SIZE {
            return Err(ManifestScannerError::Config {
                field: "max_file_size".to_owned(),
                reason: format!("must be 1-{MAX_FILE_SIZE}"),
            });
        }

        if self.allowed_extensions.is_empty() {
            return Err(ManifestScannerError::Config {
                field: "allowed_extensions".to_owned(),
                reason: "at least one extension required".to_owned(),
            });
        }

        if self.allowed_extensions.iter().any(|e| e.trim().is_empty()) {
            return Err(ManifestScannerError::Config {
                field: "allowed_extensions".to_owned(),
                reason: "extension must not be empty".to_owned(),
            });
        }

        if !self.rules_path.is_empty() {
            if Path::new(&self.rules_path)
                .components()
                .any(|c| c == Component::ParentDir)
            {
                return Err(ManifestScannerError::Config {
                    field: "rules_path".to_owned(),
                    reason: "rules_path contains path traversal pattern '..'".to_owned(),
                });
            }

            if self.rules_path.len() > MAX_PATH_LEN {
                return Err(ManifestScannerError::Config {
                    field: "rules_path".to_owned(),
                    reason: format!("rules_path exceeds maximum length {MAX_PATH_LEN}"),
                });
            }
        }

        Ok(())
    }
}

/// [`ManifestScannerConfig`] 빌더
#[derive(Default)]
pub struct ManifestScannerConfigBuilder {
    config: ManifestScannerConfig,
}

impl ManifestScannerConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 최대 파일 크기(바이트)를 설정합니다.
    pub fn max_file_size(mut self, size: usize) -> Self {
        self.config.max_file_size = size;
        self
    }

    /// 허용 확장자 목록을 설정합니다.
    pub fn allowed_extensions(mut self, extensions: Vec<String>) -> Self {
        self.config.allowed_extensions = extensions;
        self
    }

    /// 최소 심각도를 설정합니다.
    pub fn min_severity(mut self, severity: Severity) -> Self {
        self.config.min_severity = severity;
        self
    }

    /// 합성 폴백 사용 여부를 설정합니다.
    pub fn synthesize_fallback(mut self, enabled: bool) -> Self {
        self.config.synthesize_fallback = enabled;
        self
    }

    /// 추가 규칙 파일 경로를 설정합니다.
    pub fn rules_path(mut self, path: impl Into<String>) -> Self {
        self.config.rules_path = path.into();
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `ManifestScannerError::Config` 반환
    pub fn build(self) -> Result<ManifestScannerConfig, ManifestScannerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
