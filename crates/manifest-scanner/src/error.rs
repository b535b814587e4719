//! 매니페스트 스캐너 에러 타입
//!
//! [`ManifestScannerError`]는 스캐너 모듈 내에서 발생할 수 있는 에러를 나타냅니다.
//! `From<ManifestScannerError> for LockscopeError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 자연스럽게 전파됩니다.
//!
//! 매니페스트 내용 자체의 문제(빈 입력, 잘못된 JSON, 미지원 형식, 의존성 없음)는
//! 에러가 아니라 [`ParseResult`](crate::types::ParseResult)의 에러 코드로 보고됩니다.
//!
//! # 에러 카테고리
//!
//! - **입력 정책**: `FileTooBig`, `UnsupportedExtension`
//! - **버전 범위**: `VersionParse`
//! - **취약점 규칙**: `RuleDbLoad`, `RuleDbParse`
//! - **설정**: `Config`
//! - **파일 I/O**: `Io`

use lockscope_core::error::{ConfigError, LockscopeError, ScanError};

/// 매니페스트 스캐너 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ManifestScannerError {
    /// 파일 크기 초과
    #[error("file too large: {path}: {size} bytes (max: {max})")]
    FileTooBig {
        /// 파일 경로
        path: String,
        /// 실제 파일 크기 (바이트)
        size: u64,
        /// 최대 허용 크기 (바이트)
        max: usize,
    },

    /// 허용되지 않은 확장자
    #[error("unsupported file extension: {path} (allowed: {allowed})")]
    UnsupportedExtension {
        /// 파일 경로
        path: String,
        /// 허용 확장자 목록 (쉼표 구분)
        allowed: String,
    },

    /// 버전 또는 버전 범위 파싱 실패
    #[error("version parse error: '{input}': {reason}")]
    VersionParse {
        /// 파싱 대상 문자열
        input: String,
        /// 파싱 실패 사유
        reason: String,
    },

    /// 취약점 규칙 파일 로딩 실패
    #[error("rule db load error: {path}: {reason}")]
    RuleDbLoad {
        /// 규칙 파일 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 취약점 규칙 파싱 실패
    #[error("rule db parse error: {0}")]
    RuleDbParse(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

impl From<ManifestScannerError> for LockscopeError {
    fn from(err: ManifestScannerError) -> Self {
        match err {
            err @ (ManifestScannerError::FileTooBig { .. }
            | ManifestScannerError::UnsupportedExtension { .. }
            | ManifestScannerError::VersionParse { .. }) => {
                LockscopeError::Scan(ScanError::InputRejected(err.to_string()))
            }
            err @ (ManifestScannerError::RuleDbLoad { .. }
            | ManifestScannerError::RuleDbParse(_)) => {
                LockscopeError::Scan(ScanError::RuleDb(err.to_string()))
            }
            ManifestScannerError::Config { field, reason } => {
                LockscopeError::Config(ConfigError::InvalidValue { field, reason })
            }
            ManifestScannerError::Io { path, source } => LockscopeError::Io(std::io::Error::new(
                source.kind(),
                format!("{path}: {source}"),
            )),
        }
    }
}
