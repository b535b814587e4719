//! lockscope-core — 공통 타입, 에러, 설정
//!
//! 모든 lockscope 크레이트가 공유하는 기반 크레이트입니다.
//!
//! - [`config`]: `lockscope.toml` 로딩, 환경변수 오버라이드, 유효성 검증
//! - [`error`]: 도메인별 에러 타입과 최상위 [`LockscopeError`]
//! - [`types`]: 심각도([`Severity`]) 등 모듈 간 공유 타입

pub mod config;
pub mod error;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ConfigError, LockscopeError, ScanError};

// 설정
pub use config::{GeneralConfig, LockscopeConfig, ScanConfig};

// 도메인 타입
pub use types::Severity;
