//! 에러 타입 — 도메인별 에러 정의

/// lockscope 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LockscopeError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 매니페스트 스캔 에러
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

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

/// 매니페스트 스캔 에러
///
/// 파싱 자체의 실패(빈 입력, 잘못된 JSON 등)는 에러가 아니라
/// 스캔 결과의 에러 코드로 보고됩니다. 여기에는 그 바깥의 실패만 담습니다.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// 입력 파일이 수집 정책에 의해 거부됨 (크기, 확장자)
    #[error("input rejected: {0}")]
    InputRejected(String),

    /// 취약점 규칙 DB 로딩 실패
    #[error("rule db error: {0}")]
    RuleDb(String),
}
