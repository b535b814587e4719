//! 도메인 타입 -- 패키지 레코드, 파싱 결과, 에러 코드
//!
//! 모든 타입은 파싱 한 번의 결과로 생성되는 값 객체이며, JSON 직렬화 시
//! camelCase 키를 사용합니다.
//!
//! ```json
//! {
//!   "packages": [
//!     { "name": "left-pad", "version": "1.3.0", "isDirect": true, "dependencyType": "prod" }
//!   ],
//!   "error": { "code": "no_dependencies", "message": "..." }
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use lockscope_core::types::Severity;

use crate::vuln::VulnerabilityFinding;

/// 의존성 구분 (운영 / 개발)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    /// 운영 의존성 (`dependencies`)
    Prod,
    /// 개발 의존성 (`devDependencies`)
    Dev,
}

impl DependencyType {
    /// 두 분류를 병합합니다. 어느 한쪽이라도 `Prod`이면 `Prod`입니다.
    pub fn merge(self, other: Self) -> Self {
        if self == Self::Prod || other == Self::Prod {
            Self::Prod
        } else {
            Self::Dev
        }
    }

    /// 직렬화 표기를 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prod => "prod",
            Self::Dev => "dev",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 중복 제거 후의 패키지 레코드
///
/// 한 번의 파싱 결과에서 `(name, version)` 쌍마다 최대 하나만 존재합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    /// 패키지 이름 (`@scope/name` 형식 포함)
    pub name: String,
    /// 구체 버전 (범위 연산자 없음)
    pub version: String,
    /// 루트 매니페스트가 직접 선언했는지 여부
    pub is_direct: bool,
    /// 운영/개발 구분
    pub dependency_type: DependencyType,
}

impl PackageRecord {
    /// 새 레코드를 생성합니다.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        is_direct: bool,
        dependency_type: DependencyType,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            is_direct,
            dependency_type,
        }
    }

    /// 식별 키 `name@version`을 반환합니다 (대소문자 구분).
    pub fn identity(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// 취약점 정보가 결합된 패키지
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedPackage {
    /// 패키지 레코드
    #[serde(flatten)]
    pub record: PackageRecord,
    /// 매칭되었거나 합성된 취약점 (없으면 생략)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerability: Option<VulnerabilityFinding>,
}

/// 파싱 실패 코드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorCode {
    /// 입력이 비어 있거나 공백뿐
    Empty,
    /// JSON으로 파싱할 수 없음
    InvalidJson,
    /// 지원하지 않는 문서 형식
    UnsupportedFormat,
    /// 지원 형식이지만 사용할 수 있는 패키지가 없음
    NoDependencies,
}

impl ParseErrorCode {
    /// 직렬화 표기를 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::InvalidJson => "invalid_json",
            Self::UnsupportedFormat => "unsupported_format",
            Self::NoDependencies => "no_dependencies",
        }
    }

    /// 코드별 기본 메시지
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::Empty => "The file is empty.",
            Self::InvalidJson => "The file could not be parsed as JSON.",
            Self::UnsupportedFormat => {
                "Only package.json and package-lock.json (lockfileVersion 2 or 3) are supported."
            }
            Self::NoDependencies => "No dependencies were found in the file.",
        }
    }
}

impl fmt::Display for ParseErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 최상위 에러 기술자 `{code, message}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseErrorInfo {
    /// 에러 코드
    pub code: ParseErrorCode,
    /// 사람이 읽을 수 있는 메시지
    pub message: String,
}

impl ParseErrorInfo {
    /// 코드의 기본 메시지로 에러를 생성합니다.
    pub fn new(code: ParseErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_owned(),
        }
    }

    /// 상세 사유를 덧붙인 에러를 생성합니다.
    pub fn with_detail(code: ParseErrorCode, detail: impl fmt::Display) -> Self {
        Self {
            code,
            message: format!("{} ({detail})", code.default_message()),
        }
    }
}

/// 파싱 결과
///
/// 최상위 에러와 비어 있지 않은 패키지 목록 중 정확히 하나를 가집니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    /// 패키지 목록 (문서 내 첫 등장 순서)
    pub packages: Vec<ScannedPackage>,
    /// 최상위 에러 (성공 시 생략)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ParseErrorInfo>,
}

impl ParseResult {
    /// 패키지 목록으로 성공 결과를 생성합니다.
    pub fn success(packages: Vec<ScannedPackage>) -> Self {
        Self {
            packages,
            error: None,
        }
    }

    /// 에러 결과를 생성합니다.
    pub fn failure(error: ParseErrorInfo) -> Self {
        Self {
            packages: Vec::new(),
            error: Some(error),
        }
    }

    /// 에러 결과인지 확인합니다.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// 에러 코드를 반환합니다.
    pub fn error_code(&self) -> Option<ParseErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }

    /// 취약점이 결합된 패키지 목록을 반환합니다.
    pub fn findings(&self) -> impl Iterator<Item = (&PackageRecord, &VulnerabilityFinding)> {
        self.packages
            .iter()
            .filter_map(|p| p.vulnerability.as_ref().map(|v| (&p.record, v)))
    }

    /// 발견된 취약점 수를 반환합니다.
    pub fn finding_count(&self) -> usize {
        self.findings().count()
    }

    /// 지정한 심각도 이상인 취약점이 있는지 확인합니다.
    pub fn has_findings_at_or_above(&self, threshold: Severity) -> bool {
        self.findings().any(|(_, v)| v.severity >= threshold)
    }

    /// 심각도별 취약점 수를 반환합니다.
    pub fn severity_counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for (_, finding) in self.findings() {
            match finding.severity {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
        }
        counts
    }
}

/// 심각도별 취약점 개수
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    /// 전체 취약점 수를 반환합니다.
    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }

    /// 심각도의 개수를 반환합니다.
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}
