//! 도메인 타입 — 모듈 간 공유되는 데이터 구조

use std::fmt;

use serde::{Deserialize, Serialize};

/// 심각도 레벨
///
/// 취약점 권고의 심각도를 나타냅니다.
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Low < Medium < High < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    /// 낮은 심각도
    #[default]
    Low,
    /// 중간 심각도
    Medium,
    /// 높은 심각도
    High,
    /// 치명적 — 즉시 대응 필요
    Critical,
}

impl Severity {
    /// 높은 심각도부터 나열한 전체 목록
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// 문자열에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "med" | "moderate" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }

    /// 저장 계층에서 사용하는 소문자 표기를 반환합니다.
    pub fn as_lowercase(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn severity_from_str_loose() {
        assert_eq!(Severity::from_str_loose("critical"), Some(Severity::Critical));
        assert_eq!(Severity::from_str_loose("HIGH"), Some(Severity::High));
        assert_eq!(Severity::from_str_loose(" Medium "), Some(Severity::Medium));
        assert_eq!(Severity::from_str_loose("moderate"), Some(Severity::Medium));
        assert_eq!(Severity::from_str_loose("low"), Some(Severity::Low));
        assert_eq!(Severity::from_str_loose("info"), None);
        assert_eq!(Severity::from_str_loose(""), None);
    }

    #[test]
    fn severity_display_and_lowercase() {
        assert_eq!(Severity::Critical.to_string(), "Critical");
        assert_eq!(Severity::Low.to_string(), "Low");
        assert_eq!(Severity::High.as_lowercase(), "high");
    }

    #[test]
    fn severity_serializes_as_variant_name() {
        let json = serde_json::to_string(&Severity::Medium).unwrap();
        assert_eq!(json, "\"Medium\"");
        let parsed: Severity = serde_json::from_str("\"Critical\"").unwrap();
        assert_eq!(parsed, Severity::Critical);
    }

    #[test]
    fn severity_all_is_descending() {
        let mut sorted = Severity::ALL;
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(sorted, Severity::ALL);
    }
}
