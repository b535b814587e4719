//! 취약점 매칭 -- 규칙 테이블 조회와 결정적 합성 폴백
//!
//! [`VulnMatcher`]는 패키지 이름과 버전을 받아 매칭되는 권고 목록을 반환합니다.
//!
//! 1. 규칙 테이블에서 이름(대소문자 무시)과 버전 범위로 매칭
//! 2. 매칭되는 규칙이 하나도 없고 폴백이 켜져 있으면 [`fallback::synthesize`]
//!
//! 규칙 테이블은 `Arc`로 공유되므로 여러 스캐너가 같은 테이블을 재사용할 수 있습니다.

pub mod fallback;
pub mod rules;

use std::sync::Arc;

use lockscope_core::types::Severity;
use serde::{Deserialize, Serialize};

pub use rules::RuleTable;

/// 취약점 규칙 (권고 한 건)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityRule {
    /// 대상 패키지 이름
    pub package_name: String,
    /// 취약한 버전 범위 (npm 범위 문법)
    pub vulnerable_range: String,
    /// 심각도
    pub severity: Severity,
    /// CVE 식별자
    pub cve: String,
    /// 제목
    pub title: String,
    /// 설명
    pub description: String,
    /// 수정된 버전
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_in: Option<String>,
    /// 참조 URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// 패키지에 결합되는 취약점 발견 결과
///
/// 규칙에서 왔는지 합성되었는지와 무관하게 같은 형태입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityFinding {
    pub package_name: String,
    pub vulnerable_range: String,
    pub severity: Severity,
    pub cve: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl From<&VulnerabilityRule> for VulnerabilityFinding {
    fn from(rule: &VulnerabilityRule) -> Self {
        Self {
            package_name: rule.package_name.clone(),
            vulnerable_range: rule.vulnerable_range.clone(),
            severity: rule.severity,
            cve: rule.cve.clone(),
            title: rule.title.clone(),
            description: rule.description.clone(),
            fixed_in: rule.fixed_in.clone(),
            url: rule.url.clone(),
        }
    }
}

/// 취약점 매처
#[derive(Debug, Clone)]
pub struct VulnMatcher {
    rules: Arc<RuleTable>,
    synthesize_fallback: bool,
}

impl VulnMatcher {
    /// 규칙 테이블과 폴백 설정으로 매처를 생성합니다.
    pub fn new(rules: Arc<RuleTable>, synthesize_fallback: bool) -> Self {
        Self {
            rules,
            synthesize_fallback,
        }
    }

    /// 규칙 테이블을 반환합니다.
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// 합성 폴백 사용 여부를 반환합니다.
    pub fn synthesize_fallback(&self) -> bool {
        self.synthesize_fallback
    }

    /// 패키지에 해당하는 모든 취약점을 찾습니다.
    ///
    /// 규칙 매칭 결과가 있으면 등록 순서대로 전부 반환하고,
    /// 없으면 (폴백이 켜진 경우) 합성 결과를 최대 하나 반환합니다.
    pub fn find_vulnerabilities(
        &self,
        package_name: &str,
        version: &str,
    ) -> Vec<VulnerabilityFinding> {
        let matched: Vec<VulnerabilityFinding> = self
            .rules
            .matching(package_name, version)
            .into_iter()
            .map(VulnerabilityFinding::from)
            .collect();

        if !matched.is_empty() || !self.synthesize_fallback {
            return matched;
        }

        fallback::synthesize(package_name, version)
            .into_iter()
            .collect()
    }

    /// 패키지에 결합할 첫 번째 취약점을 반환합니다.
    pub fn first_finding(&self, package_name: &str, version: &str) -> Option<VulnerabilityFinding> {
        self.find_vulnerabilities(package_name, version)
            .into_iter()
            .next()
    }
}

impl Default for VulnMatcher {
    fn default() -> Self {
        Self::new(RuleTable::builtin(), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_match_takes_precedence_over_fallback() {
        let matcher = VulnMatcher::default();
        let findings = matcher.find_vulnerabilities("lodash", "4.17.20");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].cve, "CVE-2020-28500");
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn rule_finding_uses_rule_package_name() {
        let matcher = VulnMatcher::default();
        let finding = matcher.first_finding("Lodash", "4.17.20").unwrap();
        assert_eq!(finding.package_name, "lodash");
    }

    #[test]
    fn unmatched_package_falls_back_to_synthesis() {
        let matcher = VulnMatcher::default();
        let finding = matcher.first_finding("left-pad", "1.3.1").unwrap();
        assert_eq!(finding.cve, "CVE-2021-1675");
        assert!(matcher.first_finding("left-pad", "1.3.0").is_none());
    }

    #[test]
    fn fixed_version_with_no_synthesis_is_clean() {
        let matcher = VulnMatcher::default();
        assert!(matcher.find_vulnerabilities("lodash", "4.17.21").is_empty());
        assert!(matcher.find_vulnerabilities("react", "18.2.0").is_empty());
    }

    #[test]
    fn fallback_can_be_disabled() {
        let matcher = VulnMatcher::new(RuleTable::builtin(), false);
        assert!(!matcher.synthesize_fallback());
        assert!(matcher.first_finding("left-pad", "1.3.1").is_none());
        assert!(matcher.first_finding("lodash", "4.17.20").is_some());
    }

    #[test]
    fn empty_table_only_synthesizes() {
        let matcher = VulnMatcher::new(Arc::new(RuleTable::empty()), true);
        assert!(matcher.rules().is_empty());
        let finding = matcher.first_finding("typescript", "5.2.0").unwrap();
        assert_eq!(finding.cve, "CVE-2022-1981");
    }

    #[test]
    fn finding_serializes_camel_case() {
        let finding = VulnMatcher::default()
            .first_finding("lodash", "4.17.20")
            .unwrap();
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["packageName"], "lodash");
        assert_eq!(json["vulnerableRange"], "<4.17.21");
        assert_eq!(json["fixedIn"], "4.17.21");
        assert_eq!(json["severity"], "High");
    }

    #[test]
    fn finding_omits_missing_fixed_in() {
        let finding = fallback::synthesize("pkg", "next").unwrap();
        let json = serde_json::to_value(&finding).unwrap();
        assert!(json.get("fixedIn").is_none());
        assert_eq!(json["vulnerableRange"], "*");
    }
}
