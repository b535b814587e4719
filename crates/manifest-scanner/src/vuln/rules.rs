//! 취약점 규칙 테이블 -- 내장 권고 목록과 외부 JSON 규칙 파일
//!
//! [`RuleTable`]은 프로세스 시작 시 한 번 구성되고 이후 변경되지 않습니다.
//! 패키지 이름(소문자)으로 인덱싱되며, 각 규칙의 범위는 구성 시점에 미리 파싱합니다.
//!
//! # 외부 규칙 파일 형식
//!
//! ```json
//! [
//!   {
//!     "packageName": "left-pad",
//!     "vulnerableRange": "<1.3.0",
//!     "severity": "Medium",
//!     "cve": "CVE-2024-0001",
//!     "title": "Example advisory",
//!     "description": "left-pad before 1.3.0 ...",
//!     "fixedIn": "1.3.0",
//!     "url": "https://example.com/advisories/CVE-2024-0001"
//!   }
//! ]
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use lockscope_core::types::Severity;
use tracing::{debug, info, warn};

use super::VulnerabilityRule;
use crate::error::ManifestScannerError;
use crate::version::{NpmRange, parse_version};

/// 규칙 파일 최대 크기 (50 MB)
const MAX_RULE_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// 전체 규칙 최대 개수
const MAX_RULES: usize = 1_000_000;

/// 내장 규칙 (정적 데이터)
struct BuiltinRule {
    package_name: &'static str,
    vulnerable_range: &'static str,
    severity: Severity,
    cve: &'static str,
    title: &'static str,
    description: &'static str,
    fixed_in: Option<&'static str>,
    url: Option<&'static str>,
}

impl BuiltinRule {
    fn to_rule(&self) -> VulnerabilityRule {
        VulnerabilityRule {
            package_name: self.package_name.to_owned(),
            vulnerable_range: self.vulnerable_range.to_owned(),
            severity: self.severity,
            cve: self.cve.to_owned(),
            title: self.title.to_owned(),
            description: self.description.to_owned(),
            fixed_in: self.fixed_in.map(str::to_owned),
            url: self.url.map(str::to_owned),
        }
    }
}

/// 내장 취약점 권고 목록
const BUILTIN_RULES: &[BuiltinRule] = &[
    BuiltinRule {
        package_name: "lodash",
        vulnerable_range: "<4.17.21",
        severity: Severity::High,
        cve: "CVE-2020-28500",
        title: "Regular Expression Denial of Service (ReDoS)",
        description: "lodash versions prior to 4.17.21 are vulnerable to Regular Expression Denial of Service (ReDoS) via the `toNumber`, `trim` and `trimEnd` functions.",
        fixed_in: Some("4.17.21"),
        url: Some("https://nvd.nist.gov/vuln/detail/CVE-2020-28500"),
    },
    BuiltinRule {
        package_name: "axios",
        vulnerable_range: "<0.21.1",
        severity: Severity::High,
        cve: "CVE-2020-28168",
        title: "Server-Side Request Forgery (SSRF)",
        description: "axios before 0.21.1 allows attackers to perform Server-Side Request Forgery via a crafted URL.",
        fixed_in: Some("0.21.1"),
        url: Some("https://nvd.nist.gov/vuln/detail/CVE-2020-28168"),
    },
    BuiltinRule {
        package_name: "express",
        vulnerable_range: "<4.17.3",
        severity: Severity::Medium,
        cve: "CVE-2022-24999",
        title: "Open Redirect vulnerability",
        description: "qs before 6.10.3, as used in Express before 4.17.3, allows attackers to cause prototype pollution.",
        fixed_in: Some("4.17.3"),
        url: Some("https://nvd.nist.gov/vuln/detail/CVE-2022-24999"),
    },
    BuiltinRule {
        package_name: "minimist",
        vulnerable_range: "<1.2.6",
        severity: Severity::Critical,
        cve: "CVE-2021-44906",
        title: "Prototype Pollution",
        description: "Minimist <=1.2.5 is vulnerable to Prototype Pollution via file index.js, function setKey() (lines 69-95).",
        fixed_in: Some("1.2.6"),
        url: Some("https://nvd.nist.gov/vuln/detail/CVE-2021-44906"),
    },
    BuiltinRule {
        package_name: "json5",
        vulnerable_range: "<2.2.2",
        severity: Severity::High,
        cve: "CVE-2022-46175",
        title: "Prototype Pollution",
        description: "JSON5 before 2.2.2 allows Prototype Pollution when parsing JSON5 files with specially crafted input.",
        fixed_in: Some("2.2.2"),
        url: Some("https://nvd.nist.gov/vuln/detail/CVE-2022-46175"),
    },
    BuiltinRule {
        package_name: "qs",
        vulnerable_range: "<6.10.3",
        severity: Severity::High,
        cve: "CVE-2022-24999",
        title: "Prototype Pollution",
        description: "qs before 6.10.3 allows attackers to cause prototype pollution via the `allowPrototypes` option.",
        fixed_in: Some("6.10.3"),
        url: Some("https://nvd.nist.gov/vuln/detail/CVE-2022-24999"),
    },
    BuiltinRule {
        package_name: "semver",
        vulnerable_range: "<7.5.2",
        severity: Severity::Medium,
        cve: "CVE-2022-25883",
        title: "Regular Expression Denial of Service (ReDoS)",
        description: "semver versions prior to 7.5.2 are vulnerable to Regular Expression Denial of Service (ReDoS).",
        fixed_in: Some("7.5.2"),
        url: Some("https://nvd.nist.gov/vuln/detail/CVE-2022-25883"),
    },
    BuiltinRule {
        package_name: "tar",
        vulnerable_range: "<6.1.11",
        severity: Severity::High,
        cve: "CVE-2021-37701",
        title: "Arbitrary File Overwrite",
        description: "The npm package tar (aka node-tar) before versions 6.1.11 has an arbitrary file overwrite vulnerability.",
        fixed_in: Some("6.1.11"),
        url: Some("https://nvd.nist.gov/vuln/detail/CVE-2021-37701"),
    },
    BuiltinRule {
        package_name: "glob-parent",
        vulnerable_range: "<5.1.2",
        severity: Severity::High,
        cve: "CVE-2020-28469",
        title: "Regular Expression Denial of Service (ReDoS)",
        description: "The package glob-parent before 5.1.2 is vulnerable to Regular Expression Denial of Service (ReDoS).",
        fixed_in: Some("5.1.2"),
        url: Some("https://nvd.nist.gov/vuln/detail/CVE-2020-28469"),
    },
    BuiltinRule {
        package_name: "async",
        vulnerable_range: "<2.6.4",
        severity: Severity::High,
        cve: "CVE-2021-43138",
        title: "Prototype Pollution",
        description: "In async before 2.6.4, a malicious user can obtain privileges via the mapValues() method.",
        fixed_in: Some("2.6.4"),
        url: Some("https://nvd.nist.gov/vuln/detail/CVE-2021-43138"),
    },
    BuiltinRule {
        package_name: "node-fetch",
        vulnerable_range: "<2.6.7",
        severity: Severity::High,
        cve: "CVE-2022-0235",
        title: "Exposure of Sensitive Information",
        description: "node-fetch before 2.6.7 allows attackers to expose sensitive information via the Request.clone method.",
        fixed_in: Some("2.6.7"),
        url: Some("https://nvd.nist.gov/vuln/detail/CVE-2022-0235"),
    },
    BuiltinRule {
        package_name: "moment",
        vulnerable_range: "<2.29.4",
        severity: Severity::High,
        cve: "CVE-2022-31129",
        title: "Inefficient Regular Expression Complexity",
        description: "moment before 2.29.4 is vulnerable to ReDoS when passing user-provided strings without sanity length checks to moment constructor.",
        fixed_in: Some("2.29.4"),
        url: Some("https://nvd.nist.gov/vuln/detail/CVE-2022-31129"),
    },
    BuiltinRule {
        package_name: "react",
        vulnerable_range: "<18.2.0",
        severity: Severity::Low,
        cve: "CVE-2024-10011",
        title: "Information Exposure via Debug Artifacts (Mock)",
        description: "Mock advisory: react versions prior to 18.2.0 may expose internal debug artifacts under specific build configurations.",
        fixed_in: Some("18.2.0"),
        url: Some("https://example.com/security/advisories/CVE-2024-10011"),
    },
    BuiltinRule {
        package_name: "debug",
        vulnerable_range: "<4.3.4",
        severity: Severity::Medium,
        cve: "CVE-2024-10012",
        title: "Prototype Pollution via Crafted Input (Mock)",
        description: "Mock advisory: debug versions prior to 4.3.4 may allow prototype pollution in edge-case input parsing.",
        fixed_in: Some("4.3.4"),
        url: Some("https://example.com/security/advisories/CVE-2024-10012"),
    },
    BuiltinRule {
        package_name: "serialize-javascript",
        vulnerable_range: "<6.0.2",
        severity: Severity::High,
        cve: "CVE-2024-10013",
        title: "Cross-Site Scripting (XSS) in Serialization (Mock)",
        description: "Mock advisory: serialize-javascript versions prior to 6.0.2 may allow XSS when serializing untrusted data.",
        fixed_in: Some("6.0.2"),
        url: Some("https://example.com/security/advisories/CVE-2024-10013"),
    },
    BuiltinRule {
        package_name: "ws",
        vulnerable_range: "<8.13.0",
        severity: Severity::Medium,
        cve: "CVE-2024-10014",
        title: "Denial of Service via Malformed Frames (Mock)",
        description: "Mock advisory: ws versions prior to 8.13.0 may be susceptible to DoS with malformed WebSocket frames.",
        fixed_in: Some("8.13.0"),
        url: Some("https://example.com/security/advisories/CVE-2024-10014"),
    },
    BuiltinRule {
        package_name: "yargs-parser",
        vulnerable_range: "<21.1.1",
        severity: Severity::Low,
        cve: "CVE-2024-10015",
        title: "Potential Command Injection in Edge Cases (Mock)",
        description: "Mock advisory: yargs-parser versions prior to 21.1.1 may allow command injection in rare parsing scenarios.",
        fixed_in: Some("21.1.1"),
        url: Some("https://example.com/security/advisories/CVE-2024-10015"),
    },
    BuiltinRule {
        package_name: "uuid",
        vulnerable_range: "<9.0.1",
        severity: Severity::Low,
        cve: "CVE-2024-10016",
        title: "Predictable UUID Generation (Mock)",
        description: "Mock advisory: uuid versions prior to 9.0.1 may generate predictable identifiers under certain entropy constraints.",
        fixed_in: Some("9.0.1"),
        url: Some("https://example.com/security/advisories/CVE-2024-10016"),
    },
];

static BUILTIN_TABLE: LazyLock<Arc<RuleTable>> = LazyLock::new(|| {
    Arc::new(RuleTable::from_rules(
        BUILTIN_RULES.iter().map(BuiltinRule::to_rule).collect(),
    ))
});

/// 규칙과 미리 파싱된 범위
#[derive(Debug, Clone)]
struct CompiledRule {
    rule: VulnerabilityRule,
    /// 파싱 실패 시 `None` (해당 규칙은 어떤 버전과도 매칭되지 않음)
    range: Option<NpmRange>,
}

/// 불변 취약점 규칙 테이블
///
/// O(1) 조회를 위해 소문자 패키지 이름으로 인덱싱된 HashMap을 사용합니다.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<CompiledRule>,
    index: HashMap<String, Vec<usize>>,
}

impl RuleTable {
    /// 빈 테이블을 생성합니다.
    pub fn empty() -> Self {
        Self::default()
    }

    /// 내장 규칙 테이블을 반환합니다 (프로세스당 한 번 구성, 공유).
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN_TABLE)
    }

    /// 규칙 목록으로 테이블을 구성합니다.
    ///
    /// 범위를 파싱할 수 없는 규칙은 경고를 남기고 매칭 대상에서 제외됩니다.
    pub fn from_rules(rules: Vec<VulnerabilityRule>) -> Self {
        let mut compiled = Vec::with_capacity(rules.len());
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();

        for rule in rules {
            let range = match NpmRange::parse(&rule.vulnerable_range) {
                Ok(range) => Some(range),
                Err(e) => {
                    warn!(
                        package = %rule.package_name,
                        cve = %rule.cve,
                        error = %e,
                        "rule has malformed vulnerable range, it will never match"
                    );
                    None
                }
            };
            index
                .entry(rule.package_name.to_lowercase())
                .or_default()
                .push(compiled.len());
            compiled.push(CompiledRule { rule, range });
        }

        Self {
            rules: compiled,
            index,
        }
    }

    /// JSON 문자열에서 규칙 목록을 파싱합니다.
    ///
    /// JSON 형식: `VulnerabilityRule` 배열 (camelCase 키)
    pub fn parse_rules(json: &str) -> Result<Vec<VulnerabilityRule>, ManifestScannerError> {
        let rules: Vec<VulnerabilityRule> = serde_json::from_str(json).map_err(|e| {
            ManifestScannerError::RuleDbParse(format!("failed to parse rule JSON: {e}"))
        })?;

        if rules.len() > MAX_RULES {
            return Err(ManifestScannerError::RuleDbParse(format!(
                "rule count {} exceeds maximum {MAX_RULES}",
                rules.len()
            )));
        }

        Ok(rules)
    }

    /// JSON 문자열에서 테이블을 구성합니다.
    pub fn from_json(json: &str) -> Result<Self, ManifestScannerError> {
        Ok(Self::from_rules(Self::parse_rules(json)?))
    }

    /// 규칙 파일을 읽어 규칙 목록을 반환합니다.
    ///
    /// # 보안 제한
    ///
    /// - 파일당 최대 50MB (`MAX_RULE_FILE_SIZE`)
    ///
    /// # Note
    ///
    /// 이 함수는 동기 I/O를 수행합니다. async 컨텍스트에서 호출할 때는
    /// `tokio::task::spawn_blocking`으로 감싸세요.
    pub fn load_rules_file(path: &Path) -> Result<Vec<VulnerabilityRule>, ManifestScannerError> {
        let metadata = std::fs::metadata(path).map_err(|e| ManifestScannerError::RuleDbLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let file_size = metadata.len();
        if file_size > MAX_RULE_FILE_SIZE {
            return Err(ManifestScannerError::RuleDbLoad {
                path: path.display().to_string(),
                reason: format!(
                    "file size {file_size} bytes exceeds maximum {MAX_RULE_FILE_SIZE} bytes"
                ),
            });
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| ManifestScannerError::RuleDbLoad {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let rules = Self::parse_rules(&content).map_err(|e| match e {
            ManifestScannerError::RuleDbParse(reason) => {
                ManifestScannerError::RuleDbParse(format!("{}: {reason}", path.display()))
            }
            other => other,
        })?;

        info!(path = %path.display(), rules = rules.len(), "loaded rule file");
        Ok(rules)
    }

    /// 내장 규칙 뒤에 추가 규칙을 붙인 테이블을 구성합니다.
    ///
    /// 같은 패키지에 여러 규칙이 매칭되면 내장 규칙이 먼저 옵니다.
    pub fn builtin_with(extra: Vec<VulnerabilityRule>) -> Self {
        let mut rules: Vec<VulnerabilityRule> =
            BUILTIN_RULES.iter().map(BuiltinRule::to_rule).collect();
        rules.extend(extra);
        Self::from_rules(rules)
    }

    /// 테이블 내 전체 규칙 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// 테이블이 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 전체 규칙을 등록 순서대로 반환합니다.
    pub fn rules(&self) -> impl Iterator<Item = &VulnerabilityRule> {
        self.rules.iter().map(|c| &c.rule)
    }

    /// 패키지 이름으로 규칙을 조회합니다 (대소문자 무시).
    pub fn lookup(&self, package_name: &str) -> Vec<&VulnerabilityRule> {
        self.compiled_for(package_name).map(|c| &c.rule).collect()
    }

    /// 패키지 이름과 버전에 매칭되는 규칙을 등록 순서대로 반환합니다.
    ///
    /// 버전을 파싱할 수 없거나 규칙 범위가 잘못된 경우 매칭되지 않습니다.
    pub fn matching(&self, package_name: &str, version: &str) -> Vec<&VulnerabilityRule> {
        let Some(parsed) = parse_version(version) else {
            debug!(package = %package_name, version = %version, "version is not semver, no rule can match");
            return Vec::new();
        };

        self.compiled_for(package_name)
            .filter(|c| c.range.as_ref().is_some_and(|r| r.matches(&parsed)))
            .map(|c| &c.rule)
            .collect()
    }

    fn compiled_for(&self, package_name: &str) -> impl Iterator<Item = &CompiledRule> {
        self.index
            .get(&package_name.to_lowercase())
            .into_iter()
            .flatten()
            .filter_map(|&idx| self.rules.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn rule(package: &str, range: &str, cve: &str) -> VulnerabilityRule {
        VulnerabilityRule {
            package_name: package.to_owned(),
            vulnerable_range: range.to_owned(),
            severity: Severity::Medium,
            cve: cve.to_owned(),
            title: "Test".to_owned(),
            description: "Test rule".to_owned(),
            fixed_in: None,
            url: None,
        }
    }

    #[test]
    fn builtin_table_has_all_advisories() {
        let table = RuleTable::builtin();
        assert_eq!(table.len(), 18);
        assert!(!table.is_empty());
        let names: Vec<&str> = table.rules().map(|r| r.package_name.as_str()).collect();
        assert_eq!(names.first(), Some(&"lodash"));
        assert_eq!(names.last(), Some(&"uuid"));
    }

    #[test]
    fn builtin_rules_are_lowercase_and_parseable() {
        let table = RuleTable::builtin();
        for r in table.rules() {
            assert_eq!(r.package_name, r.package_name.to_lowercase());
            assert!(NpmRange::parse(&r.vulnerable_range).is_ok(), "{}", r.cve);
            assert!(r.fixed_in.is_some());
            assert!(r.url.as_deref().is_some_and(|u| u.ends_with(&r.cve)));
        }
    }

    #[test]
    fn builtin_table_is_shared() {
        let a = RuleTable::builtin();
        let b = RuleTable::builtin();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn lodash_rule_matches_below_fix() {
        let table = RuleTable::builtin();
        let matched = table.matching("lodash", "4.17.20");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].cve, "CVE-2020-28500");
        assert!(table.matching("lodash", "4.17.21").is_empty());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let table = RuleTable::builtin();
        assert_eq!(table.lookup("Lodash").len(), 1);
        assert_eq!(table.matching("LODASH", "4.17.20").len(), 1);
    }

    #[test]
    fn non_semver_version_matches_nothing() {
        let table = RuleTable::builtin();
        assert!(table.matching("lodash", "next").is_empty());
        assert!(table.matching("lodash", "").is_empty());
    }

    #[test]
    fn malformed_rule_range_never_matches() {
        let table = RuleTable::from_rules(vec![
            rule("pkg", "totally bogus", "CVE-2024-0001"),
            rule("pkg", "<2.0.0", "CVE-2024-0002"),
        ]);
        let matched = table.matching("pkg", "1.0.0");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].cve, "CVE-2024-0002");
    }

    #[test]
    fn multiple_rules_keep_registration_order() {
        let table = RuleTable::from_rules(vec![
            rule("pkg", "<2.0.0", "CVE-2024-0001"),
            rule("pkg", ">=1.0.0 <1.5.0", "CVE-2024-0002"),
        ]);
        let cves: Vec<&str> = table
            .matching("pkg", "1.2.0")
            .iter()
            .map(|r| r.cve.as_str())
            .collect();
        assert_eq!(cves, vec!["CVE-2024-0001", "CVE-2024-0002"]);
    }

    #[test]
    fn from_json_valid() {
        let json = r#"[
            {
                "packageName": "left-pad",
                "vulnerableRange": "<1.3.0",
                "severity": "Medium",
                "cve": "CVE-2024-9999",
                "title": "Test",
                "description": "Test advisory",
                "fixedIn": "1.3.0"
            }
        ]"#;
        let table = RuleTable::from_json(json).unwrap();
        assert_eq!(table.len(), 1);
        let matched = table.matching("left-pad", "1.2.0");
        assert_eq!(matched[0].fixed_in.as_deref(), Some("1.3.0"));
        assert!(matched[0].url.is_none());
    }

    #[test]
    fn from_json_invalid() {
        let err = RuleTable::from_json("not json").unwrap_err();
        assert!(matches!(err, ManifestScannerError::RuleDbParse(_)));
    }

    #[test]
    fn from_json_missing_required_field() {
        let json = r#"[{ "packageName": "a", "vulnerableRange": "*" }]"#;
        assert!(RuleTable::from_json(json).is_err());
    }

    #[test]
    fn builtin_with_extra_appends() {
        let table = RuleTable::builtin_with(vec![rule("lodash", "<5.0.0", "CVE-2099-0001")]);
        assert_eq!(table.len(), 19);
        let cves: Vec<&str> = table
            .matching("lodash", "4.17.20")
            .iter()
            .map(|r| r.cve.as_str())
            .collect();
        assert_eq!(cves, vec!["CVE-2020-28500", "CVE-2099-0001"]);
    }

    #[test]
    fn load_rules_file_reads_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"packageName":"zod","vulnerableRange":"<3.22.3","severity":"High","cve":"CVE-2023-4316","title":"ReDoS","description":"zod email regex"}}]"#
        )
        .unwrap();
        let rules = RuleTable::load_rules_file(file.path()).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].severity, Severity::High);
    }

    #[test]
    fn load_rules_file_missing() {
        let err = RuleTable::load_rules_file(Path::new("/nonexistent/rules.json")).unwrap_err();
        assert!(matches!(err, ManifestScannerError::RuleDbLoad { .. }));
    }

    #[test]
    fn load_rules_file_parse_error_names_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not an array").unwrap();
        let err = RuleTable::load_rules_file(file.path()).unwrap_err();
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }
}
