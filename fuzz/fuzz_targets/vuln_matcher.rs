#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use lockscope_core::types::Severity;
use lockscope_manifest_scanner::{RuleTable, VulnMatcher, VulnerabilityRule};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 규칙 (최대 8개로 제한)
    rules: Vec<(String, String)>,
    package_name: String,
    version: String,
    fallback: bool,
}

fuzz_target!(|input: FuzzInput| {
    let rules: Vec<VulnerabilityRule> = input
        .rules
        .into_iter()
        .take(8)
        .map(|(package_name, vulnerable_range)| VulnerabilityRule {
            package_name,
            vulnerable_range,
            severity: Severity::High,
            cve: "CVE-2099-0001".to_owned(),
            title: "fuzz".to_owned(),
            description: "fuzz".to_owned(),
            fixed_in: None,
            url: None,
        })
        .collect();

    let matcher = VulnMatcher::new(Arc::new(RuleTable::from_rules(rules)), input.fallback);
    let first = matcher.first_finding(&input.package_name, &input.version);
    let second = matcher.first_finding(&input.package_name, &input.version);
    assert_eq!(first, second);
});
