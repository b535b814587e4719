//! 결정적 가상 취약점 합성
//!
//! 내장/외부 규칙에 매칭되지 않은 패키지에 대해, `name@version` 문자열의
//! 해시로부터 가상 권고를 만들어 냅니다. 같은 입력은 항상 같은 결과를 내며
//! 난수나 시계를 사용하지 않습니다.
//!
//! # 해시
//!
//! 32비트 FNV-1a 변형으로, 입력 문자열의 UTF-16 코드 유닛 단위로 계산합니다.
//! 식별자는 소문자로 정규화한 뒤 `:roll`, `:severity` 같은 접미사를 붙여
//! 독립적인 시드를 얻습니다.

use lockscope_core::types::Severity;

use super::VulnerabilityFinding;
use crate::version::{coerce, increment_patch};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 합성 발생 확률 (백분율)
const FALLBACK_RATE: u32 = 35;

/// 심각도 가중치 (누적 순서 고정)
const SEVERITY_WEIGHTS: [(Severity, u32); 4] = [
    (Severity::Critical, 5),
    (Severity::High, 20),
    (Severity::Medium, 45),
    (Severity::Low, 30),
];

/// 참조 URL 기본 경로
const REFERENCE_URLS: [&str; 3] = [
    "https://example.com/security/advisories",
    "https://example.com/security/bulletins",
    "https://example.com/security/notice",
];

/// 제목/설명 템플릿. 설명의 `{package}`, `{version}`은 치환됩니다.
struct Template {
    title: &'static str,
    description: &'static str,
}

const CRITICAL_TEMPLATES: [Template; 2] = [
    Template {
        title: "Remote Code Execution via Crafted Payload",
        description: "Mock advisory: {package} {version} may allow remote code execution when handling crafted payloads.",
    },
    Template {
        title: "Authentication Bypass in Token Validation",
        description: "Mock advisory: {package} {version} may allow authentication bypass due to insufficient token validation.",
    },
];

const HIGH_TEMPLATES: [Template; 2] = [
    Template {
        title: "SQL Injection in Query Builder",
        description: "Mock advisory: {package} {version} may allow SQL injection when untrusted input is passed to query APIs.",
    },
    Template {
        title: "Server-Side Request Forgery (SSRF)",
        description: "Mock advisory: {package} {version} may allow SSRF via crafted URLs.",
    },
];

const MEDIUM_TEMPLATES: [Template; 2] = [
    Template {
        title: "Denial of Service via Regular Expression",
        description: "Mock advisory: {package} {version} may trigger excessive backtracking with crafted input.",
    },
    Template {
        title: "Information Disclosure in Error Handling",
        description: "Mock advisory: {package} {version} may leak sensitive metadata in error responses.",
    },
];

const LOW_TEMPLATES: [Template; 2] = [
    Template {
        title: "Potential Log Injection",
        description: "Mock advisory: {package} {version} may allow log injection when user input is not sanitized.",
    },
    Template {
        title: "Weak Default Configuration",
        description: "Mock advisory: {package} {version} uses a weak default configuration that may reduce security posture.",
    },
];

fn templates_for(severity: Severity) -> &'static [Template] {
    match severity {
        Severity::Critical => &CRITICAL_TEMPLATES,
        Severity::High => &HIGH_TEMPLATES,
        Severity::Medium => &MEDIUM_TEMPLATES,
        Severity::Low => &LOW_TEMPLATES,
    }
}

/// 문자열의 32비트 해시를 계산합니다.
///
/// 각 UTF-16 코드 유닛에 대해 XOR 후 FNV 소수를 곱합니다 (wrapping).
pub fn hash_str(value: &str) -> u32 {
    value.encode_utf16().fold(FNV_OFFSET_BASIS, |hash, unit| {
        (hash ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
    })
}

fn sub_hash(seed: &str, suffix: &str) -> u32 {
    hash_str(&format!("{seed}:{suffix}"))
}

fn pick<T>(seed: u32, values: &[T]) -> &T {
    &values[seed as usize % values.len()]
}

fn pick_severity(seed: u32) -> Severity {
    let total: u32 = SEVERITY_WEIGHTS.iter().map(|(_, w)| w).sum();
    let roll = seed % total;
    let mut cumulative = 0;
    for (severity, weight) in SEVERITY_WEIGHTS {
        cumulative += weight;
        if roll < cumulative {
            return severity;
        }
    }
    Severity::Low
}

/// 수정 버전을 추정합니다: 강제 변환한 버전의 패치를 1~3회 올립니다.
fn infer_fixed_in(version: &str, seed: &str) -> Option<String> {
    let mut fixed = coerce(version)?;
    let bumps = sub_hash(seed, "fix") % 3 + 1;
    for _ in 0..bumps {
        fixed = increment_patch(&fixed);
    }
    Some(fixed.to_string())
}

/// 패키지 식별자로부터 가상 취약점을 합성합니다.
///
/// 약 35%의 식별자만 결과를 가지며, 나머지는 `None`입니다.
/// 식별자 비교는 대소문자를 구분하지 않지만 설명에는 입력한 표기가 그대로 들어갑니다.
pub fn synthesize(package_name: &str, version: &str) -> Option<VulnerabilityFinding> {
    let seed = format!("{package_name}@{version}").to_lowercase();

    if sub_hash(&seed, "roll") % 100 >= FALLBACK_RATE {
        return None;
    }

    let severity = pick_severity(sub_hash(&seed, "severity"));
    let template = pick(
        sub_hash(&seed, &format!("template:{severity}")),
        templates_for(severity),
    );

    let cve_hash = sub_hash(&seed, "cve");
    let cve = format!("CVE-{}-{}", 2021 + cve_hash % 5, 1000 + cve_hash % 9000);
    let fixed_in = infer_fixed_in(version, &seed);
    let url_base = pick(sub_hash(&seed, "url"), &REFERENCE_URLS);

    Some(VulnerabilityFinding {
        package_name: package_name.to_owned(),
        vulnerable_range: fixed_in
            .as_deref()
            .map_or_else(|| "*".to_owned(), |f| format!("<{f}")),
        severity,
        title: template.title.to_owned(),
        description: template
            .description
            .replace("{package}", package_name)
            .replace("{version}", version),
        url: Some(format!("{url_base}/{cve}")),
        cve,
        fixed_in,
    })
}
