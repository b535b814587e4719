//! 시맨틱 버전 해석 -- npm 스타일 범위 파싱과 최소 버전 계산
//!
//! `semver` 크레이트는 Cargo 범위 문법을 따르므로, npm 범위 표현식
//! (`^1.2.0`, `~5.2.0`, `1.2.x`, `>=1.0.0 <2.0.0`, `1.2.3 - 2.3.4`, `a || b`)을
//! `VersionReq` 문법으로 변환한 뒤 사용합니다.
//!
//! # npm과 Cargo 문법 차이
//!
//! | npm | 의미 | 변환 결과 |
//! |---|---|---|
//! | `1.2.3` | 정확히 1.2.3 | `=1.2.3` |
//! | `1.2` / `1.2.x` | 1.2.* | `=1.2` |
//! | `>=1.0.0 <2.0.0` | 공백 = AND | `>=1.0.0, <2.0.0` |
//! | `1.2.3 - 2.3.4` | 하이픈 범위 | `>=1.2.3, <=2.3.4` |
//! | `a \|\| b` | OR | 집합별 `VersionReq` |

use std::sync::OnceLock;

use regex::Regex;
use semver::{BuildMetadata, Comparator, Op, Prerelease, Version, VersionReq};

use crate::error::ManifestScannerError;

/// JavaScript의 `Number.MAX_SAFE_INTEGER` -- coerce 결과 컴포넌트 상한
const MAX_SAFE_COMPONENT: u64 = 9_007_199_254_740_991;

/// 범위 연산자 (긴 것부터 검사)
const OPERATORS: [&str; 8] = [">=", "<=", "~>", ">", "<", "=", "~", "^"];

static COERCE_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn coerce_re() -> Option<&'static Regex> {
    COERCE_RE
        .get_or_init(|| {
            Regex::new(
                r"(?:^|[^0-9])([0-9]{1,16})(?:\.([0-9]{1,16}))?(?:\.([0-9]{1,16}))?(?:$|[^0-9])",
            )
            .ok()
        })
        .as_ref()
}

/// 파싱된 npm 버전 범위
///
/// `||`로 구분된 각 비교자 집합을 하나의 [`VersionReq`]로 보관합니다.
/// 집합 중 하나라도 만족하면 범위를 만족합니다.
#[derive(Debug, Clone)]
pub struct NpmRange {
    raw: String,
    sets: Vec<VersionReq>,
}

impl NpmRange {
    /// npm 범위 문자열을 파싱합니다.
    ///
    /// 빈 문자열과 `*`, `x`는 모든 버전을 허용합니다.
    pub fn parse(input: &str) -> Result<Self, ManifestScannerError> {
        let mut sets = Vec::new();
        for set in input.split("||") {
            let translated = translate_set(set).map_err(|reason| {
                ManifestScannerError::VersionParse {
                    input: input.to_owned(),
                    reason,
                }
            })?;
            let req = VersionReq::parse(&translated).map_err(|e| {
                ManifestScannerError::VersionParse {
                    input: input.to_owned(),
                    reason: e.to_string(),
                }
            })?;
            sets.push(req);
        }

        Ok(Self {
            raw: input.to_owned(),
            sets,
        })
    }

    /// 원본 범위 문자열을 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// 버전이 범위를 만족하는지 확인합니다.
    ///
    /// 프리릴리스 버전은 같은 `major.minor.patch`에 프리릴리스를 명시한
    /// 비교자가 있을 때만 매칭됩니다.
    pub fn matches(&self, version: &Version) -> bool {
        self.sets.iter().any(|req| req.matches(version))
    }

    /// 범위를 만족하는 가장 낮은 버전을 계산합니다.
    ///
    /// 만족하는 버전이 없으면 `None`을 반환합니다.
    pub fn min_version(&self) -> Option<Version> {
        let zero = Version::new(0, 0, 0);
        if self.matches(&zero) {
            return Some(zero);
        }

        let zero_pre = Version {
            pre: Prerelease::new("0").ok()?,
            ..Version::new(0, 0, 0)
        };
        if self.matches(&zero_pre) {
            return Some(zero_pre);
        }

        let candidate = self.sets.iter().filter_map(set_lower_bound).min()?;
        self.matches(&candidate).then_some(candidate)
    }
}

/// 범위 문자열을 해석하여 만족하는 가장 낮은 구체 버전을 반환합니다.
///
/// 문법 오류이거나 만족하는 버전이 없으면 `VersionParse` 에러를 반환합니다.
/// 호출자는 이를 해당 의존성 항목만 건너뛰는 신호로 취급해야 합니다.
pub fn resolve_minimum_version(range: &str) -> Result<Version, ManifestScannerError> {
    let parsed = NpmRange::parse(range)?;
    parsed
        .min_version()
        .ok_or_else(|| ManifestScannerError::VersionParse {
            input: range.to_owned(),
            reason: "no version satisfies the range".to_owned(),
        })
}

/// 구체 버전 문자열을 파싱합니다. 앞의 `=`와 `v`는 무시합니다.
pub fn parse_version(input: &str) -> Option<Version> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('=').unwrap_or(trimmed);
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(trimmed).ok()
}

/// 버전이 범위를 만족하는지 확인합니다.
///
/// 버전이나 범위 중 하나라도 파싱할 수 없으면 `false`입니다.
pub fn satisfies(version: &str, range: &str) -> bool {
    let Some(version) = parse_version(version) else {
        return false;
    };
    NpmRange::parse(range).is_ok_and(|r| r.matches(&version))
}

/// 임의의 문자열에서 첫 번째 `major[.minor[.patch]]` 숫자열을 찾아 버전으로 강제 변환합니다.
///
/// 누락된 컴포넌트는 0이 되고, 프리릴리스/빌드 메타데이터는 버려집니다.
/// 예: `"v2"` → `2.0.0`, `"1.2.3-beta"` → `1.2.3`, `"build-3"` → `3.0.0`
pub fn coerce(input: &str) -> Option<Version> {
    let caps = coerce_re()?.captures(input)?;

    let component = |idx: usize| -> Option<u64> {
        match caps.get(idx) {
            Some(m) => m
                .as_str()
                .parse::<u64>()
                .ok()
                .filter(|n| *n <= MAX_SAFE_COMPONENT),
            None => Some(0),
        }
    };

    Some(Version::new(component(1)?, component(2)?, component(3)?))
}

/// 패치 버전을 하나 올립니다.
///
/// 프리릴리스 버전은 패치를 올리지 않고 프리릴리스만 제거합니다 (`1.2.3-rc` → `1.2.3`).
pub fn increment_patch(version: &Version) -> Version {
    if version.pre.is_empty() {
        Version::new(version.major, version.minor, version.patch.saturating_add(1))
    } else {
        Version::new(version.major, version.minor, version.patch)
    }
}

/// 비교자 집합의 하한(가장 큰 하한 비교자)을 계산합니다.
fn set_lower_bound(req: &VersionReq) -> Option<Version> {
    let mut set_min: Option<Version> = None;
    for cmp in &req.comparators {
        let candidate = match cmp.op {
            Op::Greater => next_after(cmp),
            Op::Less | Op::LessEq => continue,
            _ => floor_of(cmp),
        };
        if set_min.as_ref().is_none_or(|current| candidate > *current) {
            set_min = Some(candidate);
        }
    }
    set_min
}

/// `>` 비교자를 만족하는 첫 버전
fn next_after(cmp: &Comparator) -> Version {
    match (cmp.minor, cmp.patch) {
        (None, _) => Version::new(cmp.major.saturating_add(1), 0, 0),
        (Some(minor), None) => Version::new(cmp.major, minor.saturating_add(1), 0),
        (Some(minor), Some(patch)) if cmp.pre.is_empty() => {
            Version::new(cmp.major, minor, patch.saturating_add(1))
        }
        (Some(minor), Some(patch)) => Version {
            major: cmp.major,
            minor,
            patch,
            pre: Prerelease::new(&format!("{}.0", cmp.pre)).unwrap_or_else(|_| cmp.pre.clone()),
            build: BuildMetadata::EMPTY,
        },
    }
}

/// 하한 비교자(`=`, `>=`, `~`, `^`, 와일드카드)가 허용하는 첫 버전
fn floor_of(cmp: &Comparator) -> Version {
    Version {
        major: cmp.major,
        minor: cmp.minor.unwrap_or(0),
        patch: cmp.patch.unwrap_or(0),
        pre: cmp.pre.clone(),
        build: BuildMetadata::EMPTY,
    }
}

// --- npm → semver 문법 변환 ---

/// 하나의 비교자 집합(`||` 사이)을 `VersionReq` 문법으로 변환합니다.
fn translate_set(set: &str) -> Result<String, String> {
    let tokens: Vec<&str> = set.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok("*".to_owned());
    }

    if let [low, "-", high] = tokens.as_slice() {
        return translate_hyphen(low, high);
    }

    // ">= 1.0.0"처럼 연산자와 버전 사이에 공백이 있는 경우 병합
    let mut merged: Vec<String> = Vec::with_capacity(tokens.len());
    let mut pending_op: Option<&str> = None;
    for token in tokens {
        if is_bare_operator(token) {
            if pending_op.is_some() {
                return Err(format!("consecutive operators near '{token}'"));
            }
            pending_op = Some(token);
            continue;
        }
        match pending_op.take() {
            Some(op) => merged.push(format!("{op}{token}")),
            None => merged.push(token.to_owned()),
        }
    }
    if let Some(op) = pending_op {
        return Err(format!("operator '{op}' without version"));
    }

    let mut comparators = Vec::with_capacity(merged.len());
    for token in &merged {
        if let Some(comparator) = translate_comparator(token)? {
            comparators.push(comparator);
        }
    }

    if comparators.is_empty() {
        Ok("*".to_owned())
    } else {
        Ok(comparators.join(", "))
    }
}

fn is_bare_operator(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| matches!(c, '<' | '>' | '=' | '~' | '^'))
}

/// 단일 비교자를 변환합니다. 모든 버전을 허용하는 비교자는 `None`입니다.
fn translate_comparator(token: &str) -> Result<Option<String>, String> {
    let (op, rest) = split_operator(token);
    let op = if op == "~>" { "~" } else { op };
    let rest = rest.strip_prefix('v').unwrap_or(rest);
    let partial = PartialVersion::parse(rest)?;

    if partial.numbers.is_empty() {
        return match op {
            "" | "=" | ">=" | "~" | "^" => Ok(None),
            _ => Err(format!("comparator '{token}' matches no version")),
        };
    }

    let numbers = partial.numbers.join(".");
    let comparator = match op {
        // npm의 맨 버전은 정확 매칭, 부분 버전은 와일드카드
        "" | "=" => format!("={numbers}{}", partial.pre_suffix()),
        _ => format!("{op}{numbers}{}", partial.pre_suffix()),
    };
    Ok(Some(comparator))
}

/// 하이픈 범위 `a - b`를 변환합니다.
fn translate_hyphen(low: &str, high: &str) -> Result<String, String> {
    let low = PartialVersion::parse(low.strip_prefix('v').unwrap_or(low))?;
    let high = PartialVersion::parse(high.strip_prefix('v').unwrap_or(high))?;

    let mut comparators = Vec::with_capacity(2);
    if !low.numbers.is_empty() {
        comparators.push(format!(">={}{}", low.numbers.join("."), low.pre_suffix()));
    }

    match high.numbers.as_slice() {
        [] => {}
        [major] => {
            let major = parse_component(major)?;
            comparators.push(format!("<{}.0.0", major.saturating_add(1)));
        }
        [major, minor] => {
            let minor = parse_component(minor)?;
            comparators.push(format!("<{major}.{}.0", minor.saturating_add(1)));
        }
        _ => comparators.push(format!("<={}{}", high.numbers.join("."), high.pre_suffix())),
    }

    if comparators.is_empty() {
        Ok("*".to_owned())
    } else {
        Ok(comparators.join(", "))
    }
}

fn split_operator(token: &str) -> (&str, &str) {
    for op in OPERATORS {
        if let Some(rest) = token.strip_prefix(op) {
            return (op, rest);
        }
    }
    ("", token)
}

fn parse_component(part: &str) -> Result<u64, String> {
    part.parse::<u64>()
        .map_err(|_| format!("invalid version component '{part}'"))
}

/// 와일드카드를 허용하는 부분 버전 (`1`, `1.2`, `1.2.x`, `1.2.3-beta`)
struct PartialVersion<'a> {
    /// 와일드카드 이전까지의 숫자 컴포넌트
    numbers: Vec<&'a str>,
    /// 프리릴리스 식별자 (세 컴포넌트가 모두 있을 때만)
    pre: Option<&'a str>,
}

impl<'a> PartialVersion<'a> {
    fn parse(input: &'a str) -> Result<Self, String> {
        if input.is_empty() {
            return Err("empty version".to_owned());
        }

        // 빌드 메타데이터는 범위 매칭에서 무시
        let without_build = input.split_once('+').map_or(input, |(head, _)| head);
        let (core, pre) = match without_build.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (without_build, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3 {
            return Err(format!("too many version components in '{input}'"));
        }

        let mut numbers = Vec::with_capacity(3);
        let mut wildcard_seen = false;
        for part in parts {
            if matches!(part, "x" | "X" | "*") {
                wildcard_seen = true;
                continue;
            }
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("invalid version '{input}'"));
            }
            if wildcard_seen {
                return Err(format!("number after wildcard in '{input}'"));
            }
            numbers.push(part);
        }

        if pre.is_some() && numbers.len() < 3 {
            return Err(format!("prerelease on partial version '{input}'"));
        }

        Ok(Self { numbers, pre })
    }

    fn pre_suffix(&self) -> String {
        self.pre.map(|p| format!("-{p}")).unwrap_or_default()
    }
}
