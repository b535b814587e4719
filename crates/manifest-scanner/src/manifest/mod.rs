//! 매니페스트 분류 및 패키지 추출
//!
//! 파싱된 JSON 문서를 [`classify`]로 두 가지 지원 스키마 중 하나로 분류한 뒤,
//! 분류 결과에 맞는 추출기로 후보 패키지 레코드를 만듭니다.
//!
//! # 지원 형식
//!
//! - `package-lock.json` (lockfileVersion 2, 3) -- [`package_lock`]
//! - `package.json` (`dependencies` / `devDependencies`) -- [`package_json`]
//!
//! 이후 단계는 필드를 직접 조사하지 않고 [`Classification`] 태그로 분기합니다.

mod deserializers;
pub mod package_json;
pub mod package_lock;

use std::fmt;

use serde_json::{Map, Value};

use crate::types::PackageRecord;

/// 지원하는 lockfileVersion
const SUPPORTED_LOCKFILE_VERSIONS: [u8; 2] = [2, 3];

/// 문서 분류 결과
#[derive(Debug)]
pub enum Classification<'a> {
    /// `package-lock.json` 형식
    LockFile(LockFile<'a>),
    /// `package.json` 형식
    ManifestFile(ManifestFile<'a>),
    /// 지원하지 않는 문서
    Unsupported(UnsupportedReason),
}

impl Classification<'_> {
    /// 분류 이름 (로그용)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LockFile(_) => "package-lock",
            Self::ManifestFile(_) => "package-json",
            Self::Unsupported(_) => "unsupported",
        }
    }

    /// 후보 패키지 레코드를 추출합니다 (중복 제거 전).
    ///
    /// 지원하지 않는 문서는 `None`입니다.
    pub fn extract(&self) -> Option<Vec<PackageRecord>> {
        match self {
            Self::LockFile(lock) => Some(package_lock::extract(lock)),
            Self::ManifestFile(manifest) => Some(package_json::extract(manifest)),
            Self::Unsupported(_) => None,
        }
    }
}

/// lockfile 문서
#[derive(Debug, Clone, Copy)]
pub struct LockFile<'a> {
    /// lockfileVersion (2 또는 3)
    pub version: u8,
    /// 설치 경로 → 패키지 항목 맵 (비어 있지 않음)
    pub packages: &'a Map<String, Value>,
}

/// package.json 문서
#[derive(Debug, Clone, Copy)]
pub struct ManifestFile<'a> {
    /// 문서 루트 객체
    pub document: &'a Value,
}

/// 미지원 사유
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedReason {
    /// 최상위 값이 객체가 아님
    NotAnObject,
    /// 알려진 스키마 필드가 없음
    UnknownSchema,
    /// 지원하지 않는 lockfileVersion (원본 JSON 표기)
    LockfileVersion(String),
    /// lockfile에 비어 있지 않은 `packages` 맵이 없음
    MissingPackages,
}

impl fmt::Display for UnsupportedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "top-level JSON value is not an object"),
            Self::UnknownSchema => {
                write!(f, "no lockfileVersion, dependencies or devDependencies field")
            }
            Self::LockfileVersion(v) => write!(f, "unsupported lockfileVersion {v}"),
            Self::MissingPackages => write!(f, "lockfile has no packages"),
        }
    }
}

/// 문서를 분류합니다.
///
/// 판정 순서:
/// 1. `lockfileVersion` 필드가 있으면 lockfile 후보 (2, 3만 지원, 비어 있지 않은 `packages` 필요)
/// 2. `dependencies` 또는 `devDependencies` 필드가 있으면 package.json
/// 3. 그 외는 미지원
pub fn classify(document: &Value) -> Classification<'_> {
    let Value::Object(root) = document else {
        return Classification::Unsupported(UnsupportedReason::NotAnObject);
    };

    if let Some(raw_version) = root.get("lockfileVersion") {
        let version = raw_version.as_f64().unwrap_or(0.0);
        let Some(version) = SUPPORTED_LOCKFILE_VERSIONS
            .into_iter()
            .find(|v| f64::from(*v) == version)
        else {
            return Classification::Unsupported(UnsupportedReason::LockfileVersion(
                raw_version.to_string(),
            ));
        };

        return match root.get("packages") {
            Some(Value::Object(packages)) if !packages.is_empty() => {
                Classification::LockFile(LockFile { version, packages })
            }
            _ => Classification::Unsupported(UnsupportedReason::MissingPackages),
        };
    }

    if root.contains_key("dependencies") || root.contains_key("devDependencies") {
        return Classification::ManifestFile(ManifestFile { document });
    }

    Classification::Unsupported(UnsupportedReason::UnknownSchema)
}
