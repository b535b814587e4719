//! package.json 추출기
//!
//! `dependencies`(prod)와 `devDependencies`(dev)의 이름 → 범위 맵을 순회하여
//! 각 범위를 만족하는 가장 낮은 버전으로 해석합니다. 해석할 수 없는 범위
//! (`latest`, git URL, 오타 등)는 해당 항목만 조용히 버려집니다.
//!
//! package.json은 직접 의존성만 선언하므로 모든 레코드는 `is_direct = true`입니다.

use serde::Deserialize;
use tracing::{debug, warn};

use super::ManifestFile;
use super::deserializers::string_entries;
use crate::types::{DependencyType, PackageRecord};
use crate::version::resolve_minimum_version;

/// package.json 의존성 필드 (파싱용)
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PackageJsonDeps {
    #[serde(default, deserialize_with = "string_entries")]
    dependencies: Vec<(String, String)>,
    #[serde(default, deserialize_with = "string_entries")]
    dev_dependencies: Vec<(String, String)>,
}

/// package.json 문서에서 후보 레코드를 추출합니다.
///
/// 순서: `dependencies` 전체, 이어서 `devDependencies` 전체 (각각 문서 순서).
pub fn extract(manifest: &ManifestFile<'_>) -> Vec<PackageRecord> {
    let deps = match PackageJsonDeps::deserialize(manifest.document) {
        Ok(deps) => deps,
        Err(e) => {
            warn!(error = %e, "failed to read dependency maps from package.json");
            return Vec::new();
        }
    };

    let mut records = Vec::with_capacity(deps.dependencies.len() + deps.dev_dependencies.len());
    push_resolved(&mut records, deps.dependencies, DependencyType::Prod);
    push_resolved(&mut records, deps.dev_dependencies, DependencyType::Dev);
    records
}

fn push_resolved(
    records: &mut Vec<PackageRecord>,
    entries: Vec<(String, String)>,
    dependency_type: DependencyType,
) {
    for (name, range) in entries {
        if name.is_empty() {
            debug!(range = %range, "skipping dependency with empty name");
            continue;
        }

        match resolve_minimum_version(&range) {
            Ok(version) => {
                records.push(PackageRecord::new(
                    name,
                    version.to_string(),
                    true,
                    dependency_type,
                ));
            }
            Err(e) => {
                debug!(name = %name, range = %range, error = %e, "skipping unresolvable dependency range");
            }
        }
    }
}
