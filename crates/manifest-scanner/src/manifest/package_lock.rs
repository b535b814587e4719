//! package-lock.json 추출기
//!
//! lockfile v2/v3의 `packages` 맵을 순회합니다. 키는 설치 경로이며,
//! 빈 문자열 키는 프로젝트 자신(루트)을 나타냅니다.
//!
//! ```json
//! {
//!   "lockfileVersion": 3,
//!   "packages": {
//!     "": { "name": "app", "dependencies": { "left-pad": "^1.3.0" } },
//!     "node_modules/left-pad": { "version": "1.3.0" },
//!     "node_modules/left-pad/node_modules/sub": { "version": "0.1.0", "dev": true }
//!   }
//! }
//! ```
//!
//! # 분류 규칙
//!
//! - `is_direct`: 루트의 `dependencies` 또는 `devDependencies`에 이름이 있음
//! - `dependency_type`: 루트 prod 집합 → `Prod`, 루트 dev 집합 → `Dev`,
//!   그 외에는 항목 자신의 `dev` 플래그

use std::collections::HashSet;

use serde::Deserialize;
use tracing::debug;

use super::LockFile;
use super::deserializers::{object_keys, optional_string, truthy_flag};
use crate::types::{DependencyType, PackageRecord};

/// 설치 경로에서 패키지 이름을 구분하는 마커
const NODE_MODULES_MARKER: &str = "node_modules/";

/// lockfile 루트 항목 (파싱용)
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LockRootEntry {
    #[serde(default, deserialize_with = "object_keys")]
    dependencies: Vec<String>,
    #[serde(default, deserialize_with = "object_keys")]
    dev_dependencies: Vec<String>,
}

/// lockfile 개별 패키지 항목 (파싱용)
#[derive(Deserialize)]
struct LockPackageEntry {
    #[serde(default, deserialize_with = "optional_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    version: Option<String>,
    #[serde(default, deserialize_with = "truthy_flag")]
    dev: bool,
}

/// lockfile 문서에서 후보 레코드를 추출합니다 (문서 순서).
pub fn extract(lock: &LockFile<'_>) -> Vec<PackageRecord> {
    let root = lock
        .packages
        .get("")
        .and_then(|value| LockRootEntry::deserialize(value).ok())
        .unwrap_or_default();
    let prod_names: HashSet<&str> = root.dependencies.iter().map(String::as_str).collect();
    let dev_names: HashSet<&str> = root.dev_dependencies.iter().map(String::as_str).collect();

    let mut records = Vec::with_capacity(lock.packages.len());
    for (path, value) in lock.packages {
        if path.is_empty() {
            continue;
        }

        let entry = match LockPackageEntry::deserialize(value) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(path = %path, error = %e, "skipping malformed lockfile entry");
                continue;
            }
        };

        let Some(version) = entry.version.filter(|v| !v.is_empty()) else {
            debug!(path = %path, "skipping lockfile entry without version");
            continue;
        };

        let name = match entry.name {
            Some(name) => name,
            None => match package_name_from_path(path) {
                Some(name) => name.to_owned(),
                None => {
                    debug!(path = %path, "skipping lockfile entry without resolvable name");
                    continue;
                }
            },
        };
        if name.is_empty() {
            continue;
        }

        let in_prod = prod_names.contains(name.as_str());
        let in_dev = dev_names.contains(name.as_str());
        let dependency_type = if in_prod {
            DependencyType::Prod
        } else if in_dev || entry.dev {
            DependencyType::Dev
        } else {
            DependencyType::Prod
        };

        records.push(PackageRecord::new(
            name,
            version,
            in_prod || in_dev,
            dependency_type,
        ));
    }

    records
}

/// 설치 경로의 마지막 `node_modules/` 이후 부분을 패키지 이름으로 사용합니다.
///
/// - `node_modules/lodash` → `lodash`
/// - `node_modules/@types/node` → `@types/node`
/// - `node_modules/left-pad/node_modules/sub` → `sub`
///
/// 마커가 없거나 마커 뒤가 비어 있으면 `None`입니다.
pub fn package_name_from_path(path: &str) -> Option<&str> {
    let pos = path.rfind(NODE_MODULES_MARKER)?;
    let name = &path[pos + NODE_MODULES_MARKER.len()..];
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn extract_from(doc: &Value) -> Vec<PackageRecord> {
        let packages = doc["packages"].as_object().unwrap();
        extract(&LockFile {
            version: 3,
            packages,
        })
    }

    #[test]
    fn extracts_direct_and_transitive_packages() {
        let doc = json!({
            "packages": {
                "": {
                    "name": "root",
                    "dependencies": { "left-pad": "^1.3.0" },
                    "devDependencies": { "@scope/pkg": "^2.0.0" }
                },
                "node_modules/left-pad": { "version": "1.3.0" },
                "node_modules/@scope/pkg": { "version": "2.1.0", "dev": true },
                "node_modules/left-pad/node_modules/sub": { "version": "0.1.0", "dev": true }
            }
        });

        assert_eq!(
            extract_from(&doc),
            vec![
                PackageRecord::new("left-pad", "1.3.0", true, DependencyType::Prod),
                PackageRecord::new("@scope/pkg", "2.1.0", true, DependencyType::Dev),
                PackageRecord::new("sub", "0.1.0", false, DependencyType::Dev),
            ]
        );
    }

    #[test]
    fn explicit_name_wins_over_path() {
        let doc = json!({
            "packages": {
                "node_modules/alias": { "name": "real-name", "version": "1.0.0" }
            }
        });
        let records = extract_from(&doc);
        assert_eq!(records[0].name, "real-name");
        assert!(!records[0].is_direct);
        assert_eq!(records[0].dependency_type, DependencyType::Prod);
    }

    #[test]
    fn root_classification_overrides_entry_dev_flag() {
        let doc = json!({
            "packages": {
                "": { "dependencies": { "chalk": "^5.0.0" } },
                "node_modules/chalk": { "version": "5.3.0", "dev": true }
            }
        });
        let records = extract_from(&doc);
        assert!(records[0].is_direct);
        assert_eq!(records[0].dependency_type, DependencyType::Prod);
    }

    #[test]
    fn drops_entries_without_version_or_name() {
        let doc = json!({
            "packages": {
                "": { "name": "root", "version": "1.0.0" },
                "node_modules/no-version": {},
                "node_modules/empty-version": { "version": "" },
                "packages/workspace-a": { "version": "1.0.0" },
                "node_modules/": { "version": "1.0.0" },
                "node_modules/explicit-empty": { "name": "", "version": "1.0.0" },
                "node_modules/broken": "not-an-object",
                "node_modules/ok": { "version": "2.0.0" }
            }
        });
        let records = extract_from(&doc);
        assert_eq!(
            records,
            vec![PackageRecord::new("ok", "2.0.0", false, DependencyType::Prod)]
        );
    }

    #[test]
    fn missing_root_entry_means_all_transitive() {
        let doc = json!({
            "packages": {
                "node_modules/a": { "version": "1.0.0" },
                "node_modules/b": { "version": "1.0.0", "dev": true }
            }
        });
        let records = extract_from(&doc);
        assert!(records.iter().all(|r| !r.is_direct));
        assert_eq!(records[1].dependency_type, DependencyType::Dev);
    }

    #[test]
    fn lockfile_versions_are_kept_verbatim() {
        let doc = json!({
            "packages": { "node_modules/pkg": { "version": "1.0.0-rc.1+build.5" } }
        });
        assert_eq!(extract_from(&doc)[0].version, "1.0.0-rc.1+build.5");
    }

    #[test]
    fn package_name_from_path_cases() {
        assert_eq!(package_name_from_path("node_modules/lodash"), Some("lodash"));
        assert_eq!(
            package_name_from_path("node_modules/@types/node"),
            Some("@types/node")
        );
        assert_eq!(
            package_name_from_path("node_modules/left-pad/node_modules/sub"),
            Some("sub")
        );
        assert_eq!(package_name_from_path("packages/app"), None);
        assert_eq!(package_name_from_path("node_modules/"), None);
    }
}
