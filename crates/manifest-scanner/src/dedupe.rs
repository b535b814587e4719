//! 중복 제거 -- `name@version` 식별 키로 후보 레코드 병합
//!
//! 충돌 시 병합 규칙:
//! - `is_direct`: 모든 충돌 레코드의 논리합
//! - `dependency_type`: 하나라도 `Prod`이면 `Prod`
//!
//! 출력 순서는 각 식별 키의 첫 등장 순서입니다.

use std::collections::HashMap;

use crate::types::PackageRecord;

/// 후보 레코드 목록의 중복을 제거합니다.
pub fn dedupe(records: Vec<PackageRecord>) -> Vec<PackageRecord> {
    let mut merged: Vec<PackageRecord> = Vec::with_capacity(records.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(records.len());

    for record in records {
        let key = record.identity();
        if let Some(&pos) = index.get(&key) {
            let existing = &mut merged[pos];
            existing.is_direct |= record.is_direct;
            existing.dependency_type = existing.dependency_type.merge(record.dependency_type);
        } else {
            index.insert(key, merged.len());
            merged.push(record);
        }
    }

    merged
}
