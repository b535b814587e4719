//! 느슨한 필드 역직렬화 -- 잘못된 타입의 필드를 항목 전체 실패 대신 기본값으로 처리
//!
//! 실제 매니페스트에는 손으로 편집되었거나 도구가 남긴 비표준 값이 섞여 있으므로,
//! 필드 하나의 타입 오류로 패키지 항목 전체를 잃지 않도록 합니다.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// 객체의 키 목록. 객체가 아니면 빈 목록입니다.
pub fn object_keys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Object(map) => Ok(map.into_iter().map(|(key, _)| key).collect()),
        _ => Ok(Vec::new()),
    }
}

/// 문자열 값을 가진 `(키, 값)` 목록 (문서 순서 유지).
///
/// 객체가 아니면 빈 목록이고, 문자열이 아닌 값은 건너뜁니다.
pub fn string_entries<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(map) = value else {
        return Ok(Vec::new());
    };

    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::String(s) => entries.push((key, s)),
            other => debug!(name = %key, value = %other, "skipping non-string dependency spec"),
        }
    }
    Ok(entries)
}

/// 문자열이면 `Some`, 그 외(null 포함)는 `None`.
pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// JSON 값의 참/거짓 판정 (`false`, `null`, `0`, `""`만 거짓).
pub fn truthy_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}
