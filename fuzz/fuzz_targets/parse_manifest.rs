#![no_main]

use libfuzzer_sys::fuzz_target;
use lockscope_manifest_scanner::parse_manifest;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let result = parse_manifest(&text);

    // 에러와 비어 있지 않은 패키지 목록 중 정확히 하나
    assert_ne!(result.is_error(), !result.packages.is_empty());

    let mut seen = std::collections::HashSet::new();
    for package in &result.packages {
        assert!(seen.insert(package.record.identity()));
    }
});
