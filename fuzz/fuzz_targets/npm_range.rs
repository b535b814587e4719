#![no_main]

use libfuzzer_sys::fuzz_target;
use lockscope_manifest_scanner::version::resolve_minimum_version;
use lockscope_manifest_scanner::NpmRange;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(range) = NpmRange::parse(input) else {
        return;
    };

    // 해석된 최소 버전은 항상 범위를 만족해야 함
    if let Ok(min) = resolve_minimum_version(input) {
        assert!(range.matches(&min), "{input} -> {min}");
    }
});
