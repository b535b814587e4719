//! 파싱 오케스트레이터 -- 매니페스트 텍스트 한 건을 [`ParseResult`]로 변환
//!
//! # 처리 흐름
//!
//! ```text
//! text --> trim (empty) --> serde_json (invalid_json) --> classify (unsupported_format)
//!                                                             |
//!                                                      extract --> dedupe
//!                                                             |
//!                                            (no_dependencies if zero records)
//!                                                             |
//!                                              VulnMatcher::first_finding per record
//! ```
//!
//! 구조적 실패는 `Err`가 아니라 [`ParseResult::error`]로 보고됩니다.
//! 파싱은 I/O 없이 메모리에서만 수행되며, 같은 입력은 항상 같은 결과를 냅니다.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::config::ManifestScannerConfig;
use crate::dedupe::dedupe;
use crate::error::ManifestScannerError;
use crate::manifest::{Classification, classify};
use crate::types::{ParseErrorCode, ParseErrorInfo, ParseResult, ScannedPackage};
use crate::vuln::{RuleTable, VulnMatcher, VulnerabilityRule};

/// 매니페스트 스캐너
///
/// 내부 상태는 불변 규칙 테이블뿐이므로 여러 스레드에서 동시에 `parse`를 호출해도 됩니다.
#[derive(Debug, Clone, Default)]
pub struct ManifestScanner {
    matcher: VulnMatcher,
}

impl ManifestScanner {
    /// 매처로 스캐너를 생성합니다.
    pub fn new(matcher: VulnMatcher) -> Self {
        Self { matcher }
    }

    /// 취약점 매처를 반환합니다.
    pub fn matcher(&self) -> &VulnMatcher {
        &self.matcher
    }

    /// 매니페스트 텍스트를 파싱하고 각 패키지에 취약점을 결합합니다.
    pub fn parse(&self, text: &str) -> ParseResult {
        let text = text.trim();
        if text.is_empty() {
            return ParseResult::failure(ParseErrorInfo::new(ParseErrorCode::Empty));
        }

        let document: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "manifest is not valid JSON");
                return ParseResult::failure(ParseErrorInfo::new(ParseErrorCode::InvalidJson));
            }
        };

        let classification = classify(&document);
        let format = classification.kind();
        let records = match &classification {
            Classification::Unsupported(reason) => {
                warn!(reason = %reason, "unsupported manifest format");
                return ParseResult::failure(ParseErrorInfo::with_detail(
                    ParseErrorCode::UnsupportedFormat,
                    reason,
                ));
            }
            other => other.extract().unwrap_or_default(),
        };

        let records = dedupe(records);
        if records.is_empty() {
            info!(format, packages = 0, "manifest has no usable dependencies");
            return ParseResult::failure(ParseErrorInfo::new(ParseErrorCode::NoDependencies));
        }

        let packages: Vec<ScannedPackage> = records
            .into_iter()
            .map(|record| {
                let vulnerability = self.matcher.first_finding(&record.name, &record.version);
                ScannedPackage {
                    record,
                    vulnerability,
                }
            })
            .collect();

        let result = ParseResult::success(packages);
        info!(
            format,
            packages = result.packages.len(),
            findings = result.finding_count(),
            "manifest parsed"
        );
        result
    }
}

/// 내장 규칙과 합성 폴백을 사용하는 기본 스캐너로 매니페스트를 파싱합니다.
pub fn parse_manifest(text: &str) -> ParseResult {
    ManifestScanner::default().parse(text)
}

/// [`ManifestScanner`] 빌더
///
/// 설정을 검증하고, `rules_path`가 지정되어 있으면 규칙 파일을 읽어 내장 규칙 뒤에 붙입니다.
#[derive(Default)]
pub struct ManifestScannerBuilder {
    config: ManifestScannerConfig,
    extra_rules: Vec<VulnerabilityRule>,
}

impl ManifestScannerBuilder {
    /// 기본 설정의 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 스캐너 설정을 지정합니다.
    pub fn config(mut self, config: ManifestScannerConfig) -> Self {
        self.config = config;
        self
    }

    /// 추가 규칙을 지정합니다 (규칙 파일 내용 앞에 붙습니다).
    pub fn extra_rules(mut self, rules: Vec<VulnerabilityRule>) -> Self {
        self.extra_rules = rules;
        self
    }

    /// 스캐너를 빌드합니다.
    ///
    /// # Errors
    ///
    /// - 설정 검증 실패 시 `ManifestScannerError::Config`
    /// - 규칙 파일 로딩 실패 시 `RuleDbLoad` / `RuleDbParse`
    pub fn build(self) -> Result<ManifestScanner, ManifestScannerError> {
        self.config.validate()?;

        let mut extra = self.extra_rules;
        if !self.config.rules_path.is_empty() {
            extra.extend(RuleTable::load_rules_file(Path::new(
                &self.config.rules_path,
            ))?);
        }

        let rules = if extra.is_empty() {
            RuleTable::builtin()
        } else {
            Arc::new(RuleTable::builtin_with(extra))
        };

        Ok(ManifestScanner::new(VulnMatcher::new(
            rules,
            self.config.synthesize_fallback,
        )))
    }
}
