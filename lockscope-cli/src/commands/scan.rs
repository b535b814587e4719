//! `lockscope scan` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use lockscope_core::config::LockscopeConfig;
use lockscope_core::types::Severity;
use lockscope_manifest_scanner::{
    DependencyType, IntakePolicy, ManifestScanner, ManifestScannerBuilder, ManifestScannerConfig,
    ParseResult, SeverityCounts,
};

use crate::cli::ScanArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, colorize_severity};

/// Execute the `scan` command.
///
/// Exit behavior is driven by the returned error:
/// a parse error code maps to `Rejected` (5), findings at or above the
/// threshold map to `Vulnerable` (4).
pub async fn execute(
    args: ScanArgs,
    config: &LockscopeConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let scanner_config = build_scanner_config(&args, config)?;
    let threshold = scanner_config.min_severity;
    let policy = IntakePolicy::from_config(&scanner_config);

    info!(path = %args.path.display(), threshold = %threshold, "starting manifest scan");

    let scanner = build_scanner(scanner_config).await?;
    let text = policy.read_manifest(&args.path).await?;
    let result = scanner.parse(&text);

    let report = ScanReport::new(args.path.display().to_string(), result, threshold);
    writer.render(&report)?;

    if let Some(error) = &report.result.error {
        return Err(CliError::Rejected(format!("{}: {}", error.code, error.message)));
    }

    if report.summary.reportable > 0 {
        return Err(CliError::Vulnerable(format!(
            "{} at or above {}",
            report.summary.reportable, threshold
        )));
    }

    Ok(())
}

/// Merge the `[scan]` section with command-line overrides.
fn build_scanner_config(
    args: &ScanArgs,
    config: &LockscopeConfig,
) -> Result<ManifestScannerConfig, CliError> {
    let mut scanner_config = ManifestScannerConfig::from_core(&config.scan);

    if let Some(raw) = &args.min_severity {
        scanner_config.min_severity = parse_severity(raw)?;
    }
    if args.no_fallback {
        scanner_config.synthesize_fallback = false;
    }

    Ok(scanner_config)
}

/// Build the scanner off the async runtime since the rule file is read synchronously.
pub(crate) async fn build_scanner(config: ManifestScannerConfig) -> Result<ManifestScanner, CliError> {
    tokio::task::spawn_blocking(move || ManifestScannerBuilder::new().config(config).build())
        .await
        .map_err(|e| CliError::Command(format!("scanner initialization task failed: {e}")))?
        .map_err(CliError::from)
}

pub(crate) fn parse_severity(s: &str) -> Result<Severity, CliError> {
    Severity::from_str_loose(s).ok_or_else(|| {
        CliError::Command(format!(
            "invalid severity: {s} (expected: low, medium, high, critical)"
        ))
    })
}

/// Scan output payload.
///
/// The JSON form embeds the parse result (`packages`, `error`) at the top level.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub scan_id: String,
    pub source: String,
    #[serde(flatten)]
    pub result: ParseResult,
    pub summary: ScanSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub total_packages: usize,
    pub direct: usize,
    pub dev: usize,
    pub vulnerabilities: SeverityCounts,
    pub threshold: Severity,
    /// Findings at or above `threshold`
    pub reportable: usize,
}

impl ScanReport {
    pub fn new(source: String, result: ParseResult, threshold: Severity) -> Self {
        let summary = ScanSummary {
            total_packages: result.packages.len(),
            direct: result.packages.iter().filter(|p| p.record.is_direct).count(),
            dev: result
                .packages
                .iter()
                .filter(|p| p.record.dependency_type == DependencyType::Dev)
                .count(),
            vulnerabilities: result.severity_counts(),
            threshold,
            reportable: result
                .findings()
                .filter(|(_, f)| f.severity >= threshold)
                .count(),
        };

        Self {
            scan_id: uuid::Uuid::new_v4().to_string(),
            source,
            result,
            summary,
        }
    }
}

impl Render for ScanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Scan: {}", self.source.bold())?;

        if let Some(error) = &self.result.error {
            writeln!(w, "  Result: {}", "REJECTED".red().bold())?;
            writeln!(w, "  Code: {}", error.code)?;
            writeln!(w, "  Message: {}", error.message)?;
            return Ok(());
        }

        let summary = &self.summary;
        writeln!(
            w,
            "Packages: {} ({} direct, {} dev)",
            summary.total_packages, summary.direct, summary.dev
        )?;

        let counts = &summary.vulnerabilities;
        let vuln_str = format!(
            "{} total (C:{} H:{} M:{} L:{})",
            counts.total(),
            counts.critical,
            counts.high,
            counts.medium,
            counts.low
        );
        if summary.reportable > 0 {
            writeln!(w, "Vulnerabilities: {}", vuln_str.red().bold())?;
        } else {
            writeln!(w, "Vulnerabilities: {}", vuln_str.green().bold())?;
        }
        writeln!(w)?;

        writeln!(
            w,
            "{:<30} {:<12} {:<10} {:<5} {:<10} {:<16} Fixed",
            "Package", "Version", "Scope", "Type", "Severity", "CVE"
        )?;
        writeln!(w, "{}", "-".repeat(96))?;

        for package in &self.result.packages {
            let record = &package.record;
            let scope = if record.is_direct {
                "direct"
            } else {
                "transitive"
            };

            // Findings below the threshold are counted in the summary but not listed
            match package
                .vulnerability
                .as_ref()
                .filter(|v| v.severity >= summary.threshold)
            {
                Some(v) => writeln!(
                    w,
                    "{:<30} {:<12} {:<10} {:<5} {:<10} {:<16} {}",
                    record.name,
                    record.version,
                    scope,
                    record.dependency_type.as_str(),
                    colorize_severity(v.severity),
                    v.cve,
                    v.fixed_in.as_deref().unwrap_or("N/A")
                )?,
                None => writeln!(
                    w,
                    "{:<30} {:<12} {:<10} {:<5} {:<10} {:<16} -",
                    record.name,
                    record.version,
                    scope,
                    record.dependency_type.as_str(),
                    "-",
                    "-"
                )?,
            }
        }

        writeln!(w)?;
        if summary.reportable == 0 {
            writeln!(
                w,
                "{}",
                format!("No vulnerabilities at or above {}.", summary.threshold).green()
            )?;
        }

        Ok(())
    }
}
