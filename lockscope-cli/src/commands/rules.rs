//! `lockscope rules` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use lockscope_core::config::LockscopeConfig;
use lockscope_core::types::Severity;
use lockscope_manifest_scanner::{
    ManifestScannerConfig, RuleTable, VulnMatcher, VulnerabilityFinding, VulnerabilityRule,
};

use crate::cli::{RulesAction, RulesArgs};
use crate::commands::scan::build_scanner;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, colorize_severity};

/// Execute the `rules` command.
pub async fn execute(
    args: RulesArgs,
    config: &LockscopeConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let scanner_config = ManifestScannerConfig::from_core(&config.scan);
    if !scanner_config.rules_path.is_empty() {
        info!(rules_path = %scanner_config.rules_path, "loading extra vulnerability rules");
    }
    let scanner = build_scanner(scanner_config).await?;
    let matcher = scanner.matcher();

    match args.action {
        RulesAction::List { package } => {
            let report = build_list_report(matcher.rules(), package.as_deref());
            writer.render(&report)
        }
        RulesAction::Check { name, version } => {
            let report = build_check_report(matcher, &name, &version);
            writer.render(&report)
        }
    }
}

fn build_list_report(table: &RuleTable, package: Option<&str>) -> RuleListReport {
    let rules: Vec<RuleEntry> = match package {
        Some(name) => table.lookup(name).into_iter().map(RuleEntry::from).collect(),
        None => table.rules().map(RuleEntry::from).collect(),
    };

    RuleListReport {
        total: rules.len(),
        rules,
    }
}

fn build_check_report(matcher: &VulnMatcher, name: &str, version: &str) -> RuleCheckReport {
    let finding = matcher.first_finding(name, version);
    let source = match &finding {
        Some(_) if !matcher.rules().matching(name, version).is_empty() => Some("rule"),
        Some(_) => Some("synthetic"),
        None => None,
    };

    RuleCheckReport {
        package: name.to_owned(),
        version: version.to_owned(),
        source: source.map(str::to_owned),
        finding,
    }
}

#[derive(Serialize)]
pub struct RuleListReport {
    pub total: usize,
    pub rules: Vec<RuleEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEntry {
    pub package: String,
    pub range: String,
    pub severity: Severity,
    pub cve: String,
    pub title: String,
    pub fixed_in: Option<String>,
}

impl From<&VulnerabilityRule> for RuleEntry {
    fn from(rule: &VulnerabilityRule) -> Self {
        Self {
            package: rule.package_name.clone(),
            range: rule.vulnerable_range.clone(),
            severity: rule.severity,
            cve: rule.cve.clone(),
            title: rule.title.clone(),
            fixed_in: rule.fixed_in.clone(),
        }
    }
}

impl Render for RuleListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Vulnerability Rules: {}", self.total.to_string().bold())?;
        writeln!(w)?;

        if self.rules.is_empty() {
            writeln!(w, "No rules found.")?;
            return Ok(());
        }

        writeln!(
            w,
            "{:<20} {:<24} {:<10} {:<16} Fixed",
            "Package", "Range", "Severity", "CVE"
        )?;
        writeln!(w, "{}", "-".repeat(84))?;

        for r in &self.rules {
            writeln!(
                w,
                "{:<20} {:<24} {:<10} {:<16} {}",
                r.package,
                r.range,
                colorize_severity(r.severity),
                r.cve,
                r.fixed_in.as_deref().unwrap_or("N/A")
            )?;
        }

        Ok(())
    }
}

/// Finding for a single `name@version` identity.
#[derive(Serialize)]
pub struct RuleCheckReport {
    pub package: String,
    pub version: String,
    /// `rule` or `synthetic`; absent when there is no finding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub finding: Option<VulnerabilityFinding>,
}

impl Render for RuleCheckReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Check: {}", format!("{}@{}", self.package, self.version).bold())?;

        let Some(finding) = &self.finding else {
            writeln!(w, "  Result: {}", "NO FINDING".green().bold())?;
            return Ok(());
        };

        writeln!(
            w,
            "  Result: {} ({})",
            "VULNERABLE".red().bold(),
            self.source.as_deref().unwrap_or("unknown")
        )?;
        writeln!(w, "  Severity: {}", colorize_severity(finding.severity))?;
        writeln!(w, "  CVE: {}", finding.cve)?;
        writeln!(w, "  Title: {}", finding.title)?;
        writeln!(w, "  Range: {}", finding.vulnerable_range)?;
        writeln!(
            w,
            "  Fixed in: {}",
            finding.fixed_in.as_deref().unwrap_or("N/A")
        )?;
        if let Some(url) = &finding.url {
            writeln!(w, "  URL: {url}")?;
        }
        writeln!(w, "  {}", finding.description)?;

        Ok(())
    }
}
