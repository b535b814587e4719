//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// lockscope -- npm manifest dependency and vulnerability scanner.
///
/// Use `lockscope <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "lockscope", version, about, long_about = None)]
pub struct Cli {
    /// Path to the lockscope.toml configuration file.
    #[arg(short, long, global = true, default_value = "lockscope.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a package.json / package-lock.json and report vulnerable packages.
    Scan(ScanArgs),

    /// Inspect the vulnerability rule table.
    Rules(RulesArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- scan ----

/// Scan a single npm manifest file.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Manifest file to scan (package.json or package-lock.json).
    pub path: PathBuf,

    /// Minimum severity to report (low, medium, high, critical).
    /// Overrides `scan.min_severity` from the configuration.
    #[arg(long)]
    pub min_severity: Option<String>,

    /// Only report curated rule matches (disable synthetic findings).
    #[arg(long)]
    pub no_fallback: bool,
}

// ---- rules ----

/// Inspect the vulnerability rule table.
#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub action: RulesAction,
}

#[derive(Subcommand, Debug)]
pub enum RulesAction {
    /// List the effective rules (built-in plus `scan.rules_path`).
    List {
        /// Only show rules for this package (case-insensitive).
        #[arg(long)]
        package: Option<String>,
    },
    /// Look up the finding for a single package identity.
    Check {
        /// Package name (e.g. lodash, @scope/pkg).
        name: String,
        /// Concrete package version (e.g. 4.17.20).
        version: String,
    },
}

// ---- config ----

/// Manage lockscope configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, scan).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_scan_defaults() {
        let cli = Cli::try_parse_from(["lockscope", "scan", "package.json"]).expect("should parse");
        assert_eq!(cli.config, PathBuf::from("lockscope.toml"));
        assert_eq!(cli.output, OutputFormat::Text);
        assert!(cli.log_level.is_none());
        match cli.command {
            Commands::Scan(scan_args) => {
                assert_eq!(scan_args.path, PathBuf::from("package.json"));
                assert!(scan_args.min_severity.is_none());
                assert!(!scan_args.no_fallback);
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_scan_options() {
        let cli = Cli::try_parse_from([
            "lockscope",
            "scan",
            "app/package-lock.json",
            "--min-severity",
            "high",
            "--no-fallback",
        ])
        .expect("should parse");
        match cli.command {
            Commands::Scan(scan_args) => {
                assert_eq!(scan_args.min_severity.as_deref(), Some("high"));
                assert!(scan_args.no_fallback);
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_scan_requires_path() {
        assert!(Cli::try_parse_from(["lockscope", "scan"]).is_err());
    }

    #[test]
    fn test_cli_parse_rules_list() {
        let cli = Cli::try_parse_from(["lockscope", "rules", "list"]).expect("should parse");
        match cli.command {
            Commands::Rules(rules_args) => match rules_args.action {
                RulesAction::List { package } => assert!(package.is_none()),
                _ => panic!("expected List action"),
            },
            _ => panic!("expected Rules command"),
        }
    }

    #[test]
    fn test_cli_parse_rules_list_with_package_filter() {
        let cli = Cli::try_parse_from(["lockscope", "rules", "list", "--package", "lodash"])
            .expect("should parse");
        match cli.command {
            Commands::Rules(rules_args) => match rules_args.action {
                RulesAction::List { package } => assert_eq!(package.as_deref(), Some("lodash")),
                _ => panic!("expected List action"),
            },
            _ => panic!("expected Rules command"),
        }
    }

    #[test]
    fn test_cli_parse_rules_check() {
        let cli = Cli::try_parse_from(["lockscope", "rules", "check", "@scope/pkg", "2.1.0"])
            .expect("should parse");
        match cli.command {
            Commands::Rules(rules_args) => match rules_args.action {
                RulesAction::Check { name, version } => {
                    assert_eq!(name, "@scope/pkg");
                    assert_eq!(version, "2.1.0");
                }
                _ => panic!("expected Check action"),
            },
            _ => panic!("expected Rules command"),
        }
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::try_parse_from(["lockscope", "config", "show", "--section", "scan"])
            .expect("should parse");
        match cli.command {
            Commands::Config(config_args) => match config_args.action {
                ConfigAction::Show { section } => assert_eq!(section.as_deref(), Some("scan")),
                _ => panic!("expected Show action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "lockscope",
            "config",
            "validate",
            "--output",
            "json",
            "--log-level",
            "debug",
            "-c",
            "/etc/lockscope.toml",
        ])
        .expect("should parse");
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, PathBuf::from("/etc/lockscope.toml"));
    }

    #[test]
    fn test_cli_parse_invalid_output_format_fails() {
        assert!(Cli::try_parse_from(["lockscope", "--output", "yaml", "rules", "list"]).is_err());
    }

    #[test]
    fn test_cli_parse_missing_command_fails() {
        assert!(Cli::try_parse_from(["lockscope"]).is_err());
    }

    #[test]
    fn test_cli_verify_command_structure() {
        Cli::command().debug_assert();

        let cmd = Cli::command();
        assert_eq!(cmd.get_name(), "lockscope");

        let subcommands: Vec<_> = cmd.get_subcommands().map(|s| s.get_name()).collect();
        assert_eq!(subcommands, vec!["scan", "rules", "config"]);
    }
}
