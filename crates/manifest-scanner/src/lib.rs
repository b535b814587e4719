#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`ManifestScannerError`)
//! - [`config`]: Scanner configuration (`ManifestScannerConfig`, builder)
//! - [`types`]: Domain types (`PackageRecord`, `ScannedPackage`, `ParseResult`, `ParseErrorCode`)
//! - [`version`]: npm range resolution (`NpmRange`, `resolve_minimum_version`, `coerce`)
//! - [`manifest`]: Document classification and package extraction (`classify`, `Classification`)
//! - [`dedupe`]: Identity-based record merging
//! - [`vuln`]: Vulnerability matching (`RuleTable`, `VulnMatcher`, deterministic fallback)
//! - [`intake`]: File size / extension policy and manifest reading (`IntakePolicy`)
//! - [`scanner`]: Parse orchestrator (`ManifestScanner`, `ManifestScannerBuilder`, `parse_manifest`)
//!
//! # Architecture
//!
//! ```text
//! IntakePolicy --> text --> serde_json --> classify --> extract --> dedupe
//!                                                                     |
//!                                                               VulnMatcher
//!                                                     (RuleTable, then fallback)
//!                                                                     |
//!                                                               ParseResult
//! ```

pub mod config;
pub mod dedupe;
pub mod error;
pub mod intake;
pub mod manifest;
pub mod scanner;
pub mod types;
pub mod version;
pub mod vuln;

// --- Public API Re-exports ---

// Orchestrator
pub use scanner::{ManifestScanner, ManifestScannerBuilder, parse_manifest};

// Configuration
pub use config::{ManifestScannerConfig, ManifestScannerConfigBuilder};

// Error
pub use error::ManifestScannerError;

// Intake
pub use intake::IntakePolicy;

// Types
pub use types::{
    DependencyType, PackageRecord, ParseErrorCode, ParseErrorInfo, ParseResult, ScannedPackage,
    SeverityCounts,
};

// Version
pub use version::{NpmRange, resolve_minimum_version};

// Vulnerability
pub use vuln::{RuleTable, VulnMatcher, VulnerabilityFinding, VulnerabilityRule};
