//! Symfix Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Symfix crates.

use serde::Deserialize;

/// Mapping namespaces used by the delegate rename and the sidecar header
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Namespaces {
    /// Namespace the archive is currently expressed in
    pub from: String,
    /// Namespace the archive is renamed into
    pub to: String,
}

/// Configuration for archive entry classification and commit
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Suffix of compiled-class entries
    pub class_suffix: String,
    /// Suffix of access-widener sidecar entries
    pub sidecar_suffix: String,
    /// Suffix appended to the archive path for the temporary sibling
    pub temp_suffix: String,
}

/// Configuration for the class rewriter
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Plan field, method and instruction renames on the rayon pool
    pub parallel: bool,
}

/// What to do with a sidecar entry that fails to parse
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SidecarPolicy {
    /// Copy the entry unchanged and record a diagnostic
    PassThrough,
    /// Abort the whole archive transaction
    Abort,
}

/// Log verbosity shared by the CLI and the project file
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Execution phase enum for phase-specific log targets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Mappings,
    Class,
    Sidecar,
    Archive,
    Cli,
}

impl Phase {
    /// All phases, in pipeline order
    pub const ALL: [Phase; 5] = [
        Phase::Mappings,
        Phase::Class,
        Phase::Sidecar,
        Phase::Archive,
        Phase::Cli,
    ];

    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Mappings => "mappings",
            Phase::Class => "class",
            Phase::Sidecar => "sidecar",
            Phase::Archive => "archive",
            Phase::Cli => "cli",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("symfix::{}", self.as_str())
    }
}

impl LogLevel {
    /// Parse a level name; "silent" is treated as errors only
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "silent" | "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

impl Default for Namespaces {
    fn default() -> Self {
        Self {
            from: "intermediary".to_string(),
            to: "named".to_string(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            class_suffix: ".class".to_string(),
            sidecar_suffix: ".accesswidener".to_string(),
            temp_suffix: "_temp".to_string(),
        }
    }
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl Default for SidecarPolicy {
    fn default() -> Self {
        SidecarPolicy::PassThrough
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}
