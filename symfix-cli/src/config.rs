//! CLI 配置
//!
//! 包含 CLI 特有的配置：日志配置和运行配置的组合

use std::collections::HashMap;

use symfix_api::{LogLevel, Phase};
use tracing::Level;

/// CLI 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub mappings: Option<Level>,
    pub class: Option<Level>,
    pub sidecar: Option<Level>,
    pub archive: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::INFO,
            mappings: None,
            class: None,
            sidecar: None,
            archive: None,
        }
    }
}

impl LogConfig {
    /// 由全局级别和按阶段覆盖（键为阶段名，如 `class`）构造
    pub fn from_levels(global: LogLevel, phases: &HashMap<String, LogLevel>) -> Self {
        let phase = |p: Phase| phases.get(p.as_str()).copied().map(to_tracing_level);
        Self {
            global: to_tracing_level(global),
            mappings: phase(Phase::Mappings),
            class: phase(Phase::Class),
            sidecar: phase(Phase::Sidecar),
            archive: phase(Phase::Archive),
        }
    }

    /// Get log level for a specific phase
    pub fn level_for(&self, phase: Phase) -> Level {
        let level = match phase {
            Phase::Mappings => self.mappings,
            Phase::Class => self.class,
            Phase::Sidecar => self.sidecar,
            Phase::Archive => self.archive,
            Phase::Cli => None,
        };
        level.unwrap_or(self.global)
    }
}

pub fn to_tracing_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}
