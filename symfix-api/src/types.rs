//! API 类型定义
//!
//! 重映射请求与结果。

use std::path::PathBuf;

use symfix_core::archive::ArchiveReport;
use symfix_core::mapping::LoadStats;

/// 一次重映射请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemapRequest {
    /// 输入归档（`.jar` / `.zip`）
    pub input: PathBuf,
    /// 输出路径；为空时原地改写
    pub output: Option<PathBuf>,
    /// tiny 映射文件
    pub mappings: PathBuf,
    /// 映射版本号，例如 `1.20.1+build.10`（仅校验格式）
    pub mappings_version: Option<String>,
}

impl RemapRequest {
    pub fn new(input: impl Into<PathBuf>, mappings: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
            mappings: mappings.into(),
            mappings_version: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_mappings_version(mut self, version: impl Into<String>) -> Self {
        self.mappings_version = Some(version.into());
        self
    }
}

/// 重映射输出
#[derive(Debug, Clone)]
pub struct RemapOutput {
    /// 实际写入的归档路径
    pub output_path: PathBuf,
    /// 归档改写统计
    pub report: ArchiveReport,
    /// 映射加载统计
    pub mapping_stats: LoadStats,
    /// `fabric.mod.json` 中声明的游戏版本（如果有）
    pub game_version: Option<String>,
}
