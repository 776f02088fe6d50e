//! API 错误类型
//!
//! 提供统一的错误类型和结构化错误报告。

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use symfix_core::archive::ArchiveError;
use symfix_core::mapping::MappingError;

/// Symfix 错误类型
#[derive(Error, Debug)]
pub enum SymfixError {
    /// 输入参数不合法（路径、版本号等）
    #[error("Configuration error: {0}")]
    Config(String),

    /// 映射文件无法打开
    #[error("Mappings unavailable at {}: {source}", .path.display())]
    MappingsUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 映射文件读取 / 解析失败
    #[error("Mapping error in {}: {source}", .path.display())]
    Mapping {
        path: PathBuf,
        #[source]
        source: MappingError,
    },

    /// 归档改写失败（带条目名）
    #[error("{0}")]
    Archive(#[from] ArchiveError),

    /// 归档之外的文件操作失败
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 映射输入缺失或不可读；在改动归档之前中止
    Configuration,
    /// 类条目无法解码；整个事务中止
    StructuralParse,
    /// 读写失败；原归档保持不变
    Io,
    /// 访问扩展文件格式错误；仅影响该条目
    MalformedSidecar,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::StructuralParse => "structural-parse",
            ErrorKind::Io => "io",
            ErrorKind::MalformedSidecar => "malformed-sidecar",
        }
    }
}

impl SymfixError {
    /// 错误分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            SymfixError::Config(_)
            | SymfixError::MappingsUnavailable { .. }
            | SymfixError::Mapping { .. } => ErrorKind::Configuration,
            SymfixError::Archive(ArchiveError::Class { .. }) => ErrorKind::StructuralParse,
            SymfixError::Archive(ArchiveError::Sidecar { .. }) => ErrorKind::MalformedSidecar,
            SymfixError::Archive(_) | SymfixError::Io { .. } => ErrorKind::Io,
        }
    }

    /// 出错的归档条目名（如果有）
    pub fn entry(&self) -> Option<&str> {
        match self {
            SymfixError::Archive(e) => e.entry(),
            _ => None,
        }
    }

    /// 出错的行号（映射文件或访问扩展文件）
    pub fn line(&self) -> Option<usize> {
        match self {
            SymfixError::Mapping {
                source: MappingError::Io { line, .. } | MappingError::InvalidHeader { line },
                ..
            } => Some(*line),
            SymfixError::Archive(ArchiveError::Sidecar { source, .. }) => source.line(),
            _ => None,
        }
    }

    /// 转换为结构化错误报告
    ///
    /// CLI 可以直接打印，上层应用可以序列化为 JSON。
    pub fn to_report(&self) -> ErrorReport {
        let message = match self {
            SymfixError::Archive(ArchiveError::Class { source, .. }) => source.to_string(),
            SymfixError::Archive(ArchiveError::Sidecar { source, .. }) => source.to_string(),
            SymfixError::Mapping { source, .. } => source.to_string(),
            other => other.to_string(),
        };
        let path = match self {
            SymfixError::MappingsUnavailable { path, .. }
            | SymfixError::Mapping { path, .. }
            | SymfixError::Io { path, .. } => Some(path.display().to_string()),
            _ => None,
        };

        ErrorReport {
            kind: self.kind(),
            path,
            entry: self.entry().map(str::to_string),
            line: self.line(),
            message,
        }
    }
}

/// 结构化错误报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    /// 相关文件路径（如果有）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// 归档条目名（如果有）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    /// 行号（1-based，如果有）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// 人类可读的错误消息
    pub message: String,
}

impl std::fmt::Display for ErrorReport {
    /// 默认的 CLI 友好格式
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.kind.as_str())?;
        if let Some(path) = &self.path {
            write!(f, " {}", path)?;
        }
        if let Some(entry) = &self.entry {
            write!(f, " {}", entry)?;
        }
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        write!(f, " {}", self.message)
    }
}

impl ErrorReport {
    /// 转换为 JSON 格式（Web API 使用）
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// 简洁格式（适合终端）
    pub fn to_short(&self) -> String {
        format!("{}: {}", self.kind.as_str(), self.message)
    }
}
