//! 访问扩展文件解析错误
//!
//! 所有错误都只影响当前条目；是否中止整个归档由调用方的策略决定。

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SidecarError {
    #[error("sidecar is not valid UTF-8")]
    InvalidUtf8,

    #[error("sidecar is empty, expected an accessWidener header")]
    MissingHeader,

    #[error("invalid header '{header}', expected 'accessWidener <version> <namespace>'")]
    BadHeader { header: String },

    #[error("unsupported access widener version '{version}'")]
    UnsupportedVersion { version: String },

    #[error("namespace '{found}' does not match expected namespace '{expected}'")]
    NamespaceMismatch { expected: String, found: String },

    #[error("line {line}: unknown access '{token}'")]
    UnknownAccess { line: usize, token: String },

    #[error("line {line}: unknown target kind '{token}'")]
    UnknownKind { line: usize, token: String },

    #[error("line {line}: expected {expected} tokens for {kind}, found {found}")]
    TokenCount {
        line: usize,
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: {kind} cannot be made {access}")]
    IllegalAccess {
        line: usize,
        kind: &'static str,
        access: &'static str,
    },

    #[error("line {line}: transitive access requires v2")]
    TransitiveRequiresV2 { line: usize },

    #[error("line {line}: class name '{name}' must use '/' separators")]
    DottedClassName { line: usize, name: String },
}

impl SidecarError {
    /// 出错的行号（文件头错误为 1）
    pub fn line(&self) -> Option<usize> {
        match self {
            SidecarError::InvalidUtf8 => None,
            SidecarError::MissingHeader
            | SidecarError::BadHeader { .. }
            | SidecarError::UnsupportedVersion { .. }
            | SidecarError::NamespaceMismatch { .. } => Some(1),
            SidecarError::UnknownAccess { line, .. }
            | SidecarError::UnknownKind { line, .. }
            | SidecarError::TokenCount { line, .. }
            | SidecarError::IllegalAccess { line, .. }
            | SidecarError::TransitiveRequiresV2 { line }
            | SidecarError::DottedClassName { line, .. } => Some(*line),
        }
    }
}
