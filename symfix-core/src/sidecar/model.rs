//! 访问扩展文件模型

use std::fmt;

/// 访问级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Accessible,
    Extendable,
    Mutable,
}

impl AccessKind {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "accessible" => Some(AccessKind::Accessible),
            "extendable" => Some(AccessKind::Extendable),
            "mutable" => Some(AccessKind::Mutable),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessKind::Accessible => "accessible",
            AccessKind::Extendable => "extendable",
            AccessKind::Mutable => "mutable",
        }
    }
}

/// 被放宽访问的目标
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Class {
        name: String,
    },
    Method {
        owner: String,
        name: String,
        descriptor: String,
    },
    Field {
        owner: String,
        name: String,
        descriptor: String,
    },
}

impl Target {
    pub fn kind(&self) -> &'static str {
        match self {
            Target::Class { .. } => "class",
            Target::Method { .. } => "method",
            Target::Field { .. } => "field",
        }
    }

    /// 该目标种类是否允许此访问级别
    pub fn permits(kind: &str, access: AccessKind) -> bool {
        !matches!(
            (kind, access),
            ("class", AccessKind::Mutable)
                | ("method", AccessKind::Mutable)
                | ("field", AccessKind::Extendable)
        )
    }
}

/// 一条访问声明
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    pub access: AccessKind,
    /// `transitive-` 前缀（仅 v2）
    pub transitive: bool,
    pub target: Target,
}

/// 完整的访问扩展文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessWidener {
    /// 1 或 2
    pub version: u8,
    pub namespace: String,
    pub entries: Vec<Entry>,
}

impl AccessWidener {
    pub fn new(version: u8, namespace: &str) -> Self {
        Self {
            version,
            namespace: namespace.to_string(),
            entries: Vec::new(),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.transitive {
            f.write_str("transitive-")?;
        }
        write!(f, "{}\t{}", self.access.as_str(), self.target.kind())?;
        match &self.target {
            Target::Class { name } => write!(f, "\t{}", name),
            Target::Method {
                owner,
                name,
                descriptor,
            }
            | Target::Field {
                owner,
                name,
                descriptor,
            } => write!(f, "\t{}\t{}\t{}", owner, name, descriptor),
        }
    }
}
