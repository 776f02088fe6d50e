//! 映射表加载器
//!
//! 把按行组织的映射文件（tiny 格式）折叠成 [`RenameDictionary`]。
//!
//! 每行按空白切分为字段 `kind class from to ...`，满足以下任一条件的行被排除：
//! - kind 以 `c` 开头（类 / 注释行）或以 `p` 开头（参数行）
//! - 目标名以 `<` 开头（构造器 / 初始化器）
//! - from 与 to 相同
//!
//! 字段不足 4 个的行视为格式错误，跳过并记录 debug 日志，不作为错误上报。

use std::io::BufRead;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::dictionary::RenameDictionary;

/// 映射加载错误
#[derive(Debug, Error)]
pub enum MappingError {
    /// 读取输入流失败
    #[error("failed to read mapping line {line}: {source}")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    /// 层级映射文件头无法识别
    #[error("invalid mapping header at line {line}")]
    InvalidHeader { line: usize },

    /// 映射文件中不存在请求的命名空间
    #[error("namespace '{namespace}' not present in mappings")]
    UnknownNamespace { namespace: String },
}

/// 文件头（`tiny 2 0 intermediary named`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingHeader {
    /// 格式标记，例如 `tiny` 或 `v1`
    pub format: String,
    /// 主版本号（v1 头为 1）
    pub major: u32,
    /// 次版本号
    pub minor: u32,
    /// 命名空间列表
    pub namespaces: Vec<String>,
}

/// 单行记录（仅加载期存在）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRecord<'a> {
    pub fields: Vec<&'a str>,
}

/// 记录被排除的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// 字段少于 4 个
    TooFewFields,
    /// 类 / 注释行
    ClassKind,
    /// 参数行
    ParameterKind,
    /// 目标是 `<init>` / `<clinit>`
    ConstructorTarget,
    /// from == to
    SelfMapping,
}

/// 加载统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// 读取的行数
    pub lines: usize,
    /// 写入字典的记录数（含覆盖）
    pub inserted: usize,
    /// 覆盖已有键的次数
    pub overwritten: usize,
    /// 被过滤规则排除的记录数
    pub excluded: usize,
    /// 字段不足被跳过的行数
    pub malformed: usize,
}

/// 加载结果
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub dictionary: RenameDictionary,
    pub header: Option<MappingHeader>,
    pub stats: LoadStats,
}

impl<'a> MappingRecord<'a> {
    /// 切分一行：连续空白视为一个分隔符
    pub fn parse(line: &'a str) -> Self {
        let fields = line
            .split(|c: char| matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r'))
            .filter(|field| !field.is_empty())
            .collect();
        Self { fields }
    }

    pub fn kind(&self) -> Option<&'a str> {
        self.fields.first().copied()
    }

    pub fn from_name(&self) -> Option<&'a str> {
        self.fields.get(2).copied()
    }

    pub fn to_name(&self) -> Option<&'a str> {
        self.fields.get(3).copied()
    }

    /// 应用过滤规则，返回可写入字典的 `(from, to)`
    pub fn rename(&self) -> Result<(&'a str, &'a str), Exclusion> {
        if self.fields.len() < 4 {
            return Err(Exclusion::TooFewFields);
        }

        let kind = self.fields[0];
        let from = self.fields[2];
        let to = self.fields[3];

        if kind.starts_with('c') {
            Err(Exclusion::ClassKind)
        } else if kind.starts_with('p') {
            Err(Exclusion::ParameterKind)
        } else if to.starts_with('<') {
            Err(Exclusion::ConstructorTarget)
        } else if from == to {
            Err(Exclusion::SelfMapping)
        } else {
            Ok((from, to))
        }
    }
}

impl MappingHeader {
    /// 尝试把首行解析为文件头
    pub fn parse(record: &MappingRecord<'_>) -> Option<Self> {
        match record.fields.as_slice() {
            ["tiny", major, minor, namespaces @ ..] => Some(Self {
                format: "tiny".to_string(),
                major: major.parse().ok()?,
                minor: minor.parse().ok()?,
                namespaces: namespaces.iter().map(|ns| ns.to_string()).collect(),
            }),
            ["v1", namespaces @ ..] => Some(Self {
                format: "v1".to_string(),
                major: 1,
                minor: 0,
                namespaces: namespaces.iter().map(|ns| ns.to_string()).collect(),
            }),
            _ => None,
        }
    }

    /// 头中声明的前两个命名空间（映射方向）
    pub fn direction(&self) -> Option<(&str, &str)> {
        match self.namespaces.as_slice() {
            [from, to, ..] => Some((from.as_str(), to.as_str())),
            _ => None,
        }
    }
}

/// 从行流加载重命名字典
///
/// 读取失败时整体失败，不返回部分字典。
#[instrument(target = "symfix::mappings", skip(reader))]
pub fn load_dictionary<R: BufRead>(reader: R) -> Result<LoadOutcome, MappingError> {
    let mut dictionary = RenameDictionary::new();
    let mut header = None;
    let mut stats = LoadStats::default();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|source| MappingError::Io {
            line: line_no,
            source,
        })?;
        stats.lines += 1;

        let record = MappingRecord::parse(&line);
        if record.fields.is_empty() {
            continue;
        }

        if idx == 0 {
            if let Some(parsed) = MappingHeader::parse(&record) {
                debug!(
                    target: "symfix::mappings",
                    format = %parsed.format,
                    namespaces = ?parsed.namespaces,
                    "mapping header"
                );
                header = Some(parsed);
                continue;
            }
        }

        match record.rename() {
            Ok((from, to)) => {
                stats.inserted += 1;
                if let Some(previous) = dictionary.insert(from, to) {
                    stats.overwritten += 1;
                    debug!(
                        target: "symfix::mappings",
                        line = line_no,
                        "overwriting {} -> {} with {}",
                        from,
                        previous,
                        to
                    );
                }
            }
            Err(Exclusion::TooFewFields) => {
                stats.malformed += 1;
                debug!(
                    target: "symfix::mappings",
                    line = line_no,
                    fields = record.fields.len(),
                    "skipping malformed mapping line"
                );
            }
            Err(_) => stats.excluded += 1,
        }
    }

    info!(
        target: "symfix::mappings",
        entries = dictionary.len(),
        malformed = stats.malformed,
        excluded = stats.excluded,
        "Loaded rename dictionary"
    );

    Ok(LoadOutcome {
        dictionary,
        header,
        stats,
    })
}

/// 校验文件头的映射方向，不一致时只告警
pub fn check_direction(header: Option<&MappingHeader>, from: &str, to: &str) -> bool {
    let Some((declared_from, declared_to)) = header.and_then(MappingHeader::direction) else {
        return true;
    };

    if declared_from != from || declared_to != to {
        warn!(
            target: "symfix::mappings",
            "mapping header declares {} -> {}, expected {} -> {}",
            declared_from,
            declared_to,
            from,
            to
        );
        return false;
    }
    true
}
