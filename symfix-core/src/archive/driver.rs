//! 归档流式改写
//!
//! 按存储顺序逐个处理条目：
//! - `.class` -> 类文件改写
//! - `.accesswidener` -> 访问扩展文件改写
//! - 其他条目（含目录）原样拷贝压缩数据，字节不变
//!
//! 条目名保持不变，输出顺序与输入一致。

use std::io::{self, Read, Seek, Write};

use symfix_config::{ArchiveConfig, Namespaces, RewriteConfig, SidecarPolicy};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::classfile::{rewrite_class, ClassError};
use crate::mapping::{NamespaceRemapper, RenameDictionary};
use crate::sidecar::{rewrite_sidecar, SidecarError};

/// 条目分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Class,
    Sidecar,
    Passthrough,
}

impl EntryKind {
    pub fn classify(name: &str, config: &ArchiveConfig) -> Self {
        if name.ends_with('/') {
            EntryKind::Passthrough
        } else if name.ends_with(&config.class_suffix) {
            EntryKind::Class
        } else if name.ends_with(&config.sidecar_suffix) {
            EntryKind::Sidecar
        } else {
            EntryKind::Passthrough
        }
    }
}

/// 一次归档改写所需的全部只读输入
#[derive(Clone, Copy)]
pub struct RemapContext<'a> {
    pub dictionary: &'a RenameDictionary,
    pub delegate: &'a dyn NamespaceRemapper,
    pub namespaces: &'a Namespaces,
    pub archive: &'a ArchiveConfig,
    pub rewrite: &'a RewriteConfig,
    pub sidecar_policy: SidecarPolicy,
}

/// 归档改写统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    pub entries: usize,
    pub classes_rewritten: usize,
    pub sidecars_rewritten: usize,
    pub passthrough: usize,
    /// 类文件中应用的改名数 + 访问扩展文件中的替换数
    pub renames: usize,
    /// 解析失败后原样保留的访问扩展文件
    pub failed_sidecars: Vec<String>,
}

/// 归档错误（带条目名）
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("class entry '{entry}': {source}")]
    Class {
        entry: String,
        #[source]
        source: ClassError,
    },

    #[error("sidecar entry '{entry}': {source}")]
    Sidecar {
        entry: String,
        #[source]
        source: SidecarError,
    },

    #[error("I/O error at {}: {source}", .entry.as_deref().unwrap_or("archive"))]
    Io {
        entry: Option<String>,
        #[source]
        source: io::Error,
    },

    #[error("zip error at {}: {source}", .entry.as_deref().unwrap_or("archive"))]
    Zip {
        entry: Option<String>,
        #[source]
        source: ZipError,
    },
}

impl ArchiveError {
    /// 出错条目名（归档级错误为 `None`）
    pub fn entry(&self) -> Option<&str> {
        match self {
            ArchiveError::Class { entry, .. } | ArchiveError::Sidecar { entry, .. } => Some(entry),
            ArchiveError::Io { entry, .. } | ArchiveError::Zip { entry, .. } => entry.as_deref(),
        }
    }

    pub(crate) fn io(entry: Option<&str>, source: io::Error) -> Self {
        ArchiveError::Io {
            entry: entry.map(str::to_string),
            source,
        }
    }

    pub(crate) fn zip(entry: Option<&str>, source: ZipError) -> Self {
        ArchiveError::Zip {
            entry: entry.map(str::to_string),
            source,
        }
    }
}

/// 把 `source` 归档改写到 `sink`，返回写完的 sink
///
/// 出错时 sink 中的内容不完整，调用方负责丢弃。
#[instrument(target = "symfix::archive", skip_all)]
pub fn rewrite_archive<R, W>(
    source: R,
    sink: W,
    ctx: &RemapContext<'_>,
) -> Result<(W, ArchiveReport), ArchiveError>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let mut input = ZipArchive::new(source).map_err(|e| ArchiveError::zip(None, e))?;
    let mut output = ZipWriter::new(sink);
    let mut report = ArchiveReport::default();

    for index in 0..input.len() {
        let name = input
            .by_index_raw(index)
            .map_err(|e| ArchiveError::zip(None, e))?
            .name()
            .to_string();
        let kind = EntryKind::classify(&name, ctx.archive);
        report.entries += 1;
        debug!(target: "symfix::archive", entry = %name, ?kind, "processing entry");

        match kind {
            EntryKind::Passthrough => {
                copy_raw(&mut input, &mut output, index, &name)?;
                report.passthrough += 1;
            }
            EntryKind::Class => {
                let (data, meta) = read_entry(&mut input, index, &name)?;
                let rewrite = rewrite_class(&data, ctx.dictionary, ctx.rewrite).map_err(|source| {
                    ArchiveError::Class {
                        entry: name.clone(),
                        source,
                    }
                })?;
                if rewrite.is_changed() {
                    write_entry(&mut output, &name, &meta, &rewrite.bytes)?;
                    report.classes_rewritten += 1;
                    report.renames += rewrite.renames.len();
                } else {
                    copy_raw(&mut input, &mut output, index, &name)?;
                }
            }
            EntryKind::Sidecar => {
                let (data, meta) = read_entry(&mut input, index, &name)?;
                match rewrite_sidecar(&data, ctx.delegate, ctx.namespaces, ctx.dictionary) {
                    Ok(rewrite) => {
                        write_entry(&mut output, &name, &meta, &rewrite.bytes)?;
                        report.sidecars_rewritten += 1;
                        report.renames += rewrite.remapped_entries + rewrite.substitutions.len();
                    }
                    Err(source) if ctx.sidecar_policy == SidecarPolicy::Abort => {
                        return Err(ArchiveError::Sidecar {
                            entry: name,
                            source,
                        });
                    }
                    Err(source) => {
                        warn!(
                            target: "symfix::sidecar",
                            entry = %name,
                            "Malformed sidecar passed through unchanged: {}",
                            source
                        );
                        copy_raw(&mut input, &mut output, index, &name)?;
                        report.passthrough += 1;
                        report.failed_sidecars.push(name);
                    }
                }
            }
        }
    }

    let sink = output.finish().map_err(|e| ArchiveError::zip(None, e))?;

    info!(
        target: "symfix::archive",
        entries = report.entries,
        classes = report.classes_rewritten,
        sidecars = report.sidecars_rewritten,
        renames = report.renames,
        "Archive rewritten"
    );
    Ok((sink, report))
}

/// 改写条目沿用的源条目元数据
struct EntryMeta {
    method: CompressionMethod,
    modified: Option<DateTime>,
}

/// 解压读取条目内容（校验 CRC）
fn read_entry<R: Read + Seek>(
    input: &mut ZipArchive<R>,
    index: usize,
    name: &str,
) -> Result<(Vec<u8>, EntryMeta), ArchiveError> {
    let mut entry = input
        .by_index(index)
        .map_err(|e| ArchiveError::zip(Some(name), e))?;
    let meta = EntryMeta {
        method: entry.compression(),
        modified: entry.last_modified(),
    };
    let mut data = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut data)
        .map_err(|e| ArchiveError::io(Some(name), e))?;
    Ok((data, meta))
}

fn write_entry<W: Write + Seek>(
    output: &mut ZipWriter<W>,
    name: &str,
    meta: &EntryMeta,
    data: &[u8],
) -> Result<(), ArchiveError> {
    let method = match meta.method {
        CompressionMethod::Stored => CompressionMethod::Stored,
        _ => CompressionMethod::Deflated,
    };
    let mut options = SimpleFileOptions::default().compression_method(method);
    if let Some(modified) = meta.modified {
        options = options.last_modified_time(modified);
    }
    output
        .start_file(name, options)
        .map_err(|e| ArchiveError::zip(Some(name), e))?;
    output
        .write_all(data)
        .map_err(|e| ArchiveError::io(Some(name), e))
}

/// 不解压地拷贝条目
fn copy_raw<R: Read + Seek, W: Write + Seek>(
    input: &mut ZipArchive<R>,
    output: &mut ZipWriter<W>,
    index: usize,
    name: &str,
) -> Result<(), ArchiveError> {
    let entry = input
        .by_index_raw(index)
        .map_err(|e| ArchiveError::zip(Some(name), e))?;
    output
        .raw_copy_file(entry)
        .map_err(|e| ArchiveError::zip(Some(name), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let config = ArchiveConfig::default();
        assert_eq!(EntryKind::classify("pkg/A.class", &config), EntryKind::Class);
        assert_eq!(
            EntryKind::classify("mod.accesswidener", &config),
            EntryKind::Sidecar
        );
        assert_eq!(
            EntryKind::classify("META-INF/MANIFEST.MF", &config),
            EntryKind::Passthrough
        );
        assert_eq!(EntryKind::classify("pkg.class/", &config), EntryKind::Passthrough);
    }

    #[test]
    fn test_error_entry() {
        let err = ArchiveError::io(None, io::Error::new(io::ErrorKind::Other, "disk full"));
        assert_eq!(err.entry(), None);
        assert_eq!(err.to_string(), "I/O error at archive: disk full");

        let err = ArchiveError::Class {
            entry: "pkg/A.class".to_string(),
            source: ClassError::MissingBootstrapMethods,
        };
        assert_eq!(err.entry(), Some("pkg/A.class"));
    }
}
