//! 原地改写归档文件
//!
//! 先写入同目录下的临时文件（`<path><temp_suffix>`），全部条目成功后
//! 用 rename 覆盖原文件；任何失败都会删除临时文件，原文件保持不变。

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use tracing::{error, info, instrument};

use super::driver::{rewrite_archive, ArchiveError, ArchiveReport, RemapContext};

/// 临时文件路径：原路径后直接拼接后缀
pub fn temp_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// 原地改写 `path` 处的归档
#[instrument(target = "symfix::archive", skip_all, fields(path = %path.display()))]
pub fn commit_in_place(path: &Path, ctx: &RemapContext<'_>) -> Result<ArchiveReport, ArchiveError> {
    let temp = temp_path(path, &ctx.archive.temp_suffix);

    match rewrite_to(path, &temp, ctx) {
        Ok(report) => {
            if let Err(source) = fs::rename(&temp, path) {
                let _ = fs::remove_file(&temp);
                return Err(ArchiveError::io(None, source));
            }
            info!(target: "symfix::archive", "Replaced {}", path.display());
            Ok(report)
        }
        Err(err) => {
            let _ = fs::remove_file(&temp);
            error!(
                target: "symfix::archive",
                "Rewrite of {} aborted, original left untouched: {}",
                path.display(),
                err
            );
            Err(err)
        }
    }
}

fn rewrite_to(path: &Path, temp: &Path, ctx: &RemapContext<'_>) -> Result<ArchiveReport, ArchiveError> {
    let source = File::open(path).map_err(|e| ArchiveError::io(None, e))?;
    let sink = File::create(temp).map_err(|e| ArchiveError::io(None, e))?;

    let (sink, report) = rewrite_archive(BufReader::new(source), BufWriter::new(sink), ctx)?;
    let file = sink
        .into_inner()
        .map_err(|e| ArchiveError::io(None, e.into_error()))?;
    file.sync_all().map_err(|e| ArchiveError::io(None, e))?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path() {
        assert_eq!(
            temp_path(Path::new("/mods/example.jar"), "_temp"),
            PathBuf::from("/mods/example.jar_temp")
        );
    }
}
