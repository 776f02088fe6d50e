//! CLI 格式化输出
//!
//! 提供命令行友好的错误显示和结果摘要。

use symfix_api::{RemapOutput, SymfixError};
use tracing::error;

/// 打印错误（日志 + 终端）
///
/// `json` 为真时向 stdout 输出结构化报告，便于工具集成。
pub fn print_error(e: &SymfixError, json: bool) {
    let report = e.to_report();
    error!(target: "symfix::cli", kind = report.kind.as_str(), "{}", e);

    if json {
        match report.to_json() {
            Ok(text) => println!("{}", text),
            Err(_) => eprintln!("❌ {}", report),
        }
    } else {
        eprintln!("❌ {}", report);
    }
}

/// 打印重映射结果摘要
pub fn print_summary(output: &RemapOutput) {
    for line in summary_lines(output) {
        println!("{}", line);
    }
}

fn summary_lines(output: &RemapOutput) -> Vec<String> {
    let report = &output.report;
    let mut lines = vec![
        format!("Output: {}", output.output_path.display()),
        format!(
            "Entries: {} ({} classes, {} sidecars rewritten, {} copied)",
            report.entries, report.classes_rewritten, report.sidecars_rewritten, report.passthrough
        ),
        format!("Renames: {}", report.renames),
    ];
    if let Some(version) = &output.game_version {
        lines.push(format!("Game version: {}", version));
    }
    for entry in &report.failed_sidecars {
        lines.push(format!("⚠ Left unchanged: {}", entry));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use symfix_api::symfix_core::archive::ArchiveReport;
    use symfix_api::symfix_core::mapping::LoadStats;

    #[test]
    fn test_summary_lines() {
        let output = RemapOutput {
            output_path: PathBuf::from("mod.jar"),
            report: ArchiveReport {
                entries: 4,
                classes_rewritten: 1,
                sidecars_rewritten: 1,
                passthrough: 1,
                renames: 3,
                failed_sidecars: vec!["bad.accesswidener".to_string()],
            },
            mapping_stats: LoadStats::default(),
            game_version: Some("1.20.1".to_string()),
        };

        let lines = summary_lines(&output);
        assert_eq!(lines[0], "Output: mod.jar");
        assert_eq!(lines[1], "Entries: 4 (1 classes, 1 sidecars rewritten, 1 copied)");
        assert_eq!(lines[3], "Game version: 1.20.1");
        assert_eq!(lines[4], "⚠ Left unchanged: bad.accesswidener");
    }
}
