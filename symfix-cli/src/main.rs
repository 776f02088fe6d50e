//! Symfix CLI - Command line interface
//!
//! Remaps one archive; settings come from an optional `symfix.json`
//! project file, overridden by command-line flags.

use clap::Parser;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process;

mod config;
mod logging;
mod platform;

use crate::config::LogConfig;
use crate::logging::LogFormat;
use crate::platform::{print_error, print_summary};
use symfix_api::{
    init_config, remap, ArchiveConfig, LogLevel, Namespaces, RemapRequest, RewriteConfig,
    RunConfig, SidecarPolicy,
};
use tracing::info;

const DEFAULT_PROJECT_FILE: &str = "symfix.json";

/// symfix.json 结构
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ProjectFile {
    /// 待改写的归档
    archive: Option<PathBuf>,
    /// tiny 映射文件
    mappings: Option<PathBuf>,
    /// 输出路径（省略时原地改写）
    output: Option<PathBuf>,
    /// 映射版本号
    mappings_version: Option<String>,
    namespaces: Namespaces,
    entries: ArchiveConfig,
    rewrite: RewriteConfig,
    sidecar_policy: SidecarPolicy,
    /// 是否使用映射树作为访问扩展文件的委托
    tree_delegate: Option<bool>,
    log: LogSection,
}

/// 日志配置
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct LogSection {
    /// 日志级别: "silent", "error", "warn", "info", "debug", "trace"
    level: Option<String>,
    /// "pretty", "compact", "json"
    format: Option<String>,
    file: Option<PathBuf>,
    /// 按阶段覆盖，键为 mappings / class / sidecar / archive
    phases: HashMap<String, String>,
}

#[derive(Parser, Debug)]
#[command(
    name = "symfix",
    about = "Secondary symbol remapping for compiled-class archives",
    version = "0.1.0"
)]
struct Cli {
    /// Archive to remap (.jar or .zip)
    #[arg(value_name = "ARCHIVE")]
    archive: Option<PathBuf>,

    /// Tiny mapping file
    #[arg(short, long)]
    mappings: Option<PathBuf>,

    /// Write the result here instead of replacing the archive
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Mappings version, e.g. 1.20.1+build.10
    #[arg(long)]
    mappings_version: Option<String>,

    /// Project file path (default: ./symfix.json, optional)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Malformed sidecars: pass-through or abort
    #[arg(long)]
    sidecar_policy: Option<String>,

    /// Rewrite members on a single thread
    #[arg(long)]
    sequential: bool,

    /// Skip the tiny-tree stage of the sidecar rewrite
    #[arg(long)]
    no_tree_delegate: bool,

    #[arg(long)]
    log_level: Option<String>,

    #[arg(long)]
    log_format: Option<String>,

    /// Also append logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print errors as JSON reports on stdout
    #[arg(long)]
    json_errors: bool,
}

/// 合并后的运行设置
#[derive(Debug)]
struct Settings {
    request: RemapRequest,
    run: RunConfig,
    log: LogConfig,
    log_format: LogFormat,
    log_file: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let project = match read_project_file(cli.config.as_deref()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let settings = match build_settings(&cli, project) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = logging::init_with_file(&settings.log, settings.log_format, settings.log_file.as_ref()) {
        eprintln!("Error: cannot open log file: {}", e);
        process::exit(1);
    }

    // Initialize API config (global singleton for convenience)
    init_config(settings.run.clone());
    info!(target: "symfix::cli", config = ?settings.run, "starting");

    match remap(&settings.request) {
        Ok(output) => print_summary(&output),
        Err(e) => {
            print_error(&e, cli.json_errors);
            process::exit(1);
        }
    }
}

/// Read symfix.json; the default file is optional, an explicit one is not
fn read_project_file(explicit: Option<&Path>) -> Result<(ProjectFile, PathBuf), String> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PROJECT_FILE));

    if !path.exists() {
        if explicit.is_some() {
            return Err(format!("未找到配置文件 '{}'", path.display()));
        }
        return Ok((ProjectFile::default(), PathBuf::from(".")));
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("无法读取 '{}': {}", path.display(), e))?;
    let project = parse_project(&content)
        .map_err(|e| format!("解析 '{}' 失败: {}", path.display(), e))?;

    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();
    Ok((project, base_dir))
}

fn parse_project(content: &str) -> Result<ProjectFile, serde_json::Error> {
    serde_json::from_str(content)
}

/// Merge the project file with command-line flags (flags win)
fn build_settings(cli: &Cli, (project, base_dir): (ProjectFile, PathBuf)) -> Result<Settings, String> {
    // 项目文件中的相对路径以项目文件所在目录为基准
    let relative = |p: PathBuf| if p.is_relative() { base_dir.join(p) } else { p };

    let archive = cli
        .archive
        .clone()
        .or_else(|| project.archive.map(relative))
        .ok_or("no archive given (positional ARCHIVE or \"archive\" in symfix.json)")?;
    let mappings = cli
        .mappings
        .clone()
        .or_else(|| project.mappings.map(relative))
        .ok_or("no mapping file given (--mappings or \"mappings\" in symfix.json)")?;
    let output = cli.output.clone().or_else(|| project.output.map(relative));
    let mappings_version = cli.mappings_version.clone().or(project.mappings_version);

    let sidecar_policy = match &cli.sidecar_policy {
        Some(s) => parse_sidecar_policy(s).ok_or_else(|| format!("unknown sidecar policy '{}'", s))?,
        None => project.sidecar_policy,
    };

    let mut rewrite = project.rewrite;
    if cli.sequential {
        rewrite.parallel = false;
    }

    let run = RunConfig {
        namespaces: project.namespaces,
        archive: project.entries,
        rewrite,
        sidecar_policy,
        use_tree_delegate: !cli.no_tree_delegate && project.tree_delegate.unwrap_or(true),
    };

    let level_name = cli.log_level.as_deref().or(project.log.level.as_deref());
    let global = match level_name {
        Some(s) => LogLevel::parse(s).ok_or_else(|| format!("unknown log level '{}'", s))?,
        None => LogLevel::default(),
    };
    let mut phases = HashMap::new();
    for (phase, level) in &project.log.phases {
        let parsed = LogLevel::parse(level)
            .ok_or_else(|| format!("unknown log level '{}' for phase '{}'", level, phase))?;
        phases.insert(phase.clone(), parsed);
    }

    let format_name = cli.log_format.as_deref().or(project.log.format.as_deref());
    let log_format = match format_name {
        Some(s) => LogFormat::parse(s).ok_or_else(|| format!("unknown log format '{}'", s))?,
        None => LogFormat::Compact,
    };

    let mut request = RemapRequest::new(archive, mappings);
    request.output = output;
    request.mappings_version = mappings_version;

    Ok(Settings {
        request,
        run,
        log: LogConfig::from_levels(global, &phases),
        log_format,
        log_file: cli.log_file.clone().or_else(|| project.log.file.map(relative)),
    })
}

fn parse_sidecar_policy(s: &str) -> Option<SidecarPolicy> {
    match s.to_lowercase().as_str() {
        "pass-through" | "pass_through" | "passthrough" => Some(SidecarPolicy::PassThrough),
        "abort" => Some(SidecarPolicy::Abort),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("symfix").chain(args.iter().copied())).unwrap()
    }

    fn no_project() -> (ProjectFile, PathBuf) {
        (ProjectFile::default(), PathBuf::from("."))
    }

    #[test]
    fn test_flags_only() {
        let settings = build_settings(
            &cli(&["mod.jar", "-m", "yarn.tiny", "--sequential", "--sidecar-policy", "abort"]),
            no_project(),
        )
        .unwrap();

        assert_eq!(settings.request.input, PathBuf::from("mod.jar"));
        assert_eq!(settings.request.mappings, PathBuf::from("yarn.tiny"));
        assert_eq!(settings.request.output, None);
        assert!(!settings.run.rewrite.parallel);
        assert_eq!(settings.run.sidecar_policy, SidecarPolicy::Abort);
        assert!(settings.run.use_tree_delegate);
        assert_eq!(settings.log_format, LogFormat::Compact);
    }

    #[test]
    fn test_project_file_with_overrides() {
        let project = parse_project(
            r#"{
                "archive": "build/mod.zip",
                "mappings": "mappings/yarn.tiny",
                "mappings_version": "1.20.1+build.10",
                "sidecar_policy": "abort",
                "tree_delegate": false,
                "entries": { "sidecar_suffix": ".aw" },
                "log": { "level": "warn", "format": "json", "phases": { "class": "trace" } }
            }"#,
        )
        .unwrap();

        let settings = build_settings(
            &cli(&["--sidecar-policy", "pass-through", "-o", "out.jar"]),
            (project, PathBuf::from("proj")),
        )
        .unwrap();

        assert_eq!(settings.request.input, PathBuf::from("proj/build/mod.zip"));
        assert_eq!(settings.request.mappings, PathBuf::from("proj/mappings/yarn.tiny"));
        assert_eq!(settings.request.output, Some(PathBuf::from("out.jar")));
        assert_eq!(settings.request.mappings_version.as_deref(), Some("1.20.1+build.10"));
        assert_eq!(settings.run.sidecar_policy, SidecarPolicy::PassThrough);
        assert!(!settings.run.use_tree_delegate);
        assert_eq!(settings.run.archive.sidecar_suffix, ".aw");
        assert_eq!(settings.run.archive.class_suffix, ".class");
        assert_eq!(settings.log.global, Level::WARN);
        assert_eq!(settings.log.class, Some(Level::TRACE));
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_missing_inputs() {
        let err = build_settings(&cli(&["-m", "yarn.tiny"]), no_project()).unwrap_err();
        assert!(err.contains("no archive"));

        let err = build_settings(&cli(&["mod.jar"]), no_project()).unwrap_err();
        assert!(err.contains("no mapping file"));
    }

    #[test]
    fn test_invalid_values() {
        let err = build_settings(&cli(&["a.jar", "-m", "m", "--log-level", "loud"]), no_project())
            .unwrap_err();
        assert!(err.contains("loud"));

        let err = build_settings(
            &cli(&["a.jar", "-m", "m", "--sidecar-policy", "ignore"]),
            no_project(),
        )
        .unwrap_err();
        assert!(err.contains("ignore"));
    }

    #[test]
    fn test_explicit_project_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("symfix.json");
        assert!(read_project_file(Some(&missing)).is_err());
    }

    #[test]
    fn test_read_project_file_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symfix.json");
        std::fs::write(&path, r#"{ "archive": "mod.jar" }"#).unwrap();

        let (project, base) = read_project_file(Some(&path)).unwrap();
        assert_eq!(project.archive, Some(PathBuf::from("mod.jar")));
        assert_eq!(base, dir.path());
    }
}
