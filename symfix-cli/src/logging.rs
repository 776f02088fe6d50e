//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分阶段日志控制。

use std::fs::File;
use std::io;
use std::path::Path;

use symfix_api::Phase;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

use crate::config::LogConfig;

/// 日志输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "compact" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// 按阶段构造过滤器
pub fn targets(log_config: &LogConfig) -> Targets {
    Phase::ALL
        .iter()
        .fold(Targets::new().with_default(log_config.global), |targets, phase| {
            targets.with_target(phase.target(), log_config.level_for(*phase))
        })
}

/// 使用指定格式和日志配置初始化日志系统
///
/// 指定文件时日志同时追加写入该文件（不带颜色）。
pub fn init_with_file<P: AsRef<Path>>(
    log_config: &LogConfig,
    format: LogFormat,
    file: Option<P>,
) -> io::Result<()> {
    let targets = targets(log_config);
    let console = create_format_layer(format, io::stderr).with_filter(targets.clone());

    match file {
        Some(path) => {
            let handle = File::options().create(true).append(true).open(path)?;
            let file_layer = fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(handle))
                .with_filter(targets);
            tracing_subscriber::registry()
                .with(console)
                .with(file_layer)
                .init();
        }
        None => {
            tracing_subscriber::registry().with(console).init();
        }
    }
    Ok(())
}

/// Create formatter layer based on format
fn create_format_layer<W, F>(format: LogFormat, make_writer: F) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: io::Write + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(make_writer)
            .boxed(),
    }
}
