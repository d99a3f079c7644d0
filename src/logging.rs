//! 日志初始化

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::env::{core::LogLevel, core::NoColor, EnvVar};

/// 安装全局 subscriber；日志写到 stderr，stdout 留给输出文档
///
/// 重复调用不会报错。
pub fn init_logging() {
    let level = LogLevel::get().unwrap_or_else(|e| {
        eprintln!("{}，使用默认日志级别 info", e);
        "info".to_string()
    });
    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));
    let ansi = !NoColor::get().unwrap_or(false);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(ansi)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
