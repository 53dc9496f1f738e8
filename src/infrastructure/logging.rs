//! 日志系统配置模块
//! 日志输出到 stderr，stdout 只留给命令结果

use anyhow::{Context, Result};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::config::LoggingConfig;

/// 构建日志级别过滤器（RUST_LOG 优先）
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// 初始化日志系统
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config);

    // 根据配置选择日志格式
    if config.format == "json" {
        Registry::default()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_timer(ChronoUtc::rfc_3339()),
            )
            .try_init()
            .context("Failed to initialize JSON logging")?;
    } else {
        Registry::default()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false),
            )
            .try_init()
            .context("Failed to initialize text logging")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_uses_configured_level() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: "json".to_string(),
        };

        // 未设置 RUST_LOG 时回落到配置级别
        if std::env::var("RUST_LOG").is_err() {
            assert_eq!(
                build_filter(&config).max_level_hint(),
                Some(tracing_subscriber::filter::LevelFilter::DEBUG)
            );
        }
    }
}
