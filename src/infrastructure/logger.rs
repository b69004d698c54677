//! 日志模块
//!
//! 宿主未安装 tracing 订阅者时，由插件安装默认订阅者

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化日志系统
///
/// 已经存在全局订阅者时会 panic，宿主不确定时使用 [`try_init`]
pub fn init() {
    tracing_subscriber::registry()
        .with(filter())
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// 尝试初始化日志系统，已存在全局订阅者时返回 false
pub fn try_init() -> bool {
    tracing_subscriber::registry()
        .with(filter())
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
