//! 群星回响：设备存放位置登记插件
//!
//! 通过聊天命令查询、添加、更新设备的存放位置：
//! - 查询位置：`查询` / `cx` / `Query` + 型号 + 编号
//! - 添加位置：`添加位置` / `tjwz` / `add location` / `add loc` + 型号 + 编号 + 位置
//! - 更新位置：`更新位置` / `gxwz` / `update location` / `up loc` + 型号 + 编号 + 位置
//!
//! # 架构分层
//!
//! - `domain`: 领域实体（设备键、位置编码、命令、回复）
//! - `core`: 命令匹配、分发和存储抽象
//! - `infrastructure`: SQLite 存储、迁移脚本、日志
//! - `application`: 宿主调用的插件生命周期

// 领域层
pub mod domain;

// 核心层
pub mod core;

// 基础设施层
pub mod infrastructure;

// 应用层
pub mod application;

pub mod errors;

pub use crate::application::plugin::{ChatPlugin, LocationPlugin, ReplyStream};
pub use crate::core::config::PluginConfig;
pub use crate::core::dispatcher::Dispatcher;
pub use crate::core::matcher::CommandMatcher;
pub use crate::core::store::{LocationStore, MemoryLocationStore};
pub use crate::domain::{Command, DeviceKey, EquipmentLocation, InboundMessage, Intent, LocationCode, Reply};
pub use crate::errors::{EchoError, Result};
pub use crate::infrastructure::logger;
pub use crate::infrastructure::migration::{MigrationReport, MigrationRunner};
pub use crate::infrastructure::store::SqliteLocationStore;

/// 插件版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
