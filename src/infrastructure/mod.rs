//! 基础设施层：外部系统交互
//!
//! 提供 SQLite 存储、迁移脚本执行和日志

pub mod logger;
pub mod migration;
pub mod store;
