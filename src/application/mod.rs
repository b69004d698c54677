//! 应用层：插件生命周期编排

pub mod plugin;
