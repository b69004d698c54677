//! 核心层：命令匹配、分发和存储抽象

pub mod config;
pub mod dispatcher;
pub mod matcher;
pub mod store;
