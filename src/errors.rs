//! 标准化错误处理
//!
//! 定义插件专用的错误类型

use thiserror::Error;

/// 插件主要错误类型
#[derive(Error, Debug)]
pub enum EchoError {
    /// 连接池创建失败或无法获取连接
    #[error("Connection error: {0}")]
    Connection(String),

    /// 语句执行时的驱动错误
    #[error("Storage error: {0}")]
    Storage(String),

    /// 该设备已经登记过位置
    #[error("Device already registered: model={model}, serial={serial}")]
    Conflict { model: String, serial: String },

    /// 该设备尚未登记
    #[error("Device not found: model={model}, serial={serial}")]
    NotFound { model: String, serial: String },

    /// 迁移脚本目录无法读取
    #[error("Migration error: {0}")]
    Migration(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 插件尚未初始化就收到了消息
    #[error("Plugin is not initialized")]
    NotInitialized,
}

impl EchoError {
    /// 是否为基础设施错误（连接、驱动）
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, EchoError::Connection(_) | EchoError::Storage(_))
    }
}

impl From<rusqlite::Error> for EchoError {
    fn from(err: rusqlite::Error) -> Self {
        EchoError::Storage(err.to_string())
    }
}

impl From<r2d2::Error> for EchoError {
    fn from(err: r2d2::Error) -> Self {
        EchoError::Connection(err.to_string())
    }
}

impl From<tokio::task::JoinError> for EchoError {
    fn from(err: tokio::task::JoinError) -> Self {
        EchoError::Storage(format!("Task failed: {}", err))
    }
}

impl From<anyhow::Error> for EchoError {
    fn from(err: anyhow::Error) -> Self {
        EchoError::Migration(format!("{:#}", err))
    }
}

impl From<serde_json::Error> for EchoError {
    fn from(err: serde_json::Error) -> Self {
        EchoError::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for EchoError {
    fn from(err: serde_yaml::Error) -> Self {
        EchoError::Config(err.to_string())
    }
}

/// 插件结果类型别名
pub type Result<T> = std::result::Result<T, EchoError>;
