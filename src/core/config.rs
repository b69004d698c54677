//! 配置管理
//!
//! 宿主以键值对象的形式下发插件配置，这里负责反序列化和校验

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{EchoError, Result};

/// 插件配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// 数据库主机（嵌入式后端仅用于日志）
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    /// 数据库文件路径，未配置时使用进程内的共享内存库
    pub database: Option<String>,
    pub autocommit: bool,
    /// 连接池保持的最少空闲连接
    pub minsize: u32,
    /// 连接池最大连接数
    pub maxsize: u32,
    /// 启动时执行的 SQL 脚本目录
    pub sql_folder: Option<PathBuf>,
    /// 获取连接的超时时间（秒）
    pub connect_timeout_secs: u64,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3306,
            user: None,
            password: None,
            database: None,
            autocommit: true,
            minsize: 1,
            maxsize: 100,
            sql_folder: None,
            connect_timeout_secs: 30,
        }
    }
}

impl PluginConfig {
    /// 从 YAML 文本加载
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从宿主下发的 JSON 对象加载
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 YAML 文件加载
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EchoError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.maxsize == 0 {
            return Err(EchoError::Config("maxsize must be greater than 0".to_string()));
        }
        if self.minsize > self.maxsize {
            return Err(EchoError::Config(format!(
                "minsize ({}) must not exceed maxsize ({})",
                self.minsize, self.maxsize
            )));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// 用于日志的连接目标描述（不含密码）
    pub fn target(&self) -> String {
        let user = self.user.as_deref().unwrap_or("-");
        let database = self.database.as_deref().unwrap_or(":memory:");
        format!("{}@{}:{}/{}", user, self.host, self.port, database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PluginConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3306);
        assert_eq!(config.minsize, 1);
        assert_eq!(config.maxsize, 100);
        assert!(config.autocommit);
        assert!(config.sql_folder.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_yaml() {
        let config = PluginConfig::from_yaml_str(
            "
host: db.local
port: 3307
user: bot
password: secret
database: /var/lib/echoes/locations.db
minsize: 2
maxsize: 8
sql_folder: ./sql
",
        )
        .unwrap();

        assert_eq!(config.host, "db.local");
        assert_eq!(config.port, 3307);
        assert_eq!(config.user.as_deref(), Some("bot"));
        assert_eq!(config.minsize, 2);
        assert_eq!(config.maxsize, 8);
        assert_eq!(config.sql_folder, Some(PathBuf::from("./sql")));
        assert_eq!(config.connect_timeout_secs, 30);
        assert!(!config.target().contains("secret"));
    }

    #[test]
    fn test_config_from_json() {
        let config = PluginConfig::from_json_value(serde_json::json!({
            "database": "echoes.db",
            "autocommit": false,
        }))
        .unwrap();

        assert_eq!(config.database.as_deref(), Some("echoes.db"));
        assert!(!config.autocommit);
        assert_eq!(config.maxsize, 100);
        assert_eq!(config.target(), "-@127.0.0.1:3306/echoes.db");
    }

    #[test]
    fn test_config_rejects_bad_pool_bounds() {
        let err = PluginConfig::from_json_value(serde_json::json!({ "maxsize": 0 })).unwrap_err();
        assert!(matches!(err, EchoError::Config(_)));

        let err = PluginConfig::from_json_value(serde_json::json!({ "minsize": 5, "maxsize": 2 }))
            .unwrap_err();
        assert!(matches!(err, EchoError::Config(_)));
    }
}
