//! 插件生命周期
//!
//! 宿主依次调用 `initialize` → 每条消息一次 `on_message` → `terminate`

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::core::config::PluginConfig;
use crate::core::dispatcher::Dispatcher;
use crate::domain::{InboundMessage, Reply};
use crate::errors::{EchoError, Result};
use crate::infrastructure::migration::MigrationRunner;
use crate::infrastructure::store::SqliteLocationStore;

/// 一条消息的回复流，有限且只能消费一次
pub type ReplyStream = BoxStream<'static, Reply>;

/// 宿主调用的插件接口
#[async_trait]
pub trait ChatPlugin: Send + Sync {
    /// 插件名称
    fn name(&self) -> &str;

    /// 在投递任何消息之前调用一次，完成后插件才算就绪
    async fn initialize(&self) -> Result<()>;

    /// 处理一条入站消息
    async fn on_message(&self, message: &InboundMessage) -> Result<ReplyStream>;

    /// 停用时调用一次
    async fn terminate(&self) -> Result<()>;
}

/// 设备位置插件
pub struct LocationPlugin {
    config: PluginConfig,
    runner: MigrationRunner,
    dispatcher: RwLock<Option<Arc<Dispatcher>>>,
}

impl LocationPlugin {
    pub const NAME: &'static str = "群星回响";

    pub fn new(config: PluginConfig) -> Self {
        let runner = MigrationRunner::new(config.sql_folder.clone());
        Self {
            config,
            runner,
            dispatcher: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub async fn is_ready(&self) -> bool {
        self.dispatcher.read().await.is_some()
    }

    /// 建立连接池；失败时仍尝试直接执行迁移脚本，然后返回原始错误
    async fn connect(&self) -> Result<SqliteLocationStore> {
        let config = self.config.clone();
        let connected = tokio::task::spawn_blocking(move || SqliteLocationStore::connect(&config))
            .await?;

        match connected {
            Ok(store) => Ok(store),
            Err(e) => {
                error!(db = %self.config.target(), "Database initialization failed: {}", e);
                info!("Trying configured SQL files directly");
                if let Err(fallback) = self.runner.run_direct(self.config.database.clone()).await {
                    warn!("Fallback migration failed: {}", fallback);
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl ChatPlugin for LocationPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn initialize(&self) -> Result<()> {
        info!("Initializing plugin");

        info!("Step 1: connecting to database");
        let store = self.connect().await?;

        info!("Step 2: running migrations");
        let report = self.runner.run(&store).await?;
        info!(
            files = report.files,
            executed = report.executed,
            failed = report.failed,
            "Migration finished"
        );

        *self.dispatcher.write().await = Some(Arc::new(Dispatcher::new(Arc::new(store))));
        info!("Plugin initialized");
        Ok(())
    }

    async fn on_message(&self, message: &InboundMessage) -> Result<ReplyStream> {
        let dispatcher = self
            .dispatcher
            .read()
            .await
            .clone()
            .ok_or(EchoError::NotInitialized)?;

        let replies = dispatcher.handle(&message.text).await?;
        info!(
            sender = message.sender.as_deref().unwrap_or("-"),
            replies = replies.len(),
            "Message handled"
        );
        Ok(stream::iter(replies).boxed())
    }

    async fn terminate(&self) -> Result<()> {
        if self.dispatcher.write().await.take().is_some() {
            info!("Plugin terminated, connection pool released");
        }
        Ok(())
    }
}
