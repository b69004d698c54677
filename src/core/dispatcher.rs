//! 命令分发
//!
//! 一条入站消息只执行一个流程：匹配 → 存储 → 构造回复序列。
//! 参数错误和业务冲突在本地转换成回复；连接等基础设施错误向上传播。

use std::sync::Arc;

use tracing::debug;

use crate::core::matcher::CommandMatcher;
use crate::core::store::LocationStore;
use crate::domain::{Command, DeviceKey, EquipmentLocation, LocationCode, Reply};
use crate::errors::{EchoError, Result};

/// 回复文案
pub mod replies {
    use crate::domain::Intent;

    pub const UNKNOWN_LOCATION: &str = "位置未知";
    pub const ADD_HINT: &str = "请在知道设备位置后输入：/添加位置 设备型号-设备编号 设备位置";
    pub const THANKS: &str = "感谢您的贡献";
    pub const UPDATE_HINT: &str = "如果该位置错误请使用：\n/更新位置 设备型号-设备编号 设备位置";
    pub const ADD_FIRST_HINT: &str = "请先使用添加位置命令添加设备";
    pub const UNRECOGNIZED: &str = "命令似乎不正确";

    pub fn malformed(intent: Intent) -> String {
        format!("您的输入有误，请重新输入。\n该指令应为：{}", intent.usage())
    }

    pub fn card(model: &str, serial: &str, location: &str) -> String {
        format!("型号：{}\n编号：{}\n位置：{}", model, serial, location)
    }

    pub fn already_registered(location: &str) -> String {
        format!("该设备位置已被注册位于{}", location)
    }

    pub fn added(model: &str, serial: &str, location: &str) -> String {
        format!("位置添加成功\n{}", card(model, serial, location))
    }

    pub fn updated(model: &str, serial: &str, location: &str) -> String {
        format!("位置更新成功\n{}", card(model, serial, location))
    }

    pub fn device_not_found(model: &str, serial: &str) -> String {
        format!("未找到设备 型号：{} 编号：{}", model, serial)
    }
}

/// 命令分发器
///
/// 存储在构造时注入，便于替换为测试替身
pub struct Dispatcher {
    matcher: CommandMatcher,
    store: Arc<dyn LocationStore>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn LocationStore>) -> Self {
        Self {
            matcher: CommandMatcher::new(),
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn LocationStore> {
        &self.store
    }

    /// 处理一条消息，返回按顺序发送的回复
    pub async fn handle(&self, text: &str) -> Result<Vec<Reply>> {
        let command = self.matcher.classify(text);
        debug!(intent = ?command.intent(), "Classified message");

        let replies = match command {
            Command::Query { key } => self.query(&key).await?,
            Command::Add { key, location } => self.add(&key, &location).await?,
            Command::Update { key, location } => self.update(&key, &location).await?,
            Command::Malformed(intent) => vec![replies::malformed(intent)],
            Command::Unrecognized => vec![replies::UNRECOGNIZED.to_string()],
        };

        Ok(replies.into_iter().map(Reply::plain).collect())
    }

    async fn query(&self, key: &DeviceKey) -> Result<Vec<String>> {
        match self.store.find(key).await? {
            Some(record) => Ok(vec![replies::card(
                &key.model,
                &key.serial,
                &record.location,
            )]),
            None => {
                debug!(device = %key, "Location unknown");
                Ok(vec![
                    replies::card(&key.model, &key.serial, replies::UNKNOWN_LOCATION),
                    replies::ADD_HINT.to_string(),
                    replies::THANKS.to_string(),
                ])
            }
        }
    }

    /// 添加位置；设备已登记时在三条提示后再附一条感谢，共四条回复
    async fn add(&self, key: &DeviceKey, location: &LocationCode) -> Result<Vec<String>> {
        let record = EquipmentLocation::new(key, location);
        match self.store.insert(&record).await {
            Ok(()) => {
                debug!(device = %key, location = %location, "Location added");
                Ok(vec![replies::added(&key.model, &key.serial, location.as_str())])
            }
            Err(EchoError::Conflict { .. }) => {
                let existing = self.store.find(key).await?.ok_or_else(|| {
                    EchoError::Storage(format!("record {} vanished after conflict", key))
                })?;
                debug!(device = %key, existing = %existing.location, "Location already registered");
                Ok(vec![
                    replies::card(&key.model, &key.serial, &existing.location),
                    replies::already_registered(&existing.location),
                    replies::UPDATE_HINT.to_string(),
                    replies::THANKS.to_string(),
                ])
            }
            Err(e) => Err(e),
        }
    }

    async fn update(&self, key: &DeviceKey, location: &LocationCode) -> Result<Vec<String>> {
        let record = EquipmentLocation::new(key, location);
        match self.store.update(&record).await {
            Ok(()) => {
                debug!(device = %key, location = %location, "Location updated");
                Ok(vec![replies::updated(&key.model, &key.serial, location.as_str())])
            }
            Err(EchoError::NotFound { .. }) => Ok(vec![
                replies::device_not_found(&key.model, &key.serial),
                replies::ADD_FIRST_HINT.to_string(),
            ]),
            Err(e) => Err(e),
        }
    }
}

