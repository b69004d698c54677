//! 聊天命令领域定义

use std::fmt;

use serde::{Deserialize, Serialize};

use super::location::{DeviceKey, LocationCode};

/// 命令意图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// 查询位置
    Query,
    /// 添加位置
    Add,
    /// 更新位置
    Update,
}

impl Intent {
    /// 参数格式提示，用于输入有误时的回复
    pub fn usage(&self) -> &'static str {
        match self {
            Intent::Query => "指令 型号 编号",
            Intent::Add | Intent::Update => "指令 型号 编号 位置",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Query => write!(f, "query"),
            Intent::Add => write!(f, "add"),
            Intent::Update => write!(f, "update"),
        }
    }
}

/// 命令识别结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Query {
        key: DeviceKey,
    },
    Add {
        key: DeviceKey,
        location: LocationCode,
    },
    Update {
        key: DeviceKey,
        location: LocationCode,
    },
    /// 识别出关键字但参数无法解析
    Malformed(Intent),
    /// 没有任何关键字命中
    Unrecognized,
}

impl Command {
    /// 命中的意图（未识别时为 `None`）
    pub fn intent(&self) -> Option<Intent> {
        match self {
            Command::Query { .. } => Some(Intent::Query),
            Command::Add { .. } => Some(Intent::Add),
            Command::Update { .. } => Some(Intent::Update),
            Command::Malformed(intent) => Some(*intent),
            Command::Unrecognized => None,
        }
    }
}

/// 回复给宿主的纯文本消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reply(String);

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    pub fn into_text(self) -> String {
        self.0
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for Reply {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// 宿主投递的入站消息
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundMessage {
    /// 发送者标识（仅用于日志）
    pub sender: Option<String>,
    /// 原始消息文本
    pub text: String,
}

impl InboundMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            sender: None,
            text: text.into(),
        }
    }

    pub fn from_sender(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: Some(sender.into()),
            text: text.into(),
        }
    }
}
