//! 命令匹配器
//!
//! 按固定优先级（查询 → 添加 → 更新）依次尝试各意图的关键字，
//! 第一个命中关键字的意图决定结果；都未命中时返回 [`Command::Unrecognized`]。

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::domain::{Command, DeviceKey, Intent, LocationCode};

/// 单个意图的匹配规则
pub struct IntentMatcher {
    intent: Intent,
    keyword: Regex,
    arguments: Regex,
}

impl IntentMatcher {
    /// 根据关键字同义词构造匹配规则
    ///
    /// `with_location` 为 true 时参数末尾需要位置编码
    fn new(intent: Intent, synonyms: &[&str], with_location: bool) -> Self {
        let alternatives = synonyms
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        let keyword = format!("(?i)(?:{})", alternatives);
        // 参数只认 ASCII 数字和字母，与 `LocationCode::parse` 保持一致
        let arguments = if with_location {
            format!(r"{}[^0-9]*([0-9]+)[^0-9]*([0-9]+)\s*((?-i:[A-Za-z])[0-9]+)", keyword)
        } else {
            format!(r"{}[^0-9]*([0-9]+)[^0-9]*([0-9]+)", keyword)
        };

        Self {
            intent,
            keyword: Regex::new(&keyword).expect("keyword pattern is valid"),
            arguments: Regex::new(&arguments).expect("argument pattern is valid"),
        }
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    /// 文本中是否出现该意图的关键字
    pub fn fires(&self, text: &str) -> bool {
        self.keyword.is_match(text)
    }

    /// 提取参数；关键字命中但参数不完整时返回 [`Command::Malformed`]
    pub fn extract(&self, text: &str) -> Command {
        self.arguments
            .captures(text)
            .and_then(|caps| self.build(&caps))
            .unwrap_or(Command::Malformed(self.intent))
    }

    fn build(&self, caps: &Captures<'_>) -> Option<Command> {
        let key = DeviceKey::new(caps.get(1)?.as_str(), caps.get(2)?.as_str());
        match self.intent {
            Intent::Query => Some(Command::Query { key }),
            Intent::Add => Some(Command::Add {
                key,
                location: LocationCode::parse(caps.get(3)?.as_str())?,
            }),
            Intent::Update => Some(Command::Update {
                key,
                location: LocationCode::parse(caps.get(3)?.as_str())?,
            }),
        }
    }
}

static DEFAULT_MATCHERS: LazyLock<Vec<IntentMatcher>> = LazyLock::new(|| {
    vec![
        IntentMatcher::new(Intent::Query, &["查询", "cx", "Query"], false),
        IntentMatcher::new(
            Intent::Add,
            &["添加位置", "tjwz", "add location", "add loc"],
            true,
        ),
        IntentMatcher::new(
            Intent::Update,
            &["更新位置", "gxwz", "update location", "up loc"],
            true,
        ),
    ]
});

/// 命令匹配器
///
/// 持有按优先级排列的意图规则列表
#[derive(Clone, Copy)]
pub struct CommandMatcher {
    matchers: &'static [IntentMatcher],
}

impl CommandMatcher {
    pub fn new() -> Self {
        Self {
            matchers: DEFAULT_MATCHERS.as_slice(),
        }
    }

    /// 识别消息文本
    pub fn classify(&self, text: &str) -> Command {
        self.matchers
            .iter()
            .find(|m| m.fires(text))
            .map(|m| m.extract(text))
            .unwrap_or(Command::Unrecognized)
    }

    /// 按优先级列出的意图
    pub fn intents(&self) -> impl Iterator<Item = Intent> + '_ {
        self.matchers.iter().map(IntentMatcher::intent)
    }
}

impl Default for CommandMatcher {
    fn default() -> Self {
        Self::new()
    }
}
