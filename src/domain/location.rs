//! 设备位置领域实体

use std::fmt;

use serde::{Deserialize, Serialize};

/// 设备唯一键：型号 + 编号
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceKey {
    pub model: String,
    pub serial: String,
}

impl DeviceKey {
    pub fn new(model: impl Into<String>, serial: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            serial: serial.into(),
        }
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.model, self.serial)
    }
}

/// 位置编码
///
/// 一个字母加若干数字，例如 `A12`。字母统一转为大写，数字原样保留。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationCode(String);

impl LocationCode {
    /// 解析并规范化位置编码，格式不符时返回 `None`
    pub fn parse(raw: &str) -> Option<Self> {
        let mut chars = raw.chars();
        let letter = chars.next().filter(char::is_ascii_alphabetic)?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let mut code = String::with_capacity(raw.len());
        code.push(letter.to_ascii_uppercase());
        code.push_str(digits);
        Some(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 设备存放位置记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentLocation {
    pub model: String,
    pub serial: String,
    pub location: String,
}

impl EquipmentLocation {
    pub fn new(key: &DeviceKey, location: &LocationCode) -> Self {
        Self {
            model: key.model.clone(),
            serial: key.serial.clone(),
            location: location.as_str().to_string(),
        }
    }

    pub fn key(&self) -> DeviceKey {
        DeviceKey::new(self.model.clone(), self.serial.clone())
    }
}
