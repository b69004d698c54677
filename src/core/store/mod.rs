//! 存储接口定义
//!
//! 提供设备位置表的抽象接口，支持内存和SQLite实现

pub mod memory;

use async_trait::async_trait;

use crate::domain::{DeviceKey, EquipmentLocation};
use crate::errors::Result;

pub use memory::MemoryLocationStore;

/// 设备位置存储接口
///
/// 单表 {型号, 编号, 位置}，以 (型号, 编号) 为键。
/// 写操作均为原子的条件写入，返回 `Ok` 时已持久化。
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// 按键精确查找，未找到时返回 `None`
    async fn find(&self, key: &DeviceKey) -> Result<Option<EquipmentLocation>>;

    /// 插入新记录
    ///
    /// 键已存在时返回 [`EchoError::Conflict`](crate::errors::EchoError::Conflict)
    async fn insert(&self, record: &EquipmentLocation) -> Result<()>;

    /// 覆盖已有记录的位置
    ///
    /// 键不存在时返回 [`EchoError::NotFound`](crate::errors::EchoError::NotFound)
    async fn update(&self, record: &EquipmentLocation) -> Result<()>;
}
