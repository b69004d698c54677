//! 内存存储实现
//!
//! 数据仅在内存中，重启后丢失，适合测试

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::{DeviceKey, EquipmentLocation};
use crate::errors::{EchoError, Result};

use super::LocationStore;

/// 内存存储
#[derive(Default)]
pub struct MemoryLocationStore {
    records: DashMap<DeviceKey, String>,
}

impl MemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前记录数
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl LocationStore for MemoryLocationStore {
    async fn find(&self, key: &DeviceKey) -> Result<Option<EquipmentLocation>> {
        Ok(self.records.get(key).map(|location| EquipmentLocation {
            model: key.model.clone(),
            serial: key.serial.clone(),
            location: location.value().clone(),
        }))
    }

    async fn insert(&self, record: &EquipmentLocation) -> Result<()> {
        match self.records.entry(record.key()) {
            Entry::Occupied(_) => Err(EchoError::Conflict {
                model: record.model.clone(),
                serial: record.serial.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(record.location.clone());
                Ok(())
            }
        }
    }

    async fn update(&self, record: &EquipmentLocation) -> Result<()> {
        match self.records.get_mut(&record.key()) {
            Some(mut location) => {
                *location = record.location.clone();
                Ok(())
            }
            None => Err(EchoError::NotFound {
                model: record.model.clone(),
                serial: record.serial.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(model: &str, serial: &str, location: &str) -> EquipmentLocation {
        EquipmentLocation {
            model: model.to_string(),
            serial: serial.to_string(),
            location: location.to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_missing() {
        let store = MemoryLocationStore::new();
        assert!(store.find(&DeviceKey::new("5", "12")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_then_conflict() {
        let store = MemoryLocationStore::new();
        store.insert(&record("5", "12", "B7")).await.unwrap();

        let err = store.insert(&record("5", "12", "C1")).await.unwrap_err();
        assert!(matches!(err, EchoError::Conflict { .. }));

        let found = store.find(&DeviceKey::new("5", "12")).await.unwrap().unwrap();
        assert_eq!(found.location, "B7");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update() {
        let store = MemoryLocationStore::new();
        let err = store.update(&record("5", "12", "C9")).await.unwrap_err();
        assert!(matches!(err, EchoError::NotFound { .. }));
        assert!(store.is_empty());

        store.insert(&record("5", "12", "B7")).await.unwrap();
        store.update(&record("5", "12", "C9")).await.unwrap();
        let found = store.find(&DeviceKey::new("5", "12")).await.unwrap().unwrap();
        assert_eq!(found.location, "C9");
    }
}
