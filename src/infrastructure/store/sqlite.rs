//! SQLite 存储实现
//!
//! 使用 r2d2 连接池管理 SQLite 连接，每次操作占用一个连接，
//! 在阻塞线程池中执行，操作结束（包括出错）时连接归还连接池。

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::core::config::PluginConfig;
use crate::core::store::LocationStore;
use crate::domain::{DeviceKey, EquipmentLocation};
use crate::errors::{EchoError, Result};

/// 设备位置表名
pub const LOCATION_TABLE: &str = "equipment_locations";

/// 连接池统计
#[derive(Debug, Clone, Copy)]
pub struct PoolState {
    pub connections: u32,
    pub idle_connections: u32,
}

/// SQLite 存储
#[derive(Clone)]
pub struct SqliteLocationStore {
    pool: Arc<Pool<SqliteConnectionManager>>,
    autocommit: bool,
}

impl SqliteLocationStore {
    /// 按配置创建连接池并初始化表结构
    ///
    /// 未配置 `database` 时使用单连接的内存数据库
    pub fn connect(config: &PluginConfig) -> Result<Self> {
        config.validate()?;

        let (manager, min_idle, max_size, in_memory) = match config.database.as_deref() {
            Some(path) if path != ":memory:" => {
                if let Some(parent) = Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)
                            .map_err(|e| EchoError::Connection(e.to_string()))?;
                    }
                }
                let manager = SqliteConnectionManager::file(path).with_init(|conn| {
                    conn.execute_batch(
                        "
                        PRAGMA busy_timeout = 5000;
                        PRAGMA journal_mode = WAL;
                        PRAGMA synchronous = NORMAL;
                        ",
                    )
                });
                (manager, config.minsize, config.maxsize, false)
            }
            // 每个内存连接都是独立的数据库，只能保留一个连接，且不能被回收
            _ => (SqliteConnectionManager::memory(), 1, 1, true),
        };

        let mut builder = Pool::builder()
            .max_size(max_size)
            .min_idle(Some(min_idle))
            .connection_timeout(config.connect_timeout());
        if in_memory {
            builder = builder.idle_timeout(None).max_lifetime(None);
        }
        let pool = builder.build(manager)?;

        info!(
            db = %config.target(),
            max_size,
            min_idle,
            "Database pool created"
        );

        let store = Self {
            pool: Arc::new(pool),
            autocommit: config.autocommit,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// 创建内存数据库（用于测试）
    pub fn new_in_memory() -> Result<Self> {
        Self::connect(&PluginConfig::default())
    }

    /// 初始化数据库表结构
    fn init_schema(&self) -> Result<()> {
        let conn = self.get()?;
        create_schema(&conn)
    }

    /// 从连接池获取一个连接，超时返回连接错误
    pub fn get(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// 连接池统计
    pub fn state(&self) -> PoolState {
        let state = self.pool.state();
        PoolState {
            connections: state.connections,
            idle_connections: state.idle_connections,
        }
    }

    /// 获取并归还一个连接以检查连接池是否可用
    pub fn health_check(&self) -> Result<()> {
        let conn = self.get()?;
        conn.execute_batch("SELECT 1")?;
        debug!("Database pool health check passed");
        Ok(())
    }

    /// 在阻塞线程池中执行数据库操作
    async fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await?
    }

    /// 执行一条写语句并确保已提交，返回受影响的行数
    async fn write(&self, sql: &'static str, params: [String; 3]) -> Result<usize> {
        let autocommit = self.autocommit;
        self.execute(move |conn| {
            if autocommit {
                return Ok(conn.execute(sql, rusqlite::params_from_iter(params.iter()))?);
            }
            let tx = conn.transaction()?;
            let changed = tx.execute(sql, rusqlite::params_from_iter(params.iter()))?;
            tx.commit()?;
            Ok(changed)
        })
        .await
    }
}

/// 创建设备位置表
pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS equipment_locations (
            model TEXT NOT NULL,
            serial TEXT NOT NULL,
            location TEXT NOT NULL,
            PRIMARY KEY (model, serial)
        );

        CREATE INDEX IF NOT EXISTS idx_equipment_locations_location
            ON equipment_locations(location);
        ",
    )?;
    Ok(())
}

#[async_trait]
impl LocationStore for SqliteLocationStore {
    async fn find(&self, key: &DeviceKey) -> Result<Option<EquipmentLocation>> {
        let key = key.clone();
        self.execute(move |conn| {
            let record = conn
                .query_row(
                    "SELECT model, serial, location FROM equipment_locations
                     WHERE model = ?1 AND serial = ?2",
                    rusqlite::params![&key.model, &key.serial],
                    |row| {
                        Ok(EquipmentLocation {
                            model: row.get(0)?,
                            serial: row.get(1)?,
                            location: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn insert(&self, record: &EquipmentLocation) -> Result<()> {
        let changed = self
            .write(
                "INSERT INTO equipment_locations (model, serial, location)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (model, serial) DO NOTHING",
                [
                    record.model.clone(),
                    record.serial.clone(),
                    record.location.clone(),
                ],
            )
            .await?;

        if changed == 0 {
            return Err(EchoError::Conflict {
                model: record.model.clone(),
                serial: record.serial.clone(),
            });
        }
        Ok(())
    }

    async fn update(&self, record: &EquipmentLocation) -> Result<()> {
        let changed = self
            .write(
                "UPDATE equipment_locations SET location = ?1
                 WHERE model = ?2 AND serial = ?3",
                [
                    record.location.clone(),
                    record.model.clone(),
                    record.serial.clone(),
                ],
            )
            .await?;

        if changed == 0 {
            return Err(EchoError::NotFound {
                model: record.model.clone(),
                serial: record.serial.clone(),
            });
        }
        Ok(())
    }
}
