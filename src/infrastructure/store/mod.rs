//! 存储实现

pub mod sqlite;

pub use sqlite::{PoolState, SqliteLocationStore};
