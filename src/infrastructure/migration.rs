//! 启动时的 SQL 脚本迁移
//!
//! 按文件名顺序执行 `sql_folder` 下的所有 `.sql` 文件。脚本按 `;` 简单切分，
//! 因此字符串字面量中不能出现 `;`。单条语句失败只记录日志，继续执行后续语句和文件，
//! 全部执行完后统一提交，提交失败则回滚。

use std::path::{Path, PathBuf};

use anyhow::Context;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::errors::{EchoError, Result};
use crate::infrastructure::store::SqliteLocationStore;

/// 语句分隔符
const DELIMITER: char = ';';
/// 行注释前缀
const COMMENT_PREFIXES: [&str; 2] = ["--", "#"];
/// 日志中展示的出错语句最大字符数
const PREVIEW_CHARS: usize = 100;

/// 一次迁移的执行结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// 找到的脚本文件数
    pub files: usize,
    /// 成功执行的语句数
    pub executed: usize,
    /// 失败并被跳过的语句数
    pub failed: usize,
    /// 是否已提交
    pub committed: bool,
}

/// 迁移执行器
#[derive(Debug, Clone, Default)]
pub struct MigrationRunner {
    folder: Option<PathBuf>,
}

impl MigrationRunner {
    pub fn new(folder: Option<PathBuf>) -> Self {
        Self { folder }
    }

    /// 通过连接池中的一个连接执行迁移
    pub async fn run(&self, store: &SqliteLocationStore) -> Result<MigrationReport> {
        let runner = self.clone();
        let store = store.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = store.get()?;
            runner.run_on(&mut conn)
        })
        .await?
    }

    /// 不经过连接池，直接打开数据库文件执行迁移
    pub async fn run_direct(&self, database: Option<String>) -> Result<MigrationReport> {
        let runner = self.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = match database.as_deref() {
                Some(path) if path != ":memory:" => Connection::open(path)?,
                _ => Connection::open_in_memory()?,
            };
            runner.run_on(&mut conn)
        })
        .await?
    }

    /// 在给定连接上执行迁移
    pub fn run_on(&self, conn: &mut Connection) -> Result<MigrationReport> {
        let mut report = MigrationReport::default();

        let Some(folder) = self.folder.as_deref() else {
            info!("sql_folder not configured, skipping database migration");
            return Ok(report);
        };

        if !folder.exists() {
            warn!(folder = %folder.display(), "SQL folder does not exist");
            return Ok(report);
        }

        let files = list_sql_files(folder)?;
        if files.is_empty() {
            info!(folder = %folder.display(), "No SQL files found");
            return Ok(report);
        }

        report.files = files.len();
        info!(count = files.len(), "Found SQL files to execute");

        conn.execute_batch("BEGIN")?;

        for path in &files {
            let name = file_name(path);
            info!(file = %name, "Executing SQL file");

            let statements = match read_statements(path) {
                Ok(statements) => statements,
                Err(e) => {
                    warn!(file = %name, "Failed to process SQL file: {:#}", e);
                    continue;
                }
            };

            for (i, stmt) in statements.iter().enumerate() {
                match conn.execute_batch(stmt) {
                    Ok(()) => {
                        report.executed += 1;
                        info!(file = %name, index = i + 1, "Statement executed");
                    }
                    Err(e) => {
                        report.failed += 1;
                        warn!(file = %name, index = i + 1, "Statement failed: {}", e);
                        warn!("Failed SQL: {}...", preview(stmt));
                    }
                }
            }
        }

        match conn.execute_batch("COMMIT") {
            Ok(()) => {
                report.committed = true;
                info!(
                    executed = report.executed,
                    failed = report.failed,
                    "All SQL files executed"
                );
            }
            Err(e) => {
                warn!("Failed to commit migration: {}", e);
                match conn.execute_batch("ROLLBACK") {
                    Ok(()) => info!("Migration rolled back"),
                    Err(rollback_e) => warn!("Failed to roll back migration: {}", rollback_e),
                }
            }
        }

        Ok(report)
    }
}

/// 列出目录下的 `.sql` 文件，按文件名排序
fn list_sql_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(folder).map_err(|e| {
        EchoError::Migration(format!("failed to read {}: {}", folder.display(), e))
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "sql"))
        .collect();
    files.sort_by_key(|path| file_name(path));
    Ok(files)
}

fn read_statements(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(split_statements(&content))
}

/// 按分隔符切分脚本
///
/// 片段开头的注释行会被去掉，只剩注释或空白的片段被跳过
pub fn split_statements(content: &str) -> Vec<String> {
    content
        .split(DELIMITER)
        .map(strip_leading_comments)
        .filter(|stmt| !stmt.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_leading_comments(fragment: &str) -> &str {
    let mut rest = fragment.trim();
    while COMMENT_PREFIXES.iter().any(|p| rest.starts_with(p)) {
        rest = match rest.split_once('\n') {
            Some((_, tail)) => tail.trim(),
            None => "",
        };
    }
    rest
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn preview(stmt: &str) -> String {
    stmt.chars().take(PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_statements() {
        let script = "
            -- 设备表
            CREATE TABLE a (x TEXT);
            # 旧注释
            ;
            INSERT INTO a VALUES ('1');

            -- trailing comment
        ";
        let statements = split_statements(script);
        assert_eq!(
            statements,
            vec![
                "CREATE TABLE a (x TEXT)".to_string(),
                "INSERT INTO a VALUES ('1')".to_string(),
            ]
        );
    }

    #[test]
    fn test_split_breaks_on_delimiter_in_literal() {
        let statements = split_statements("INSERT INTO a VALUES ('x;y');");
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "设".repeat(150);
        assert_eq!(preview(&long).chars().count(), PREVIEW_CHARS);
    }

    #[test]
    fn test_no_folder_is_skipped() {
        let mut conn = Connection::open_in_memory().unwrap();
        let report = MigrationRunner::new(None).run_on(&mut conn).unwrap();
        assert_eq!(report, MigrationReport::default());
    }

    #[test]
    fn test_missing_folder_is_skipped() {
        let mut conn = Connection::open_in_memory().unwrap();
        let runner = MigrationRunner::new(Some(PathBuf::from("/nonexistent/echoes/sql")));
        let report = runner.run_on(&mut conn).unwrap();
        assert_eq!(report.files, 0);
        assert!(!report.committed);
    }
}
