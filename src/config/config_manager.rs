// ==========================================
// CRM 联系人导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{
    ImportConfigReader, DEFAULT_MAX_FILE_SIZE_BYTES, DEFAULT_SNAPSHOT_PAGE_SIZE,
};
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(RepositoryError::connection)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }

        Ok(Self { conn })
    }

    fn lock_for(&self, key: &str) -> ImportResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: format!("锁获取失败: {}", e),
        })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self.lock_for(key)?;

        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 读取配置并解析；缺失或格式错误时回退默认值（格式错误记录警告）
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> ImportResult<T>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置值格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 获取所有 global 配置的快照（JSON格式，按键排序）
    pub fn get_config_snapshot(&self) -> ImportResult<String> {
        let conn = self.lock_for("*")?;
        let read_err = |e: rusqlite::Error| ImportError::ConfigReadError {
            key: "*".to_string(),
            message: e.to_string(),
        };

        let mut stmt = conn
            .prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")
            .map_err(read_err)?;

        let config_map = stmt
            .query_map(params![GLOBAL_SCOPE], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(read_err)?
            .collect::<Result<BTreeMap<String, String>, _>>()
            .map_err(read_err)?;

        serde_json::to_string(&json!(config_map))
            .map_err(|e| ImportError::InternalError(e.to_string()))
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_max_file_size_bytes(&self) -> ImportResult<u64> {
        let value =
            self.get_parsed_or_default(config_keys::MAX_FILE_SIZE_BYTES, DEFAULT_MAX_FILE_SIZE_BYTES)?;
        // 0 视为未配置
        Ok(if value == 0 { DEFAULT_MAX_FILE_SIZE_BYTES } else { value })
    }

    async fn get_snapshot_page_size(&self) -> ImportResult<usize> {
        let value =
            self.get_parsed_or_default(config_keys::SNAPSHOT_PAGE_SIZE, DEFAULT_SNAPSHOT_PAGE_SIZE)?;
        Ok(if value == 0 { DEFAULT_SNAPSHOT_PAGE_SIZE } else { value })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 上传
    pub const MAX_FILE_SIZE_BYTES: &str = "max_file_size_bytes";

    // 查重快照
    pub const SNAPSHOT_PAGE_SIZE: &str = "snapshot_page_size";
}
