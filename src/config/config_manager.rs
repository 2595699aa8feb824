// ==========================================
// 公司概况导入器 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::importer::error::{ImportError, ImportResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// 默认批量落库大小
pub const DEFAULT_BATCH_SIZE: usize = 500;
/// 默认分块读取大小
pub const DEFAULT_CHUNK_SIZE: usize = 500;
/// 默认导入人
pub const DEFAULT_IMPORTED_BY: &str = "system";

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
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(|e| ImportError::ConfigReadError {
            key: "<connection>".to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImportResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;
            configure_sqlite_connection(&guard).map_err(|e| ImportError::ConfigReadError {
                key: "<connection>".to_string(),
                message: e.to_string(),
            })?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )
        .map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式，写入批次报告）
    pub fn snapshot_global_config(&self) -> ImportResult<String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        let to_config_error = |e: rusqlite::Error| ImportError::ConfigReadError {
            key: "<snapshot>".to_string(),
            message: e.to_string(),
        };

        let mut stmt = conn
            .prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")
            .map_err(to_config_error)?;
        let config_map = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(to_config_error)?
            .collect::<rusqlite::Result<BTreeMap<String, String>>>()
            .map_err(to_config_error)?;

        Ok(serde_json::to_string(&config_map)?)
    }

    /// 读取正整数配置；缺失取默认，非法或为 0 时告警并取默认
    fn get_positive_usize(&self, key: &str, default: usize) -> ImportResult<usize> {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<usize>() {
            Ok(value) if value > 0 => Ok(value),
            _ => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default,
                    "配置值非法，使用默认值"
                );
                Ok(default)
            }
        }
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_batch_size(&self) -> ImportResult<usize> {
        self.get_positive_usize(config_keys::IMPORT_BATCH_SIZE, DEFAULT_BATCH_SIZE)
    }

    async fn get_chunk_size(&self) -> ImportResult<usize> {
        self.get_positive_usize(config_keys::IMPORT_CHUNK_SIZE, DEFAULT_CHUNK_SIZE)
    }

    async fn get_imported_by(&self) -> ImportResult<String> {
        let value = self
            .get_global_config_value(config_keys::IMPORT_IMPORTED_BY)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Ok(value.unwrap_or_else(|| DEFAULT_IMPORTED_BY.to_string()))
    }

    async fn get_config_snapshot(&self) -> ImportResult<String> {
        self.snapshot_global_config()
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const IMPORT_BATCH_SIZE: &str = "import.batch_size";
    pub const IMPORT_CHUNK_SIZE: &str = "import.chunk_size";
    pub const IMPORT_IMPORTED_BY: &str = "import.imported_by";
}
