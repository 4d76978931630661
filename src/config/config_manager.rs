// ==========================================
// 商品批量导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{ImportConfigReader, ImportSettings};
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// 配置键
pub mod config_keys {
    pub const MAX_ROWS: &str = "import/max_rows";
    pub const MAX_NAME_LENGTH: &str = "import/max_name_length";
    pub const MAX_SKU_LENGTH: &str = "import/max_sku_length";
    pub const MAX_DESCRIPTION_LENGTH: &str = "import/max_description_length";
    pub const MAX_IMAGE_URLS: &str = "import/max_image_urls";
    pub const MAX_UPLOAD_BYTES: &str = "import/max_upload_bytes";
    pub const TEMPLATE_CACHE_SECONDS: &str = "template/cache_seconds";
}

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
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error + Send + Sync>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 读取数值配置；缺失或格式错误时回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error + Send + Sync>>
    where
        T: FromStr + Copy,
    {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    warn!(key = key, value = %raw, "配置值格式错误，使用默认值");
                    Ok(default)
                }
            },
        }
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_max_rows(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        self.get_parsed_or_default(config_keys::MAX_ROWS, ImportSettings::default().max_rows)
    }

    async fn get_max_name_length(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        self.get_parsed_or_default(
            config_keys::MAX_NAME_LENGTH,
            ImportSettings::default().max_name_length,
        )
    }

    async fn get_max_sku_length(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        self.get_parsed_or_default(
            config_keys::MAX_SKU_LENGTH,
            ImportSettings::default().max_sku_length,
        )
    }

    async fn get_max_description_length(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        self.get_parsed_or_default(
            config_keys::MAX_DESCRIPTION_LENGTH,
            ImportSettings::default().max_description_length,
        )
    }

    async fn get_max_image_urls(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        self.get_parsed_or_default(
            config_keys::MAX_IMAGE_URLS,
            ImportSettings::default().max_image_urls,
        )
    }

    async fn get_max_upload_bytes(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        self.get_parsed_or_default(
            config_keys::MAX_UPLOAD_BYTES,
            ImportSettings::default().max_upload_bytes,
        )
    }

    async fn get_template_cache_seconds(&self) -> Result<u64, Box<dyn Error + Send + Sync>> {
        self.get_parsed_or_default(
            config_keys::TEMPLATE_CACHE_SECONDS,
            ImportSettings::default().template_cache_seconds,
        )
    }
}
