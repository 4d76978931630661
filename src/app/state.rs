// ==========================================
// 商品批量导入 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::Arc;

use crate::api::{ImportApi, TemplateApi};
use crate::db::{init_schema, open_sqlite_connection};

/// 应用状态
///
/// 包含所有API实例
/// 在 Web 服务 / CLI 中作为全局状态管理
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 模板下载API
    pub template_api: Arc<TemplateApi>,

    /// 商品导入API
    pub import_api: Arc<ImportApi>,
}

impl AppState {
    /// 创建应用状态（确保数据库表结构存在）
    pub fn new(db_path: String) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(db_path = %db_path, "初始化数据库");
        let conn = open_sqlite_connection(&db_path)?;
        init_schema(&conn)?;
        drop(conn);

        Ok(Self {
            template_api: Arc::new(TemplateApi::new(db_path.clone())),
            import_api: Arc::new(ImportApi::new(db_path.clone())),
            db_path,
        })
    }
}

/// 获取默认数据库路径
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("CATALOG_IMPORT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./catalog_import.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("catalog-import");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("catalog_import.db");
        }
    }

    path.to_string_lossy().to_string()
}
