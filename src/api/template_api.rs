// ==========================================
// 模板下载API
// ==========================================
// 职责: 生成导入模板并附带下载元数据
// 说明: 模板内容只依赖列定义与分类表，可由上游缓存
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::domain::ColumnSchema;
use crate::importer::{TemplateGenerator, XlsxTemplateGenerator};
use crate::repository::{ProductImportRepository, ProductImportRepositoryImpl};
use tracing::info;

pub const TEMPLATE_FILE_NAME: &str = "products-import-template.xlsx";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// 模板下载载荷
#[derive(Debug, Clone)]
pub struct TemplateDownload {
    pub file_name: String,
    pub content_type: String,
    pub cache_control: String,
    pub bytes: Vec<u8>,
}

/// 模板API
pub struct TemplateApi {
    db_path: String,
}

impl TemplateApi {
    /// 创建新的TemplateApi实例
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    /// 下载导入模板（含隐藏的分类参考页）
    pub async fn download_template(&self) -> ApiResult<TemplateDownload> {
        let repo = ProductImportRepositoryImpl::new(&self.db_path)?;
        let config = ConfigManager::new(&self.db_path)
            .map_err(|e| ApiError::DatabaseError(format!("创建配置管理器失败: {}", e)))?;

        let categories = repo.list_categories().await?;
        let cache_seconds = config
            .get_template_cache_seconds()
            .await
            .map_err(|e| ApiError::InternalError(format!("配置读取失败: {}", e)))?;

        let bytes = XlsxTemplateGenerator.generate_template(&ColumnSchema::products(), &categories)?;
        info!(size = bytes.len(), categories = categories.len(), "导入模板已生成");

        Ok(TemplateDownload {
            file_name: TEMPLATE_FILE_NAME.to_string(),
            content_type: XLSX_CONTENT_TYPE.to_string(),
            cache_control: format!("public, max-age={}", cache_seconds),
            bytes,
        })
    }
}
