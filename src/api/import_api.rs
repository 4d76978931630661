// ==========================================
// 商品导入API
// ==========================================
// 职责: 封装上传导入与批次历史查询
// 前置: 调用方已完成鉴权，文件字节原样传入
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::domain::{ImportBatch, ImportReport};
use crate::importer::{ProductImporter, ProductImporterImpl};
use crate::repository::{ProductImportRepository, ProductImportRepositoryImpl};
use tracing::warn;

/// 批次历史单次最多返回条数
const MAX_BATCH_LIST_LIMIT: usize = 100;

/// 导入API
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    fn create_importer(
        &self,
    ) -> ApiResult<ProductImporterImpl<ProductImportRepositoryImpl, ConfigManager>> {
        let repo = ProductImportRepositoryImpl::new(&self.db_path)?;
        let config = ConfigManager::new(&self.db_path)
            .map_err(|e| ApiError::DatabaseError(format!("创建配置管理器失败: {}", e)))?;
        Ok(ProductImporterImpl::with_defaults(repo, config))
    }

    /// 导入商品数据
    ///
    /// # 参数
    /// - file_bytes: 上传文件内容
    /// - file_name: 原始文件名（审计）
    /// - imported_by: 操作人（审计）
    ///
    /// # 返回
    /// - Ok(ImportReport): 逐行结果
    /// - Err(InvalidInput): 空文件 / 超过上传大小限制
    /// - Err(ImportRejected): 文件无法解析 / 缺列 / 行数超限
    pub async fn import_products(
        &self,
        file_bytes: &[u8],
        file_name: Option<&str>,
        imported_by: Option<&str>,
    ) -> ApiResult<ImportReport> {
        if file_bytes.is_empty() {
            return Err(ApiError::InvalidInput("上传文件为空".to_string()));
        }

        let config = ConfigManager::new(&self.db_path)
            .map_err(|e| ApiError::DatabaseError(format!("创建配置管理器失败: {}", e)))?;
        let max_upload_bytes = config
            .get_max_upload_bytes()
            .await
            .map_err(|e| ApiError::InternalError(format!("配置读取失败: {}", e)))?;
        if file_bytes.len() > max_upload_bytes {
            warn!(size = file_bytes.len(), max = max_upload_bytes, "上传文件过大");
            return Err(ApiError::InvalidInput(format!(
                "文件大小 {} 字节超过上限 {} 字节",
                file_bytes.len(),
                max_upload_bytes
            )));
        }

        let importer = self.create_importer()?;
        let report = importer
            .import_from_bytes(file_bytes, file_name, imported_by)
            .await?;
        Ok(report)
    }

    /// 最近的导入批次（按时间倒序）
    pub async fn list_recent_batches(&self, limit: usize) -> ApiResult<Vec<ImportBatch>> {
        let limit = limit.clamp(1, MAX_BATCH_LIST_LIMIT);
        let repo = ProductImportRepositoryImpl::new(&self.db_path)?;
        let batches = repo.get_recent_batches(limit).await?;
        Ok(batches)
    }
}
