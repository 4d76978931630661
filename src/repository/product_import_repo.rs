// ==========================================
// 商品批量导入 - 目录 Repository Trait
// ==========================================
// 职责: 定义导入相关数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
//       每次写入是独立的单条语句，不做批量事务
// ==========================================

use crate::domain::{CandidateProduct, Category, ExistingProductRef, ImportBatch, Product};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

// ==========================================
// ProductImportRepository Trait
// ==========================================
// 用途: 商品导入相关数据访问
// 实现者: ProductImportRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait ProductImportRepository: Send + Sync {
    // ===== 分类（只读查询 + 运维写入）=====

    /// 全部分类（按代码排序）
    async fn list_categories(&self) -> RepositoryResult<Vec<Category>>;

    /// 分类代码集合（每批次读取一次，统一为大写）
    async fn category_codes(&self) -> RepositoryResult<HashSet<String>>;

    /// 新增或更新分类（CLI / 测试用）
    async fn upsert_category(&self, category: &Category) -> RepositoryResult<()>;

    // ===== 商品 =====

    /// 按 SKU 批量查询现有商品
    ///
    /// # 返回
    /// - 大写 SKU → 商品引用（匹配不区分大小写，不存在的 SKU 不出现在结果中）
    async fn find_products_by_skus(
        &self,
        skus: &[String],
    ) -> RepositoryResult<HashMap<String, ExistingProductRef>>;

    /// 插入新商品
    ///
    /// # 返回
    /// - Err(UniqueConstraintViolation): SKU 已被占用（并发导入）
    async fn insert_product(&self, product: &Product) -> RepositoryResult<()>;

    /// 按 SKU 整体替换可变字段（保留 id 与 created_at）
    ///
    /// # 返回
    /// - Ok(String): 被更新商品的 id
    /// - Err(NotFound): SKU 不存在或商品已归档
    async fn update_product_by_sku(
        &self,
        candidate: &CandidateProduct,
        updated_at: DateTime<Utc>,
    ) -> RepositoryResult<String>;

    async fn get_product_by_sku(&self, sku: &str) -> RepositoryResult<Option<Product>>;

    async fn count_products(&self) -> RepositoryResult<usize>;

    // ===== 批次审计 =====

    /// 插入导入批次记录
    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()>;

    /// 查询最近的导入批次（按导入时间倒序）
    ///
    /// # 参数
    /// - limit: 返回记录数限制
    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>>;
}
