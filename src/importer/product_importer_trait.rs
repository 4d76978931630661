// ==========================================
// 商品批量导入 - 导入组件 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 流程: 模板 → 解析 → 校验 → 协调 → 落库
// ==========================================

use crate::config::ImportSettings;
use crate::domain::{
    CandidateProduct, Category, ColumnSchema, ExistingProductRef, ImportReport, RawRow,
    ReconciledCandidate, ValidationError,
};
use crate::importer::error::{ImportResult, ParseError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;

// ==========================================
// ProductImporter Trait
// ==========================================
// 用途: 商品导入主接口（编排器）
// 实现者: ProductImporterImpl
#[async_trait]
pub trait ProductImporter: Send + Sync {
    /// 导入一个已上传的表格文件
    ///
    /// # 参数
    /// - file_bytes: 文件内容（已通过鉴权）
    /// - file_name: 原始文件名（仅用于格式提示与审计）
    /// - imported_by: 操作人（审计）
    ///
    /// # 返回
    /// - Ok(ImportReport): 逐行结果（即使全部行失败）
    /// - Err: 文件级致命错误，未发生任何写入
    ///
    /// # 导入流程
    /// 1. Parsing: 解析文件 → RawRow
    /// 2. Validating: 逐行校验 → CandidateProduct / 错误列表
    /// 3. Reconciling: SKU 协调 → Create / Update / 跳过
    /// 4. Persisting: 逐行写库
    /// 5. Done: 汇总报告 + 批次审计
    async fn import_from_bytes(
        &self,
        file_bytes: &[u8],
        file_name: Option<&str>,
        imported_by: Option<&str>,
    ) -> ImportResult<ImportReport>;

    /// 从本地文件导入（CLI / 测试）
    async fn import_from_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        imported_by: Option<&str>,
    ) -> ImportResult<ImportReport>;
}

// ==========================================
// TemplateGenerator Trait
// ==========================================
// 实现者: XlsxTemplateGenerator
pub trait TemplateGenerator: Send + Sync {
    /// 生成导入模板
    ///
    /// # 参数
    /// - schema: 列定义
    /// - categories: 可选分类参考表（为空时不生成参考页）
    fn generate_template(
        &self,
        schema: &ColumnSchema,
        categories: &[Category],
    ) -> ImportResult<Vec<u8>>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: ExcelParser, CsvParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行
    ///
    /// # 返回
    /// - Ok(Vec<RawRow>): 数据行（已跳过表头、空行、模板示例行）
    /// - Err(ParseError): 文件不可读 / 缺列 / 行数超限
    fn parse(
        &self,
        file_bytes: &[u8],
        schema: &ColumnSchema,
        max_rows: usize,
    ) -> Result<Vec<RawRow>, ParseError>;
}

// ==========================================
// RowValidator Trait
// ==========================================
// 实现者: RowValidatorImpl
pub trait RowValidator: Send + Sync {
    /// 校验单行（报告全部违规字段，而非第一个）
    ///
    /// # 返回
    /// - Ok(CandidateProduct): 无任何错误
    /// - Err(Vec<ValidationError>): 至少一个错误，整行不转换
    fn validate(
        &self,
        row: &RawRow,
        schema: &ColumnSchema,
        existing_category_codes: &HashSet<String>,
        settings: &ImportSettings,
    ) -> Result<CandidateProduct, Vec<ValidationError>>;
}

// ==========================================
// CatalogReconciler Trait
// ==========================================
// 实现者: CatalogReconcilerImpl
pub trait CatalogReconciler: Send + Sync {
    /// 协调候选商品与现有目录
    ///
    /// # 参数
    /// - candidates: 按文件顺序排列的候选商品
    /// - existing_sku_index: SKU → 目录商品
    ///
    /// # 返回
    /// - 与输入同序的决策列表
    fn reconcile(
        &self,
        candidates: Vec<CandidateProduct>,
        existing_sku_index: &HashMap<String, ExistingProductRef>,
    ) -> Vec<ReconciledCandidate>;
}
