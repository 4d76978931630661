// ==========================================
// 商品批量导入 - 导入编排器实现
// ==========================================
// 职责: 整合导入流程，从上传文件到商品目录
// 流程: 解析 → 校验 → 协调 → 逐行落库 → 报告 + 批次审计
// 红线: 解析失败 / 目录查询失败时不发生任何写入；
//       单行写库失败不回滚已提交的行
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::{
    CandidateProduct, ColumnSchema, ImportBatch, ImportOutcome, ImportPhase, ImportReport,
    Product, ProductField, ReconcileDecision, ReconciledCandidate, RowOutcome, SkipReason,
    ValidationError,
};
use crate::importer::catalog_reconciler::CatalogReconcilerImpl;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::product_importer_trait::{
    CatalogReconciler, FileParser, ProductImporter, RowValidator,
};
use crate::importer::row_validator::RowValidatorImpl;
use crate::repository::{ProductImportRepository, RepositoryError};
use anyhow::Context;
use chrono::Utc;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ProductImporterImpl - 商品导入编排器
// ==========================================
pub struct ProductImporterImpl<R, C>
where
    R: ProductImportRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    import_repo: R,

    // 配置读取器
    config: C,

    // 列契约（与模板生成器共用）
    schema: ColumnSchema,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    row_validator: Box<dyn RowValidator>,
    catalog_reconciler: Box<dyn CatalogReconciler>,
}

impl<R, C> ProductImporterImpl<R, C>
where
    R: ProductImportRepository,
    C: ImportConfigReader,
{
    /// 创建新的 ProductImporter 实例
    ///
    /// # 参数
    /// - import_repo: 目录仓储
    /// - config: 配置读取器
    /// - schema: 列定义
    /// - file_parser: 文件解析器
    /// - row_validator: 行校验器
    /// - catalog_reconciler: 目录协调器
    pub fn new(
        import_repo: R,
        config: C,
        schema: ColumnSchema,
        file_parser: Box<dyn FileParser>,
        row_validator: Box<dyn RowValidator>,
        catalog_reconciler: Box<dyn CatalogReconciler>,
    ) -> Self {
        Self {
            import_repo,
            config,
            schema,
            file_parser,
            row_validator,
            catalog_reconciler,
        }
    }

    /// 使用标准列定义与默认组件
    pub fn with_defaults(import_repo: R, config: C) -> Self {
        Self::new(
            import_repo,
            config,
            ColumnSchema::products(),
            Box::new(UniversalFileParser),
            Box::new(RowValidatorImpl),
            Box::new(CatalogReconcilerImpl),
        )
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// 新建商品；SKU 已被并发导入占用时转为更新
    async fn create_product(&self, candidate: &CandidateProduct) -> ImportOutcome {
        let product = Product::from_candidate(candidate, Utc::now());
        match self.import_repo.insert_product(&product).await {
            Ok(()) => ImportOutcome::Created {
                product_id: product.id,
            },
            Err(RepositoryError::UniqueConstraintViolation(msg)) if candidate.sku.is_some() => {
                warn!(
                    row = candidate.source_row_index,
                    sku = ?candidate.sku,
                    detail = %msg,
                    "SKU 已被占用，改为更新"
                );
                self.update_product(candidate).await
            }
            Err(e) => {
                error!(row = candidate.source_row_index, error = %e, "商品写入失败");
                ImportOutcome::Failed {
                    errors: vec![ValidationError::persistence(
                        candidate.source_row_index,
                        e.to_string(),
                    )],
                }
            }
        }
    }

    async fn update_product(&self, candidate: &CandidateProduct) -> ImportOutcome {
        match self
            .import_repo
            .update_product_by_sku(candidate, Utc::now())
            .await
        {
            Ok(product_id) => ImportOutcome::Updated { product_id },
            Err(e) => {
                let message = match e {
                    RepositoryError::NotFound { .. } => {
                        "المنتج المطلوب تحديثه لم يعد موجوداً".to_string()
                    }
                    other => other.to_string(),
                };
                error!(row = candidate.source_row_index, sku = ?candidate.sku, error = %message, "商品更新失败");
                ImportOutcome::Failed {
                    errors: vec![ValidationError::persistence(
                        candidate.source_row_index,
                        message,
                    )],
                }
            }
        }
    }

    async fn persist(&self, item: ReconciledCandidate) -> RowOutcome {
        let ReconciledCandidate {
            candidate,
            decision,
        } = item;
        let sku = candidate.sku.clone();

        let outcome = match decision {
            ReconcileDecision::Create => self.create_product(&candidate).await,
            ReconcileDecision::Update { .. } => self.update_product(&candidate).await,
            ReconcileDecision::DuplicateInBatch { first_row_index } => {
                ImportOutcome::Skipped(SkipReason::DuplicateInBatch {
                    sku: sku.clone().unwrap_or_default(),
                    first_row_index,
                })
            }
            ReconcileDecision::ConflictsExisting { product_id } => {
                ImportOutcome::Skipped(SkipReason::ConflictsExisting {
                    sku: sku.clone().unwrap_or_default(),
                    product_id,
                })
            }
        };

        RowOutcome {
            row_index: candidate.source_row_index,
            sheet_row: candidate.sheet_row,
            sku,
            outcome,
        }
    }

    /// 写入批次审计记录（失败只记日志，不影响报告）
    async fn record_batch(
        &self,
        report: &ImportReport,
        file_name: Option<&str>,
        imported_by: Option<&str>,
    ) {
        let report_json = match serde_json::to_string(report) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!(error = %e, "报告序列化失败");
                None
            }
        };

        let batch = ImportBatch {
            batch_id: report.batch_id.clone(),
            file_name: file_name.map(|s| s.to_string()),
            imported_by: imported_by.map(|s| s.to_string()),
            total_rows: report.total_rows,
            created: report.created,
            updated: report.updated,
            skipped: report.skipped,
            failed: report.failed,
            status: report.status,
            imported_at: Utc::now(),
            elapsed_ms: report.elapsed_ms,
            report_json,
        };

        if let Err(e) = self.import_repo.insert_batch(&batch).await {
            error!(batch_id = %batch.batch_id, error = %e, "批次审计记录写入失败");
        }
    }
}

#[async_trait::async_trait]
impl<R, C> ProductImporter for ProductImporterImpl<R, C>
where
    R: ProductImportRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, file_bytes), fields(batch_id, size = file_bytes.len()))]
    async fn import_from_bytes(
        &self,
        file_bytes: &[u8],
        file_name: Option<&str>,
        imported_by: Option<&str>,
    ) -> ImportResult<ImportReport> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(batch_id = %batch_id, file_name = ?file_name, "开始导入商品数据");

        let settings = self.config.load_settings().await.map_err(|e| {
            error!(error = %e, "导入配置读取失败");
            ImportError::ConfigReadError(e.to_string())
        })?;

        // === 步骤 1: 解析文件 ===
        debug!(phase = ?ImportPhase::Parsing, "步骤 1: 解析文件");
        let raw_rows = self
            .file_parser
            .parse(file_bytes, &self.schema, settings.max_rows)
            .map_err(|e| {
                error!(error = %e, "文件解析失败");
                ImportError::Parse(e)
            })?;
        info!(total_rows = raw_rows.len(), "文件解析完成");

        // === 步骤 2: 逐行校验 ===
        debug!(phase = ?ImportPhase::Validating, "步骤 2: 逐行校验");
        let category_codes = self.import_repo.category_codes().await.map_err(|e| {
            error!(error = %e, "分类读取失败");
            ImportError::CatalogLookup(e.to_string())
        })?;

        let cleaner = DataCleaner;
        let mut outcomes: Vec<RowOutcome> = Vec::with_capacity(raw_rows.len());
        let mut candidates: Vec<CandidateProduct> = Vec::new();
        for row in &raw_rows {
            match self
                .row_validator
                .validate(row, &self.schema, &category_codes, &settings)
            {
                Ok(candidate) => candidates.push(candidate),
                Err(errors) => {
                    debug!(row = row.row_index, errors = errors.len(), "行校验失败");
                    outcomes.push(RowOutcome {
                        row_index: row.row_index,
                        sheet_row: row.sheet_row,
                        sku: cleaner
                            .cell_text(row.get(ProductField::Sku))
                            .map(|s| cleaner.clean_text(&s, true)),
                        outcome: ImportOutcome::Failed { errors },
                    });
                }
            }
        }
        info!(
            valid = candidates.len(),
            invalid = outcomes.len(),
            "行校验完成"
        );

        // === 步骤 3: 目录协调 ===
        debug!(phase = ?ImportPhase::Reconciling, "步骤 3: 目录协调");
        let skus: Vec<String> = candidates
            .iter()
            .filter_map(|c| c.sku.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let sku_index = self
            .import_repo
            .find_products_by_skus(&skus)
            .await
            .map_err(|e| {
                error!(error = %e, "SKU 索引读取失败");
                ImportError::CatalogLookup(e.to_string())
            })?;
        let reconciled = self.catalog_reconciler.reconcile(candidates, &sku_index);
        debug!(count = reconciled.len(), existing = sku_index.len(), "目录协调完成");

        // === 步骤 4: 逐行落库 ===
        debug!(phase = ?ImportPhase::Persisting, "步骤 4: 逐行落库");
        for item in reconciled {
            outcomes.push(self.persist(item).await);
        }

        // === 步骤 5: 汇总报告 ===
        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        let report = ImportReport::from_outcomes(batch_id, outcomes, elapsed_ms);
        self.record_batch(&report, file_name, imported_by).await;

        info!(
            phase = ?ImportPhase::Done,
            total = report.total_rows,
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            status = report.status.as_str(),
            elapsed_ms = elapsed_ms,
            "商品导入完成"
        );

        Ok(report)
    }

    async fn import_from_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        imported_by: Option<&str>,
    ) -> ImportResult<ImportReport> {
        let path = file_path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("读取文件失败: {}", path.display()))?;
        let file_name = path.file_name().and_then(|n| n.to_str());
        self.import_from_bytes(&bytes, file_name, imported_by).await
    }
}
