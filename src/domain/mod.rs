// ==========================================
// 商品批量导入 - 领域模型层
// ==========================================
// 职责: 定义列契约、商品实体、导入结果类型
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod import;
pub mod product;
pub mod schema;

// 重导出核心类型
pub use import::{
    BatchStatus, ErrorCode, ImportBatch, ImportOutcome, ImportPhase, ImportReport,
    ReconcileDecision, ReconciledCandidate, RowOutcome, SkipReason, ValidationError,
};
pub use product::{CandidateProduct, Category, CellValue, ExistingProductRef, Product, RawRow};
pub use schema::{ColumnDef, ColumnSchema, ColumnType, ProductField};
