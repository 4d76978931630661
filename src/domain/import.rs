// ==========================================
// 商品批量导入 - 导入结果模型
// ==========================================
// 职责: 行级错误 / 协调决策 / 行结果 / 批次报告
// 红线: 先写库后报告；报告中不存在无记录的写入
// ==========================================

use crate::domain::product::CandidateProduct;
use crate::domain::schema::ProductField;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ErrorCode - 行级错误码
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    MissingRequired,
    InvalidNumber,
    UnknownCategory,
    InvalidName,
    InvalidSku,
    InvalidImageUrl,
    InvalidAttributes,
    InvalidBoolean,
    InvalidDescription,
    /// 写库失败（与校验错误码区分）
    PersistenceFailed,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 非字段级错误（如写库失败）使用的字段名
pub const ROW_FIELD: &str = "row";

// ==========================================
// ValidationError - 行级错误
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub row_index: usize,
    pub field: String,
    pub code: ErrorCode,
    pub message: String,
}

impl ValidationError {
    pub fn new(row_index: usize, field: ProductField, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            row_index,
            field: field.key().to_string(),
            code,
            message: message.into(),
        }
    }

    pub fn persistence(row_index: usize, message: impl Into<String>) -> Self {
        Self {
            row_index,
            field: ROW_FIELD.to_string(),
            code: ErrorCode::PersistenceFailed,
            message: message.into(),
        }
    }
}

// ==========================================
// ReconcileDecision - 协调决策
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconcileDecision {
    Create,
    Update { product_id: String },
    /// 同批次内 SKU 重复，保留首次出现的行
    DuplicateInBatch { first_row_index: usize },
    /// SKU 对应的目录商品已归档
    ConflictsExisting { product_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledCandidate {
    pub candidate: CandidateProduct,
    pub decision: ReconcileDecision,
}

// ==========================================
// SkipReason / ImportOutcome - 行结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    DuplicateInBatch { sku: String, first_row_index: usize },
    ConflictsExisting { sku: String, product_id: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DuplicateInBatch { sku, first_row_index } => {
                write!(f, "تكرار رمز المنتج {} (ورد أولاً في الصف {})", sku, first_row_index)
            }
            SkipReason::ConflictsExisting { sku, .. } => {
                write!(f, "رمز المنتج {} يخص منتجاً مؤرشفاً", sku)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportOutcome {
    Created { product_id: String },
    Updated { product_id: String },
    Skipped(SkipReason),
    Failed { errors: Vec<ValidationError> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowOutcome {
    pub row_index: usize,
    pub sheet_row: usize,
    pub sku: Option<String>,
    pub outcome: ImportOutcome,
}

// ==========================================
// BatchStatus / ImportReport - 批次报告
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Success,
    PartialSuccess,
    Failure,
}

impl BatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchStatus::Success => "SUCCESS",
            BatchStatus::PartialSuccess => "PARTIAL_SUCCESS",
            BatchStatus::Failure => "FAILURE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "SUCCESS" => Some(BatchStatus::Success),
            "PARTIAL_SUCCESS" => Some(BatchStatus::PartialSuccess),
            "FAILURE" => Some(BatchStatus::Failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String,
    pub total_rows: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub status: BatchStatus,
    pub outcomes: Vec<RowOutcome>,
    pub elapsed_ms: u64,
}

impl ImportReport {
    /// 由行结果汇总；行结果按 row_index 排序
    pub fn from_outcomes(batch_id: String, mut outcomes: Vec<RowOutcome>, elapsed_ms: u64) -> Self {
        outcomes.sort_by_key(|o| o.row_index);

        let mut created = 0;
        let mut updated = 0;
        let mut skipped = 0;
        let mut failed = 0;
        for o in &outcomes {
            match o.outcome {
                ImportOutcome::Created { .. } => created += 1,
                ImportOutcome::Updated { .. } => updated += 1,
                ImportOutcome::Skipped(_) => skipped += 1,
                ImportOutcome::Failed { .. } => failed += 1,
            }
        }

        let succeeded = created + updated;
        let status = if skipped + failed == 0 {
            BatchStatus::Success
        } else if succeeded == 0 {
            BatchStatus::Failure
        } else {
            BatchStatus::PartialSuccess
        };

        Self {
            batch_id,
            total_rows: outcomes.len(),
            created,
            updated,
            skipped,
            failed,
            status,
            outcomes,
            elapsed_ms,
        }
    }

    /// 失败行的全部错误（便于商户一次性修正）
    pub fn errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.outcomes.iter().flat_map(|o| match &o.outcome {
            ImportOutcome::Failed { errors } => errors.as_slice(),
            _ => &[],
        })
    }

    pub fn outcome_for_row(&self, row_index: usize) -> Option<&ImportOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.row_index == row_index)
            .map(|o| &o.outcome)
    }
}

// ==========================================
// ImportPhase - 编排器状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportPhase {
    Parsing,
    Validating,
    Reconciling,
    Persisting,
    Done,
}

// ==========================================
// ImportBatch - 导入批次审计记录
// ==========================================
// 对齐: import_batch 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,
    pub file_name: Option<String>,
    pub imported_by: Option<String>,
    pub total_rows: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub status: BatchStatus,
    pub imported_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub report_json: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(row_index: usize, outcome: ImportOutcome) -> RowOutcome {
        RowOutcome {
            row_index,
            sheet_row: row_index + 1,
            sku: None,
            outcome,
        }
    }

    #[test]
    fn test_report_counts_and_partial_status() {
        let report = ImportReport::from_outcomes(
            "B1".to_string(),
            vec![
                outcome(2, ImportOutcome::Failed {
                    errors: vec![ValidationError::persistence(2, "disk full")],
                }),
                outcome(1, ImportOutcome::Created { product_id: "p1".to_string() }),
                outcome(3, ImportOutcome::Updated { product_id: "p2".to_string() }),
            ],
            5,
        );

        assert_eq!(report.total_rows, 3);
        assert_eq!(report.created, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.status, BatchStatus::PartialSuccess);
        assert_eq!(report.outcomes[0].row_index, 1);
        assert_eq!(report.errors().count(), 1);
    }

    #[test]
    fn test_empty_report_is_success() {
        let report = ImportReport::from_outcomes("B2".to_string(), Vec::new(), 0);
        assert_eq!(report.total_rows, 0);
        assert_eq!(report.status, BatchStatus::Success);
    }

    #[test]
    fn test_all_failed_is_failure() {
        let report = ImportReport::from_outcomes(
            "B3".to_string(),
            vec![outcome(1, ImportOutcome::Failed { errors: vec![] })],
            0,
        );
        assert_eq!(report.status, BatchStatus::Failure);
    }

    #[test]
    fn test_batch_status_round_trip_str() {
        for s in [BatchStatus::Success, BatchStatus::PartialSuccess, BatchStatus::Failure] {
            assert_eq!(BatchStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(BatchStatus::parse("OTHER"), None);
    }
}
