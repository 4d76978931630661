// ==========================================
// 商品批量导入 - 目录协调器
// ==========================================
// 阶段: Reconciling
// 规则: 按文件顺序建立批内 SKU 索引，首次出现者有效
//       SKU 不在目录 → Create；在目录 → Update；
//       目录商品已归档 → ConflictsExisting；无 SKU → Create
// ==========================================

use crate::domain::{CandidateProduct, ExistingProductRef, ReconcileDecision, ReconciledCandidate};
use crate::importer::product_importer_trait::CatalogReconciler;
use std::collections::HashMap;
use tracing::debug;

pub struct CatalogReconcilerImpl;

impl CatalogReconciler for CatalogReconcilerImpl {
    fn reconcile(
        &self,
        candidates: Vec<CandidateProduct>,
        existing_sku_index: &HashMap<String, ExistingProductRef>,
    ) -> Vec<ReconciledCandidate> {
        // SKU → 首次出现的行序号
        let mut batch_index: HashMap<String, usize> = HashMap::new();

        candidates
            .into_iter()
            .map(|candidate| {
                let decision = match candidate.sku.as_deref() {
                    None => ReconcileDecision::Create,
                    Some(sku) => {
                        if let Some(&first_row_index) = batch_index.get(sku) {
                            debug!(sku = sku, row = candidate.source_row_index, first_row_index, "批内 SKU 重复");
                            ReconcileDecision::DuplicateInBatch { first_row_index }
                        } else {
                            batch_index.insert(sku.to_string(), candidate.source_row_index);
                            match existing_sku_index.get(sku) {
                                None => ReconcileDecision::Create,
                                Some(existing) if existing.archived => {
                                    ReconcileDecision::ConflictsExisting {
                                        product_id: existing.id.clone(),
                                    }
                                }
                                Some(existing) => ReconcileDecision::Update {
                                    product_id: existing.id.clone(),
                                },
                            }
                        }
                    }
                };
                ReconciledCandidate { candidate, decision }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn candidate(row: usize, sku: Option<&str>) -> CandidateProduct {
        CandidateProduct {
            source_row_index: row,
            sheet_row: row + 1,
            sku: sku.map(|s| s.to_string()),
            name: format!("منتج {}", row),
            category_code: "CLOTHING".to_string(),
            price: 10.0,
            stock: 1,
            description: None,
            image_urls: vec![],
            attributes: BTreeMap::new(),
            published: true,
        }
    }

    fn existing(id: &str, sku: &str, archived: bool) -> (String, ExistingProductRef) {
        (
            sku.to_string(),
            ExistingProductRef {
                id: id.to_string(),
                sku: sku.to_string(),
                archived,
            },
        )
    }

    #[test]
    fn test_create_update_and_no_sku() {
        let index: HashMap<_, _> = [existing("p1", "A1", false)].into_iter().collect();
        let result = CatalogReconcilerImpl.reconcile(
            vec![candidate(1, Some("A1")), candidate(2, Some("B2")), candidate(3, None)],
            &index,
        );

        let decisions: Vec<_> = result.into_iter().map(|r| r.decision).collect();
        assert_eq!(
            decisions,
            vec![
                ReconcileDecision::Update { product_id: "p1".to_string() },
                ReconcileDecision::Create,
                ReconcileDecision::Create,
            ]
        );
    }

    #[test]
    fn test_duplicate_in_batch_first_wins() {
        let index: HashMap<_, _> = [existing("p1", "A1", false)].into_iter().collect();
        let result = CatalogReconcilerImpl.reconcile(
            vec![
                candidate(1, Some("A1")),
                candidate(2, None),
                candidate(3, Some("A1")),
                candidate(4, None),
            ],
            &index,
        );

        assert_eq!(result.len(), 4);
        assert_eq!(result[0].decision, ReconcileDecision::Update { product_id: "p1".to_string() });
        assert_eq!(result[2].decision, ReconcileDecision::DuplicateInBatch { first_row_index: 1 });
        // 无 SKU 的行互不冲突
        assert_eq!(result[3].decision, ReconcileDecision::Create);
    }

    #[test]
    fn test_archived_product_conflicts() {
        let index: HashMap<_, _> = [existing("p9", "OLD-1", true)].into_iter().collect();
        let result = CatalogReconcilerImpl.reconcile(vec![candidate(1, Some("OLD-1"))], &index);
        assert_eq!(
            result[0].decision,
            ReconcileDecision::ConflictsExisting { product_id: "p9".to_string() }
        );
    }
}
