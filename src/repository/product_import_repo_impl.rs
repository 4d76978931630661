// ==========================================
// 商品批量导入 - 目录 Repository 实现
// ==========================================
// 职责: 实现导入相关数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 存储: image_urls / attributes 以 JSON 文本列保存
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{
    BatchStatus, CandidateProduct, Category, ExistingProductRef, ImportBatch, Product,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::product_import_repo::ProductImportRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// SQLite 单条语句的参数上限以内分块查询
const SKU_LOOKUP_CHUNK: usize = 500;

const PRODUCT_COLUMNS: &str = "id, sku, name, category_code, price, stock, description, \
     image_urls_json, attributes_json, published, archived, created_at, updated_at";

fn json_column<T: serde::de::DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn time_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_product(row: &Row) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        sku: row.get(1)?,
        name: row.get(2)?,
        category_code: row.get(3)?,
        price: row.get(4)?,
        stock: row.get::<_, i64>(5)? as u32,
        description: row.get(6)?,
        image_urls: json_column(row, 7)?,
        attributes: json_column(row, 8)?,
        published: row.get::<_, i64>(9)? != 0,
        archived: row.get::<_, i64>(10)? != 0,
        created_at: time_column(row, 11)?,
        updated_at: time_column(row, 12)?,
    })
}

fn map_batch(row: &Row) -> rusqlite::Result<ImportBatch> {
    let status_raw: String = row.get(8)?;
    Ok(ImportBatch {
        batch_id: row.get(0)?,
        file_name: row.get(1)?,
        imported_by: row.get(2)?,
        total_rows: row.get::<_, i64>(3)? as usize,
        created: row.get::<_, i64>(4)? as usize,
        updated: row.get::<_, i64>(5)? as usize,
        skipped: row.get::<_, i64>(6)? as usize,
        failed: row.get::<_, i64>(7)? as usize,
        // 未知状态按失败处理，避免历史数据无法读取
        status: BatchStatus::parse(&status_raw).unwrap_or(BatchStatus::Failure),
        imported_at: time_column(row, 9)?,
        elapsed_ms: row.get::<_, i64>(10)? as u64,
        report_json: row.get(11)?,
    })
}

// ==========================================
// ProductImportRepositoryImpl
// ==========================================
pub struct ProductImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ProductImportRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(format!("锁获取失败: {}", e)))
    }
}

#[async_trait]
impl ProductImportRepository for ProductImportRepositoryImpl {
    async fn list_categories(&self) -> RepositoryResult<Vec<Category>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT code, name FROM category ORDER BY code")?;
        let categories = stmt
            .query_map([], |row| {
                Ok(Category {
                    code: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    async fn category_codes(&self) -> RepositoryResult<HashSet<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT code FROM category")?;
        let codes = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|code| code.map(|c| c.trim().to_uppercase()))
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(codes)
    }

    async fn upsert_category(&self, category: &Category) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO category (code, name) VALUES (?1, ?2)
            ON CONFLICT(code) DO UPDATE SET name = excluded.name
            "#,
            params![category.code.trim().to_uppercase(), category.name],
        )?;
        Ok(())
    }

    async fn find_products_by_skus(
        &self,
        skus: &[String],
    ) -> RepositoryResult<HashMap<String, ExistingProductRef>> {
        let conn = self.get_conn()?;
        let mut index = HashMap::new();

        for chunk in skus.chunks(SKU_LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT id, sku, archived FROM product WHERE sku IN ({})",
                placeholders
            );
            let mut stmt = conn.prepare(&sql)?;
            let refs = stmt
                .query_map(params_from_iter(chunk.iter()), |row| {
                    Ok(ExistingProductRef {
                        id: row.get(0)?,
                        sku: row.get(1)?,
                        archived: row.get::<_, i64>(2)? != 0,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            for r in refs {
                index.insert(r.sku.to_uppercase(), r);
            }
        }

        Ok(index)
    }

    async fn insert_product(&self, product: &Product) -> RepositoryResult<()> {
        let image_urls_json = serde_json::to_string(&product.image_urls)?;
        let attributes_json = serde_json::to_string(&product.attributes)?;

        let conn = self.get_conn()?;
        conn.execute(
            &format!(
                "INSERT INTO product ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                PRODUCT_COLUMNS
            ),
            params![
                product.id,
                product.sku,
                product.name,
                product.category_code,
                product.price,
                product.stock as i64,
                product.description,
                image_urls_json,
                attributes_json,
                product.published as i32,
                product.archived as i32,
                product.created_at.to_rfc3339(),
                product.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn update_product_by_sku(
        &self,
        candidate: &CandidateProduct,
        updated_at: DateTime<Utc>,
    ) -> RepositoryResult<String> {
        let sku = candidate.sku.as_deref().ok_or_else(|| RepositoryError::FieldValueError {
            field: "sku".to_string(),
            message: "更新商品需要 SKU".to_string(),
        })?;
        let image_urls_json = serde_json::to_string(&candidate.image_urls)?;
        let attributes_json = serde_json::to_string(&candidate.attributes)?;

        let conn = self.get_conn()?;
        let product_id: Option<String> = conn
            .query_row(
                r#"
                UPDATE product SET
                    name = ?2, category_code = ?3, price = ?4, stock = ?5,
                    description = ?6, image_urls_json = ?7, attributes_json = ?8,
                    published = ?9, updated_at = ?10
                WHERE sku = ?1 AND archived = 0
                RETURNING id
                "#,
                params![
                    sku,
                    candidate.name,
                    candidate.category_code,
                    candidate.price,
                    candidate.stock as i64,
                    candidate.description,
                    image_urls_json,
                    attributes_json,
                    candidate.published as i32,
                    updated_at.to_rfc3339(),
                ],
                |row| row.get(0),
            )
            .optional()?;

        product_id.ok_or_else(|| RepositoryError::NotFound {
            entity: "Product".to_string(),
            id: sku.to_string(),
        })
    }

    async fn get_product_by_sku(&self, sku: &str) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let product = conn
            .query_row(
                &format!("SELECT {} FROM product WHERE sku = ?1", PRODUCT_COLUMNS),
                params![sku],
                map_product,
            )
            .optional()?;
        Ok(product)
    }

    async fn count_products(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM product", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, file_name, imported_by, total_rows,
                created_rows, updated_rows, skipped_rows, failed_rows,
                status, imported_at, elapsed_ms, report_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                batch.batch_id,
                batch.file_name,
                batch.imported_by,
                batch.total_rows as i64,
                batch.created as i64,
                batch.updated as i64,
                batch.skipped as i64,
                batch.failed as i64,
                batch.status.as_str(),
                batch.imported_at.to_rfc3339(),
                batch.elapsed_ms as i64,
                batch.report_json,
            ],
        )?;
        Ok(())
    }

    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, file_name, imported_by, total_rows,
                   created_rows, updated_rows, skipped_rows, failed_rows,
                   status, imported_at, elapsed_ms, report_json
            FROM import_batch
            ORDER BY imported_at DESC
            LIMIT ?1
            "#,
        )?;
        let batches = stmt
            .query_map(params![limit as i64], map_batch)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use std::collections::BTreeMap;
    use tempfile::NamedTempFile;

    fn setup() -> (NamedTempFile, ProductImportRepositoryImpl) {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = open_sqlite_connection(temp_file.path().to_str().unwrap()).unwrap();
        init_schema(&conn).unwrap();
        let repo = ProductImportRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)));
        (temp_file, repo)
    }

    fn candidate(sku: &str, price: f64) -> CandidateProduct {
        CandidateProduct {
            source_row_index: 1,
            sheet_row: 2,
            sku: Some(sku.to_string()),
            name: "حذاء رياضي".to_string(),
            category_code: "SHOES".to_string(),
            price,
            stock: 4,
            description: None,
            image_urls: vec!["https://cdn.test/a.jpg".to_string()],
            attributes: BTreeMap::from([("المقاس".to_string(), "42".to_string())]),
            published: true,
        }
    }

    async fn seed_category(repo: &ProductImportRepositoryImpl) {
        repo.upsert_category(&Category {
            code: "SHOES".to_string(),
            name: "أحذية".to_string(),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_insert_and_find_by_sku() {
        let (_tmp, repo) = setup();
        seed_category(&repo).await;

        let product = Product::from_candidate(&candidate("SH-1", 120.0), Utc::now());
        repo.insert_product(&product).await.unwrap();

        let index = repo
            .find_products_by_skus(&["SH-1".to_string(), "SH-404".to_string()])
            .await
            .unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index["SH-1"].id, product.id);

        let loaded = repo.get_product_by_sku("SH-1").await.unwrap().unwrap();
        assert_eq!(loaded.attributes.get("المقاس"), Some(&"42".to_string()));
        assert_eq!(loaded.image_urls, product.image_urls);
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_unique_violation() {
        let (_tmp, repo) = setup();
        seed_category(&repo).await;

        let first = Product::from_candidate(&candidate("SH-1", 120.0), Utc::now());
        repo.insert_product(&first).await.unwrap();
        let second = Product::from_candidate(&candidate("SH-1", 90.0), Utc::now());

        let err = repo.insert_product(&second).await.unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_update_preserves_identity() {
        let (_tmp, repo) = setup();
        seed_category(&repo).await;

        let product = Product::from_candidate(&candidate("SH-1", 120.0), Utc::now());
        repo.insert_product(&product).await.unwrap();

        let id = repo
            .update_product_by_sku(&candidate("SH-1", 99.5), Utc::now())
            .await
            .unwrap();
        assert_eq!(id, product.id);

        let loaded = repo.get_product_by_sku("SH-1").await.unwrap().unwrap();
        assert_eq!(loaded.price, 99.5);
        assert_eq!(loaded.created_at.timestamp(), product.created_at.timestamp());
    }

    #[tokio::test]
    async fn test_update_missing_sku_not_found() {
        let (_tmp, repo) = setup();
        let err = repo
            .update_product_by_sku(&candidate("GONE", 1.0), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_codes_and_skus_match_case_insensitively() {
        let (_tmp, repo) = setup();
        {
            let conn = repo.get_conn().unwrap();
            conn.execute("INSERT INTO category (code, name) VALUES ('shoes', 'أحذية')", [])
                .unwrap();
        }
        assert!(repo.category_codes().await.unwrap().contains("SHOES"));

        let mut product = Product::from_candidate(&candidate("sh-1", 120.0), Utc::now());
        product.category_code = "shoes".to_string();
        repo.insert_product(&product).await.unwrap();

        let index = repo.find_products_by_skus(&["SH-1".to_string()]).await.unwrap();
        assert_eq!(index["SH-1"].id, product.id);

        // 大写 SKU 与已有小写 SKU 冲突
        let upper = Product::from_candidate(&candidate("SH-1", 90.0), Utc::now());
        let err = repo.insert_product(&upper).await.unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));

        let id = repo
            .update_product_by_sku(&candidate("SH-1", 99.0), Utc::now())
            .await
            .unwrap();
        assert_eq!(id, product.id);
    }

    #[tokio::test]
    async fn test_upsert_category_normalizes_code() {
        let (_tmp, repo) = setup();
        repo.upsert_category(&Category {
            code: " bags ".to_string(),
            name: "حقائب".to_string(),
        })
        .await
        .unwrap();

        let categories = repo.list_categories().await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].code, "BAGS");
    }

    #[tokio::test]
    async fn test_unknown_category_is_foreign_key_violation() {
        let (_tmp, repo) = setup();
        let product = Product::from_candidate(&candidate("SH-1", 1.0), Utc::now());
        let err = repo.insert_product(&product).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
    }
}
