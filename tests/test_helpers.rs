// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、分类种子数据、工作簿构造
// ==========================================

#![allow(dead_code)]

use catalog_import::config::ConfigManager;
use catalog_import::db::{init_schema, open_sqlite_connection};
use catalog_import::domain::{Category, ColumnSchema};
use catalog_import::importer::ProductImporterImpl;
use catalog_import::repository::{ProductImportRepository, ProductImportRepositoryImpl};
use rust_xlsxwriter::Workbook;
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("invalid temp path")?.to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 写入标准测试分类
pub async fn seed_categories(db_path: &str) -> Result<(), Box<dyn Error>> {
    let repo = ProductImportRepositoryImpl::new(db_path)?;
    for (code, name) in [("CLOTHING", "ملابس"), ("SHOES", "أحذية"), ("BAGS", "حقائب")] {
        repo.upsert_category(&Category {
            code: code.to_string(),
            name: name.to_string(),
        })
        .await?;
    }
    Ok(())
}

/// 创建测试用的 ProductImporter 实例
pub fn create_test_importer(
    db_path: &str,
) -> ProductImporterImpl<ProductImportRepositoryImpl, ConfigManager> {
    let import_repo =
        ProductImportRepositoryImpl::new(db_path).expect("Failed to create ProductImportRepository");
    let config = ConfigManager::new(db_path).expect("Failed to create ConfigManager");
    ProductImporterImpl::with_defaults(import_repo, config)
}

/// 标准表头（阿拉伯语标签）
pub fn product_headers() -> Vec<String> {
    ColumnSchema::products()
        .headers()
        .into_iter()
        .map(|h| h.to_string())
        .collect()
}

/// 构造 .xlsx：第一行为表头；能解析为数字的单元格写为数字，空串不写
pub fn build_xlsx(header: &[String], rows: &[Vec<&str>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, h) in header.iter().enumerate() {
        sheet.write_string(0, col as u16, h).expect("write header");
    }
    for (r, row) in rows.iter().enumerate() {
        let sheet_row = r as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            match value.parse::<f64>() {
                Ok(n) => sheet.write_number(sheet_row, col as u16, n).expect("write number"),
                Err(_) => sheet.write_string(sheet_row, col as u16, *value).expect("write string"),
            };
        }
    }

    workbook.save_to_buffer().expect("save workbook")
}

/// 仅含必填列的一行：sku, name, category_code, price, stock
pub fn product_row<'a>(sku: &'a str, name: &'a str, category: &'a str, price: &'a str, stock: &'a str) -> Vec<&'a str> {
    vec![sku, name, category, price, stock]
}

/// 必填列表头（与 product_row 对应）
pub fn required_headers() -> Vec<String> {
    product_headers().into_iter().take(5).collect()
}
