// ==========================================
// 商品批量导入 - 导入层
// ==========================================
// 职责: 模板生成 + 上传文件 → 商品目录
// 支持: Excel (.xlsx/.xls), CSV
// ==========================================

// 模块声明
pub mod catalog_reconciler;
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod product_importer_impl;
pub mod product_importer_trait;
pub mod row_validator;
pub mod template_generator;

// 重导出核心类型
pub use catalog_reconciler::CatalogReconcilerImpl;
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult, ParseError};
pub use field_mapper::{FieldMapper, HeaderMap};
pub use file_parser::{CsvParser, ExcelParser, SpreadsheetFormat, UniversalFileParser};
pub use product_importer_impl::ProductImporterImpl;
pub use row_validator::RowValidatorImpl;
pub use template_generator::XlsxTemplateGenerator;

// 重导出 Trait 接口
pub use product_importer_trait::{
    CatalogReconciler, FileParser, ProductImporter, RowValidator, TemplateGenerator,
};
