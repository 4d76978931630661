// ==========================================
// 商品批量导入 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 店铺后台的商品目录批量导入（阿拉伯语商户）
// 流程: 模板下载 → 商户填表 → 上传 → 逐行报告
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 列契约 / 商品 / 导入结果
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 模板生成与导入管道
pub mod importer;

// 配置层 - 导入限制
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    BatchStatus, CandidateProduct, Category, ColumnSchema, ErrorCode, ImportOutcome,
    ImportReport, Product, RawRow, ValidationError,
};

// 导入器
pub use importer::{ProductImporter, ProductImporterImpl, XlsxTemplateGenerator};

// API
pub use api::{ImportApi, TemplateApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "استيراد المنتجات";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
