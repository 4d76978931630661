// ==========================================
// 商品批量导入 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 Web 路由 / CLI 调用
// ==========================================

pub mod error;
pub mod import_api;
pub mod template_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::ImportApi;
pub use template_api::{TemplateApi, TemplateDownload, TEMPLATE_FILE_NAME, XLSX_CONTENT_TYPE};
