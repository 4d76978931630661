// ==========================================
// 商品批量导入 - 应用层
// ==========================================
// 职责: 组装 API 实例，供 Web 服务 / CLI 使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
