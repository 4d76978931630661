// ==========================================
// 商品批量导入 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换导入 / 仓储错误为调用方可区分的错误
// 说明: InvalidInput / ImportRejected 属于客户端问题，其余为服务端问题
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 客户端错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// 文件级致命错误（解析失败 / 缺列 / 行数超限），未产生报告
    #[error("导入被拒绝: {0}")]
    ImportRejected(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 是否由调用方输入导致（对应 4xx）
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidInput(_) | ApiError::ImportRejected(_) | ApiError::NotFound(_)
        )
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Parse(e) => ApiError::ImportRejected(e.to_string()),
            ImportError::CatalogLookup(msg) => ApiError::DatabaseError(msg),
            ImportError::ConfigReadError(msg) => {
                ApiError::InternalError(format!("配置读取失败: {}", msg))
            }
            ImportError::Template(msg) => ApiError::InternalError(format!("模板生成失败: {}", msg)),
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
            ImportError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::error::ParseError;

    #[test]
    fn test_parse_error_is_rejection() {
        let api_err: ApiError = ImportError::Parse(ParseError::TooManyRows { max: 10 }).into();
        match &api_err {
            ApiError::ImportRejected(msg) => assert!(msg.contains("10")),
            other => panic!("Expected ImportRejected, got {:?}", other),
        }
        assert!(api_err.is_client_error());
    }

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "Product".to_string(),
            id: "SKU-1".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Product"));
                assert!(msg.contains("SKU-1"));
            }
            _ => panic!("Expected NotFound"),
        }

        let api_err: ApiError = RepositoryError::DatabaseQueryError("disk".to_string()).into();
        assert!(!api_err.is_client_error());
    }
}
