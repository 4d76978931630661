// ==========================================
// 商品批量导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 这里只放“整批拒绝”的致命错误；
//       行级错误进入 ImportReport，不走 Err 通道
// ==========================================

use thiserror::Error;

/// 文件级解析错误（整批拒绝，不产生报告）
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("文件为空")]
    EmptyFile,

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("工作簿无工作表或无表头行")]
    EmptyWorkbook,

    #[error("缺少必填列: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("数据行数超出上限: 最多 {max} 行")]
    TooManyRows { max: usize },
}

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("文件解析失败: {0}")]
    Parse(#[from] ParseError),

    // 分类 / SKU 索引读取失败发生在任何写入之前，整批拒绝
    #[error("目录查询失败: {0}")]
    CatalogLookup(String),

    #[error("配置读取失败: {0}")]
    ConfigReadError(String),

    #[error("模板生成失败: {0}")]
    Template(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        ParseError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for ParseError {
    fn from(err: calamine::Error) -> Self {
        ParseError::ExcelParseError(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ImportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ImportError::Template(err.to_string())
    }
}

impl ImportError {
    /// 是否为文件本身的问题（调用方据此区分 4xx / 5xx）
    pub fn is_parse_error(&self) -> bool {
        matches!(self, ImportError::Parse(_))
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
