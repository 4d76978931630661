// ==========================================
// 商品批量导入 - 商品领域模型
// ==========================================
// 职责: 原始行 / 候选商品 / 目录实体
// 用途: 导入层生成，仓储层读写
// ==========================================

use crate::domain::schema::ProductField;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// CellValue - 单元格原始值（未做类型转换）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Blank,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// 文本单元格：去除首尾空白，空串视为 Blank
    pub fn text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            CellValue::Blank
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Blank => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            // 整数值的浮点单元格（Excel 数字列）按整数输出，避免 "12345.0"
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

// ==========================================
// RawRow - 解析后的原始行
// ==========================================
// 生命周期: 仅存在于单次导入请求，校验后丢弃
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    /// 数据行序号（从 1 开始，不含表头与空行）
    pub row_index: usize,
    /// 表格中的物理行号（表头为第 1 行）
    pub sheet_row: usize,
    pub cells: BTreeMap<ProductField, CellValue>,
}

impl RawRow {
    pub fn new(row_index: usize, sheet_row: usize) -> Self {
        Self {
            row_index,
            sheet_row,
            cells: BTreeMap::new(),
        }
    }

    pub fn with_cell(mut self, field: ProductField, value: CellValue) -> Self {
        self.cells.insert(field, value);
        self
    }

    /// 取单元格；列缺失等同于空白
    pub fn get(&self, field: ProductField) -> &CellValue {
        self.cells.get(&field).unwrap_or(&CellValue::Blank)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(CellValue::is_blank)
    }
}

// ==========================================
// CandidateProduct - 校验通过的候选商品
// ==========================================
// 红线: 校验通过后不可变；只能整体进入协调阶段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProduct {
    pub source_row_index: usize,
    pub sheet_row: usize,
    pub sku: Option<String>,
    pub name: String,
    pub category_code: String,
    pub price: f64,
    pub stock: u32,
    pub description: Option<String>,
    pub image_urls: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub published: bool,
}

// ==========================================
// Category - 商品分类（只读）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub code: String,
    pub name: String,
}

// ==========================================
// Product - 目录中的商品实体
// ==========================================
// 对齐: product 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub sku: Option<String>,
    pub name: String,
    pub category_code: String,
    pub price: f64,
    pub stock: u32,
    pub description: Option<String>,
    pub image_urls: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub published: bool,
    /// 已归档商品不接受导入覆盖
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// 由候选商品创建新实体（生成新 ID）
    pub fn from_candidate(candidate: &CandidateProduct, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sku: candidate.sku.clone(),
            name: candidate.name.clone(),
            category_code: candidate.category_code.clone(),
            price: candidate.price,
            stock: candidate.stock,
            description: candidate.description.clone(),
            image_urls: candidate.image_urls.clone(),
            attributes: candidate.attributes.clone(),
            published: candidate.published,
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }
}

// ==========================================
// ExistingProductRef - SKU 索引条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingProductRef {
    pub id: String,
    pub sku: String,
    pub archived: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text_trims_and_blanks() {
        assert_eq!(CellValue::text("  abc "), CellValue::Text("abc".to_string()));
        assert_eq!(CellValue::text("   "), CellValue::Blank);
    }

    #[test]
    fn test_cell_display_integral_number() {
        assert_eq!(CellValue::Number(12345.0).to_string(), "12345");
        assert_eq!(CellValue::Number(49.9).to_string(), "49.9");
    }

    #[test]
    fn test_raw_row_missing_cell_is_blank() {
        let row = RawRow::new(1, 2).with_cell(ProductField::Name, CellValue::text("x"));
        assert!(row.get(ProductField::Price).is_blank());
        assert!(!row.is_blank());
        assert!(RawRow::new(2, 3).is_blank());
    }
}
