// ==========================================
// 商品批量导入 - 模板列定义 (ColumnSchema)
// ==========================================
// 职责: 模板生成器与文件解析器共用的列契约
// 红线: 表头文本一经发布不得修改（已下发模板依赖它）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ProductField - 商品导入字段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductField {
    Sku,
    Name,
    CategoryCode,
    Price,
    Stock,
    Description,
    ImageUrls,
    Attributes,
    Published,
}

impl ProductField {
    /// 机器可读的列键（同时作为表头别名）
    pub fn key(self) -> &'static str {
        match self {
            ProductField::Sku => "sku",
            ProductField::Name => "name",
            ProductField::CategoryCode => "category_code",
            ProductField::Price => "price",
            ProductField::Stock => "stock",
            ProductField::Description => "description",
            ProductField::ImageUrls => "image_urls",
            ProductField::Attributes => "attributes",
            ProductField::Published => "published",
        }
    }
}

impl fmt::Display for ProductField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ==========================================
// ColumnType - 单元格类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Number,
    /// 取值受限（如分类代码），有效值在运行时由目录提供
    Enum,
    Boolean,
}

// ==========================================
// ColumnDef - 单列定义
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    pub field: ProductField,
    pub header: String,
    pub required: bool,
    pub column_type: ColumnType,
    /// 固定枚举值；为 None 时由调用方提供（分类代码）
    pub enum_values: Option<Vec<String>>,
    /// 模板示例行中的取值
    pub example: String,
    /// 额外接受的表头写法（不区分大小写）
    pub aliases: Vec<String>,
}

impl ColumnDef {
    fn new(
        field: ProductField,
        header: &str,
        required: bool,
        column_type: ColumnType,
        example: &str,
    ) -> Self {
        Self {
            field,
            header: header.to_string(),
            required,
            column_type,
            enum_values: None,
            example: example.to_string(),
            aliases: vec![field.key().to_string()],
        }
    }

    fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases.extend(aliases.iter().map(|a| a.to_string()));
        self
    }

    /// 判断表头单元格是否指向本列
    pub fn matches_header(&self, raw_header: &str) -> bool {
        let header = raw_header.trim();
        if header == self.header {
            return true;
        }
        let lowered = header.to_lowercase();
        self.aliases.iter().any(|a| a.to_lowercase() == lowered)
    }
}

// ==========================================
// ColumnSchema - 有序列集合
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSchema {
    columns: Vec<ColumnDef>,
}

impl ColumnSchema {
    /// 商品导入标准列（顺序即模板列顺序）
    pub fn products() -> Self {
        Self {
            columns: vec![
                ColumnDef::new(ProductField::Sku, "رمز المنتج (SKU)", false, ColumnType::Text, "TSHIRT-001")
                    .with_aliases(&["SKU"]),
                ColumnDef::new(ProductField::Name, "اسم المنتج", true, ColumnType::Text, "قميص قطني أبيض")
                    .with_aliases(&["product name"]),
                ColumnDef::new(ProductField::CategoryCode, "رمز التصنيف", true, ColumnType::Enum, "CLOTHING")
                    .with_aliases(&["category"]),
                ColumnDef::new(ProductField::Price, "السعر", true, ColumnType::Number, "49.90"),
                ColumnDef::new(ProductField::Stock, "الكمية المتوفرة", true, ColumnType::Number, "25")
                    .with_aliases(&["quantity", "qty"]),
                ColumnDef::new(ProductField::Description, "الوصف", false, ColumnType::Text, "قميص قطني 100% بأكمام قصيرة"),
                ColumnDef::new(
                    ProductField::ImageUrls,
                    "روابط الصور",
                    false,
                    ColumnType::Text,
                    "https://cdn.example.com/tshirt-front.jpg, https://cdn.example.com/tshirt-back.jpg",
                )
                .with_aliases(&["images"]),
                ColumnDef::new(ProductField::Attributes, "الخصائص", false, ColumnType::Text, "اللون=أبيض; المقاس=L"),
                ColumnDef::new(ProductField::Published, "منشور", false, ColumnType::Boolean, "نعم")
                    .with_aliases(&["active"]),
            ],
        }
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, field: ProductField) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.field == field)
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }

    pub fn required_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.required)
    }

    /// 表头文本 → 列定义
    pub fn resolve_header(&self, raw_header: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.matches_header(raw_header))
    }
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self::products()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_headers_are_unique() {
        let schema = ColumnSchema::products();
        let headers = schema.headers();
        let unique: HashSet<_> = headers.iter().collect();
        assert_eq!(headers.len(), unique.len());
    }

    #[test]
    fn test_column_order_is_stable() {
        let schema = ColumnSchema::products();
        let fields: Vec<_> = schema.columns().iter().map(|c| c.field).collect();
        assert_eq!(fields[0], ProductField::Sku);
        assert_eq!(fields[1], ProductField::Name);
        assert_eq!(fields[8], ProductField::Published);
    }

    #[test]
    fn test_resolve_header_by_label_and_alias() {
        let schema = ColumnSchema::products();
        assert_eq!(
            schema.resolve_header("السعر").map(|c| c.field),
            Some(ProductField::Price)
        );
        assert_eq!(
            schema.resolve_header("  Category_Code ").map(|c| c.field),
            Some(ProductField::CategoryCode)
        );
        assert_eq!(schema.resolve_header("Qty").map(|c| c.field), Some(ProductField::Stock));
        assert!(schema.resolve_header("unknown column").is_none());
    }

    #[test]
    fn test_required_columns() {
        let schema = ColumnSchema::products();
        let required: Vec<_> = schema.required_columns().map(|c| c.field).collect();
        assert_eq!(
            required,
            vec![
                ProductField::Name,
                ProductField::CategoryCode,
                ProductField::Price,
                ProductField::Stock
            ]
        );
    }
}
