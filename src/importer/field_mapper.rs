// ==========================================
// 商品批量导入 - 字段映射器
// ==========================================
// 职责: 表头 → 列定义映射；位置单元格 → RawRow
// 说明: 表头同时接受正式标签与列键别名（不区分大小写）
// ==========================================

use crate::domain::{CellValue, ColumnSchema, ColumnType, ProductField, RawRow};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::ParseError;
use std::collections::HashSet;
use tracing::warn;

/// 表头解析结果：第 i 列对应的字段（None 表示忽略该列）
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMap {
    columns: Vec<Option<ProductField>>,
}

impl HeaderMap {
    pub fn fields(&self) -> impl Iterator<Item = ProductField> + '_ {
        self.columns.iter().filter_map(|c| *c)
    }
}

pub struct FieldMapper;

impl FieldMapper {
    /// 解析表头行
    ///
    /// # 返回
    /// - Err(MissingColumns): 必填列不存在
    pub fn map_headers(
        &self,
        headers: &[String],
        schema: &ColumnSchema,
    ) -> Result<HeaderMap, ParseError> {
        let mut seen: HashSet<ProductField> = HashSet::new();
        let mut columns = Vec::with_capacity(headers.len());

        for (col_idx, header) in headers.iter().enumerate() {
            if header.trim().is_empty() {
                columns.push(None);
                continue;
            }
            match schema.resolve_header(header) {
                Some(def) if seen.insert(def.field) => columns.push(Some(def.field)),
                Some(def) => {
                    warn!(column = col_idx + 1, field = %def.field, "重复列，已忽略");
                    columns.push(None);
                }
                None => {
                    warn!(column = col_idx + 1, header = %header, "未知列，已忽略");
                    columns.push(None);
                }
            }
        }

        let missing: Vec<String> = schema
            .required_columns()
            .filter(|def| !seen.contains(&def.field))
            .map(|def| def.header.clone())
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::MissingColumns { missing });
        }

        Ok(HeaderMap { columns })
    }

    /// 位置单元格 → RawRow（超出表头范围的单元格丢弃）
    pub fn map_row(
        &self,
        header_map: &HeaderMap,
        cells: Vec<CellValue>,
        row_index: usize,
        sheet_row: usize,
    ) -> RawRow {
        let mut row = RawRow::new(row_index, sheet_row);
        for (col_idx, cell) in cells.into_iter().enumerate() {
            if let Some(Some(field)) = header_map.columns.get(col_idx) {
                row.cells.insert(*field, cell);
            }
        }
        row
    }

    /// 是否与模板示例行完全一致（未修改的模板不应导入示例商品）
    pub fn is_template_example(&self, row: &RawRow, schema: &ColumnSchema) -> bool {
        let cleaner = DataCleaner;
        schema.columns().iter().all(|def| {
            let cell = row.get(def.field);
            match def.column_type {
                ColumnType::Number => {
                    let expected = cleaner.parse_number(&CellValue::text(&def.example));
                    let actual = cleaner.parse_number(cell);
                    matches!((expected, actual), (Ok(e), Ok(a)) if e == a)
                }
                _ => cleaner.cell_text(cell).as_deref() == Some(def.example.as_str()),
            }
        })
    }
}
