// ==========================================
// 商品批量导入 - 模板生成器
// ==========================================
// 输出: .xlsx 字节
// 结构: 第 1 页 = 表头（加粗、冻结）+ 示例行
//       第 2 页 = 分类参考表（隐藏，可选）
// 红线: 表头顺序与文字完全来自 ColumnSchema
// ==========================================

use crate::domain::{Category, ColumnSchema, ColumnType};
use crate::importer::error::ImportResult;
use crate::importer::product_importer_trait::TemplateGenerator;
use rust_xlsxwriter::{Format, Workbook};
use tracing::debug;

pub const PRODUCTS_SHEET_NAME: &str = "products";
pub const CATEGORIES_SHEET_NAME: &str = "categories";

const MIN_COLUMN_WIDTH: f64 = 14.0;
const MAX_COLUMN_WIDTH: f64 = 60.0;

pub struct XlsxTemplateGenerator;

impl XlsxTemplateGenerator {
    fn column_width(header: &str, example: &str) -> f64 {
        let chars = header.chars().count().max(example.chars().count()) as f64 + 2.0;
        chars.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
    }
}

impl TemplateGenerator for XlsxTemplateGenerator {
    fn generate_template(
        &self,
        schema: &ColumnSchema,
        categories: &[Category],
    ) -> ImportResult<Vec<u8>> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();

        {
            let sheet = workbook.add_worksheet();
            sheet.set_name(PRODUCTS_SHEET_NAME)?;
            sheet.set_right_to_left(true);

            for (col_idx, def) in schema.columns().iter().enumerate() {
                let col = col_idx as u16;
                sheet.write_string_with_format(0, col, &def.header, &header_format)?;

                // 示例行：数字列写数字，其余写文本
                match def.column_type {
                    ColumnType::Number => match def.example.parse::<f64>() {
                        Ok(n) => {
                            sheet.write_number(1, col, n)?;
                        }
                        Err(_) => {
                            sheet.write_string(1, col, &def.example)?;
                        }
                    },
                    _ => {
                        sheet.write_string(1, col, &def.example)?;
                    }
                }

                sheet.set_column_width(col, Self::column_width(&def.header, &def.example))?;
            }
            sheet.set_freeze_panes(1, 0)?;
        }

        if !categories.is_empty() {
            let sheet = workbook.add_worksheet();
            sheet.set_name(CATEGORIES_SHEET_NAME)?;
            sheet.write_string_with_format(0, 0, "code", &header_format)?;
            sheet.write_string_with_format(0, 1, "name", &header_format)?;
            for (idx, category) in categories.iter().enumerate() {
                let row = idx as u32 + 1;
                sheet.write_string(row, 0, &category.code)?;
                sheet.write_string(row, 1, &category.name)?;
            }
            sheet.set_column_width(0, MIN_COLUMN_WIDTH)?;
            sheet.set_column_width(1, MAX_COLUMN_WIDTH / 2.0)?;
            sheet.set_hidden(true);
        }

        let bytes = workbook.save_to_buffer()?;
        debug!(
            columns = schema.columns().len(),
            categories = categories.len(),
            size = bytes.len(),
            "模板生成完成"
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::file_parser::UniversalFileParser;
    use crate::importer::product_importer_trait::FileParser;
    use calamine::{Reader, Xlsx};
    use std::io::Cursor;

    fn categories() -> Vec<Category> {
        vec![
            Category { code: "CLOTHING".to_string(), name: "ملابس".to_string() },
            Category { code: "SHOES".to_string(), name: "أحذية".to_string() },
        ]
    }

    #[test]
    fn test_template_reparses_as_empty_batch() {
        let schema = ColumnSchema::products();
        let bytes = XlsxTemplateGenerator.generate_template(&schema, &categories()).unwrap();

        // 未修改的模板：表头完整、示例行被跳过
        let rows = UniversalFileParser.parse(&bytes, &schema, 10).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_template_header_matches_schema() {
        let schema = ColumnSchema::products();
        let bytes = XlsxTemplateGenerator.generate_template(&schema, &[]).unwrap();

        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec![PRODUCTS_SHEET_NAME.to_string()]);

        let range = workbook.worksheet_range(PRODUCTS_SHEET_NAME).unwrap();
        let header: Vec<String> = range.rows().next().unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(header, schema.headers());
        assert_eq!(range.height(), 2);
    }

    #[test]
    fn test_template_category_sheet() {
        let schema = ColumnSchema::products();
        let bytes = XlsxTemplateGenerator.generate_template(&schema, &categories()).unwrap();

        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range(CATEGORIES_SHEET_NAME).unwrap();
        let codes: Vec<String> = range.rows().skip(1).map(|r| r[0].to_string()).collect();
        assert_eq!(codes, vec!["CLOTHING", "SHOES"]);
    }
}
