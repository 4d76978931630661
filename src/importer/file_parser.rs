// ==========================================
// 商品批量导入 - 文件解析器实现
// ==========================================
// 阶段: Parsing
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 规则: 跳过表头；跳过全空行（不计数）；跳过模板示例行；
//       文本单元格去首尾空白；超过行数上限整批拒绝
// ==========================================

use crate::domain::{CellValue, ColumnSchema, RawRow};
use crate::importer::error::ParseError;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::product_importer_trait::FileParser;
use calamine::{Data, Range, Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use std::io::{Cursor, Read, Seek};
use tracing::debug;

const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";
const OLE_SIGNATURE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

// ==========================================
// SpreadsheetFormat - 按文件内容识别格式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    Xlsx,
    Xls,
    Csv,
}

impl SpreadsheetFormat {
    /// 识别文件格式（不信任扩展名）
    pub fn detect(file_bytes: &[u8]) -> Result<Self, ParseError> {
        if file_bytes.is_empty() {
            return Err(ParseError::EmptyFile);
        }
        if file_bytes.starts_with(ZIP_SIGNATURE) {
            return Ok(SpreadsheetFormat::Xlsx);
        }
        if file_bytes.starts_with(OLE_SIGNATURE) {
            return Ok(SpreadsheetFormat::Xls);
        }
        if std::str::from_utf8(file_bytes).is_ok() {
            return Ok(SpreadsheetFormat::Csv);
        }
        Err(ParseError::UnsupportedFormat("无法识别的二进制文件".to_string()))
    }
}

/// 解析后的表格：表头 + (物理行号, 单元格)
struct SheetGrid {
    header: Vec<String>,
    rows: Vec<(usize, Vec<CellValue>)>,
}

/// 表格 → RawRow（公共的跳行 / 计数 / 上限规则）
fn assemble_rows(
    grid: SheetGrid,
    schema: &ColumnSchema,
    max_rows: usize,
) -> Result<Vec<RawRow>, ParseError> {
    let mapper = FieldMapper;
    let header_map = mapper.map_headers(&grid.header, schema)?;

    let mut rows: Vec<RawRow> = Vec::new();
    for (sheet_row, cells) in grid.rows {
        // 跳过完全空白的行
        if cells.iter().all(CellValue::is_blank) {
            continue;
        }

        let row = mapper.map_row(&header_map, cells, rows.len() + 1, sheet_row);
        if mapper.is_template_example(&row, schema) {
            debug!(sheet_row = sheet_row, "跳过模板示例行");
            continue;
        }

        if rows.len() >= max_rows {
            return Err(ParseError::TooManyRows { max: max_rows });
        }
        rows.push(row);
    }

    Ok(rows)
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    fn convert_cell(cell: &Data) -> CellValue {
        match cell {
            Data::Empty => CellValue::Blank,
            Data::String(s) => CellValue::text(s),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            // 日期 / 错误单元格按显示文本交给校验器
            other => CellValue::text(&other.to_string()),
        }
    }

    /// 读取第一个工作表
    fn read_first_sheet<RS, R>(workbook: &mut R) -> Result<Range<Data>, ParseError>
    where
        RS: Read + Seek,
        R: Reader<RS>,
        R::Error: std::fmt::Display,
    {
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names.first().cloned().ok_or(ParseError::EmptyWorkbook)?;
        workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ParseError::ExcelParseError(e.to_string()))
    }

    fn range_to_grid(range: &Range<Data>) -> Result<SheetGrid, ParseError> {
        // Range 从第一个非空单元格开始，物理行号需加上起点偏移
        let start_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);

        let mut rows = range.rows();
        let header_row = rows.next().ok_or(ParseError::EmptyWorkbook)?;
        let header: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();
        if header.iter().all(|h| h.is_empty()) {
            return Err(ParseError::EmptyWorkbook);
        }

        let data_rows = rows
            .enumerate()
            .map(|(offset, cells)| {
                (
                    start_row + offset + 2,
                    cells.iter().map(Self::convert_cell).collect(),
                )
            })
            .collect();

        Ok(SheetGrid {
            header,
            rows: data_rows,
        })
    }

    fn read_grid(&self, file_bytes: &[u8]) -> Result<SheetGrid, ParseError> {
        let range = match SpreadsheetFormat::detect(file_bytes)? {
            SpreadsheetFormat::Xlsx => {
                let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(file_bytes))
                    .map_err(|e| ParseError::ExcelParseError(e.to_string()))?;
                Self::read_first_sheet(&mut workbook)?
            }
            SpreadsheetFormat::Xls => {
                let mut workbook: Xls<_> = Xls::new(Cursor::new(file_bytes))
                    .map_err(|e| ParseError::ExcelParseError(e.to_string()))?;
                Self::read_first_sheet(&mut workbook)?
            }
            SpreadsheetFormat::Csv => {
                return Err(ParseError::UnsupportedFormat("csv".to_string()));
            }
        };
        Self::range_to_grid(&range)
    }
}

impl FileParser for ExcelParser {
    fn parse(
        &self,
        file_bytes: &[u8],
        schema: &ColumnSchema,
        max_rows: usize,
    ) -> Result<Vec<RawRow>, ParseError> {
        let grid = self.read_grid(file_bytes)?;
        assemble_rows(grid, schema, max_rows)
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 分隔符嗅探：阿拉伯语区 Excel 导出的 CSV 常用分号
    fn sniff_delimiter(text: &str) -> u8 {
        let first_line = text.lines().next().unwrap_or("");
        let commas = first_line.matches(',').count();
        let semicolons = first_line.matches(';').count();
        if semicolons > commas {
            b';'
        } else {
            b','
        }
    }

    fn read_grid(&self, file_bytes: &[u8]) -> Result<SheetGrid, ParseError> {
        let bytes = file_bytes.strip_prefix(UTF8_BOM).unwrap_or(file_bytes);
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ParseError::CsvParseError(format!("文件不是 UTF-8 编码: {}", e)))?;

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(Self::sniff_delimiter(text))
            .from_reader(text.as_bytes());

        let mut records = reader.records();
        let header: Vec<String> = match records.next() {
            Some(record) => record?.iter().map(|h| h.trim().to_string()).collect(),
            None => return Err(ParseError::EmptyWorkbook),
        };
        if header.iter().all(|h| h.is_empty()) {
            return Err(ParseError::EmptyWorkbook);
        }

        let mut rows = Vec::new();
        for (idx, result) in records.enumerate() {
            let record = result?;
            let sheet_row = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 2);
            rows.push((sheet_row, record.iter().map(CellValue::text).collect()));
        }

        Ok(SheetGrid { header, rows })
    }
}

impl FileParser for CsvParser {
    fn parse(
        &self,
        file_bytes: &[u8],
        schema: &ColumnSchema,
        max_rows: usize,
    ) -> Result<Vec<RawRow>, ParseError> {
        if file_bytes.is_empty() {
            return Err(ParseError::EmptyFile);
        }
        let grid = self.read_grid(file_bytes)?;
        assemble_rows(grid, schema, max_rows)
    }
}

// ==========================================
// 通用文件解析器（根据文件内容自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse(
        &self,
        file_bytes: &[u8],
        schema: &ColumnSchema,
        max_rows: usize,
    ) -> Result<Vec<RawRow>, ParseError> {
        match SpreadsheetFormat::detect(file_bytes)? {
            SpreadsheetFormat::Xlsx | SpreadsheetFormat::Xls => {
                ExcelParser.parse(file_bytes, schema, max_rows)
            }
            SpreadsheetFormat::Csv => CsvParser.parse(file_bytes, schema, max_rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProductField;

    const HEADER: &str = "sku,name,category_code,price,stock";

    #[test]
    fn test_detect_format() {
        assert_eq!(SpreadsheetFormat::detect(b"PK\x03\x04rest").unwrap(), SpreadsheetFormat::Xlsx);
        assert_eq!(SpreadsheetFormat::detect(OLE_SIGNATURE).unwrap(), SpreadsheetFormat::Xls);
        assert_eq!(SpreadsheetFormat::detect(b"a,b\n1,2").unwrap(), SpreadsheetFormat::Csv);
        assert!(matches!(SpreadsheetFormat::detect(b""), Err(ParseError::EmptyFile)));
        assert!(matches!(
            SpreadsheetFormat::detect(&[0xFF, 0xFE, 0x00, 0x9F]),
            Err(ParseError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let csv = format!("{}\nABC1, قميص ,CLOTHING,49.9,10\nABC2,سروال,CLOTHING,80,3\n", HEADER);
        let rows = CsvParser
            .parse(csv.as_bytes(), &ColumnSchema::products(), 100)
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_index, 1);
        assert_eq!(rows[0].sheet_row, 2);
        assert_eq!(rows[0].get(ProductField::Name), &CellValue::Text("قميص".to_string()));
        assert_eq!(rows[1].get(ProductField::Sku), &CellValue::Text("ABC2".to_string()));
    }

    #[test]
    fn test_csv_parser_skip_empty_rows() {
        let csv = format!("{}\nABC1,a,C,1,1\n,,,,\n\nABC2,b,C,2,2\n", HEADER);
        let rows = CsvParser
            .parse(csv.as_bytes(), &ColumnSchema::products(), 100)
            .unwrap();

        // 空行不计数，序号连续
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].row_index, 2);
        assert_eq!(rows[1].sheet_row, 5);
    }

    #[test]
    fn test_csv_parser_semicolon_and_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("sku;name;category_code;price;stock\nA1;x;C;1,5;2\n".as_bytes());
        let rows = UniversalFileParser
            .parse(&bytes, &ColumnSchema::products(), 100)
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(ProductField::Price), &CellValue::Text("1,5".to_string()));
    }

    #[test]
    fn test_csv_parser_too_many_rows() {
        let csv = format!("{}\nA1,a,C,1,1\nA2,b,C,1,1\nA3,c,C,1,1\n", HEADER);
        let result = CsvParser.parse(csv.as_bytes(), &ColumnSchema::products(), 2);
        assert!(matches!(result, Err(ParseError::TooManyRows { max: 2 })));
    }

    #[test]
    fn test_csv_parser_exactly_max_rows() {
        let csv = format!("{}\nA1,a,C,1,1\nA2,b,C,1,1\n\n", HEADER);
        let rows = CsvParser
            .parse(csv.as_bytes(), &ColumnSchema::products(), 2)
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].row_index, 2);
    }

    #[test]
    fn test_csv_parser_header_only() {
        let rows = CsvParser
            .parse(format!("{}\n", HEADER).as_bytes(), &ColumnSchema::products(), 10)
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_excel_parser_rejects_garbage_zip() {
        let result = UniversalFileParser.parse(b"PK\x03\x04not really a zip", &ColumnSchema::products(), 10);
        assert!(matches!(result, Err(ParseError::ExcelParseError(_))));
    }
}
