// ==========================================
// 商品批量导入 - 行校验器
// ==========================================
// 阶段: Validating
// 规则: 逐字段检查，收集该行的全部错误后一次性返回
// 红线: 有任何错误则不产生 CandidateProduct（不做部分转换）
// 说明: 纯函数；SKU 批内重复留给协调阶段
// ==========================================

use crate::config::ImportSettings;
use crate::domain::{
    CandidateProduct, CellValue, ColumnSchema, ErrorCode, ProductField, RawRow, ValidationError,
};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::product_importer_trait::RowValidator;
use std::collections::{BTreeMap, HashSet};

pub struct RowValidatorImpl;

/// 单行校验上下文（累积错误）
struct RowCheck<'a> {
    row: &'a RawRow,
    schema: &'a ColumnSchema,
    cleaner: DataCleaner,
    errors: Vec<ValidationError>,
}

impl<'a> RowCheck<'a> {
    fn new(row: &'a RawRow, schema: &'a ColumnSchema) -> Self {
        Self {
            row,
            schema,
            cleaner: DataCleaner,
            errors: Vec::new(),
        }
    }

    fn label(&self, field: ProductField) -> String {
        self.schema
            .column(field)
            .map(|c| c.header.clone())
            .unwrap_or_else(|| field.key().to_string())
    }

    fn push(&mut self, field: ProductField, code: ErrorCode, message: String) {
        self.errors
            .push(ValidationError::new(self.row.row_index, field, code, message));
    }

    fn cell(&self, field: ProductField) -> &'a CellValue {
        self.row.get(field)
    }

    /// 必填字段：空白则记录 MissingRequired
    fn required(&mut self, field: ProductField) -> Option<&'a CellValue> {
        let cell = self.cell(field);
        if self.cleaner.cell_text(cell).is_none() {
            let message = format!("الحقل «{}» مطلوب", self.label(field));
            self.push(field, ErrorCode::MissingRequired, message);
            return None;
        }
        Some(cell)
    }

    fn optional_text(&self, field: ProductField) -> Option<String> {
        self.cleaner
            .cell_text(self.cell(field))
            .map(|t| self.cleaner.strip_format_marks(&t))
            .filter(|t| !t.is_empty())
    }

    fn check_sku(&mut self, max_len: usize) -> Option<String> {
        let raw = self.optional_text(ProductField::Sku)?;
        let sku = self.cleaner.clean_text(&raw, true);
        if !is_valid_sku(&sku, max_len) {
            let message = format!(
                "رمز المنتج «{}» غير صالح: أحرف لاتينية وأرقام وشرطات فقط، بحد أقصى {} حرفاً",
                raw, max_len
            );
            self.push(ProductField::Sku, ErrorCode::InvalidSku, message);
        }
        Some(sku)
    }

    fn check_name(&mut self, max_len: usize) -> Option<String> {
        let cell = self.required(ProductField::Name)?;
        let text = self.cleaner.cell_text(cell).unwrap_or_default();
        let name = self.cleaner.strip_format_marks(&text);
        if name.is_empty() {
            self.push(
                ProductField::Name,
                ErrorCode::InvalidName,
                "اسم المنتج فارغ".to_string(),
            );
            return None;
        }
        if name.chars().count() > max_len {
            let message = format!("اسم المنتج أطول من {} حرفاً", max_len);
            self.push(ProductField::Name, ErrorCode::InvalidName, message);
            return None;
        }
        Some(name)
    }

    fn check_category(&mut self, existing: &HashSet<String>) -> Option<String> {
        let cell = self.required(ProductField::CategoryCode)?;
        let text = self.cleaner.cell_text(cell).unwrap_or_default();
        let code = self.cleaner.clean_text(&self.cleaner.strip_format_marks(&text), true);
        if !existing.contains(&code) {
            let message = format!("رمز التصنيف «{}» غير موجود", code);
            self.push(ProductField::CategoryCode, ErrorCode::UnknownCategory, message);
            return None;
        }
        Some(code)
    }

    fn check_price(&mut self) -> Option<f64> {
        let cell = self.required(ProductField::Price)?;
        match self.cleaner.parse_number(cell) {
            Ok(price) if price > 0.0 => Some(price),
            Ok(price) => {
                let message = format!("السعر يجب أن يكون أكبر من صفر (القيمة: {})", price);
                self.push(ProductField::Price, ErrorCode::InvalidNumber, message);
                None
            }
            Err(raw) => {
                let message = format!("السعر «{}» ليس رقماً", raw);
                self.push(ProductField::Price, ErrorCode::InvalidNumber, message);
                None
            }
        }
    }

    fn check_stock(&mut self) -> Option<u32> {
        let cell = self.required(ProductField::Stock)?;
        match self.cleaner.parse_number(cell) {
            Ok(stock) if stock >= 0.0 && stock.fract() == 0.0 && stock <= u32::MAX as f64 => {
                Some(stock as u32)
            }
            Ok(stock) => {
                let message = format!("الكمية يجب أن تكون عدداً صحيحاً غير سالب (القيمة: {})", stock);
                self.push(ProductField::Stock, ErrorCode::InvalidNumber, message);
                None
            }
            Err(raw) => {
                let message = format!("الكمية «{}» ليست رقماً", raw);
                self.push(ProductField::Stock, ErrorCode::InvalidNumber, message);
                None
            }
        }
    }

    fn check_description(&mut self, max_len: usize) -> Option<String> {
        let description = self.optional_text(ProductField::Description)?;
        if description.chars().count() > max_len {
            let message = format!("الوصف أطول من {} حرفاً", max_len);
            self.push(ProductField::Description, ErrorCode::InvalidDescription, message);
        }
        Some(description)
    }

    fn check_image_urls(&mut self, max_count: usize) -> Vec<String> {
        let Some(raw) = self.optional_text(ProductField::ImageUrls) else {
            return Vec::new();
        };
        let urls = self.cleaner.split_list(&raw);
        if urls.len() > max_count {
            let message = format!("عدد روابط الصور {} يتجاوز الحد الأقصى {}", urls.len(), max_count);
            self.push(ProductField::ImageUrls, ErrorCode::InvalidImageUrl, message);
        }
        for url in urls.iter().filter(|u| !is_http_url(u)) {
            let message = format!("رابط الصورة «{}» غير صالح", url);
            self.push(ProductField::ImageUrls, ErrorCode::InvalidImageUrl, message);
        }
        urls
    }

    fn check_attributes(&mut self) -> BTreeMap<String, String> {
        let Some(raw) = self.optional_text(ProductField::Attributes) else {
            return BTreeMap::new();
        };
        match self.cleaner.parse_attributes(&raw) {
            Ok(attributes) => attributes,
            Err(part) => {
                let message = format!("الخاصية «{}» يجب أن تكون بالشكل مفتاح=قيمة", part);
                self.push(ProductField::Attributes, ErrorCode::InvalidAttributes, message);
                BTreeMap::new()
            }
        }
    }

    fn check_published(&mut self) -> bool {
        let cell = self.cell(ProductField::Published);
        if self.cleaner.cell_text(cell).is_none() {
            return true;
        }
        match self.cleaner.parse_bool(cell) {
            Some(published) => published,
            None => {
                let message = format!("القيمة «{}» غير صالحة، استخدم نعم أو لا", cell);
                self.push(ProductField::Published, ErrorCode::InvalidBoolean, message);
                true
            }
        }
    }
}

/// SKU: ASCII 字母数字，允许单个内部连字符
fn is_valid_sku(sku: &str, max_len: usize) -> bool {
    if sku.is_empty() || sku.len() > max_len {
        return false;
    }
    if sku.starts_with('-') || sku.ends_with('-') || sku.contains("--") {
        return false;
    }
    sku.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn is_http_url(url: &str) -> bool {
    let lowered = url.to_ascii_lowercase();
    let rest = match lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
    {
        Some(rest) => rest,
        None => return false,
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    !host.is_empty() && !url.chars().any(char::is_whitespace)
}

impl RowValidator for RowValidatorImpl {
    fn validate(
        &self,
        row: &RawRow,
        schema: &ColumnSchema,
        existing_category_codes: &HashSet<String>,
        settings: &ImportSettings,
    ) -> Result<CandidateProduct, Vec<ValidationError>> {
        let mut check = RowCheck::new(row, schema);

        // 每个检查都执行，不短路
        let sku = check.check_sku(settings.max_sku_length);
        let name = check.check_name(settings.max_name_length);
        let category_code = check.check_category(existing_category_codes);
        let price = check.check_price();
        let stock = check.check_stock();
        let description = check.check_description(settings.max_description_length);
        let image_urls = check.check_image_urls(settings.max_image_urls);
        let attributes = check.check_attributes();
        let published = check.check_published();

        if !check.errors.is_empty() {
            return Err(check.errors);
        }

        match (name, category_code, price, stock) {
            (Some(name), Some(category_code), Some(price), Some(stock)) => Ok(CandidateProduct {
                source_row_index: row.row_index,
                sheet_row: row.sheet_row,
                sku,
                name,
                category_code,
                price,
                stock,
                description,
                image_urls,
                attributes,
                published,
            }),
            // 无错误时四个必填值均已解析
            _ => Err(vec![ValidationError::new(
                row.row_index,
                ProductField::Name,
                ErrorCode::MissingRequired,
                "بيانات الصف غير مكتملة",
            )]),
        }
    }
}
