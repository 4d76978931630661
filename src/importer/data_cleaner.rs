// ==========================================
// 商品批量导入 - 数据清洗器
// ==========================================
// 职责: TRIM / UPPER / 空值标准化 / 阿拉伯数字归一 / 类型转换
// 说明: 只做“值”的转换，是否违规由 RowValidator 判定
// ==========================================

use crate::domain::product::CellValue;
use std::collections::BTreeMap;

/// 双向文本控制符（阿拉伯语编辑器常见的不可见字符）
const FORMAT_MARKS: &[char] = &[
    '\u{061C}', // ARABIC LETTER MARK
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{200E}', '\u{200F}',
    '\u{202A}', '\u{202B}', '\u{202C}', '\u{202D}', '\u{202E}',
    '\u{2066}', '\u{2067}', '\u{2068}', '\u{2069}',
    '\u{FEFF}',
];

pub struct DataCleaner;

impl DataCleaner {
    /// 清洗文本字段（TRIM + 可选 UPPER）
    pub fn clean_text(&self, value: &str, uppercase: bool) -> String {
        let trimmed = value.trim();
        if uppercase {
            trimmed.to_uppercase()
        } else {
            trimmed.to_string()
        }
    }

    /// 单元格转文本；空白返回 None
    pub fn cell_text(&self, cell: &CellValue) -> Option<String> {
        match cell {
            CellValue::Blank => None,
            other => {
                let text = other.to_string();
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }

    /// 去除不可见的方向控制符后再 TRIM
    pub fn strip_format_marks(&self, value: &str) -> String {
        value
            .chars()
            .filter(|c| !FORMAT_MARKS.contains(c))
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// 阿拉伯-印度数字 / 波斯数字 → ASCII；阿拉伯小数点 → '.'，阿拉伯千分位 → ','
    pub fn normalize_digits(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in self.strip_format_marks(value).chars() {
            match c {
                '\u{0660}'..='\u{0669}' => {
                    out.push(char::from(b'0' + (c as u32 - 0x0660) as u8));
                }
                '\u{06F0}'..='\u{06F9}' => {
                    out.push(char::from(b'0' + (c as u32 - 0x06F0) as u8));
                }
                '\u{066B}' => out.push('.'),
                '\u{066C}' => out.push(','),
                '\u{00A0}' => out.push(' '),
                _ => out.push(c),
            }
        }
        out
    }

    /// 去掉千分位（',' 或空格）
    ///
    /// 整数部分首组 1-3 位、其后每组恰好 3 位；小数部分不允许分组。
    /// 分组不合法（如 "1,5"、"1 2"）返回 None，不做猜测。
    pub fn strip_grouping(&self, value: &str) -> Option<String> {
        if !value.contains([',', ' ']) {
            return Some(value.to_string());
        }

        let (int_part, frac_part) = match value.split_once('.') {
            Some((int_part, frac)) => (int_part, Some(frac)),
            None => (value, None),
        };
        if frac_part.is_some_and(|f| f.contains([',', ' '])) {
            return None;
        }

        let digits = int_part.trim_start_matches(['-', '+']);
        let sign = &int_part[..int_part.len() - digits.len()];
        let all_digits = |g: &str| g.chars().all(|c| c.is_ascii_digit());

        let mut groups = digits.split([',', ' ']);
        let first = groups.next().unwrap_or("");
        if first.is_empty() || first.len() > 3 || !all_digits(first) {
            return None;
        }

        let mut out = format!("{}{}", sign, first);
        for group in groups {
            if group.len() != 3 || !all_digits(group) {
                return None;
            }
            out.push_str(group);
        }
        if let Some(frac) = frac_part {
            out.push('.');
            out.push_str(frac);
        }
        Some(out)
    }

    /// 解析数值单元格
    ///
    /// # 返回
    /// - Ok(f64): 有限数值
    /// - Err(String): 原始文本（用于错误信息）
    pub fn parse_number(&self, cell: &CellValue) -> Result<f64, String> {
        match cell {
            CellValue::Number(n) if n.is_finite() => Ok(*n),
            CellValue::Number(n) => Err(n.to_string()),
            CellValue::Text(s) => {
                let normalized = self.normalize_digits(s);
                let ungrouped = self.strip_grouping(&normalized).ok_or_else(|| s.clone())?;
                match ungrouped.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(v),
                    _ => Err(s.clone()),
                }
            }
            CellValue::Bool(b) => Err(b.to_string()),
            CellValue::Blank => Err(String::new()),
        }
    }

    /// 解析布尔单元格（是/否 的多种写法）
    pub fn parse_bool(&self, cell: &CellValue) -> Option<bool> {
        match cell {
            CellValue::Bool(b) => Some(*b),
            CellValue::Number(n) if *n == 1.0 => Some(true),
            CellValue::Number(n) if *n == 0.0 => Some(false),
            CellValue::Text(s) => {
                let normalized = self.normalize_digits(s).to_lowercase();
                match normalized.as_str() {
                    "1" | "y" | "yes" | "true" | "نعم" => Some(true),
                    "0" | "n" | "no" | "false" | "لا" => Some(false),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// 拆分图片链接列表（逗号 / 竖线 / 换行）
    pub fn split_list(&self, value: &str) -> Vec<String> {
        value
            .split(|c| c == ',' || c == '|' || c == '\n' || c == '،')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }

    /// 解析 “键=值; 键=值” 形式的属性
    ///
    /// # 返回
    /// - Err(String): 第一个不合法的片段
    pub fn parse_attributes(&self, value: &str) -> Result<BTreeMap<String, String>, String> {
        let mut attributes = BTreeMap::new();
        for part in value.split(|c| c == ';' || c == '؛' || c == '\n') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (key, val) = part.split_once('=').ok_or_else(|| part.to_string())?;
            let key = self.strip_format_marks(key);
            let val = self.strip_format_marks(val);
            if key.is_empty() || val.is_empty() {
                return Err(part.to_string());
            }
            if attributes.insert(key, val).is_some() {
                return Err(part.to_string());
            }
        }
        Ok(attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_basic() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.clean_text("  clothing  ", false), "clothing");
        assert_eq!(cleaner.clean_text("  clothing  ", true), "CLOTHING");
    }

    #[test]
    fn test_normalize_arabic_indic_digits() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.normalize_digits("١٢٣٫٥٠"), "123.50");
        assert_eq!(cleaner.normalize_digits("۱۲"), "12");
        assert_eq!(cleaner.normalize_digits("١٬٠٠٠"), "1,000");
    }

    #[test]
    fn test_strip_grouping() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.strip_grouping("1,250.75").as_deref(), Some("1250.75"));
        assert_eq!(cleaner.strip_grouping("-12 345 678").as_deref(), Some("-12345678"));
        assert_eq!(cleaner.strip_grouping("49.9").as_deref(), Some("49.9"));
        assert_eq!(cleaner.strip_grouping("1,5"), None);
        assert_eq!(cleaner.strip_grouping("1 2"), None);
        assert_eq!(cleaner.strip_grouping("1,2,3"), None);
        assert_eq!(cleaner.strip_grouping("1234,567"), None);
        assert_eq!(cleaner.strip_grouping("1.250,75"), None);
        assert_eq!(cleaner.strip_grouping(",250"), None);
    }

    #[test]
    fn test_parse_number_variants() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_number(&CellValue::Number(49.9)), Ok(49.9));
        assert_eq!(cleaner.parse_number(&CellValue::text("٤٩٫٩")), Ok(49.9));
        assert_eq!(cleaner.parse_number(&CellValue::text("-3")), Ok(-3.0));
        assert_eq!(cleaner.parse_number(&CellValue::text("١٬٢٥٠٫٥")), Ok(1250.5));
        assert_eq!(cleaner.parse_number(&CellValue::text("1\u{00A0}000")), Ok(1000.0));
        assert_eq!(cleaner.parse_number(&CellValue::text("1,5")), Err("1,5".to_string()));
        assert!(cleaner.parse_number(&CellValue::text("abc")).is_err());
        assert!(cleaner.parse_number(&CellValue::text("inf")).is_err());
        assert!(cleaner.parse_number(&CellValue::Bool(true)).is_err());
    }

    #[test]
    fn test_parse_bool_variants() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_bool(&CellValue::text("نعم")), Some(true));
        assert_eq!(cleaner.parse_bool(&CellValue::text("لا")), Some(false));
        assert_eq!(cleaner.parse_bool(&CellValue::text("YES")), Some(true));
        assert_eq!(cleaner.parse_bool(&CellValue::Number(0.0)), Some(false));
        assert_eq!(cleaner.parse_bool(&CellValue::text("maybe")), None);
    }

    #[test]
    fn test_strip_format_marks() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.strip_format_marks("\u{200F}قميص\u{200E} "), "قميص");
        assert_eq!(cleaner.strip_format_marks("\u{200F}\u{061C}"), "");
    }

    #[test]
    fn test_split_list() {
        let cleaner = DataCleaner;
        assert_eq!(
            cleaner.split_list("https://a/1.jpg, https://a/2.jpg|\nhttps://a/3.jpg"),
            vec!["https://a/1.jpg", "https://a/2.jpg", "https://a/3.jpg"]
        );
    }

    #[test]
    fn test_parse_attributes() {
        let cleaner = DataCleaner;
        let attrs = cleaner.parse_attributes("اللون=أبيض; المقاس = L؛").unwrap();
        assert_eq!(attrs.get("اللون"), Some(&"أبيض".to_string()));
        assert_eq!(attrs.get("المقاس"), Some(&"L".to_string()));

        assert_eq!(cleaner.parse_attributes("color"), Err("color".to_string()));
        assert_eq!(cleaner.parse_attributes("=red"), Err("=red".to_string()));
        assert!(cleaner.parse_attributes("a=1; a=2").is_err());
    }
}
