// ==========================================
// 公司概况导入器 - 行校验器实现
// ==========================================
// 职责: 按列声明的校验规则（必填/长度/邮箱/链接/年份）
// 说明: 校验失败的行整行拒绝，不做静默修正
// ==========================================

use crate::domain::{FieldViolation, RawCell, RawRow};
use crate::importer::company_importer_trait::RowValidator as RowValidatorTrait;
use crate::importer::field_mapper::columns;
use chrono::{Datelike, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern")
});

static YEAR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").expect("year pattern"));

/// 年份下界
pub const MIN_FOUNDING_YEAR: i32 = 1000;

/// 短文本字段最大长度
pub const SHORT_TEXT_MAX_LEN: usize = 255;

/// 电话字段最大长度
pub const PHONE_MAX_LEN: usize = 50;

// ==========================================
// 单条规则
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    Required,
    MaxLength(usize),
    Email,
    Url,
    /// 四位年份，下界固定，上界为当前年份
    Year,
}

/// 列 → 规则组
#[derive(Debug, Clone)]
pub struct ColumnRules {
    pub column: &'static str,
    pub rules: Vec<FieldRule>,
}

impl ColumnRules {
    fn new(column: &'static str, rules: &[FieldRule]) -> Self {
        Self {
            column,
            rules: rules.to_vec(),
        }
    }
}

/// 默认规则表
pub fn default_rules() -> Vec<ColumnRules> {
    use FieldRule::*;

    let mut rules = vec![
        ColumnRules::new(
            columns::COMPANY_REGISTERED_NAME,
            &[Required, MaxLength(SHORT_TEXT_MAX_LEN)],
        ),
        ColumnRules::new(columns::YEAR_FOUNDED, &[Year]),
        ColumnRules::new(columns::COMPANY_PHONE, &[MaxLength(PHONE_MAX_LEN)]),
        ColumnRules::new(columns::CONTACT_PERSON_PHONE, &[MaxLength(PHONE_MAX_LEN)]),
    ];

    for column in [
        columns::COMPANY_TRADING_NAME,
        columns::HQ_ORIGIN_COUNTRY,
        columns::COMPANY_TYPE,
        columns::OWNERSHIP_STRUCTURE,
        columns::CONTACT_PERSON_NAME,
        columns::CONTACT_PERSON_TITLE,
    ] {
        rules.push(ColumnRules::new(column, &[MaxLength(SHORT_TEXT_MAX_LEN)]));
    }

    for column in [columns::COMPANY_EMAIL, columns::CONTACT_PERSON_EMAIL] {
        rules.push(ColumnRules::new(column, &[MaxLength(SHORT_TEXT_MAX_LEN), Email]));
    }

    for column in [
        columns::COMPANY_WEBSITE,
        columns::LINKEDIN_URL,
        columns::TWITTER_URL,
        columns::FACEBOOK_URL,
        columns::INSTAGRAM_URL,
    ] {
        rules.push(ColumnRules::new(column, &[MaxLength(SHORT_TEXT_MAX_LEN), Url]));
    }

    rules
}

// ==========================================
// RowValidator - 行校验器
// ==========================================
pub struct RowValidator {
    rules: Vec<ColumnRules>,
    current_year: i32,
}

impl RowValidator {
    /// 使用默认规则表和本地当前年份
    pub fn new() -> Self {
        Self::with_current_year(Local::now().year())
    }

    /// 指定当前年份（测试用，避免跨年漂移）
    pub fn with_current_year(current_year: i32) -> Self {
        Self {
            rules: default_rules(),
            current_year,
        }
    }

    pub fn with_rules(rules: Vec<ColumnRules>, current_year: i32) -> Self {
        Self {
            rules,
            current_year,
        }
    }

    fn check(&self, column: &str, rule: FieldRule, cell: &RawCell) -> Option<String> {
        if rule == FieldRule::Required {
            return cell.is_blank().then(|| "必填字段为空".to_string());
        }

        // 可选列为空时，其余规则一律通过
        if cell.is_blank() {
            return None;
        }

        let text = match cell.as_text() {
            Some(text) => text,
            None => return Some("期望文本值，实际为数组".to_string()),
        };

        let violation = match rule {
            FieldRule::Required => None,
            FieldRule::MaxLength(max) => {
                let len = text.chars().count();
                (len > max).then(|| format!("长度 {} 超过上限 {}", len, max))
            }
            FieldRule::Email => {
                (!EMAIL_PATTERN.is_match(&text)).then(|| format!("邮箱格式错误: {}", text))
            }
            FieldRule::Url => (!is_web_url(&text)).then(|| format!("链接格式错误: {}", text)),
            FieldRule::Year => self.check_year(&text),
        };

        if let Some(message) = &violation {
            tracing::debug!(column = column, message = %message, "字段校验未通过");
        }
        violation
    }

    fn check_year(&self, text: &str) -> Option<String> {
        if !YEAR_PATTERN.is_match(text) {
            return Some(format!("年份必须为四位数字: {}", text));
        }
        match text.parse::<i32>() {
            Ok(year) if (MIN_FOUNDING_YEAR..=self.current_year).contains(&year) => None,
            _ => Some(format!(
                "年份超出范围 [{}, {}]: {}",
                MIN_FOUNDING_YEAR, self.current_year, text
            )),
        }
    }
}

impl Default for RowValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn is_web_url(text: &str) -> bool {
    match Url::parse(text) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

impl RowValidatorTrait for RowValidator {
    fn validate(&self, row: &RawRow) -> Vec<FieldViolation> {
        let mut violations = Vec::new();

        for column_rules in &self.rules {
            let cell = row.get(column_rules.column);
            for rule in &column_rules.rules {
                if let Some(message) = self.check(column_rules.column, *rule, cell) {
                    violations.push(FieldViolation {
                        column: column_rules.column.to_string(),
                        message,
                    });
                    // 同列只报第一条
                    break;
                }
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> RowValidator {
        RowValidator::with_current_year(2026)
    }

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        RawRow::from_pairs(1, pairs.iter().copied())
    }

    #[test]
    fn test_valid_row_passes() {
        let violations = validator().validate(&row(&[
            ("company_registered_name", "Acme Ltd"),
            ("year_founded", "1999"),
            ("company_email", "info@acme.co.uk"),
            ("company_website", "https://acme.example.com"),
        ]));
        assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn test_missing_name_is_required() {
        let violations = validator().validate(&row(&[("company_registered_name", "  ")]));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].column, "company_registered_name");
    }

    #[test]
    fn test_year_bounds() {
        for bad in ["999", "0999", "2027", "19a9", "19999"] {
            let violations = validator().validate(&row(&[
                ("company_registered_name", "Acme"),
                ("year_founded", bad),
            ]));
            assert_eq!(violations.len(), 1, "year {}", bad);
            assert_eq!(violations[0].column, "year_founded");
        }
        for good in ["1000", "2026"] {
            let violations = validator().validate(&row(&[
                ("company_registered_name", "Acme"),
                ("year_founded", good),
            ]));
            assert!(violations.is_empty(), "year {}", good);
        }
    }

    #[test]
    fn test_numeric_year_cell() {
        let mut r = row(&[("company_registered_name", "Acme")]);
        r.insert("year_founded", RawCell::Number(1999.0));
        assert!(validator().validate(&r).is_empty());
    }

    #[test]
    fn test_email_and_url_formats() {
        let violations = validator().validate(&row(&[
            ("company_registered_name", "Acme"),
            ("contact_person_email", "not-an-email"),
            ("linkedin_url", "linkedin.com/company/acme"),
            ("twitter_url", "ftp://twitter.com/acme"),
        ]));
        let columns: Vec<&str> = violations.iter().map(|v| v.column.as_str()).collect();
        assert!(columns.contains(&"contact_person_email"));
        assert!(columns.contains(&"linkedin_url"));
        assert!(columns.contains(&"twitter_url"));
        assert_eq!(violations.len(), 3);
    }

    #[test]
    fn test_max_length() {
        let long_name = "x".repeat(SHORT_TEXT_MAX_LEN + 1);
        let violations = validator().validate(&row(&[("company_registered_name", long_name.as_str())]));
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("超过上限"));

        let phone = "1".repeat(PHONE_MAX_LEN + 1);
        let violations = validator().validate(&row(&[
            ("company_registered_name", "Acme"),
            ("company_phone", phone.as_str()),
        ]));
        assert_eq!(violations[0].column, "company_phone");
    }

    #[test]
    fn test_array_cell_in_text_column() {
        let mut r = row(&[]);
        r.insert(
            "company_registered_name",
            RawCell::Array(vec![serde_json::json!("Acme")]),
        );
        let violations = validator().validate(&r);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("数组"));
    }
}
