// ==========================================
// 公司概况导入器 - 单元格类型转换
// ==========================================
// 职责: 逗号列表 / 布尔 / JSON 列 / 日期 / 整数 / 文本
// 红线: 转换从不返回错误，失败时降级为安全默认值并上报告警
// ==========================================

use crate::domain::row::format_number;
use crate::domain::RawCell;
use crate::importer::diagnostics::{WarningContext, WarningSink};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use serde_json::{json, Value};

/// 表格日期序列号的识别窗口 [下界, 上界)
///
/// 25569 = 1970-01-01；60000 ≈ 2064-04，覆盖业务上合理的日期范围
pub const DATE_SERIAL_MIN: f64 = 25569.0;
pub const DATE_SERIAL_MAX: f64 = 60000.0;

const TRUTHY: &[&str] = &["1", "true", "yes", "y", "on"];
const FALSY: &[&str] = &["0", "false", "no", "n", "off"];

// 带时间的格式，截断到日期
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

// 斜杠按美式月/日，短横线与点号按日/月
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%d-%b-%Y",
];

// ==========================================
// JSON 列的降级策略
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonFallback {
    Null,
    EmptyArray,
    /// {"full_address_string": 原文}
    WrapFullAddress,
}

/// 一个转换函数，两种策略：缺省值 + 失败值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonColumnPolicy {
    pub on_absent: JsonFallback,
    pub on_failure: JsonFallback,
}

impl JsonColumnPolicy {
    /// 通用 JSON 列：缺省与失败都为 null
    pub const GENERAL: Self = Self {
        on_absent: JsonFallback::Null,
        on_failure: JsonFallback::Null,
    };

    /// 地址列：缺省为 []，失败时包装原文
    pub const ADDRESS: Self = Self {
        on_absent: JsonFallback::EmptyArray,
        on_failure: JsonFallback::WrapFullAddress,
    };
}

impl JsonFallback {
    fn materialize(self, original: &str) -> Value {
        match self {
            JsonFallback::Null => Value::Null,
            JsonFallback::EmptyArray => Value::Array(Vec::new()),
            JsonFallback::WrapFullAddress => json!({ "full_address_string": original }),
        }
    }
}

// ==========================================
// 纯函数：不上报，只给出结果或失败原因
// ==========================================

/// 逗号分隔 → 去空白的有序列表；空值为空列表，数组原样通过
pub fn split_comma_list(cell: &RawCell) -> Vec<String> {
    match cell {
        RawCell::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        other => other
            .as_text()
            .map(|text| split_text(&text))
            .unwrap_or_default(),
    }
}

fn split_text(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// 识别常见真/假文本；空值为 Ok(None)，无法识别为 Err
pub fn parse_bool(cell: &RawCell) -> Result<Option<bool>, String> {
    match cell {
        RawCell::Bool(b) => Ok(Some(*b)),
        RawCell::Array(_) => Err("布尔列不接受数组值".to_string()),
        other if other.is_blank() => Ok(None),
        other => {
            let text = other.as_text().unwrap_or_default().to_lowercase();
            if TRUTHY.contains(&text.as_str()) {
                Ok(Some(true))
            } else if FALSY.contains(&text.as_str()) {
                Ok(Some(false))
            } else {
                Err(format!("无法识别的布尔值: {}", text))
            }
        }
    }
}

/// JSON 列解码
///
/// 空白、"undefined"、"null"（不区分大小写）视为缺省；
/// 只接受数组形态的结果（JSON 数组或对象）
pub fn decode_json_column(cell: &RawCell, policy: JsonColumnPolicy) -> Result<Value, (Value, String)> {
    let text = match cell {
        RawCell::Array(items) => return Ok(Value::Array(items.clone())),
        other => other.as_text().unwrap_or_default(),
    };

    if is_absent_token(&text) {
        return Ok(policy.on_absent.materialize(&text));
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(value @ (Value::Array(_) | Value::Object(_))) => Ok(value),
        Ok(other) => Err((
            policy.on_failure.materialize(&text),
            format!("JSON 解码结果不是数组: {}", other),
        )),
        Err(e) => Err((
            policy.on_failure.materialize(&text),
            format!("JSON 解码失败: {}", e),
        )),
    }
}

fn is_absent_token(text: &str) -> bool {
    text.is_empty() || text.eq_ignore_ascii_case("undefined") || text.eq_ignore_ascii_case("null")
}

/// 表格日期序列号（1900 日期系统）→ 日历日期
pub fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !(DATE_SERIAL_MIN..DATE_SERIAL_MAX).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// 通用日期文本解析
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// 日期：序列号窗口内按序列号换算，其余按文本解析；空值为 Ok(None)
pub fn parse_date(cell: &RawCell) -> Result<Option<NaiveDate>, String> {
    let text = match cell {
        RawCell::Array(_) => return Err("日期列不接受数组值".to_string()),
        RawCell::Bool(_) => return Err("日期列不接受布尔值".to_string()),
        other if other.is_blank() => return Ok(None),
        other => other.as_text().unwrap_or_default(),
    };

    let numeric = match cell {
        RawCell::Number(n) => Some(*n),
        _ => text.parse::<f64>().ok(),
    };

    if let Some(serial) = numeric {
        if let Some(date) = date_from_serial(serial) {
            return Ok(Some(date));
        }
    }

    parse_date_text(&text)
        .map(Some)
        .ok_or_else(|| format!("无法解析的日期: {}", text))
}

/// 整数：允许千分位逗号与整数值的浮点数
pub fn parse_integer(cell: &RawCell) -> Result<Option<i64>, String> {
    match cell {
        RawCell::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => Ok(Some(*n as i64)),
        RawCell::Number(n) => Err(format!("不是整数: {}", format_number(*n))),
        RawCell::Array(_) => Err("整数列不接受数组值".to_string()),
        RawCell::Bool(_) => Err("整数列不接受布尔值".to_string()),
        other if other.is_blank() => Ok(None),
        other => {
            let text = other.as_text().unwrap_or_default();
            let digits: String = text.chars().filter(|c| *c != ',' && *c != ' ').collect();
            digits
                .parse::<i64>()
                .or_else(|_| match digits.parse::<f64>() {
                    Ok(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(f as i64),
                    _ => Err(()),
                })
                .map(Some)
                .map_err(|_| format!("无法解析为整数: {}", text))
        }
    }
}

// ==========================================
// CellCoercer - 绑定行号与告警输出的转换器
// ==========================================
pub struct CellCoercer<'s> {
    sink: &'s dyn WarningSink,
    row_number: usize,
}

impl<'s> CellCoercer<'s> {
    pub fn new(sink: &'s dyn WarningSink, row_number: usize) -> Self {
        Self { sink, row_number }
    }

    fn warn(&self, column: &str, message: &str) {
        self.sink
            .warn(message, WarningContext::cell(self.row_number, column));
    }

    /// 去空白文本，空值为 None
    pub fn text(&self, column: &str, cell: &RawCell) -> Option<String> {
        match cell.as_text() {
            Some(text) if text.is_empty() => None,
            Some(text) => Some(text),
            None => {
                self.warn(column, "文本列收到数组值，已置空");
                None
            }
        }
    }

    pub fn comma_list(&self, cell: &RawCell) -> Vec<String> {
        split_comma_list(cell)
    }

    pub fn boolean(&self, column: &str, cell: &RawCell) -> Option<bool> {
        parse_bool(cell).unwrap_or_else(|message| {
            self.warn(column, &message);
            None
        })
    }

    pub fn integer(&self, column: &str, cell: &RawCell) -> Option<i64> {
        parse_integer(cell).unwrap_or_else(|message| {
            self.warn(column, &message);
            None
        })
    }

    pub fn date(&self, column: &str, cell: &RawCell) -> Option<NaiveDate> {
        parse_date(cell).unwrap_or_else(|message| {
            self.warn(column, &message);
            None
        })
    }

    pub fn json(&self, column: &str, cell: &RawCell, policy: JsonColumnPolicy) -> Value {
        decode_json_column(cell, policy).unwrap_or_else(|(fallback, message)| {
            self.warn(column, &message);
            fallback
        })
    }

    /// 通用 JSON 列，null 映射为 None
    pub fn json_general(&self, column: &str, cell: &RawCell) -> Option<Value> {
        match self.json(column, cell, JsonColumnPolicy::GENERAL) {
            Value::Null => None,
            value => Some(value),
        }
    }
}
