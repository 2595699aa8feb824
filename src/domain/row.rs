// ==========================================
// 公司概况导入器 - 原始行模型
// ==========================================
// 用途: 文件解析 → 字段映射之间的中间产物
// 生命周期: 仅在导入流程内
// ==========================================

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ==========================================
// RawCell - 单元格原始值
// ==========================================
// 说明: 部分表格库会把公式单元格预先解码为数组，
//       因此用带标签的枚举表达，而不是在运行期检查类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Array(Vec<Value>),
}

impl RawCell {
    /// 标量单元格渲染为去空白文本；数组返回 None
    ///
    /// 整数值的浮点数不带小数点（1999.0 → "1999"）
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawCell::Empty => Some(String::new()),
            RawCell::Text(s) => Some(s.trim().to_string()),
            RawCell::Number(n) => Some(format_number(*n)),
            RawCell::Bool(b) => Some(b.to_string()),
            RawCell::Array(_) => None,
        }
    }

    /// 空单元格或仅含空白的文本
    pub fn is_blank(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 转为 JSON（用于记录拒绝行的原始数据）
    pub fn to_json(&self) -> Value {
        match self {
            RawCell::Empty => Value::Null,
            RawCell::Text(s) => Value::String(s.clone()),
            RawCell::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            RawCell::Bool(b) => Value::Bool(*b),
            RawCell::Array(items) => Value::Array(items.clone()),
        }
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(value.to_string())
        }
    }
}

impl From<String> for RawCell {
    fn from(value: String) -> Self {
        if value.is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(value)
        }
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        RawCell::Number(value)
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// ==========================================
// RawRow - 表头匹配后的一行
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub row_number: usize, // 数据行号（从 1 开始，不含表头）
    pub cells: HashMap<String, RawCell>,
}

impl RawRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            cells: HashMap::new(),
        }
    }

    /// 构造便捷方法，测试与内存导入使用
    pub fn from_pairs<K, V, I>(row_number: usize, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<RawCell>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            row_number,
            cells: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, cell: RawCell) {
        self.cells.insert(column.into(), cell);
    }

    /// 缺失列视为空单元格
    pub fn get(&self, column: &str) -> &RawCell {
        self.cells.get(column).unwrap_or(&RawCell::Empty)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(RawCell::is_blank)
    }

    /// 原始行 JSON（按列名排序，便于比对）
    pub fn to_json(&self) -> Value {
        let mut columns: Vec<&String> = self.cells.keys().collect();
        columns.sort();
        let map = columns
            .into_iter()
            .map(|c| (c.clone(), self.cells[c].to_json()))
            .collect::<serde_json::Map<String, Value>>();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_renders_without_fraction() {
        assert_eq!(RawCell::Number(1999.0).as_text(), Some("1999".to_string()));
        assert_eq!(RawCell::Number(2.5).as_text(), Some("2.5".to_string()));
    }

    #[test]
    fn test_missing_column_is_empty() {
        let row = RawRow::from_pairs(1, [("company_registered_name", "Acme Ltd")]);
        assert_eq!(row.get("hq_address"), &RawCell::Empty);
        assert!(!row.is_blank());
    }

    #[test]
    fn test_blank_row() {
        let row = RawRow::from_pairs(3, [("a", ""), ("b", "   ")]);
        assert!(row.is_blank());
    }
}
