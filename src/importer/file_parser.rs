// ==========================================
// 公司概况导入器 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls/.ods) / CSV (.csv) / JSON 行数组 (.json)
// 约定: 第一行为表头，未知列保留但映射时忽略
// ==========================================

use crate::domain::{RawCell, RawRow};
use crate::importer::company_importer_trait::FileParser;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Data, Range, Reader};
use csv::ReaderBuilder;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        // 读取表头（去掉 UTF-8 BOM）
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        // csv 会跳过完全空的行，行号取自记录所在的物理行（表头占第 1 行）
        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let row_number = record
                .position()
                .map(|pos| pos.line().saturating_sub(1) as usize)
                .filter(|n| *n > 0)
                .unwrap_or(row_idx + 1);
            let mut row = RawRow::new(row_number);

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row.insert(header.clone(), RawCell::from(value.trim()));
                }
            }

            // 跳过完全空白的行
            if row.is_blank() {
                continue;
            }

            rows.push(row);
        }

        Ok(rows)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    fn convert_cell(cell: &Data) -> RawCell {
        match cell {
            Data::Empty | Data::Error(_) => RawCell::Empty,
            Data::String(s) => RawCell::from(s.trim()),
            Data::Float(f) => RawCell::Number(*f),
            Data::Int(i) => RawCell::Number(*i as f64),
            Data::Bool(b) => RawCell::Bool(*b),
            // 日期单元格保留序列号，交给日期转换识别
            Data::DateTime(dt) => RawCell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::from(s.trim()),
        }
    }
}

impl ExcelParser {
    /// 取第一个工作表名
    fn first_sheet(sheet_names: &[String]) -> ImportResult<String> {
        sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))
    }

    /// 首行为表头，其余为数据行；行号相对表头计算，空白行保留位置
    fn rows_from_range(range: &Range<Data>) -> ImportResult<Vec<RawRow>> {
        let mut data_rows = range.rows();
        let header_row = data_rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无表头行".to_string()))?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (row_idx, data_row) in data_rows.enumerate() {
            let mut row = RawRow::new(row_idx + 1);

            for (col_idx, cell) in data_row.iter().enumerate() {
                match headers.get(col_idx) {
                    Some(header) if !header.is_empty() => {
                        row.insert(header.clone(), Self::convert_cell(cell));
                    }
                    _ => {}
                }
            }

            if row.is_blank() {
                continue;
            }

            rows.push(row);
        }

        Ok(rows)
    }
}

impl FileParser for ExcelParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if !matches!(ext.as_str(), "xlsx" | "xls" | "xlsm" | "ods") {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_name = Self::first_sheet(&workbook.sheet_names())?;
        let range = workbook.worksheet_range(&sheet_name)?;

        Self::rows_from_range(&range)
    }
}

// ==========================================
// JSON 行数组 Parser 实现
// ==========================================
// 格式: [{"company_registered_name": "...", ...}, ...]
// 说明: 上游表格库已解码的数组单元格保持为数组
pub struct JsonRowsParser;

impl JsonRowsParser {
    fn convert_value(value: Value) -> RawCell {
        match value {
            Value::Null => RawCell::Empty,
            Value::Bool(b) => RawCell::Bool(b),
            Value::Number(n) => n.as_f64().map(RawCell::Number).unwrap_or(RawCell::Empty),
            Value::String(s) => RawCell::from(s),
            Value::Array(items) => RawCell::Array(items),
            // 对象保留 JSON 文本，交给 JSON 列转换解码
            object @ Value::Object(_) => RawCell::Text(object.to_string()),
        }
    }
}

impl FileParser for JsonRowsParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let reader = BufReader::new(File::open(file_path)?);
        let entries: Vec<serde_json::Map<String, Value>> = serde_json::from_reader(reader)?;

        let rows = entries
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| {
                let mut row = RawRow::new(idx + 1);
                for (column, value) in entry {
                    row.insert(column.trim().to_string(), Self::convert_value(value));
                }
                row
            })
            .filter(|row| !row.is_blank())
            .collect();

        Ok(rows)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        match extension_of(file_path).as_str() {
            "csv" => CsvParser.parse_to_raw_rows(file_path),
            "xlsx" | "xls" | "xlsm" | "ods" => ExcelParser.parse_to_raw_rows(file_path),
            "json" => JsonRowsParser.parse_to_raw_rows(file_path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{CellErrorType, ExcelDateTime, ExcelDateTimeType};
    use std::io::Write;
    use tempfile::Builder;

    fn temp_with_suffix(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let file = temp_with_suffix(
            ".csv",
            "company_registered_name,year_founded,main_industry_operations\n\
             Acme Ltd,1999,\"Tech, Finance\"\n\
             Beta plc,2005,Retail\n",
        );

        let rows = CsvParser.parse_to_raw_rows(file.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 1);
        assert_eq!(
            rows[0].get("company_registered_name"),
            &RawCell::Text("Acme Ltd".to_string())
        );
        assert_eq!(
            rows[0].get("main_industry_operations"),
            &RawCell::Text("Tech, Finance".to_string())
        );
    }

    #[test]
    fn test_csv_parser_skip_empty_rows() {
        let file = temp_with_suffix(".csv", "company_registered_name,hq_origin_country\nA,UK\n,\nB,FR\n");
        let rows = CsvParser.parse_to_raw_rows(file.path()).unwrap();

        assert_eq!(rows.len(), 2);
        // 行号保持原始位置
        assert_eq!(rows[1].row_number, 3);
    }

    #[test]
    fn test_csv_parser_blank_line_keeps_row_position() {
        let file = temp_with_suffix(
            ".csv",
            "company_registered_name,company_email\nA Co,a@a.com\n\nB Co,bad\n",
        );
        let rows = CsvParser.parse_to_raw_rows(file.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 1);
        assert_eq!(rows[1].row_number, 3);
        assert_eq!(
            rows[1].get("company_registered_name"),
            &RawCell::Text("B Co".to_string())
        );
    }

    #[test]
    fn test_excel_convert_cell() {
        let serial = ExcelDateTime::new(45000.0, ExcelDateTimeType::DateTime, false);

        assert_eq!(
            ExcelParser::convert_cell(&Data::DateTime(serial)),
            RawCell::Number(45000.0)
        );
        assert_eq!(ExcelParser::convert_cell(&Data::Int(1999)), RawCell::Number(1999.0));
        assert_eq!(ExcelParser::convert_cell(&Data::Float(2.5)), RawCell::Number(2.5));
        assert_eq!(ExcelParser::convert_cell(&Data::Bool(true)), RawCell::Bool(true));
        assert_eq!(ExcelParser::convert_cell(&Data::Empty), RawCell::Empty);
        assert_eq!(
            ExcelParser::convert_cell(&Data::Error(CellErrorType::NA)),
            RawCell::Empty
        );
        assert_eq!(
            ExcelParser::convert_cell(&Data::String("  Acme Ltd ".to_string())),
            RawCell::Text("Acme Ltd".to_string())
        );
        assert_eq!(
            ExcelParser::convert_cell(&Data::DateTimeIso("2023-03-15".to_string())),
            RawCell::Text("2023-03-15".to_string())
        );
        assert_eq!(
            ExcelParser::convert_cell(&Data::String("   ".to_string())),
            RawCell::Empty
        );
    }

    #[test]
    fn test_excel_rows_from_range() {
        let mut range: Range<Data> = Range::new((0, 0), (3, 1));
        range.set_value((0, 0), Data::String("company_registered_name".to_string()));
        range.set_value((0, 1), Data::String("last_valuation_date".to_string()));
        range.set_value((1, 0), Data::String("Acme Ltd".to_string()));
        range.set_value(
            (1, 1),
            Data::DateTime(ExcelDateTime::new(45000.0, ExcelDateTimeType::DateTime, false)),
        );
        // 第 2 行数据留空
        range.set_value((3, 0), Data::String("Beta plc".to_string()));

        let rows = ExcelParser::rows_from_range(&range).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 1);
        assert_eq!(rows[0].get("last_valuation_date"), &RawCell::Number(45000.0));
        assert_eq!(rows[1].row_number, 3);
        assert_eq!(
            rows[1].get("company_registered_name"),
            &RawCell::Text("Beta plc".to_string())
        );
    }

    #[test]
    fn test_excel_missing_header_or_sheet() {
        let empty: Range<Data> = Range::empty();
        assert!(matches!(
            ExcelParser::rows_from_range(&empty),
            Err(ImportError::ExcelParseError(_))
        ));

        assert!(matches!(
            ExcelParser::first_sheet(&[]),
            Err(ImportError::ExcelParseError(_))
        ));
        assert_eq!(
            ExcelParser::first_sheet(&["Companies".to_string(), "Notes".to_string()]).unwrap(),
            "Companies"
        );
    }

    #[test]
    fn test_excel_parser_rejects_corrupt_workbook() {
        let file = temp_with_suffix(".xlsx", "this is not a zip archive");
        let result = ExcelParser.parse_to_raw_rows(file.path());
        assert!(matches!(result, Err(ImportError::ExcelParseError(_))));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_raw_rows(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_json_rows_keep_arrays() {
        let file = temp_with_suffix(
            ".json",
            r#"[{"company_registered_name":"Acme","target_markets":["EU","US"],"year_founded":1999,"hq_address":{"city":"Leeds"}},{}]"#,
        );
        let rows = JsonRowsParser.parse_to_raw_rows(file.path()).unwrap();

        assert_eq!(rows.len(), 1);
        assert!(matches!(rows[0].get("target_markets"), RawCell::Array(items) if items.len() == 2));
        assert_eq!(rows[0].get("year_founded"), &RawCell::Number(1999.0));
        assert_eq!(
            rows[0].get("hq_address"),
            &RawCell::Text(r#"{"city":"Leeds"}"#.to_string())
        );
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let file = temp_with_suffix(".txt", "hello");
        let result = UniversalFileParser.parse_to_raw_rows(file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "txt"));
    }
}
