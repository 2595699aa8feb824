// ==========================================
// 公司概况导入器 - 导入层
// ==========================================
// 职责: 表格行 → 公司概况记录 → 分批落库
// 支持: Excel, CSV, JSON 行数组
// ==========================================

// 模块声明
pub mod cell_coercion;
pub mod company_importer_impl;
pub mod company_importer_trait;
pub mod diagnostics;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod row_validator;

// 重导出核心类型
pub use cell_coercion::{CellCoercer, JsonColumnPolicy, JsonFallback};
pub use company_importer_impl::CompanyImporterImpl;
pub use diagnostics::{
    CollectingWarningSink, TeeWarningSink, TracingWarningSink, WarningContext, WarningSink,
};
pub use error::{ImportError, ImportResult};
pub use field_mapper::{columns, FieldMapper as FieldMapperImpl};
pub use file_parser::{CsvParser, ExcelParser, JsonRowsParser, UniversalFileParser};
pub use row_validator::{default_rules, ColumnRules, FieldRule, RowValidator as RowValidatorImpl};

// 重导出 Trait 接口
pub use company_importer_trait::{CompanyImporter, FieldMapper, FileParser, RowValidator};
