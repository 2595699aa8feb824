// ==========================================
// 公司概况导入器 - 导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// ==========================================

use crate::domain::{CompanyOverviewRecord, FieldViolation, ImportReport, RawRow};
use crate::importer::diagnostics::WarningSink;
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// CompanyImporter Trait
// ==========================================
// 用途: 公司概况导入主接口
// 实现者: CompanyImporterImpl
#[async_trait]
pub trait CompanyImporter: Send + Sync {
    /// 从表格文件导入公司概况
    ///
    /// # 参数
    /// - file_path: .xlsx / .xls / .ods / .csv / .json
    ///
    /// # 返回
    /// - Ok(ImportReport): 批次信息、逐行拒绝明细、告警列表
    /// - Err: 文件读取错误、存储错误（单元格问题不会走到这里）
    ///
    /// # 导入流程
    /// 1. 文件读取与解析
    /// 2. 按块逐行校验（失败行整行拒绝）
    /// 3. 字段映射与类型转换（失败字段降级）
    /// 4. 每满一批落库（事务化），再处理下一批
    /// 5. 记录批次与拒绝明细
    async fn import_file(&self, file_path: &Path) -> ImportResult<ImportReport>;

    /// 导入已读取的行（调用方自行解析文件时使用）
    async fn import_rows(&self, rows: Vec<RawRow>, source_name: &str)
        -> ImportResult<ImportReport>;

    /// 依次导入多个文件
    ///
    /// 某个文件失败只记录错误信息，不影响其他文件
    async fn import_files(&self, file_paths: &[&Path]) -> Vec<Result<ImportReport, String>>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 1）
// 实现者: ExcelParser, CsvParser, JsonRowsParser
pub trait FileParser: Send + Sync {
    /// 解析为表头匹配后的行，完全空白的行不返回
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>>;
}

// ==========================================
// RowValidator Trait
// ==========================================
// 用途: 逐列声明式校验（阶段 2）
// 实现者: row_validator::RowValidator
pub trait RowValidator: Send + Sync {
    /// 返回按列名标注的违规列表；为空表示通过
    fn validate(&self, row: &RawRow) -> Vec<FieldViolation>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 行 → 记录（阶段 3）
// 实现者: field_mapper::FieldMapper
pub trait FieldMapper: Send + Sync {
    /// 注册名称缺失时返回 None 并上报一条告警；
    /// 其余字段问题只降级、上报，不影响记录产出
    fn map_row(&self, row: &RawRow, sink: &dyn WarningSink) -> Option<CompanyOverviewRecord>;
}
