// ==========================================
// 公司概况导入器 - 领域模型层
// ==========================================
// 职责: 定义原始行、导入记录、批次与诊断类型
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod company;
pub mod row;

// 重导出核心类型
pub use company::{
    CompanyOverviewRecord, FieldViolation, ImportBatch, ImportReport, ImportSummary,
    ImportWarning, RowRejection,
};
pub use row::{RawCell, RawRow};
