// ==========================================
// 公司概况导入器 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 并购平台公司概况表格导入
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 行与记录
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 解析/校验/映射/落库
pub mod importer;

// 配置层 - 导入参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    CompanyOverviewRecord, FieldViolation, ImportBatch, ImportReport, ImportSummary,
    ImportWarning, RawCell, RawRow, RowRejection,
};

pub use importer::{CompanyImporter, CompanyImporterImpl, ImportError, ImportResult};

pub use repository::{CompanyImportRepository, CompanyImportRepositoryImpl};

pub use config::{ConfigManager, ImportConfigReader};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "公司概况导入器";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
