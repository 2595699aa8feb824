// ==========================================
// 公司概况导入器 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod company_import_repo;
pub mod company_import_repo_impl;
pub mod error;

pub use company_import_repo::CompanyImportRepository;
pub use company_import_repo_impl::CompanyImportRepositoryImpl;
pub use error::{RepositoryError, RepositoryResult};
