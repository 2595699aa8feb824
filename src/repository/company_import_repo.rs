// ==========================================
// 公司概况导入器 - 导入 Repository Trait
// ==========================================
// 职责: 定义导入相关数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::{CompanyOverviewRecord, ImportBatch, RowRejection};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// CompanyImportRepository Trait
// ==========================================
// 用途: 公司概况批量落库 + 批次/拒绝行记录
// 实现者: CompanyImportRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait CompanyImportRepository: Send + Sync {
    // ===== 批量写入（事务化）=====

    /// 批量插入公司概况
    ///
    /// # 返回
    /// - Ok(usize): 成功插入的记录数
    /// - Err: 数据库错误（整个事务回滚）
    async fn batch_insert_company_overviews(
        &self,
        records: Vec<CompanyOverviewRecord>,
    ) -> RepositoryResult<usize>;

    /// 批量插入拒绝行
    async fn batch_insert_rejections(&self, rejections: Vec<RowRejection>)
        -> RepositoryResult<usize>;

    // ===== 批次管理 =====

    /// 记录导入批次
    async fn insert_batch(&self, batch: ImportBatch) -> RepositoryResult<()>;

    /// 查询批次
    async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatch>>;

    // ===== 查询 =====

    /// 按批次查询已导入的记录（按行号排序）
    async fn list_company_overviews_by_batch(
        &self,
        batch_id: &str,
    ) -> RepositoryResult<Vec<CompanyOverviewRecord>>;

    /// 按批次查询拒绝行（按行号排序）
    async fn get_rejections_by_batch(&self, batch_id: &str) -> RepositoryResult<Vec<RowRejection>>;

    /// 公司概况总数
    async fn count_company_overviews(&self) -> RepositoryResult<usize>;
}
