// ==========================================
// 公司概况导入器 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取每次落库的记录数
    ///
    /// # 默认值
    /// - 500
    async fn get_batch_size(&self) -> ImportResult<usize>;

    /// 获取每次读入内存处理的行数
    ///
    /// # 默认值
    /// - 500
    async fn get_chunk_size(&self) -> ImportResult<usize>;

    /// 获取导入人标识（写入 import_batch.imported_by）
    ///
    /// # 默认值
    /// - "system"
    async fn get_imported_by(&self) -> ImportResult<String>;

    /// 获取配置快照（JSON 对象文本，写入批次报告）
    ///
    /// # 默认值
    /// - "{}"
    async fn get_config_snapshot(&self) -> ImportResult<String> {
        Ok("{}".to_string())
    }
}
