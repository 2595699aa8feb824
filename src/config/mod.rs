// ==========================================
// 公司概况导入器 - 配置层
// ==========================================
// 职责: 导入参数管理（批量大小、分块大小、导入人）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

pub use config_manager::{
    config_keys, ConfigManager, DEFAULT_BATCH_SIZE, DEFAULT_CHUNK_SIZE, DEFAULT_IMPORTED_BY,
};
pub use import_config_trait::ImportConfigReader;
