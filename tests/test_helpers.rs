// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试文件生成等功能
// ==========================================

#![allow(dead_code)]

use company_overview_importer::config::ConfigManager;
use company_overview_importer::db::init_schema;
use company_overview_importer::importer::{
    CompanyImporterImpl, FieldMapperImpl, RowValidatorImpl, UniversalFileParser,
};
use company_overview_importer::repository::CompanyImportRepositoryImpl;
use rusqlite::{params, Connection};
use std::error::Error;
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let conn = Connection::open(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 写入 global 配置
pub fn insert_test_config(db_path: &str, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let conn = Connection::open(db_path)?;
    conn.execute(
        "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

/// 写入临时 CSV 文件（首行为表头）
pub fn write_csv(content: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    write_with_suffix(".csv", content)
}

/// 写入临时 JSON 行数组文件
pub fn write_json_rows(content: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    write_with_suffix(".json", content)
}

fn write_with_suffix(suffix: &str, content: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = Builder::new().suffix(suffix).tempfile()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// 创建基于 SQLite 的导入器
pub fn create_test_importer(
    db_path: &str,
) -> CompanyImporterImpl<CompanyImportRepositoryImpl, ConfigManager> {
    let import_repo =
        CompanyImportRepositoryImpl::new(db_path).expect("Failed to create CompanyImportRepository");
    let config = ConfigManager::new(db_path).expect("Failed to create ConfigManager");

    CompanyImporterImpl::new(
        import_repo,
        config,
        Box::new(UniversalFileParser),
        Box::new(RowValidatorImpl::with_current_year(2024)),
        Box::new(FieldMapperImpl),
    )
}
