// ==========================================
// 公司概况导入器 - 命令行入口
// ==========================================
// 用法: company-overview-importer <文件>...
// 数据库: COMPANY_IMPORT_DB_PATH > 用户数据目录 > ./company_overview.db
// ==========================================

use anyhow::Context;
use company_overview_importer::db::{init_schema, open_sqlite_connection};
use company_overview_importer::importer::{
    CompanyImporter, CompanyImporterImpl, FieldMapperImpl, RowValidatorImpl, UniversalFileParser,
};
use company_overview_importer::{logging, ConfigManager, CompanyImportRepositoryImpl, ImportReport};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

/// 获取默认数据库路径
fn default_db_path() -> String {
    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("COMPANY_IMPORT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./company_overview.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("company-overview-importer");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("company_overview.db");
        }
    }

    path.to_string_lossy().to_string()
}

fn print_report(path: &Path, report: &ImportReport) {
    let summary = &report.summary;
    println!("==================================================");
    println!("文件: {}", path.display());
    println!("批次: {}", report.batch.batch_id);
    println!(
        "总行数: {}  导入: {}  拒绝: {}  告警: {}  耗时: {}ms",
        summary.total_rows,
        summary.imported,
        summary.rejected,
        summary.warnings,
        report.elapsed_time.as_millis()
    );

    for rejection in &report.rejections {
        println!(
            "  第 {} 行 [{}] {}",
            rejection.row_number,
            rejection.reg_name.as_deref().unwrap_or("-"),
            rejection.describe()
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    logging::init();

    let files: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if files.is_empty() {
        eprintln!("用法: company-overview-importer <文件>...");
        eprintln!("支持: .xlsx / .xls / .xlsm / .ods / .csv / .json");
        return Ok(ExitCode::from(2));
    }

    tracing::info!("{} v{}", company_overview_importer::APP_NAME, company_overview_importer::VERSION);

    let db_path = default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    init_schema(&conn).context("建表失败")?;
    let conn = Arc::new(Mutex::new(conn));

    let importer = CompanyImporterImpl::new(
        CompanyImportRepositoryImpl::from_connection(conn.clone())?,
        ConfigManager::from_connection(conn)?,
        Box::new(UniversalFileParser),
        Box::new(RowValidatorImpl::new()),
        Box::new(FieldMapperImpl),
    );

    let paths: Vec<&Path> = files.iter().map(PathBuf::as_path).collect();
    let results = importer.import_files(&paths).await;

    let mut failed = 0usize;
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(report) => print_report(path, &report),
            Err(message) => {
                failed += 1;
                eprintln!("导入失败: {}", message);
            }
        }
    }

    if failed > 0 {
        tracing::error!(failed, total = paths.len(), "部分文件导入失败");
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
