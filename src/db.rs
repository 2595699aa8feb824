// ==========================================
// 公司概况导入器 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建库脚本集中在此处，测试与命令行共用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：foreign_keys 与 busy_timeout 都需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS import_batch (
            batch_id TEXT PRIMARY KEY,
            file_name TEXT,
            file_path TEXT,
            total_rows INTEGER NOT NULL DEFAULT 0,
            imported_rows INTEGER NOT NULL DEFAULT 0,
            rejected_rows INTEGER NOT NULL DEFAULT 0,
            warning_count INTEGER NOT NULL DEFAULT 0,
            imported_at TEXT,
            imported_by TEXT,
            elapsed_ms INTEGER,
            report_json TEXT
        );

        CREATE TABLE IF NOT EXISTS company_overview (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            batch_id TEXT,
            row_number INTEGER NOT NULL,
            reg_name TEXT NOT NULL CHECK (length(reg_name) > 0),
            trading_name TEXT,
            hq_origin_country TEXT,
            year_founded INTEGER,
            incorporation_date TEXT,
            company_type TEXT,
            ownership_structure TEXT,
            company_description TEXT,
            employee_count INTEGER,
            main_industry_operations TEXT NOT NULL DEFAULT '[]',
            other_industry_operations TEXT NOT NULL DEFAULT '[]',
            countries_of_operation TEXT NOT NULL DEFAULT '[]',
            business_model TEXT NOT NULL DEFAULT '[]',
            target_markets TEXT NOT NULL DEFAULT '[]',
            website TEXT,
            company_email TEXT,
            company_phone TEXT,
            contact_name TEXT,
            contact_title TEXT,
            contact_email TEXT,
            contact_phone TEXT,
            linkedin_url TEXT,
            twitter_url TEXT,
            facebook_url TEXT,
            instagram_url TEXT,
            publicly_listed INTEGER,
            open_to_acquisition INTEGER,
            last_valuation_date TEXT,
            ebitda_times TEXT,
            shareholders TEXT,
            hq_address TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_company_overview_batch
            ON company_overview(batch_id);

        CREATE TABLE IF NOT EXISTS import_rejection (
            rejection_id TEXT PRIMARY KEY,
            batch_id TEXT NOT NULL,
            row_number INTEGER NOT NULL,
            reg_name TEXT,
            violations_json TEXT NOT NULL,
            raw_data TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_import_rejection_batch
            ON import_rejection(batch_id);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(
            read_schema_version(&conn).unwrap(),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }
}
