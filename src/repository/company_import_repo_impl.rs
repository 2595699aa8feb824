// ==========================================
// 公司概况导入器 - 导入 Repository 实现
// ==========================================
// 职责: 实现导入相关数据访问（使用 rusqlite）
// 存储: 列表/对象以 JSON 文本保存，日期为 YYYY-MM-DD，布尔为可空整数
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::{CompanyOverviewRecord, FieldViolation, ImportBatch, RowRejection};
use crate::repository::company_import_repo::CompanyImportRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

const COMPANY_OVERVIEW_COLUMNS: &str = r#"
    batch_id, row_number, reg_name, trading_name, hq_origin_country,
    year_founded, incorporation_date, company_type, ownership_structure,
    company_description, employee_count, main_industry_operations,
    other_industry_operations, countries_of_operation, business_model,
    target_markets, website, company_email, company_phone, contact_name,
    contact_title, contact_email, contact_phone, linkedin_url, twitter_url,
    facebook_url, instagram_url, publicly_listed, open_to_acquisition,
    last_valuation_date, ebitda_times, shareholders, hq_address
"#;

/// 读取 JSON 文本列
fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_json_column(row: &Row, idx: usize) -> rusqlite::Result<Option<Value>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|text| {
        serde_json::from_str(&text)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn row_to_record(row: &Row) -> rusqlite::Result<CompanyOverviewRecord> {
    Ok(CompanyOverviewRecord {
        batch_id: row.get(0)?,
        row_number: row.get::<_, i64>(1)? as usize,
        reg_name: row.get(2)?,
        trading_name: row.get(3)?,
        hq_origin_country: row.get(4)?,
        year_founded: row.get(5)?,
        incorporation_date: row.get(6)?,
        company_type: row.get(7)?,
        ownership_structure: row.get(8)?,
        company_description: row.get(9)?,
        employee_count: row.get(10)?,
        main_industry_operations: json_column(row, 11)?,
        other_industry_operations: json_column(row, 12)?,
        countries_of_operation: json_column(row, 13)?,
        business_model: json_column(row, 14)?,
        target_markets: json_column(row, 15)?,
        website: row.get(16)?,
        company_email: row.get(17)?,
        company_phone: row.get(18)?,
        contact_name: row.get(19)?,
        contact_title: row.get(20)?,
        contact_email: row.get(21)?,
        contact_phone: row.get(22)?,
        linkedin_url: row.get(23)?,
        twitter_url: row.get(24)?,
        facebook_url: row.get(25)?,
        instagram_url: row.get(26)?,
        publicly_listed: row.get(27)?,
        open_to_acquisition: row.get(28)?,
        last_valuation_date: row.get(29)?,
        ebitda_times: optional_json_column(row, 30)?,
        shareholders: optional_json_column(row, 31)?,
        hq_address: json_column(row, 32)?,
    })
}

fn row_to_batch(row: &Row) -> rusqlite::Result<ImportBatch> {
    Ok(ImportBatch {
        batch_id: row.get(0)?,
        file_name: row.get(1)?,
        file_path: row.get(2)?,
        total_rows: row.get(3)?,
        imported_rows: row.get(4)?,
        rejected_rows: row.get(5)?,
        warning_count: row.get(6)?,
        imported_at: row.get(7)?,
        imported_by: row.get(8)?,
        elapsed_ms: row.get(9)?,
        report_json: row.get(10)?,
    })
}

fn row_to_rejection(row: &Row) -> rusqlite::Result<RowRejection> {
    let violations: Vec<FieldViolation> = json_column(row, 4)?;
    Ok(RowRejection {
        rejection_id: row.get(0)?,
        batch_id: row.get(1)?,
        row_number: row.get::<_, i64>(2)? as usize,
        reg_name: row.get(3)?,
        violations,
        raw_data: row.get(5)?,
        created_at: row.get(6)?,
    })
}

// ==========================================
// CompanyImportRepositoryImpl
// ==========================================
pub struct CompanyImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl CompanyImportRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（会再次应用统一 PRAGMA，幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在事务中批量插入公司概况
    fn batch_insert_company_overviews_tx(
        tx: &Transaction,
        records: &[CompanyOverviewRecord],
    ) -> RepositoryResult<usize> {
        let sql = format!(
            "INSERT INTO company_overview ({}) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32, ?33
            )",
            COMPANY_OVERVIEW_COLUMNS
        );
        let mut stmt = tx.prepare(&sql)?;

        let mut count = 0;
        for record in records {
            let ebitda_times = record.ebitda_times.as_ref().map(Value::to_string);
            let shareholders = record.shareholders.as_ref().map(Value::to_string);

            stmt.execute(params![
                record.batch_id,
                record.row_number as i64,
                record.reg_name,
                record.trading_name,
                record.hq_origin_country,
                record.year_founded,
                record.incorporation_date,
                record.company_type,
                record.ownership_structure,
                record.company_description,
                record.employee_count,
                serde_json::to_string(&record.main_industry_operations)?,
                serde_json::to_string(&record.other_industry_operations)?,
                serde_json::to_string(&record.countries_of_operation)?,
                serde_json::to_string(&record.business_model)?,
                serde_json::to_string(&record.target_markets)?,
                record.website,
                record.company_email,
                record.company_phone,
                record.contact_name,
                record.contact_title,
                record.contact_email,
                record.contact_phone,
                record.linkedin_url,
                record.twitter_url,
                record.facebook_url,
                record.instagram_url,
                record.publicly_listed,
                record.open_to_acquisition,
                record.last_valuation_date,
                ebitda_times,
                shareholders,
                record.hq_address.to_string(),
            ])?;
            count += 1;
        }

        Ok(count)
    }

    fn batch_insert_rejections_tx(
        tx: &Transaction,
        rejections: &[RowRejection],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO import_rejection (
                rejection_id, batch_id, row_number, reg_name,
                violations_json, raw_data, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )?;

        let mut count = 0;
        for rejection in rejections {
            stmt.execute(params![
                rejection.rejection_id,
                rejection.batch_id,
                rejection.row_number as i64,
                rejection.reg_name,
                serde_json::to_string(&rejection.violations)?,
                rejection.raw_data,
                rejection.created_at,
            ])?;
            count += 1;
        }

        Ok(count)
    }
}

#[async_trait]
impl CompanyImportRepository for CompanyImportRepositoryImpl {
    async fn batch_insert_company_overviews(
        &self,
        records: Vec<CompanyOverviewRecord>,
    ) -> RepositoryResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        let count = Self::batch_insert_company_overviews_tx(&tx, &records)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(count)
    }

    async fn batch_insert_rejections(
        &self,
        rejections: Vec<RowRejection>,
    ) -> RepositoryResult<usize> {
        if rejections.is_empty() {
            return Ok(0);
        }

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        let count = Self::batch_insert_rejections_tx(&tx, &rejections)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(count)
    }

    async fn insert_batch(&self, batch: ImportBatch) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO import_batch (
                batch_id, file_name, file_path, total_rows, imported_rows,
                rejected_rows, warning_count, imported_at, imported_by,
                elapsed_ms, report_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                batch.batch_id,
                batch.file_name,
                batch.file_path,
                batch.total_rows,
                batch.imported_rows,
                batch.rejected_rows,
                batch.warning_count,
                batch.imported_at,
                batch.imported_by,
                batch.elapsed_ms,
                batch.report_json,
            ],
        )?;
        Ok(())
    }

    async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatch>> {
        let conn = self.lock()?;
        let batch = conn
            .query_row(
                r#"
                SELECT batch_id, file_name, file_path, total_rows, imported_rows,
                       rejected_rows, warning_count, imported_at, imported_by,
                       elapsed_ms, report_json
                FROM import_batch WHERE batch_id = ?1
                "#,
                params![batch_id],
                row_to_batch,
            )
            .optional()?;
        Ok(batch)
    }

    async fn list_company_overviews_by_batch(
        &self,
        batch_id: &str,
    ) -> RepositoryResult<Vec<CompanyOverviewRecord>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM company_overview WHERE batch_id = ?1 ORDER BY row_number",
            COMPANY_OVERVIEW_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![batch_id], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    async fn get_rejections_by_batch(&self, batch_id: &str) -> RepositoryResult<Vec<RowRejection>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT rejection_id, batch_id, row_number, reg_name,
                   violations_json, raw_data, created_at
            FROM import_rejection WHERE batch_id = ?1
            ORDER BY row_number
            "#,
        )?;
        let rejections = stmt
            .query_map(params![batch_id], row_to_rejection)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rejections)
    }

    async fn count_company_overviews(&self) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM company_overview", [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use chrono::{NaiveDate, Utc};
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn create_repo() -> (NamedTempFile, CompanyImportRepositoryImpl) {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();
        let repo = CompanyImportRepositoryImpl::new(&path).unwrap();
        {
            let conn = repo.lock().unwrap();
            init_schema(&conn).unwrap();
        }
        (temp_file, repo)
    }

    #[tokio::test]
    async fn test_record_survives_round_trip_through_sqlite() {
        let (_tmp, repo) = create_repo();

        let mut record = CompanyOverviewRecord::with_reg_name("Acme Ltd", 1);
        record.batch_id = Some("batch-1".to_string());
        record.year_founded = Some(1999);
        record.main_industry_operations = vec!["Tech".to_string(), "Finance".to_string()];
        record.ebitda_times = Some(json!({"years": "3", "amount": "5"}));
        record.hq_address = json!({"full_address_string": "123 Main St"});
        record.publicly_listed = Some(false);
        record.last_valuation_date = NaiveDate::from_ymd_opt(2023, 3, 15);

        let inserted = repo
            .batch_insert_company_overviews(vec![record.clone()])
            .await
            .unwrap();
        assert_eq!(inserted, 1);

        let stored = repo.list_company_overviews_by_batch("batch-1").await.unwrap();
        assert_eq!(stored, vec![record]);
        assert_eq!(repo.count_company_overviews().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_reg_name_is_refused_by_schema() {
        let (_tmp, repo) = create_repo();

        let record = CompanyOverviewRecord::with_reg_name("", 1);
        let result = repo.batch_insert_company_overviews(vec![record]).await;

        assert!(result.is_err());
        assert_eq!(repo.count_company_overviews().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rejections_and_batch() {
        let (_tmp, repo) = create_repo();

        let rejection = RowRejection {
            rejection_id: "r-1".to_string(),
            batch_id: "batch-2".to_string(),
            row_number: 4,
            reg_name: Some("Bad Email Co".to_string()),
            violations: vec![FieldViolation {
                column: "company_email".to_string(),
                message: "邮箱格式错误: nope".to_string(),
            }],
            raw_data: "{}".to_string(),
            created_at: Utc::now(),
        };
        repo.batch_insert_rejections(vec![rejection]).await.unwrap();

        repo.insert_batch(ImportBatch {
            batch_id: "batch-2".to_string(),
            file_name: Some("companies.csv".to_string()),
            file_path: None,
            total_rows: 1,
            imported_rows: 0,
            rejected_rows: 1,
            warning_count: 1,
            imported_at: Some(Utc::now()),
            imported_by: Some("system".to_string()),
            elapsed_ms: Some(3),
            report_json: None,
        })
        .await
        .unwrap();

        let stored = repo.get_rejections_by_batch("batch-2").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].violations[0].column, "company_email");

        let batch = repo.get_batch("batch-2").await.unwrap().unwrap();
        assert_eq!(batch.rejected_rows, 1);
        assert!(repo.get_batch("missing").await.unwrap().is_none());
    }
}
