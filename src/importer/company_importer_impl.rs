// ==========================================
// 公司概况导入器 - 导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到数据库
// 流程: 解析 → 分块 → 逐行校验 → 映射转换 → 分批落库 → 记录批次
// 红线: 行与行之间不共享状态，结果与分块/分批边界无关
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::{
    CompanyOverviewRecord, ImportBatch, ImportReport, ImportSummary, RawRow, RowRejection,
};
use crate::importer::company_importer_trait::{
    CompanyImporter, FieldMapper, FileParser, RowValidator,
};
use crate::importer::diagnostics::{
    CollectingWarningSink, TeeWarningSink, TracingWarningSink, WarningContext, WarningSink,
};
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::columns;
use crate::repository::CompanyImportRepository;
use chrono::Utc;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn, Span};
use uuid::Uuid;

/// 导入来源（写入 import_batch）
struct ImportSource<'a> {
    file_name: Option<&'a str>,
    file_path: Option<&'a str>,
}

// ==========================================
// CompanyImporterImpl - 公司概况导入器实现
// ==========================================
pub struct CompanyImporterImpl<R, C>
where
    R: CompanyImportRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    import_repo: R,

    // 配置读取器
    config: C,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    row_validator: Box<dyn RowValidator>,
    field_mapper: Box<dyn FieldMapper>,
}

impl<R, C> CompanyImporterImpl<R, C>
where
    R: CompanyImportRepository,
    C: ImportConfigReader,
{
    /// 创建新的 CompanyImporter 实例
    ///
    /// # 参数
    /// - import_repo: 导入数据仓储
    /// - config: 配置读取器
    /// - file_parser: 文件解析器
    /// - row_validator: 行校验器
    /// - field_mapper: 字段映射器
    pub fn new(
        import_repo: R,
        config: C,
        file_parser: Box<dyn FileParser>,
        row_validator: Box<dyn RowValidator>,
        field_mapper: Box<dyn FieldMapper>,
    ) -> Self {
        Self {
            import_repo,
            config,
            file_parser,
            row_validator,
            field_mapper,
        }
    }

    /// 访问底层仓储（查询导入结果）
    pub fn repository(&self) -> &R {
        &self.import_repo
    }

    /// 落库一批记录并清空缓冲区
    async fn flush(
        &self,
        buffer: &mut Vec<CompanyOverviewRecord>,
        batch_no: &mut usize,
    ) -> ImportResult<usize> {
        if buffer.is_empty() {
            return Ok(0);
        }

        *batch_no += 1;
        let records = std::mem::take(buffer);
        let size = records.len();
        let inserted = self
            .import_repo
            .batch_insert_company_overviews(records)
            .await
            .map_err(|e| {
                error!(batch_no = *batch_no, size, error = %e, "批量落库失败");
                e
            })?;
        debug!(batch_no = *batch_no, inserted, "批量落库完成");

        Ok(inserted)
    }

    /// 执行导入流水线（文件导入与行导入共用）
    async fn run_pipeline(
        &self,
        batch_id: String,
        rows: Vec<RawRow>,
        source: ImportSource<'_>,
        start_time: Instant,
    ) -> ImportResult<ImportReport> {
        let chunk_size = self.config.get_chunk_size().await?.max(1);
        let batch_size = self.config.get_batch_size().await?.max(1);
        let imported_by = self.config.get_imported_by().await?;
        let config_snapshot: Value =
            serde_json::from_str(&self.config.get_config_snapshot().await?)?;
        debug!(chunk_size, batch_size, "导入参数");

        let collector = CollectingWarningSink::new();
        let tracing_sink = TracingWarningSink;
        let sink = TeeWarningSink::new(&tracing_sink, &collector);

        let total_rows = rows.len();
        let mut imported = 0usize;
        let mut batch_no = 0usize;
        let mut buffer: Vec<CompanyOverviewRecord> = Vec::with_capacity(batch_size);
        let mut rejections: Vec<RowRejection> = Vec::new();

        // === 步骤 2: 分块处理 ===
        debug!("步骤 2: 分块校验与映射");
        for (chunk_no, chunk) in rows.chunks(chunk_size).enumerate() {
            debug!(chunk_no = chunk_no + 1, rows = chunk.len(), "处理数据块");

            for row in chunk {
                // 校验失败 → 整行拒绝，只产生一条告警
                let violations = self.row_validator.validate(row);
                if !violations.is_empty() {
                    let rejection = RowRejection {
                        rejection_id: Uuid::new_v4().to_string(),
                        batch_id: batch_id.clone(),
                        row_number: row.row_number,
                        reg_name: row
                            .get(columns::COMPANY_REGISTERED_NAME)
                            .as_text()
                            .filter(|name| !name.is_empty()),
                        violations,
                        raw_data: row.to_json().to_string(),
                        created_at: Utc::now(),
                    };
                    sink.warn(
                        &format!("行校验失败，整行拒绝: {}", rejection.describe()),
                        WarningContext::row(row.row_number),
                    );
                    rejections.push(rejection);
                    continue;
                }

                // === 步骤 3: 映射转换（字段问题只降级）===
                let Some(mut record) = self.field_mapper.map_row(row, &sink) else {
                    continue;
                };
                record.batch_id = Some(batch_id.clone());
                buffer.push(record);

                // === 步骤 4: 每满一批立即落库 ===
                if buffer.len() >= batch_size {
                    imported += self.flush(&mut buffer, &mut batch_no).await?;
                }
            }
        }
        imported += self.flush(&mut buffer, &mut batch_no).await?;
        info!(imported, rejected = rejections.len(), batches = batch_no, "记录落库完成");

        // === 步骤 5: 记录拒绝明细与批次 ===
        debug!("步骤 5: 记录拒绝明细与批次");
        if !rejections.is_empty() {
            self.import_repo
                .batch_insert_rejections(rejections.clone())
                .await?;
        }

        let warnings = collector.take();
        let summary = ImportSummary {
            total_rows,
            imported,
            rejected: rejections.len(),
            warnings: warnings.len(),
        };
        let elapsed_time = start_time.elapsed();

        let report_json = json!({
            "summary": summary,
            "chunk_size": chunk_size,
            "batch_size": batch_size,
            "batches": batch_no,
            "config": config_snapshot,
        })
        .to_string();

        let batch = ImportBatch {
            batch_id: batch_id.clone(),
            file_name: source.file_name.map(str::to_string),
            file_path: source.file_path.map(str::to_string),
            total_rows: total_rows as i32,
            imported_rows: imported as i32,
            rejected_rows: summary.rejected as i32,
            warning_count: summary.warnings as i32,
            imported_at: Some(Utc::now()),
            imported_by: Some(imported_by),
            elapsed_ms: Some(elapsed_time.as_millis() as i64),
            report_json: Some(report_json),
        };
        self.import_repo.insert_batch(batch.clone()).await?;

        info!(
            batch_id = %batch_id,
            total = summary.total_rows,
            imported = summary.imported,
            rejected = summary.rejected,
            warnings = summary.warnings,
            elapsed_ms = elapsed_time.as_millis() as u64,
            "公司概况导入完成"
        );

        Ok(ImportReport {
            batch,
            summary,
            rejections,
            warnings,
            elapsed_time,
        })
    }
}

#[async_trait::async_trait]
impl<R, C> CompanyImporter for CompanyImporterImpl<R, C>
where
    R: CompanyImportRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, file_path), fields(batch_id))]
    async fn import_file(&self, file_path: &Path) -> ImportResult<ImportReport> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        Span::current().record("batch_id", batch_id.as_str());

        let file_path_str = file_path.display().to_string();
        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        info!(batch_id = %batch_id, file_path = %file_path_str, "开始导入公司概况");

        // === 步骤 1: 解析文件 ===
        debug!("步骤 1: 解析文件");
        let rows = self.file_parser.parse_to_raw_rows(file_path).map_err(|e| {
            error!(error = %e, "文件解析失败");
            e
        })?;
        info!(total_rows = rows.len(), "文件解析完成");

        self.run_pipeline(
            batch_id,
            rows,
            ImportSource {
                file_name: Some(&file_name),
                file_path: Some(&file_path_str),
            },
            start_time,
        )
        .await
    }

    #[instrument(skip(self, rows), fields(batch_id))]
    async fn import_rows(&self, rows: Vec<RawRow>, source_name: &str) -> ImportResult<ImportReport> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        Span::current().record("batch_id", batch_id.as_str());
        info!(batch_id = %batch_id, total_rows = rows.len(), "开始导入已读取的行");

        self.run_pipeline(
            batch_id,
            rows,
            ImportSource {
                file_name: Some(source_name),
                file_path: None,
            },
            start_time,
        )
        .await
    }

    async fn import_files(&self, file_paths: &[&Path]) -> Vec<Result<ImportReport, String>> {
        let mut results = Vec::with_capacity(file_paths.len());

        for path in file_paths {
            match self.import_file(path).await {
                Ok(report) => results.push(Ok(report)),
                Err(e) => {
                    warn!(file_path = %path.display(), error = %e, "文件导入失败，继续下一个");
                    results.push(Err(format!("{}: {}", path.display(), e)));
                }
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawCell;
    use crate::importer::field_mapper::FieldMapper as FieldMapperImpl;
    use crate::importer::file_parser::UniversalFileParser;
    use crate::importer::row_validator::RowValidator as RowValidatorImpl;
    use crate::repository::RepositoryResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ===== 测试替身 =====

    #[derive(Default)]
    struct MemoryRepo {
        insert_calls: Mutex<Vec<usize>>,
        records: Mutex<Vec<CompanyOverviewRecord>>,
        rejections: Mutex<Vec<RowRejection>>,
        batches: Mutex<Vec<ImportBatch>>,
    }

    #[async_trait]
    impl CompanyImportRepository for MemoryRepo {
        async fn batch_insert_company_overviews(
            &self,
            records: Vec<CompanyOverviewRecord>,
        ) -> RepositoryResult<usize> {
            let n = records.len();
            self.insert_calls.lock().unwrap().push(n);
            self.records.lock().unwrap().extend(records);
            Ok(n)
        }

        async fn batch_insert_rejections(
            &self,
            rejections: Vec<RowRejection>,
        ) -> RepositoryResult<usize> {
            let n = rejections.len();
            self.rejections.lock().unwrap().extend(rejections);
            Ok(n)
        }

        async fn insert_batch(&self, batch: ImportBatch) -> RepositoryResult<()> {
            self.batches.lock().unwrap().push(batch);
            Ok(())
        }

        async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatch>> {
            Ok(self
                .batches
                .lock()
                .unwrap()
                .iter()
                .find(|b| b.batch_id == batch_id)
                .cloned())
        }

        async fn list_company_overviews_by_batch(
            &self,
            batch_id: &str,
        ) -> RepositoryResult<Vec<CompanyOverviewRecord>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.batch_id.as_deref() == Some(batch_id))
                .cloned()
                .collect())
        }

        async fn get_rejections_by_batch(
            &self,
            batch_id: &str,
        ) -> RepositoryResult<Vec<RowRejection>> {
            Ok(self
                .rejections
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.batch_id == batch_id)
                .cloned()
                .collect())
        }

        async fn count_company_overviews(&self) -> RepositoryResult<usize> {
            Ok(self.records.lock().unwrap().len())
        }
    }

    struct FixedConfig {
        batch_size: usize,
        chunk_size: usize,
    }

    #[async_trait]
    impl ImportConfigReader for FixedConfig {
        async fn get_batch_size(&self) -> ImportResult<usize> {
            Ok(self.batch_size)
        }

        async fn get_chunk_size(&self) -> ImportResult<usize> {
            Ok(self.chunk_size)
        }

        async fn get_imported_by(&self) -> ImportResult<String> {
            Ok("tester".to_string())
        }
    }

    fn importer(batch_size: usize, chunk_size: usize) -> CompanyImporterImpl<MemoryRepo, FixedConfig> {
        CompanyImporterImpl::new(
            MemoryRepo::default(),
            FixedConfig {
                batch_size,
                chunk_size,
            },
            Box::new(UniversalFileParser),
            Box::new(RowValidatorImpl::with_current_year(2024)),
            Box::new(FieldMapperImpl),
        )
    }

    fn named_row(row_number: usize, name: &str) -> RawRow {
        RawRow::from_pairs(
            row_number,
            [(columns::COMPANY_REGISTERED_NAME, RawCell::from(name))],
        )
    }

    #[tokio::test]
    async fn test_flushes_every_batch_size_records() {
        let importer = importer(2, 3);
        let rows = (1..=5).map(|i| named_row(i, &format!("Company {}", i))).collect();

        let report = importer.import_rows(rows, "memory").await.unwrap();

        assert_eq!(report.summary.imported, 5);
        assert_eq!(*importer.repository().insert_calls.lock().unwrap(), vec![2, 2, 1]);
        assert_eq!(report.batch.imported_by.as_deref(), Some("tester"));
        let stored = importer.repository().records.lock().unwrap().clone();
        assert!(stored
            .iter()
            .all(|r| r.batch_id.as_deref() == Some(report.batch.batch_id.as_str())));
    }

    #[tokio::test]
    async fn test_results_do_not_depend_on_boundaries() {
        let rows: Vec<RawRow> = (1..=7)
            .map(|i| {
                if i == 4 {
                    named_row(i, "")
                } else {
                    named_row(i, &format!("Company {}", i))
                }
            })
            .collect();

        let small = importer(1, 2).import_rows(rows.clone(), "a").await.unwrap();
        let large = importer(500, 500).import_rows(rows, "b").await.unwrap();

        assert_eq!(small.summary, large.summary);
        assert_eq!(small.summary.imported, 6);
        assert_eq!(small.summary.rejected, 1);
    }

    #[tokio::test]
    async fn test_rejected_row_yields_exactly_one_warning() {
        let importer = importer(500, 500);
        let rows = vec![
            named_row(1, ""),
            RawRow::from_pairs(
                2,
                [
                    (columns::COMPANY_REGISTERED_NAME, RawCell::from("Valid Co")),
                    (columns::COMPANY_EMAIL, RawCell::from("not-an-email")),
                ],
            ),
            named_row(3, "Next Co"),
        ];

        let report = importer.import_rows(rows, "memory").await.unwrap();

        assert_eq!(report.summary.imported, 1);
        assert_eq!(report.summary.rejected, 2);
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.warnings[0].row_number, Some(1));
        assert_eq!(report.rejections[0].reg_name, None);
        assert_eq!(report.rejections[1].violations.len(), 1);
        assert_eq!(report.rejections[1].violations[0].column, columns::COMPANY_EMAIL);
        assert_eq!(report.rejections[1].reg_name.as_deref(), Some("Valid Co"));
        assert_eq!(importer.repository().rejections.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_input_still_records_batch() {
        let importer = importer(500, 500);
        let report = importer.import_rows(Vec::new(), "empty").await.unwrap();

        assert_eq!(report.summary, ImportSummary::default());
        assert!(importer.repository().insert_calls.lock().unwrap().is_empty());
        assert_eq!(importer.repository().batches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_import_files_continues_after_failure() {
        let importer = importer(500, 500);
        let missing = Path::new("missing_companies.csv");
        let unsupported = Path::new("companies.txt");

        let results = importer.import_files(&[missing, unsupported]).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_err()));
    }
}
