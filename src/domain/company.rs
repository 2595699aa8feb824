// ==========================================
// 公司概况导入器 - 公司概况领域模型
// ==========================================
// 职责: 导入产出的持久化记录 + 导入批次/拒绝行/告警
// 红线: 记录每行只构造一次，落库前只补充 batch_id
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ==========================================
// CompanyOverviewRecord - 公司概况记录
// ==========================================
// 对齐: company_overview 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyOverviewRecord {
    // ===== 基本信息 =====
    pub reg_name: String,                       // 注册名称（必填）
    pub trading_name: Option<String>,           // 经营名称
    pub hq_origin_country: Option<String>,      // 总部所在国
    pub year_founded: Option<i32>,              // 成立年份
    pub incorporation_date: Option<NaiveDate>,  // 注册日期
    pub company_type: Option<String>,           // 公司类型
    pub ownership_structure: Option<String>,    // 股权结构
    pub company_description: Option<String>,    // 公司简介
    pub employee_count: Option<i64>,            // 员工人数

    // ===== 行业与市场（逗号列表，永不为 null）=====
    pub main_industry_operations: Vec<String>,
    pub other_industry_operations: Vec<String>,
    pub countries_of_operation: Vec<String>,
    pub business_model: Vec<String>,
    pub target_markets: Vec<String>,

    // ===== 联系方式 =====
    pub website: Option<String>,
    pub company_email: Option<String>,
    pub company_phone: Option<String>,
    pub contact_name: Option<String>,
    pub contact_title: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,

    // ===== 社交链接 =====
    pub linkedin_url: Option<String>,
    pub twitter_url: Option<String>,
    pub facebook_url: Option<String>,
    pub instagram_url: Option<String>,

    // ===== 交易偏好 =====
    pub publicly_listed: Option<bool>,
    pub open_to_acquisition: Option<bool>,
    pub last_valuation_date: Option<NaiveDate>,

    // ===== 结构化字段（JSON）=====
    pub ebitda_times: Option<Value>, // EBITDA 倍数，如 {"years":"3","amount":"5"}
    pub shareholders: Option<Value>,
    /// 总部地址：解码成功为数组/对象；空值为 []；
    /// 解码失败为 {"full_address_string": 原文}
    pub hq_address: Value,

    // ===== 元信息 =====
    pub row_number: usize,
    pub batch_id: Option<String>,
}

#[cfg(test)]
impl CompanyOverviewRecord {
    /// 只有注册名称的最小记录，其余字段取中性默认值
    pub fn with_reg_name(reg_name: impl Into<String>, row_number: usize) -> Self {
        Self {
            reg_name: reg_name.into(),
            trading_name: None,
            hq_origin_country: None,
            year_founded: None,
            incorporation_date: None,
            company_type: None,
            ownership_structure: None,
            company_description: None,
            employee_count: None,
            main_industry_operations: Vec::new(),
            other_industry_operations: Vec::new(),
            countries_of_operation: Vec::new(),
            business_model: Vec::new(),
            target_markets: Vec::new(),
            website: None,
            company_email: None,
            company_phone: None,
            contact_name: None,
            contact_title: None,
            contact_email: None,
            contact_phone: None,
            linkedin_url: None,
            twitter_url: None,
            facebook_url: None,
            instagram_url: None,
            publicly_listed: None,
            open_to_acquisition: None,
            last_valuation_date: None,
            ebitda_times: None,
            shareholders: None,
            hq_address: Value::Array(Vec::new()),
            row_number,
            batch_id: None,
        }
    }
}

// ==========================================
// FieldViolation - 字段校验失败
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub column: String,  // 源列名
    pub message: String, // 违规描述
}

// ==========================================
// RowRejection - 被拒绝的行
// ==========================================
// 对齐: import_rejection 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowRejection {
    pub rejection_id: String,
    pub batch_id: String,
    pub row_number: usize,
    pub reg_name: Option<String>,
    pub violations: Vec<FieldViolation>,
    pub raw_data: String, // 原始行 JSON
    pub created_at: DateTime<Utc>,
}

impl RowRejection {
    /// 按列名汇总的错误文本，如 "company_email: 邮箱格式错误"
    pub fn describe(&self) -> String {
        self.violations
            .iter()
            .map(|v| format!("{}: {}", v.column, v.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// ==========================================
// ImportWarning - 导入告警（降级/跳过）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportWarning {
    pub row_number: Option<usize>,
    pub column: Option<String>,
    pub message: String,
}

// ==========================================
// ImportBatch - 导入批次
// ==========================================
// 对齐: import_batch 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,                   // 批次 ID（UUID）
    pub file_name: Option<String>,          // 源文件名
    pub file_path: Option<String>,          // 源文件路径
    pub total_rows: i32,                    // 总行数
    pub imported_rows: i32,                 // 成功导入行数
    pub rejected_rows: i32,                 // 拒绝行数
    pub warning_count: i32,                 // 告警条数
    pub imported_at: Option<DateTime<Utc>>, // 导入时间
    pub imported_by: Option<String>,        // 导入人
    pub elapsed_ms: Option<i64>,            // 导入耗时（毫秒）
    pub report_json: Option<String>,        // 汇总报告 JSON
}

// ==========================================
// ImportSummary - 导入汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub imported: usize,
    pub rejected: usize,
    pub warnings: usize,
}

// ==========================================
// ImportReport - 导入结果
// ==========================================
// 用途: 导入接口返回值，供界面展示逐行摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch: ImportBatch,
    pub summary: ImportSummary,
    pub rejections: Vec<RowRejection>,
    pub warnings: Vec<ImportWarning>,
    pub elapsed_time: std::time::Duration,
}
