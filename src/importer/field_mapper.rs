// ==========================================
// 公司概况导入器 - 字段映射器实现
// ==========================================
// 职责: 源列 → 记录字段映射 + 逐字段类型转换
// 说明: 字段之间互不依赖，唯一的整行门槛是注册名称
// ==========================================

use crate::domain::{CompanyOverviewRecord, RawRow};
use crate::importer::cell_coercion::{CellCoercer, JsonColumnPolicy};
use crate::importer::company_importer_trait::FieldMapper as FieldMapperTrait;
use crate::importer::diagnostics::{WarningContext, WarningSink};

/// 源表头列名
pub mod columns {
    pub const COMPANY_REGISTERED_NAME: &str = "company_registered_name";
    pub const COMPANY_TRADING_NAME: &str = "company_trading_name";
    pub const HQ_ORIGIN_COUNTRY: &str = "hq_origin_country";
    pub const YEAR_FOUNDED: &str = "year_founded";
    pub const DATE_OF_INCORPORATION: &str = "date_of_incorporation";
    pub const COMPANY_TYPE: &str = "company_type";
    pub const OWNERSHIP_STRUCTURE: &str = "ownership_structure";
    pub const MAIN_INDUSTRY_OPERATIONS: &str = "main_industry_operations";
    pub const OTHER_INDUSTRY_OPERATIONS: &str = "other_industry_operations";
    pub const COUNTRIES_OF_OPERATION: &str = "countries_of_operation";
    pub const BUSINESS_MODEL: &str = "business_model";
    pub const TARGET_MARKETS: &str = "target_markets";
    pub const COMPANY_DESCRIPTION: &str = "company_description";
    pub const NUMBER_OF_EMPLOYEES: &str = "number_of_employees";
    pub const COMPANY_WEBSITE: &str = "company_website";
    pub const COMPANY_EMAIL: &str = "company_email";
    pub const COMPANY_PHONE: &str = "company_phone";
    pub const CONTACT_PERSON_NAME: &str = "contact_person_name";
    pub const CONTACT_PERSON_TITLE: &str = "contact_person_title";
    pub const CONTACT_PERSON_EMAIL: &str = "contact_person_email";
    pub const CONTACT_PERSON_PHONE: &str = "contact_person_phone";
    pub const LINKEDIN_URL: &str = "linkedin_url";
    pub const TWITTER_URL: &str = "twitter_url";
    pub const FACEBOOK_URL: &str = "facebook_url";
    pub const INSTAGRAM_URL: &str = "instagram_url";
    pub const IS_PUBLICLY_LISTED: &str = "is_publicly_listed";
    pub const OPEN_TO_ACQUISITION: &str = "open_to_acquisition";
    pub const LAST_VALUATION_DATE: &str = "last_valuation_date";
    pub const EBITDA_MULTIPLES: &str = "ebitda_multiples";
    pub const SHAREHOLDERS: &str = "shareholders";
    pub const HQ_ADDRESS: &str = "hq_address";
}

pub struct FieldMapper;

impl FieldMapperTrait for FieldMapper {
    fn map_row(&self, row: &RawRow, sink: &dyn WarningSink) -> Option<CompanyOverviewRecord> {
        use columns::*;

        let c = CellCoercer::new(sink, row.row_number);

        // 必填门槛: 注册名称为空 → 跳过整行，仅一条告警
        let reg_name = match row.get(COMPANY_REGISTERED_NAME).as_text() {
            Some(name) if !name.is_empty() => name,
            _ => {
                sink.warn(
                    "注册名称为空，跳过该行",
                    WarningContext::cell(row.row_number, COMPANY_REGISTERED_NAME),
                );
                return None;
            }
        };

        Some(CompanyOverviewRecord {
            reg_name,
            trading_name: c.text(COMPANY_TRADING_NAME, row.get(COMPANY_TRADING_NAME)),
            hq_origin_country: c.text(HQ_ORIGIN_COUNTRY, row.get(HQ_ORIGIN_COUNTRY)),
            year_founded: c
                .integer(YEAR_FOUNDED, row.get(YEAR_FOUNDED))
                .and_then(|y| i32::try_from(y).ok()),
            incorporation_date: c.date(DATE_OF_INCORPORATION, row.get(DATE_OF_INCORPORATION)),
            company_type: c.text(COMPANY_TYPE, row.get(COMPANY_TYPE)),
            ownership_structure: c.text(OWNERSHIP_STRUCTURE, row.get(OWNERSHIP_STRUCTURE)),
            company_description: c.text(COMPANY_DESCRIPTION, row.get(COMPANY_DESCRIPTION)),
            employee_count: c.integer(NUMBER_OF_EMPLOYEES, row.get(NUMBER_OF_EMPLOYEES)),

            main_industry_operations: c.comma_list(row.get(MAIN_INDUSTRY_OPERATIONS)),
            other_industry_operations: c.comma_list(row.get(OTHER_INDUSTRY_OPERATIONS)),
            countries_of_operation: c.comma_list(row.get(COUNTRIES_OF_OPERATION)),
            business_model: c.comma_list(row.get(BUSINESS_MODEL)),
            target_markets: c.comma_list(row.get(TARGET_MARKETS)),

            website: c.text(COMPANY_WEBSITE, row.get(COMPANY_WEBSITE)),
            company_email: c.text(COMPANY_EMAIL, row.get(COMPANY_EMAIL)),
            company_phone: c.text(COMPANY_PHONE, row.get(COMPANY_PHONE)),
            contact_name: c.text(CONTACT_PERSON_NAME, row.get(CONTACT_PERSON_NAME)),
            contact_title: c.text(CONTACT_PERSON_TITLE, row.get(CONTACT_PERSON_TITLE)),
            contact_email: c.text(CONTACT_PERSON_EMAIL, row.get(CONTACT_PERSON_EMAIL)),
            contact_phone: c.text(CONTACT_PERSON_PHONE, row.get(CONTACT_PERSON_PHONE)),

            linkedin_url: c.text(LINKEDIN_URL, row.get(LINKEDIN_URL)),
            twitter_url: c.text(TWITTER_URL, row.get(TWITTER_URL)),
            facebook_url: c.text(FACEBOOK_URL, row.get(FACEBOOK_URL)),
            instagram_url: c.text(INSTAGRAM_URL, row.get(INSTAGRAM_URL)),

            publicly_listed: c.boolean(IS_PUBLICLY_LISTED, row.get(IS_PUBLICLY_LISTED)),
            open_to_acquisition: c.boolean(OPEN_TO_ACQUISITION, row.get(OPEN_TO_ACQUISITION)),
            last_valuation_date: c.date(LAST_VALUATION_DATE, row.get(LAST_VALUATION_DATE)),

            ebitda_times: c.json_general(EBITDA_MULTIPLES, row.get(EBITDA_MULTIPLES)),
            shareholders: c.json_general(SHAREHOLDERS, row.get(SHAREHOLDERS)),
            hq_address: c.json(HQ_ADDRESS, row.get(HQ_ADDRESS), JsonColumnPolicy::ADDRESS),

            row_number: row.row_number,
            batch_id: None,
        })
    }
}
