// ==========================================
// CRM 联系人导入 - 行校验器实现
// ==========================================
// 职责: 必填字段 / URL 格式 / 日期标准化（纯函数，无 I/O）
// 顺序: 必填缺失 → 短路；URL 非法 → 拒绝；日期非法 → 保留联系人 + 记录错误
// ==========================================

use crate::domain::contact::{ParsedContact, RawRow, RowOutcome, ValidationError, CSV_IMPORT_SOURCE};
use crate::importer::contact_importer_trait::{
    DataCleaner, RowValidator as RowValidatorTrait,
};
use crate::importer::data_cleaner::DataCleaner as DataCleanerImpl;

pub const MSG_MISSING_REQUIRED: &str = "Missing required fields (First Name, Last Name, or URL)";
pub const MSG_INVALID_URL: &str = "Invalid LinkedIn URL format";
pub const MSG_INVALID_DATE: &str = "Invalid date format";

pub struct RowValidator {
    data_cleaner: Box<dyn DataCleaner>,
}

impl RowValidator {
    pub fn new(data_cleaner: Box<dyn DataCleaner>) -> Self {
        Self { data_cleaner }
    }
}

impl Default for RowValidator {
    fn default() -> Self {
        Self::new(Box::new(DataCleanerImpl))
    }
}

impl RowValidatorTrait for RowValidator {
    fn validate_row(&self, row: &RawRow) -> RowOutcome {
        let cleaner = &self.data_cleaner;

        let first_name = cleaner.clean_text(&row.first_name);
        let last_name = cleaner.clean_text(&row.last_name);
        let url = cleaner.clean_text(&row.url);

        // 必填字段
        if first_name.is_empty() || last_name.is_empty() || url.is_empty() {
            return RowOutcome::RejectedWithError(ValidationError::new(
                row.row_number,
                MSG_MISSING_REQUIRED,
            ));
        }

        // URL 格式
        if !cleaner.is_valid_linkedin_url(&url) {
            return RowOutcome::RejectedWithError(ValidationError::new(
                row.row_number,
                MSG_INVALID_URL,
            ));
        }

        let mut contact = ParsedContact {
            first_name,
            last_name,
            linkedin_url: url,
            email: cleaner.normalize_null(&row.email),
            company: cleaner.normalize_null(&row.company),
            position: cleaner.normalize_null(&row.position),
            connected_on: None,
            source: CSV_IMPORT_SOURCE.to_string(),
        };

        // 日期: 空白 → None；非法 → 联系人 + 错误
        let raw_date = match cleaner.normalize_null(&row.connected_on) {
            None => return RowOutcome::ContactOnly(contact),
            Some(v) => v,
        };

        match cleaner.parse_connected_on(&raw_date) {
            Some(date) => {
                contact.connected_on = Some(date);
                RowOutcome::ContactOnly(contact)
            }
            None => RowOutcome::ContactWithWarning(
                contact,
                ValidationError::new(
                    row.row_number,
                    format!("{} for Connected On: {}", MSG_INVALID_DATE, raw_date),
                ),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn valid_row(row_number: usize) -> RawRow {
        RawRow {
            row_number,
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            url: "https://www.linkedin.com/in/john-doe".to_string(),
            email: "".to_string(),
            company: "Acme".to_string(),
            position: "Engineer".to_string(),
            connected_on: "01 Dec 2024".to_string(),
        }
    }

    #[test]
    fn test_valid_row_produces_contact_only() {
        let validator = RowValidator::default();
        let outcome = validator.validate_row(&valid_row(1));

        let contact = match outcome {
            RowOutcome::ContactOnly(c) => c,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(contact.email, None);
        assert_eq!(contact.company.as_deref(), Some("Acme"));
        assert_eq!(contact.connected_on, NaiveDate::from_ymd_opt(2024, 12, 1));
        assert_eq!(contact.source, CSV_IMPORT_SOURCE);
    }

    #[test]
    fn test_missing_required_short_circuits() {
        let validator = RowValidator::default();
        for field in ["first", "last", "url"] {
            let mut row = valid_row(3);
            // 同时给出非法 URL/日期，确认只产生一条错误
            row.connected_on = "not a date".to_string();
            match field {
                "first" => row.first_name = "   ".to_string(),
                "last" => row.last_name = "".to_string(),
                _ => row.url = " ".to_string(),
            }

            let outcome = validator.validate_row(&row);
            assert_eq!(
                outcome,
                RowOutcome::RejectedWithError(ValidationError::new(3, MSG_MISSING_REQUIRED))
            );
        }
    }

    #[test]
    fn test_invalid_url_rejected() {
        let validator = RowValidator::default();
        let mut row = valid_row(2);
        row.url = "http://www.linkedin.com/in/john-doe".to_string();

        let outcome = validator.validate_row(&row);
        assert!(outcome.contact().is_none());
        assert_eq!(outcome.error().map(|e| e.message.as_str()), Some(MSG_INVALID_URL));
    }

    #[test]
    fn test_trailing_slash_url_accepted() {
        let validator = RowValidator::default();
        let mut row = valid_row(2);
        row.url = "https://www.linkedin.com/in/john-doe/".to_string();

        let outcome = validator.validate_row(&row);
        assert_eq!(
            outcome.contact().map(|c| c.linkedin_url.as_str()),
            Some("https://www.linkedin.com/in/john-doe/")
        );
        assert!(outcome.error().is_none());
    }

    #[test]
    fn test_invalid_date_keeps_contact_and_reports_error() {
        let validator = RowValidator::default();
        let mut row = valid_row(5);
        row.connected_on = "sometime in 2024".to_string();

        match validator.validate_row(&row) {
            RowOutcome::ContactWithWarning(contact, error) => {
                assert_eq!(contact.connected_on, None);
                assert_eq!(contact.first_name, "John");
                assert_eq!(error.row, 5);
                assert!(error.message.contains("Invalid date format"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_blank_date_and_email_are_absent() {
        let validator = RowValidator::default();
        let mut row = valid_row(1);
        row.connected_on = "  ".to_string();
        row.email = " jd@example.com ".to_string();

        let outcome = validator.validate_row(&row);
        let contact = outcome.contact().expect("应产生联系人");
        assert_eq!(contact.connected_on, None);
        assert_eq!(contact.email.as_deref(), Some("jd@example.com"));
        assert!(outcome.error().is_none());
    }
}
