// ==========================================
// CRM 联系人导入 - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 日期多格式解析 / LinkedIn URL 规则
// ==========================================

use crate::importer::contact_importer_trait::DataCleaner as DataCleanerTrait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// LinkedIn 个人主页: https + 可选 www + linkedin.com + /in/<slug> + 可选结尾斜杠
///
/// slug 仅允许 ASCII 字母数字、`-`、`_` 与百分号编码（非 ASCII 名称导出时已编码）
static LINKEDIN_PROFILE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://(www\.)?linkedin\.com/in/[A-Za-z0-9_%-]+/?$")
        .expect("LinkedIn URL 正则无效")
});

/// Connected On 可接受格式（按顺序尝试）
///
/// - `01 Dec 2024`
/// - `Dec 01, 2024`
/// - `2024-12-01`
/// - `12/01/2024`
/// - `December 1, 2024`
pub const CONNECTED_ON_FORMATS: [&str; 5] =
    ["%d %b %Y", "%b %d, %Y", "%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y"];

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }

    fn normalize_null(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn parse_connected_on(&self, value: &str) -> Option<NaiveDate> {
        let trimmed = value.trim();
        CONNECTED_ON_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
    }

    fn is_valid_linkedin_url(&self, value: &str) -> bool {
        LINKEDIN_PROFILE_PATTERN.is_match(value.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_normalize_null() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.normalize_null("   "), None);
        assert_eq!(cleaner.normalize_null(""), None);
        assert_eq!(
            cleaner.normalize_null(" a@b.com "),
            Some("a@b.com".to_string())
        );
    }

    #[test]
    fn test_parse_connected_on_all_formats() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_connected_on("01 Dec 2024"), ymd(2024, 12, 1));
        assert_eq!(cleaner.parse_connected_on("Dec 01, 2024"), ymd(2024, 12, 1));
        assert_eq!(cleaner.parse_connected_on("2024-12-01"), ymd(2024, 12, 1));
        assert_eq!(cleaner.parse_connected_on("12/01/2024"), ymd(2024, 12, 1));
        assert_eq!(cleaner.parse_connected_on("December 1, 2024"), ymd(2024, 12, 1));
        assert_eq!(cleaner.parse_connected_on(" 15 Mar 2023 "), ymd(2023, 3, 15));
    }

    #[test]
    fn test_parse_connected_on_rejects_garbage() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_connected_on("yesterday"), None);
        assert_eq!(cleaner.parse_connected_on("2024-13-01"), None);
        assert_eq!(cleaner.parse_connected_on("31/12/2024"), None);
    }

    #[test]
    fn test_linkedin_url_accepts_profiles() {
        let cleaner = DataCleaner;
        assert!(cleaner.is_valid_linkedin_url("https://www.linkedin.com/in/john-doe"));
        assert!(cleaner.is_valid_linkedin_url("https://www.linkedin.com/in/john-doe/"));
        assert!(cleaner.is_valid_linkedin_url("https://linkedin.com/in/jane_doe-123"));
        assert!(cleaner.is_valid_linkedin_url("https://www.linkedin.com/in/j%C3%B6hn-doe"));
    }

    #[test]
    fn test_linkedin_url_rejects_other_shapes() {
        let cleaner = DataCleaner;
        assert!(!cleaner.is_valid_linkedin_url("http://www.linkedin.com/in/john-doe"));
        assert!(!cleaner.is_valid_linkedin_url("https://www.linkedin.com/company/acme"));
        assert!(!cleaner.is_valid_linkedin_url("https://www.linkedin.com/john-doe"));
        assert!(!cleaner.is_valid_linkedin_url("https://www.example.com/in/john-doe"));
        assert!(!cleaner.is_valid_linkedin_url("https://www.linkedin.com/in/"));
        assert!(!cleaner.is_valid_linkedin_url("https://www.linkedin.com/in/john-doe//"));
        assert!(!cleaner.is_valid_linkedin_url("https://www.linkedin.com/in/a.b!c"));
        assert!(!cleaner.is_valid_linkedin_url("https://www.linkedin.com/in/jöhn"));
        assert!(!cleaner.is_valid_linkedin_url("https://www.linkedin.com/in/john-doe?trk=x"));
    }
}
