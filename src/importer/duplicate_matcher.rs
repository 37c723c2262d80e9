// ==========================================
// CRM 联系人导入 - 查重器实现
// ==========================================
// 职责: 新联系人 × 已有联系人快照 的疑似重复检测
// 策略: URL（去一个结尾斜杠后精确相等）/ 姓名（TRIM + 忽略大小写）
// 说明: 两种策略独立，同一对记录可产生两条匹配；不做批内自查重
// ==========================================

use crate::domain::contact::{DuplicateMatch, ExistingContactRef, ParsedContact};
use crate::domain::types::MatchType;
use crate::importer::contact_importer_trait::DuplicateMatcher as DuplicateMatcherTrait;
use std::collections::HashMap;
use tracing::debug;

/// URL 标准化: 去掉一个结尾斜杠（不递归），其余保持原样（大小写敏感）
pub fn normalize_url(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}

/// 姓名标准化键: (first, last) TRIM + 小写
pub fn name_key(first_name: &str, last_name: &str) -> (String, String) {
    (
        first_name.trim().to_lowercase(),
        last_name.trim().to_lowercase(),
    )
}

// ==========================================
// ExistingContactIndex - 已有联系人查重索引
// ==========================================
// 查重器与批量导入执行器共用，保证两边的"碰撞"口径一致
pub struct ExistingContactIndex<'a> {
    by_url: HashMap<&'a str, Vec<&'a ExistingContactRef>>,
    by_name: HashMap<(String, String), Vec<&'a ExistingContactRef>>,
}

impl<'a> ExistingContactIndex<'a> {
    /// 建立索引（同一键下保持快照顺序）
    pub fn build(existing: &'a [ExistingContactRef]) -> Self {
        let mut by_url: HashMap<&'a str, Vec<&'a ExistingContactRef>> = HashMap::new();
        let mut by_name: HashMap<(String, String), Vec<&'a ExistingContactRef>> = HashMap::new();

        for record in existing {
            if !record.linkedin_url.is_empty() {
                by_url
                    .entry(normalize_url(&record.linkedin_url))
                    .or_default()
                    .push(record);
            }
            by_name
                .entry(name_key(&record.first_name, &record.last_name))
                .or_default()
                .push(record);
        }

        Self { by_url, by_name }
    }

    /// 查找与联系人碰撞的已有记录（先 URL 后姓名）
    pub fn lookup(&self, contact: &ParsedContact) -> Vec<(MatchType, &'a ExistingContactRef)> {
        let mut hits = Vec::new();
        if let Some(records) = self.by_url.get(normalize_url(&contact.linkedin_url)) {
            hits.extend(records.iter().map(|r| (MatchType::Url, *r)));
        }
        if let Some(records) = self
            .by_name
            .get(&name_key(&contact.first_name, &contact.last_name))
        {
            hits.extend(records.iter().map(|r| (MatchType::Name, *r)));
        }
        hits
    }
}

pub struct DuplicateMatcher;

impl DuplicateMatcherTrait for DuplicateMatcher {
    fn find_duplicates(
        &self,
        contacts: &[ParsedContact],
        existing: &[ExistingContactRef],
    ) -> Vec<DuplicateMatch> {
        let index = ExistingContactIndex::build(existing);

        let matches: Vec<DuplicateMatch> = contacts
            .iter()
            .flat_map(|contact| {
                index
                    .lookup(contact)
                    .into_iter()
                    .map(move |(match_type, record)| DuplicateMatch {
                        csv_contact: contact.clone(),
                        existing_contact: record.clone(),
                        match_type,
                    })
            })
            .collect();

        debug!(
            contacts = contacts.len(),
            existing = existing.len(),
            matches = matches.len(),
            "查重完成"
        );
        matches
    }
}
