// ==========================================
// CRM 联系人导入 - 联系人领域模型
// ==========================================
// 职责: 导入管道各阶段的数据结构
// 流程: RawRow → RowOutcome → ParseResult → DuplicateMatch → ImportStats
// ==========================================

use crate::domain::types::MatchType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 导入来源标记（写入 ParsedContact.source）
pub const CSV_IMPORT_SOURCE: &str = "CSV Import";

// ==========================================
// RawRow - 原始行（固定结构）
// ==========================================
// 红线: 仅做列映射 + TRIM，不做任何类型转换
// 缺失列一律为空字符串
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub row_number: usize, // 数据行号（1 起，不含表头）

    pub first_name: String,   // First Name
    pub last_name: String,    // Last Name
    pub url: String,          // URL
    pub email: String,        // Email Address
    pub company: String,      // Company
    pub position: String,     // Position
    pub connected_on: String, // Connected On
}

impl RawRow {
    /// 是否为完全空白行（所有字段为空）
    pub fn is_blank(&self) -> bool {
        [
            &self.first_name,
            &self.last_name,
            &self.url,
            &self.email,
            &self.company,
            &self.position,
            &self.connected_on,
        ]
        .iter()
        .all(|v| v.trim().is_empty())
    }
}

// ==========================================
// ParsedContact - 通过校验的联系人
// ==========================================
// 创建后不可变；connected_on 序列化为 YYYY-MM-DD
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedContact {
    pub first_name: String,
    pub last_name: String,
    pub linkedin_url: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub connected_on: Option<NaiveDate>,
    pub source: String,
}

// ==========================================
// ValidationError - 行级校验错误
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub row: usize,
    pub message: String,
}

impl ValidationError {
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.message)
    }
}

// ==========================================
// RowOutcome - 单行校验结果
// ==========================================
// 三种结果显式区分，日期错误是唯一"既有联系人又有错误"的分支
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    ContactOnly(ParsedContact),
    ContactWithWarning(ParsedContact, ValidationError),
    RejectedWithError(ValidationError),
}

impl RowOutcome {
    pub fn contact(&self) -> Option<&ParsedContact> {
        match self {
            RowOutcome::ContactOnly(c) | RowOutcome::ContactWithWarning(c, _) => Some(c),
            RowOutcome::RejectedWithError(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            RowOutcome::ContactOnly(_) => None,
            RowOutcome::ContactWithWarning(_, e) | RowOutcome::RejectedWithError(e) => Some(e),
        }
    }
}

// ==========================================
// ParseResult - 解析汇总
// ==========================================
// 不变量: valid_rows == contacts.len()
// total_rows 统计所有非空白数据行（无论是否有效）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    pub contacts: Vec<ParsedContact>,
    pub errors: Vec<ValidationError>,
    pub total_rows: usize,
    pub valid_rows: usize,
}

impl ParseResult {
    /// 合并一行的校验结果（维护计数不变量）
    pub fn record(&mut self, outcome: RowOutcome) {
        self.total_rows += 1;
        match outcome {
            RowOutcome::ContactOnly(contact) => self.contacts.push(contact),
            RowOutcome::ContactWithWarning(contact, error) => {
                self.contacts.push(contact);
                self.errors.push(error);
            }
            RowOutcome::RejectedWithError(error) => self.errors.push(error),
        }
        self.valid_rows = self.contacts.len();
    }

    /// 是否至少有一条有效联系人（允许进入下一步）
    pub fn has_valid_contacts(&self) -> bool {
        self.valid_rows > 0
    }

    /// 错误报告（每行 "Row {n}: {message}"）
    pub fn error_report(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ==========================================
// ExistingContactRef - 已有联系人投影（仅用于查重）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingContactRef {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub linkedin_url: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
}

// ==========================================
// ContactRecord - 联系人存储记录（完整行）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub linkedin_url: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub connected_on: Option<NaiveDate>,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContactRecord {
    /// 查重投影
    pub fn to_ref(&self) -> ExistingContactRef {
        ExistingContactRef {
            id: self.id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            linkedin_url: self.linkedin_url.clone(),
            email: self.email.clone(),
            company: self.company.clone(),
            position: self.position.clone(),
        }
    }
}

// ==========================================
// DuplicateMatch - 疑似重复记录
// ==========================================
// 每个 (CSV 行, 已有记录, 策略) 一条
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateMatch {
    pub csv_contact: ParsedContact,
    pub existing_contact: ExistingContactRef,
    pub match_type: MatchType,
}

// ==========================================
// BulkImportRequest - 批量提交请求
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkImportRequest {
    pub contacts: Vec<ParsedContact>,
    pub category_ids: Vec<String>,  // 附加到本批每个联系人
    pub overwrite_ids: Vec<String>, // 允许覆盖的已有联系人 ID
}

// ==========================================
// ImportStats - 导入结果统计（以执行器为准）
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    pub imported: usize, // 新建
    pub updated: usize,  // 覆盖更新
    pub skipped: usize,  // 重复且未勾选覆盖
}
