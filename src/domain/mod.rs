// ==========================================
// CRM 联系人导入 - 领域模型层
// ==========================================
// 职责: 定义导入管道各阶段的数据结构与枚举
// 红线: 不含数据访问逻辑,不含工作流逻辑
// ==========================================

pub mod contact;
pub mod types;

// 重导出核心类型
pub use contact::{
    BulkImportRequest, ContactRecord, DuplicateMatch, ExistingContactRef, ImportStats,
    ParseResult, ParsedContact, RawRow, RowOutcome, ValidationError, CSV_IMPORT_SOURCE,
};
pub use types::{MatchType, WorkflowStep};
