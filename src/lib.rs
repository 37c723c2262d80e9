// ==========================================
// CRM 联系人导入 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 流程: CSV 解析 → 行校验 → 查重 → 多步确认 → 批量落库
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 数据结构与类型
pub mod domain;

// 导入层 - 解析/校验/查重
pub mod importer;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 系统配置
pub mod config;

// 工作流层 - 多步导入会话
pub mod workflow;

// 应用层 - 组装
pub mod app;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    BulkImportRequest, DuplicateMatch, ExistingContactRef, ImportStats, MatchType, ParseResult,
    ParsedContact, ValidationError, WorkflowStep,
};
pub use importer::{ContactCsvImporter, ContactImporter, ImportError};
pub use repository::{BulkImportExecutor, ContactRepository, ContactRepositoryImpl, RepositoryError};
pub use workflow::{CancelOutcome, ImportSession, ImportWorkflowController, WorkflowError};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "CRM 联系人导入";
