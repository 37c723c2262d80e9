// ==========================================
// CRM 联系人导入 - 数据仓储层
// ==========================================
// 红线: Repository 不含导入规则
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod contact_repo;
pub mod contact_repo_impl;
pub mod error;

// 重导出核心仓储
pub use contact_repo::{BulkImportExecutor, ContactRepository};
pub use contact_repo_impl::ContactRepositoryImpl;
pub use error::{RepositoryError, RepositoryResult};
