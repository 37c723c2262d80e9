// ==========================================
// CRM 联系人导入 - 应用层
// ==========================================
// 职责: 组装仓储/配置/工作流，供 CLI 或宿主应用使用
// ==========================================

pub mod state;

pub use state::{get_default_db_path, AppState};
