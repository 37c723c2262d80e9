// ==========================================
// CRM 联系人导入 - 导入工作流
// ==========================================
// 职责: 上传 → 预览 → 重复检查 → 确认 的多步会话
// ==========================================

pub mod controller;
pub mod error;
pub mod session;

pub use controller::ImportWorkflowController;
pub use error::{WorkflowError, WorkflowResult};
pub use session::{precheck_file, CancelOutcome, ConfirmSummary, ImportSession, SelectedFile};
