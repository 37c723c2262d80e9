// ==========================================
// CRM 联系人导入 - 工作流错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 导入层/仓储层错误经 #[from] 向上汇聚
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 工作流错误类型
#[derive(Error, Debug)]
pub enum WorkflowError {
    // ===== 状态机错误 =====
    #[error("Invalid step transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("No valid contacts to import")]
    NoValidContacts,

    #[error("At least one category or campaign must be selected")]
    NoCategorySelected,

    #[error("{count} possible duplicates need a decision before continuing")]
    DuplicatesUnresolved { count: usize },

    #[error("Overwrite target is not a matched contact: {0}")]
    UnknownOverwriteTarget(String),

    #[error("Another operation is still running for this session")]
    OperationInProgress,

    #[error("Session was cancelled or replaced; result discarded")]
    SessionSuperseded,

    #[error("Session already completed")]
    SessionCompleted,

    #[error("Cancel was not requested")]
    CancelNotRequested,

    #[error("Cancel is waiting for confirmation")]
    CancelPending,

    #[error("Import failed: {0}")]
    CommitFailed(String),

    // ===== 下层错误 =====
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl WorkflowError {
    /// 稳定错误码（供前端映射）
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            WorkflowError::NoValidContacts => "NO_VALID_CONTACTS",
            WorkflowError::NoCategorySelected => "NO_CATEGORY_SELECTED",
            WorkflowError::DuplicatesUnresolved { .. } => "DUPLICATES_UNRESOLVED",
            WorkflowError::UnknownOverwriteTarget(_) => "UNKNOWN_OVERWRITE_TARGET",
            WorkflowError::OperationInProgress => "OPERATION_IN_PROGRESS",
            WorkflowError::SessionSuperseded => "SESSION_SUPERSEDED",
            WorkflowError::SessionCompleted => "SESSION_COMPLETED",
            WorkflowError::CancelNotRequested => "CANCEL_NOT_REQUESTED",
            WorkflowError::CancelPending => "CANCEL_PENDING",
            WorkflowError::CommitFailed(_) => "COMMIT_FAILED",
            WorkflowError::Import(e) => e.code(),
            WorkflowError::Repository(e) => e.code(),
            WorkflowError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result 类型别名
pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_delegates_to_inner_error() {
        let err: WorkflowError = ImportError::FileTooLarge { size: 10, max: 5 }.into();
        assert_eq!(err.code(), "FILE_TOO_LARGE");

        let err: WorkflowError = RepositoryError::LockError("x".to_string()).into();
        assert_eq!(err.code(), "DB_LOCK_ERROR");
    }

    #[test]
    fn test_transition_message() {
        let err = WorkflowError::InvalidStateTransition {
            from: "UPLOAD".to_string(),
            to: "CONFIRM".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid step transition: UPLOAD -> CONFIRM");
    }
}
