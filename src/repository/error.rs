// ==========================================
// CRM 联系人导入 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据库错误 =====
    #[error("Record not found: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("Database connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("Database lock failed: {0}")]
    LockError(String),

    #[error("Database transaction failed: {0}")]
    DatabaseTransactionError(String),

    #[error("Database query failed: {0}")]
    DatabaseQueryError(String),

    #[error("Unique constraint violated: {0}")]
    UniqueConstraintViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

}

impl RepositoryError {
    /// 打开数据库失败
    pub fn connection(err: rusqlite::Error) -> Self {
        RepositoryError::DatabaseConnectionError(err.to_string())
    }

    /// 事务开始/提交失败
    pub fn transaction(err: rusqlite::Error) -> Self {
        RepositoryError::DatabaseTransactionError(err.to_string())
    }

    /// 稳定错误码（日志与 CLI 输出使用）
    pub fn code(&self) -> &'static str {
        match self {
            RepositoryError::NotFound { .. } => "NOT_FOUND",
            RepositoryError::DatabaseConnectionError(_) => "DB_CONNECTION_ERROR",
            RepositoryError::LockError(_) => "DB_LOCK_ERROR",
            RepositoryError::DatabaseTransactionError(_) => "DB_TRANSACTION_ERROR",
            RepositoryError::DatabaseQueryError(_) => "DB_QUERY_ERROR",
            RepositoryError::UniqueConstraintViolation(_) => "UNIQUE_CONSTRAINT_VIOLATION",
            RepositoryError::ForeignKeyViolation(_) => "FOREIGN_KEY_VIOLATION",
        }
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rusqlite_no_rows_maps_to_not_found() {
        let err: RepositoryError = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_lock_error_code() {
        let err = RepositoryError::LockError("poisoned".to_string());
        assert_eq!(err.code(), "DB_LOCK_ERROR");
        assert!(err.to_string().contains("poisoned"));
    }

    #[test]
    fn test_unique_violation_classified() {
        let err: RepositoryError = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
            Some("UNIQUE constraint failed: contact.contact_id".to_string()),
        )
        .into();
        assert_eq!(err.code(), "UNIQUE_CONSTRAINT_VIOLATION");
    }

    #[test]
    fn test_connection_and_transaction_codes() {
        let err = RepositoryError::connection(rusqlite::Error::InvalidQuery);
        assert_eq!(err.code(), "DB_CONNECTION_ERROR");
        let err = RepositoryError::transaction(rusqlite::Error::InvalidQuery);
        assert_eq!(err.code(), "DB_TRANSACTION_ERROR");
    }
}
