// ==========================================
// CRM 联系人导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 行级校验问题不是错误，走 ValidationError 数据通道
// ==========================================

use thiserror::Error;

/// 导入模块错误类型（文件接收阶段）
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件预检错误（解析前拒绝）=====
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file format: {0} (only .csv is accepted)")]
    UnsupportedFormat(String),

    #[error("File too large: {size} bytes (max {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    // ===== 读取/解析错误 =====
    #[error("File read failed: {0}")]
    FileReadError(String),

    // ===== 配置错误 =====
    #[error("Config read failed (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    // ===== 通用错误 =====
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ImportError {
    /// 稳定错误码（供前端映射）
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::FileNotFound(_) => "FILE_NOT_FOUND",
            ImportError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            ImportError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            ImportError::FileReadError(_) => "FILE_READ_ERROR",
            ImportError::ConfigReadError { .. } => "CONFIG_READ_ERROR",
            ImportError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ImportError::FileNotFound(err.to_string()),
            _ => ImportError::FileReadError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
