// ==========================================
// CRM 联系人导入 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接、仓储与配置
// ==========================================

use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::contact_repo_impl::ContactRepositoryImpl;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::workflow::controller::ImportWorkflowController;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// 数据库路径环境变量（便于调试/测试/CI）
pub const DB_PATH_ENV: &str = "CRM_CONTACT_IMPORT_DB_PATH";

/// 应用状态
///
/// 所有仓储共享同一个 SQLite 连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 联系人仓储（同时是批量导入执行器）
    pub contact_repo: Arc<ContactRepositoryImpl>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的 AppState 实例
    ///
    /// # 说明
    /// 打开数据库、建表（幂等）、初始化仓储与配置
    pub fn new(db_path: String) -> RepositoryResult<Self> {
        tracing::info!(db_path = %db_path, "初始化 AppState");

        let conn = open_sqlite_connection(&db_path).map_err(RepositoryError::connection)?;
        init_schema(&conn)?;
        let conn = Arc::new(Mutex::new(conn));

        let contact_repo = Arc::new(ContactRepositoryImpl::from_connection(conn.clone()));
        let config_manager = Arc::new(ConfigManager::from_connection(conn)?);

        Ok(Self {
            db_path,
            contact_repo,
            config_manager,
        })
    }

    /// 创建一个新的导入工作流（每次导入一个会话）
    pub fn new_import_controller(&self) -> ImportWorkflowController {
        ImportWorkflowController::new(
            self.contact_repo.clone(),
            self.contact_repo.clone(),
            self.config_manager.clone(),
        )
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./crm_contacts.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("crm-contact-import");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("crm_contacts.db");
        }
    }

    path.to_string_lossy().to_string()
}
