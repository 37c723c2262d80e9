// ==========================================
// CRM 联系人导入 - 配置层
// ==========================================
// 职责: 系统配置读取，缺省值兜底
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::{
    ImportConfigReader, DEFAULT_MAX_FILE_SIZE_BYTES, DEFAULT_SNAPSHOT_PAGE_SIZE,
};
