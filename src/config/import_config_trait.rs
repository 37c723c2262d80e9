// ==========================================
// CRM 联系人导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入工作流所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::error::ImportResult;
use async_trait::async_trait;

/// 默认文件大小上限: 5 MB
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;

/// 默认快照分页大小
pub const DEFAULT_SNAPSHOT_PAGE_SIZE: usize = 1000;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入工作流所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取上传文件大小上限（字节）
    ///
    /// # 默认值
    /// - 5242880
    ///
    /// # 用途
    /// - Upload 阶段的前置校验，超限文件不会进入解析
    async fn get_max_file_size_bytes(&self) -> ImportResult<u64>;

    /// 获取已有联系人快照的分页大小
    ///
    /// # 默认值
    /// - 1000
    async fn get_snapshot_page_size(&self) -> ImportResult<usize>;
}
