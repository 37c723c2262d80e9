// ==========================================
// CRM 联系人导入 - 联系人 Repository Trait
// ==========================================
// 职责: 定义联系人存储的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含导入规则，碰撞口径复用查重索引
// ==========================================

use crate::domain::contact::{
    BulkImportRequest, ContactRecord, ExistingContactRef, ImportStats, ParsedContact,
};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ContactRepository Trait
// ==========================================
// 用途: 联系人存储的基础读写
// 实现者: ContactRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// 读取全部已有联系人的查重投影
    ///
    /// # 参数
    /// - page_size: 每页读取条数（快照可能很大，分批读取）
    ///
    /// # 返回
    /// - Ok(Vec<ExistingContactRef>): 按存储顺序的完整快照
    async fn list_existing_contacts(
        &self,
        page_size: usize,
    ) -> RepositoryResult<Vec<ExistingContactRef>>;

    /// 新建联系人
    ///
    /// # 返回
    /// - Ok(String): 新联系人 ID
    async fn create_contact(&self, contact: &ParsedContact) -> RepositoryResult<String>;

    /// 根据 ID 查询联系人
    async fn find_contact_by_id(&self, contact_id: &str) -> RepositoryResult<Option<ContactRecord>>;

    /// 查询联系人关联的分类/活动 ID
    async fn list_contact_categories(&self, contact_id: &str) -> RepositoryResult<Vec<String>>;

    /// 统计联系人总数
    async fn count_contacts(&self) -> RepositoryResult<usize>;
}

// ==========================================
// BulkImportExecutor Trait
// ==========================================
// 用途: 导入工作流的最终落库边界
// 实现者: ContactRepositoryImpl
#[async_trait]
pub trait BulkImportExecutor: Send + Sync {
    /// 批量导入联系人
    ///
    /// # 规则（逐条）
    /// - 与"已勾选覆盖"的已有记录碰撞 → 更新该记录，计入 updated
    /// - 仅与未勾选的已有记录碰撞 → 保持原样，计入 skipped
    /// - 无碰撞 → 新建，计入 imported
    /// - 新建/更新的联系人关联全部 category_ids
    ///
    /// # 返回
    /// - Ok(ImportStats): 实际生效统计
    /// - Err: 整体失败（不提供逐行错误）
    async fn bulk_import(&self, request: BulkImportRequest) -> RepositoryResult<ImportStats>;
}
