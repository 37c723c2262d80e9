// ==========================================
// CRM 联系人导入 - 导入工作流控制器
// ==========================================
// 职责: 驱动 ImportSession 状态机，负责全部 IO（读文件/读快照/提交）
// 并发: 会话锁只在同步段持有，绝不跨 await
// 迟到结果: 异步段前后比较 session_id，不一致即丢弃
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::domain::contact::{ExistingContactRef, ImportStats};
use crate::domain::types::WorkflowStep;
use crate::importer::contact_importer::ContactCsvImporter;
use crate::importer::contact_importer_trait::{ContactImporter, DuplicateMatcher};
use crate::importer::duplicate_matcher::DuplicateMatcher as DuplicateMatcherImpl;
use crate::importer::error::ImportError;
use crate::repository::contact_repo::{BulkImportExecutor, ContactRepository};
use crate::workflow::error::{WorkflowError, WorkflowResult};
use crate::workflow::session::{
    precheck_file, CancelOutcome, ConfirmSummary, ImportSession, SelectedFile,
};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, instrument, warn};

// ==========================================
// ImportWorkflowController
// ==========================================
pub struct ImportWorkflowController {
    repository: Arc<dyn ContactRepository>,
    executor: Arc<dyn BulkImportExecutor>,
    config: Arc<dyn ImportConfigReader>,
    importer: Box<dyn ContactImporter>,
    matcher: Box<dyn DuplicateMatcher>,
    session: Mutex<ImportSession>,
}

impl ImportWorkflowController {
    /// 创建控制器（默认解析引擎与查重器）
    ///
    /// # 参数
    /// - repository: 已有联系人快照来源
    /// - executor: 批量导入执行器
    /// - config: 导入配置
    pub fn new(
        repository: Arc<dyn ContactRepository>,
        executor: Arc<dyn BulkImportExecutor>,
        config: Arc<dyn ImportConfigReader>,
    ) -> Self {
        Self::with_components(
            repository,
            executor,
            config,
            Box::new(ContactCsvImporter::default()),
            Box::new(DuplicateMatcherImpl),
        )
    }

    /// 创建控制器（注入全部组件）
    pub fn with_components(
        repository: Arc<dyn ContactRepository>,
        executor: Arc<dyn BulkImportExecutor>,
        config: Arc<dyn ImportConfigReader>,
        importer: Box<dyn ContactImporter>,
        matcher: Box<dyn DuplicateMatcher>,
    ) -> Self {
        Self {
            repository,
            executor,
            config,
            importer,
            matcher,
            session: Mutex::new(ImportSession::new()),
        }
    }

    fn lock(&self) -> WorkflowResult<MutexGuard<'_, ImportSession>> {
        self.session
            .lock()
            .map_err(|e| WorkflowError::InternalError(format!("会话锁获取失败: {}", e)))
    }

    /// 在锁内执行一次转换；失败时会话保持原值
    fn apply<F>(&self, transition: F) -> WorkflowResult<ImportSession>
    where
        F: FnOnce(ImportSession) -> WorkflowResult<ImportSession>,
    {
        let mut guard = self.lock()?;
        let next = transition(guard.clone())?;
        *guard = next;
        Ok(guard.clone())
    }

    /// 仅当会话未被替换时应用异步结果
    fn apply_if_current<F>(&self, session_id: &str, transition: F) -> WorkflowResult<ImportSession>
    where
        F: FnOnce(ImportSession) -> WorkflowResult<ImportSession>,
    {
        let mut guard = self.lock()?;
        if guard.session_id != session_id {
            warn!(session_id, current = %guard.session_id, "会话已取消或替换，丢弃迟到结果");
            return Err(WorkflowError::SessionSuperseded);
        }
        let next = transition(guard.clone())?;
        *guard = next;
        Ok(guard.clone())
    }

    /// 标记进行中，返回当前 session_id
    fn begin_operation(&self, expected: WorkflowStep) -> WorkflowResult<String> {
        let session = self.apply(|s| {
            if s.step != expected {
                return Err(WorkflowError::InvalidStateTransition {
                    from: s.step.to_string(),
                    to: expected.to_string(),
                });
            }
            s.begin_operation()
        })?;
        Ok(session.session_id)
    }

    /// 异步段失败：清除进行中标记并记录错误（会话已替换则忽略）
    fn fail_operation(&self, session_id: &str, error: &WorkflowError) {
        let message = error.to_string();
        let _ = self.apply_if_current(session_id, |s| Ok(s.end_operation(Some(message))));
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 当前会话快照
    pub fn snapshot(&self) -> WorkflowResult<ImportSession> {
        Ok(self.lock()?.clone())
    }

    pub fn summary(&self) -> WorkflowResult<ConfirmSummary> {
        self.lock()?.summary()
    }

    pub fn error_report(&self) -> WorkflowResult<String> {
        Ok(self.lock()?.error_report())
    }

    /// 导出错误报告到文件
    pub async fn export_error_report(&self, path: &Path) -> WorkflowResult<()> {
        let report = self.error_report()?;
        tokio::fs::write(path, report)
            .await
            .map_err(ImportError::from)?;
        info!(path = %path.display(), "错误报告已导出");
        Ok(())
    }

    // ==========================================
    // UPLOAD
    // ==========================================

    /// 选择并解析文件（预检通过才进入解析）
    #[instrument(skip(self, path), fields(file = %path.display()))]
    pub async fn upload_file(&self, path: &Path) -> WorkflowResult<ImportSession> {
        let session_id = self.begin_operation(WorkflowStep::Upload)?;

        let selected = match self.precheck_path(path).await {
            Ok(selected) => selected,
            Err(e) => {
                let _ = self.apply_if_current(&session_id, |s| Ok(s.reject_upload(&e)));
                return Err(e.into());
            }
        };

        self.apply_if_current(&session_id, |s| s.select_file(selected.clone()))?;

        match self.importer.parse_csv_file(path).await {
            Ok(result) => {
                self.apply_if_current(&session_id, |s| s.accept_upload(selected, result))
            }
            Err(e) => {
                let _ = self.apply_if_current(&session_id, |s| Ok(s.reject_upload(&e)));
                Err(e.into())
            }
        }
    }

    /// 上传内存中的文件内容（界面拖拽等场景）
    pub async fn upload_bytes(&self, file_name: &str, content: &[u8]) -> WorkflowResult<ImportSession> {
        let session_id = self.begin_operation(WorkflowStep::Upload)?;

        let max = match self.config.get_max_file_size_bytes().await {
            Ok(max) => max,
            Err(e) => {
                let err = WorkflowError::from(e);
                self.fail_operation(&session_id, &err);
                return Err(err);
            }
        };

        let selected = match precheck_file(file_name, content.len() as u64, max) {
            Ok(selected) => selected,
            Err(e) => {
                let _ = self.apply_if_current(&session_id, |s| Ok(s.reject_upload(&e)));
                return Err(e.into());
            }
        };

        self.apply_if_current(&session_id, |s| s.select_file(selected.clone()))?;
        let result = self.importer.parse_csv_bytes(content);
        self.apply_if_current(&session_id, |s| s.accept_upload(selected, result))
    }

    async fn precheck_path(&self, path: &Path) -> Result<SelectedFile, ImportError> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ImportError::FileNotFound(path.display().to_string()),
            _ => ImportError::FileReadError(e.to_string()),
        })?;
        if !metadata.is_file() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let max = self.config.get_max_file_size_bytes().await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        precheck_file(&file_name, metadata.len(), max)
    }

    // ==========================================
    // 前进 / 后退
    // ==========================================

    /// 前进一步
    ///
    /// - UPLOAD → PREVIEW
    /// - PREVIEW → 读取已有联系人快照并查重 → DUPLICATE_CHECK（无匹配直接 CONFIRM）
    /// - DUPLICATE_CHECK 需通过 resolve_duplicates 提交覆盖集合
    /// - CONFIRM 需通过 commit 提交
    pub async fn next(&self) -> WorkflowResult<ImportSession> {
        let step = self.lock()?.step;
        match step {
            WorkflowStep::Upload => self.apply(|s| s.advance_to_preview()),
            WorkflowStep::Preview => self.run_duplicate_check().await,
            WorkflowStep::DuplicateCheck => Err(WorkflowError::DuplicatesUnresolved {
                count: self.lock()?.duplicates.len(),
            }),
            WorkflowStep::Confirm => Err(WorkflowError::InvalidStateTransition {
                from: WorkflowStep::Confirm.to_string(),
                to: "DONE".to_string(),
            }),
        }
    }

    #[instrument(skip(self))]
    async fn run_duplicate_check(&self) -> WorkflowResult<ImportSession> {
        let (session_id, contacts) = {
            let mut guard = self.lock()?;
            guard.ensure_can_leave_preview()?;
            let next = guard.clone().begin_operation()?;
            *guard = next;
            (guard.session_id.clone(), guard.contacts().to_vec())
        };

        let existing = match self.load_existing_snapshot().await {
            Ok(existing) => existing,
            Err(e) => {
                self.fail_operation(&session_id, &e);
                return Err(e);
            }
        };

        let duplicates = self.matcher.find_duplicates(&contacts, &existing);
        info!(
            contacts = contacts.len(),
            existing = existing.len(),
            duplicates = duplicates.len(),
            "重复检查完成"
        );

        self.apply_if_current(&session_id, |s| s.enter_duplicate_check(duplicates))
    }

    async fn load_existing_snapshot(
        &self,
    ) -> WorkflowResult<Vec<ExistingContactRef>> {
        let page_size = self.config.get_snapshot_page_size().await?;
        Ok(self.repository.list_existing_contacts(page_size).await?)
    }

    pub fn back(&self) -> WorkflowResult<ImportSession> {
        self.apply(|s| s.back())
    }

    // ==========================================
    // PREVIEW / DUPLICATE_CHECK
    // ==========================================

    pub fn select_categories<I, S>(&self, category_ids: I) -> WorkflowResult<ImportSession>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.apply(|s| s.select_categories(category_ids))
    }

    pub fn resolve_duplicates<I, S>(&self, overwrite_ids: I) -> WorkflowResult<ImportSession>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apply(|s| s.resolve_duplicates(overwrite_ids))
    }

    // ==========================================
    // 取消 / 关闭
    // ==========================================

    pub fn cancel(&self) -> WorkflowResult<CancelOutcome> {
        let mut guard = self.lock()?;
        let (next, outcome) = guard.clone().request_cancel()?;
        *guard = next;
        Ok(outcome)
    }

    pub fn confirm_cancel(&self) -> WorkflowResult<ImportSession> {
        let session = self.apply(|s| s.confirm_cancel())?;
        info!(session_id = %session.session_id, "导入会话已取消");
        Ok(session)
    }

    pub fn dismiss_cancel(&self) -> WorkflowResult<ImportSession> {
        self.apply(|s| Ok(s.dismiss_cancel()))
    }

    /// 关闭会话（完成后或放弃时），开始新会话
    pub fn close(&self) -> WorkflowResult<ImportSession> {
        self.apply(|_| Ok(ImportSession::new()))
    }

    // ==========================================
    // CONFIRM
    // ==========================================

    /// 提交导入（每次尝试只调用执行器一次）
    #[instrument(skip(self))]
    pub async fn commit(&self) -> WorkflowResult<ImportStats> {
        let (session_id, request) = {
            let mut guard = self.lock()?;
            let (next, request) = guard.clone().begin_commit()?;
            *guard = next;
            (guard.session_id.clone(), request)
        };

        match self.executor.bulk_import(request).await {
            Ok(stats) => {
                self.apply_if_current(&session_id, |s| Ok(s.commit_succeeded(stats)))?;
                info!(
                    imported = stats.imported,
                    updated = stats.updated,
                    skipped = stats.skipped,
                    "导入完成"
                );
                Ok(stats)
            }
            Err(e) => {
                warn!(code = e.code(), error = %e, "批量导入失败");
                let err = WorkflowError::CommitFailed(e.to_string());
                let message = err.to_string();
                self.apply_if_current(&session_id, |s| Ok(s.commit_failed(message)))?;
                Err(err)
            }
        }
    }
}
